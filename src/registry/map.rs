//! # Type-keyed subscriber registry.
//!
//! [`Registry`] maps a [`MessageKey`] to the ordered list of entries subscribed
//! for that message type.
//!
//! ## Rules
//! - Insertion order is preserved and is the invocation order.
//! - No uniqueness check: pushing the same handler twice yields two entries.
//! - A key is removed as soon as its list becomes empty.
//! - The registry itself is not synchronized; owners wrap it in a lock and only
//!   hand out [`Registry::snapshot`] copies to dispatch code.

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;

use super::family::Family;
use super::key::MessageKey;
use crate::handlers::Message;

/// Type-erased `Vec<F::Entry<M>>`.
type ErasedList = Box<dyn Any + Send + Sync>;

/// Mapping from message type to subscriber list.
pub struct Registry<F: Family> {
    lists: HashMap<MessageKey, ErasedList>,
    _family: PhantomData<fn() -> F>,
}

impl<F: Family> Registry<F> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            lists: HashMap::new(),
            _family: PhantomData,
        }
    }

    /// Appends an entry to the list for `M`, creating the list if absent.
    ///
    /// # Panics
    /// If the list stored under `M`'s key holds another entry type. Keys are
    /// `TypeId`s, so this means the registry itself is broken.
    pub fn push<M: Message>(&mut self, entry: F::Entry<M>) {
        let key = MessageKey::of::<M>();
        let slot = self
            .lists
            .entry(key)
            .or_insert_with(|| Box::new(Vec::<F::Entry<M>>::new()));

        let Some(list) = slot.downcast_mut::<Vec<F::Entry<M>>>() else {
            unreachable!("list under key `{key}` holds another entry type");
        };
        list.push(entry);
    }

    /// Point-in-time copy of the list for `M` (empty if absent).
    pub fn snapshot<M: Message>(&self) -> Vec<F::Entry<M>> {
        self.list::<M>().map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Removes every entry matching `pred` from the list for `M`.
    ///
    /// Drops the key when the list ends up empty. Returns the number of removed
    /// entries.
    pub fn remove_where<M, P>(&mut self, mut pred: P) -> usize
    where
        M: Message,
        P: FnMut(&F::Entry<M>) -> bool,
    {
        let key = MessageKey::of::<M>();
        let Some(list) = self
            .lists
            .get_mut(&key)
            .and_then(|slot| slot.downcast_mut::<Vec<F::Entry<M>>>())
        else {
            return 0;
        };

        let before = list.len();
        list.retain(|entry| !pred(entry));
        let removed = before - list.len();

        if list.is_empty() {
            self.lists.remove(&key);
        }
        removed
    }

    /// Removes every entry pointing at `target`, plus every dead entry.
    pub fn remove_target<M: Message>(&mut self, target: *const ()) -> usize {
        self.remove_where::<M, _>(|entry| {
            !F::is_alive::<M>(entry) || std::ptr::addr_eq(F::target::<M>(entry), target)
        })
    }

    /// Removes every entry whose target has been reclaimed.
    pub fn remove_dead<M: Message>(&mut self) -> usize {
        self.remove_where::<M, _>(|entry| !F::is_alive::<M>(entry))
    }

    /// Number of entries for `M`, dead ones included.
    pub fn len<M: Message>(&self) -> usize {
        self.list::<M>().map_or(0, <[_]>::len)
    }

    /// True if a list exists for `M`.
    pub fn contains<M: Message>(&self) -> bool {
        self.lists.contains_key(&MessageKey::of::<M>())
    }

    /// Keys with at least one entry.
    pub fn keys(&self) -> impl Iterator<Item = &MessageKey> {
        self.lists.keys()
    }

    /// True if no message type has subscribers.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Drops every list.
    pub fn clear(&mut self) {
        self.lists.clear();
    }

    fn list<M: Message>(&self) -> Option<&[F::Entry<M>]> {
        self.lists
            .get(&MessageKey::of::<M>())
            .and_then(|slot| slot.downcast_ref::<Vec<F::Entry<M>>>())
            .map(Vec::as_slice)
    }
}

impl<F: Family> Default for Registry<F> {
    fn default() -> Self {
        Self::new()
    }
}
