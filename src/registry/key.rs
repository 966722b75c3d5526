use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of a message type, used as the registry map key.
///
/// Equality and hashing use the [`TypeId`] only; the type name is carried for
/// diagnostics.
#[derive(Clone, Copy, Debug)]
pub struct MessageKey {
    id: TypeId,
    name: &'static str,
}

impl MessageKey {
    /// Key for message type `M`.
    #[inline]
    pub fn of<M: 'static>() -> Self {
        Self {
            id: TypeId::of::<M>(),
            name: std::any::type_name::<M>(),
        }
    }

    /// Fully qualified type name of the message.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for MessageKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MessageKey {}

impl Hash for MessageKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_by_type() {
        assert_eq!(MessageKey::of::<String>(), MessageKey::of::<String>());
        assert_ne!(MessageKey::of::<String>(), MessageKey::of::<&'static str>());
        assert_ne!(MessageKey::of::<u32>(), MessageKey::of::<i32>());
    }

    #[test]
    fn test_name_is_type_name() {
        assert_eq!(MessageKey::of::<u64>().name(), "u64");
        assert_eq!(MessageKey::of::<u64>().to_string(), "u64");
    }
}
