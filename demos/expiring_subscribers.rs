//! # Example: Aggregator with expiring subscribers
//!
//! Views subscribe while they exist. Once a view drops its handler, the
//! aggregator stops calling it and prunes the entry on the next publish.

use std::sync::Arc;

use typebus::{Aggregator, AsyncHandlerFn, AsyncHandlerRef, HandlerError};

struct ThemeChanged {
    dark: bool,
}

struct View {
    on_theme: AsyncHandlerRef<ThemeChanged>,
}

impl View {
    fn new(name: &'static str, bus: &Aggregator) -> Self {
        let on_theme: AsyncHandlerRef<ThemeChanged> =
            AsyncHandlerFn::arc(name, move |ev: Arc<ThemeChanged>| async move {
                println!("[{name}] dark={}", ev.dark);
                Ok::<_, HandlerError>(())
            });
        bus.subscribe(&on_theme);
        Self { on_theme }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), HandlerError> {
    let bus = Aggregator::new();

    let sidebar = View::new("sidebar", &bus);
    let editor = View::new("editor", &bus);
    bus.publish(ThemeChanged { dark: true }).await?;

    drop(editor);
    println!("entries before publish: {}", bus.entry_count::<ThemeChanged>());
    bus.publish(ThemeChanged { dark: false }).await?;
    println!("entries after publish: {}", bus.entry_count::<ThemeChanged>());

    bus.unsubscribe(&sidebar.on_theme);
    println!("subscribed types: {:?}", bus.message_types());
    Ok(())
}
