//! # Example: Dispatcher failure reports
//!
//! One sync and two async handlers listen for `OrderPlaced`. One async handler
//! rejects large orders, another panics on a bad SKU. The sender never sees
//! those failures; a separate task drains `Dispatcher::failures()` instead.

use std::sync::Arc;
use std::time::Duration;

use typebus::{
    AsyncHandlerFn, AsyncHandlerRef, Dispatcher, DispatcherConfig, HandlerError, HandlerFn,
    HandlerRef,
};

#[derive(Debug)]
struct OrderPlaced {
    sku: &'static str,
    amount: u32,
}

#[tokio::main]
async fn main() {
    let bus = Dispatcher::builder(DispatcherConfig::default().named("orders")).build();

    let mut failures = bus.failures();
    let reporter = tokio::spawn(async move {
        while let Ok(ev) = failures.recv().await {
            println!(
                "[report #{}] {} handler={} reason={}",
                ev.seq,
                ev.kind.as_label(),
                ev.handler.as_deref().unwrap_or("?"),
                ev.reason.as_deref().unwrap_or("")
            );
        }
    });

    let ledger: HandlerRef<OrderPlaced> = HandlerFn::arc("ledger", |ev: &OrderPlaced| {
        println!("[ledger] {} x{}", ev.sku, ev.amount);
        Ok(())
    });
    let limits: AsyncHandlerRef<OrderPlaced> =
        AsyncHandlerFn::arc("limits", |ev: Arc<OrderPlaced>| async move {
            if ev.amount > 100 {
                return Err(HandlerError::fail(format!("amount {} over limit", ev.amount)));
            }
            Ok(())
        });
    let catalog: AsyncHandlerRef<OrderPlaced> =
        AsyncHandlerFn::arc("catalog", |ev: Arc<OrderPlaced>| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert!(!ev.sku.is_empty(), "empty sku");
            println!("[catalog] reserved {}", ev.sku);
            Ok::<_, HandlerError>(())
        });

    bus.register(ledger);
    bus.register_async(limits);
    bus.register_async(catalog.clone());

    bus.send_async(OrderPlaced { sku: "A-1", amount: 3 }).await;
    bus.send_async(OrderPlaced { sku: "B-7", amount: 500 }).await;
    bus.send_async(OrderPlaced { sku: "", amount: 1 }).await;

    bus.unregister_async(&catalog);
    println!(
        "sync={} async={}",
        bus.handler_count::<OrderPlaced>(),
        bus.async_handler_count::<OrderPlaced>()
    );

    // Dropping the last dispatcher clone closes the report channel.
    drop(bus);
    let _ = reporter.await;
}
