use std::{future::Future, pin::Pin};

use log::*;
use proxy_order_engine::events::{EventHandlers, EventHooks, ProxyOrderChangedEvent, SyncCompletedEvent};

fn no_op() -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async {})
}

/// Event handlers that write every proxy order change and sync summary to the log.
///
/// 1. ProxyOrderChangedEvent - logged at debug level, one line per proxy order.
/// 2. SyncCompletedEvent - logged at info level, or as a warning if any subscription failed.
pub fn create_logging_event_handlers(buffer_size: usize) -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks
        .on_proxy_order_changed(|ev: ProxyOrderChangedEvent| {
            let po = ev.proxy_order;
            debug!("📬️ {:?}: {} for {} in {}", ev.change, po.id, po.subscription_id, po.order_cycle_id);
            no_op()
        })
        .on_sync_completed(|ev: SyncCompletedEvent| {
            let summary = ev.summary;
            if summary.failed > 0 {
                warn!("📬️ Sync finished with failures. {summary}");
            } else {
                info!("📬️ Sync finished. {summary}");
            }
            no_op()
        });
    EventHandlers::new(buffer_size, hooks)
}
