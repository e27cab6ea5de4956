use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, ProxyOrderChangedEvent, SyncCompletedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub proxy_order_changed_producer: Vec<EventProducer<ProxyOrderChangedEvent>>,
    pub sync_completed_producer: Vec<EventProducer<SyncCompletedEvent>>,
}

impl EventProducers {
    pub fn is_empty(&self) -> bool {
        self.proxy_order_changed_producer.is_empty() && self.sync_completed_producer.is_empty()
    }
}

pub struct EventHandlers {
    pub on_proxy_order_changed: Option<EventHandler<ProxyOrderChangedEvent>>,
    pub on_sync_completed: Option<EventHandler<SyncCompletedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_proxy_order_changed = hooks.on_proxy_order_changed.map(|f| EventHandler::new(buffer_size, f));
        let on_sync_completed = hooks.on_sync_completed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_proxy_order_changed, on_sync_completed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_proxy_order_changed {
            result.proxy_order_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_sync_completed {
            result.sync_completed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_proxy_order_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_sync_completed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_proxy_order_changed: Option<Handler<ProxyOrderChangedEvent>>,
    pub on_sync_completed: Option<Handler<SyncCompletedEvent>>,
}

impl EventHooks {
    pub fn on_proxy_order_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ProxyOrderChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_proxy_order_changed = Some(Arc::new(f));
        self
    }

    pub fn on_sync_completed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(SyncCompletedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_sync_completed = Some(Arc::new(f));
        self
    }
}
