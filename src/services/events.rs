//! In-process event dispatcher.
//!
//! Listeners subscribe to a dotted event name or to `*`. Dispatch runs them
//! in registration order; a failing listener is logged and skipped.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::metrics::PerformanceMonitor;
use crate::domain::{DomainEvent, EventEnvelope};
use crate::errors::AppResult;

/// Subscribe to every event
pub const ALL_EVENTS: &str = "*";

#[async_trait]
pub trait EventListener: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, event: &EventEnvelope) -> AppResult<()>;
}

#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<Vec<(String, Arc<dyn EventListener>)>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, event_name: &str, listener: Arc<dyn EventListener>) {
        tracing::debug!(event = event_name, listener = listener.name(), "Listener registered");
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push((event_name.to_string(), listener));
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }

    /// Deliver an event; returns the envelope that was dispatched
    pub async fn dispatch(&self, event: DomainEvent) -> EventEnvelope {
        let envelope = EventEnvelope::new(event);
        let name = envelope.event.name();

        let targets: Vec<Arc<dyn EventListener>> = match self.listeners.read() {
            Ok(listeners) => listeners
                .iter()
                .filter(|(subscribed, _)| subscribed == ALL_EVENTS || subscribed == name)
                .map(|(_, listener)| listener.clone())
                .collect(),
            Err(_) => Vec::new(),
        };

        for listener in targets {
            if let Err(e) = listener.handle(&envelope).await {
                tracing::error!(
                    event = name,
                    listener = listener.name(),
                    error = %e,
                    "Event listener failed"
                );
            }
        }

        envelope
    }
}

/// Writes every event to the `audit` tracing target
pub struct AuditLogListener;

#[async_trait]
impl EventListener for AuditLogListener {
    fn name(&self) -> &str {
        "audit_log"
    }

    async fn handle(&self, event: &EventEnvelope) -> AppResult<()> {
        let payload = serde_json::to_string(event).unwrap_or_default();
        tracing::info!(target: "audit", event = event.event.name(), id = %event.id, "{}", payload);
        Ok(())
    }
}

/// Counts security events in the performance monitor
pub struct SecurityMetricsListener {
    monitor: Arc<PerformanceMonitor>,
}

impl SecurityMetricsListener {
    pub fn new(monitor: Arc<PerformanceMonitor>) -> Self {
        Self { monitor }
    }
}

#[async_trait]
impl EventListener for SecurityMetricsListener {
    fn name(&self) -> &str {
        "security_metrics"
    }

    async fn handle(&self, event: &EventEnvelope) -> AppResult<()> {
        if event.event.is_security_event() {
            self.monitor.increment(event.event.name());
        }
        Ok(())
    }
}
