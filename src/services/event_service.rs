use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Whether a hook fires before or after the core effect of a mutating action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Before,
    After,
}

#[derive(Debug)]
pub struct HrmEvent<'a> {
    pub action: &'a str,
    pub phase: Phase,
    pub payload: &'a JsonValue,
}

/// External collaborators implement this to observe mutations. Listener
/// failures are the listener's problem; emission never affects the response.
pub trait EventListener: Send + Sync {
    fn handle(&self, event: &HrmEvent);
}

/// Explicit observer registry. Listeners are registered once at startup, the
/// hub is then shared read-only through `AppState`.
#[derive(Default)]
pub struct EventHub {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, action: &str, phase: Phase, payload: &JsonValue) {
        let event = HrmEvent {
            action,
            phase,
            payload,
        };
        for listener in &self.listeners {
            listener.handle(&event);
        }
    }
}

/// Default listener: mirrors every mutation into the log stream.
pub struct TracingListener;

impl EventListener for TracingListener {
    fn handle(&self, event: &HrmEvent) {
        tracing::debug!(action = event.action, phase = ?event.phase, "hrm event");
    }
}
