//! Structured lifecycle events and the sinks that receive them
//!
//! The connection lifecycle reports what it does through an [`EventSink`]
//! instead of writing to a particular logger. [`TracingSink`] forwards
//! events to `tracing`; [`MemorySink`] keeps them for inspection.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Severity of a lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventLevel::Info => f.write_str("INFO"),
            EventLevel::Warning => f.write_str("WARNING"),
            EventLevel::Error => f.write_str("ERROR"),
        }
    }
}

/// A structured event: level, human-readable message and key/value context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub level: EventLevel,
    pub message: String,
    pub context: Vec<(&'static str, String)>,
}

impl LifecycleEvent {
    pub fn new(level: EventLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Error, message)
    }

    /// Attach a context entry
    pub fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Look up a context value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)?;
        for (key, value) in &self.context {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

/// Receiver of lifecycle events. Emission is fire-and-forget.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LifecycleEvent);
}

/// Shared handle to an event sink
pub type SharedEventSink = Arc<dyn EventSink>;

/// Forwards events to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &LifecycleEvent) {
        let context = ContextDisplay(&event.context);
        match event.level {
            EventLevel::Info => tracing::info!(context = %context, "{}", event.message),
            EventLevel::Warning => tracing::warn!(context = %context, "{}", event.message),
            EventLevel::Error => tracing::error!(context = %context, "{}", event.message),
        }
    }
}

struct ContextDisplay<'a>(&'a [(&'static str, String)]);

impl fmt::Display for ContextDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Keeps every emitted event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events received so far
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().clone()
    }

    /// Events of the given level, in emission order
    pub fn events_at(&self, level: EventLevel) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &LifecycleEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder_and_lookup() {
        let event = LifecycleEvent::warning("Connection attempt 1 failed")
            .with("attempt", 1)
            .with("delay_ms", 1000);

        assert_eq!(event.level, EventLevel::Warning);
        assert_eq!(event.get("attempt"), Some("1"));
        assert_eq!(event.get("delay_ms"), Some("1000"));
        assert_eq!(event.get("missing"), None);
        assert_eq!(
            event.to_string(),
            "WARNING: Connection attempt 1 failed attempt=1 delay_ms=1000"
        );
    }

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.emit(&LifecycleEvent::info("a"));
        sink.emit(&LifecycleEvent::error("b"));
        sink.emit(&LifecycleEvent::info("c"));

        let messages: Vec<_> = sink.events().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
        assert_eq!(sink.events_at(EventLevel::Error).len(), 1);

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_tracing_sink_does_not_panic_without_subscriber() {
        TracingSink.emit(&LifecycleEvent::info("connected").with("host", "localhost"));
    }
}
