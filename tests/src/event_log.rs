use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{field::Field, Event, Level, Subscriber};
use tracing_subscriber::{field::Visit, layer::Context, Layer};

/// Records every event emitted while it is installed.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<LoggedEvent>>>,
}

#[derive(Debug, Clone)]
pub struct LoggedEvent {
    pub level: Level,
    pub message: String,
}

impl EventLog {
    pub fn new() -> EventLog {
        EventLog::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Events at `level` or more severe.
    pub fn at_least(&self, level: Level) -> Vec<LoggedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.level <= level)
            .cloned()
            .collect()
    }

    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.events
            .lock()
            .iter()
            .any(|event| event.level == level && event.message.contains(message))
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl<S: Subscriber> Layer<S> for EventLog {
    fn on_event(&self, event: &Event<'_>, _cx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.events.lock().push(LoggedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}
