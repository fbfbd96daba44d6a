//! Fire-and-forget user notifications.

use std::cell::RefCell;
use std::fmt;

use tracing::{error, info};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Level::Success => write!(f, "ok: {}", self.message),
            Level::Error => write!(f, "error: {}", self.message),
        }
    }
}

/// Toast surface. Implementations must not fail.
pub trait NotificationSink {
    fn notify(&self, notification: Notification);

    fn success(&self, message: &str) {
        self.notify(Notification {
            level: Level::Success,
            message: message.to_string(),
        });
    }

    fn error(&self, message: &str) {
        self.notify(Notification {
            level: Level::Error,
            message: message.to_string(),
        });
    }
}

/// Sends notifications to the log.
#[derive(Debug, Default, Copy, Clone)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, n: Notification) {
        match n.level {
            Level::Success => info!("{}", n.message),
            Level::Error => error!("{}", n.message),
        }
    }
}

/// Keeps every notification for later display or inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    seen: RefCell<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.seen.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.seen
            .borrow()
            .iter()
            .filter(|n| n.level == Level::Error)
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn take(&self) -> Vec<Notification> {
        self.seen.take()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.seen.borrow_mut().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::{Level, NotificationSink, RecordingSink};

    #[test]
    fn recording_sink_separates_errors() {
        let sink = RecordingSink::new();
        sink.success("loaded");
        sink.error("conduits failed");
        assert_eq!(sink.errors(), vec!["conduits failed".to_string()]);
        assert_eq!(sink.all()[0].level, Level::Success);
        assert_eq!(sink.take().len(), 2);
        assert!(sink.all().is_empty());
    }
}
