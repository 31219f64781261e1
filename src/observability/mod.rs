//! Observability
//!
//! Structured JSON logging of lifecycle and domain events.
//!
//! ```ignore
//! use feedloader::observability::{log_event, Event};
//!
//! log_event(Event::FeedCreated, &[("feed", "sales")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log an event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_does_not_panic() {
        log_event(Event::BootStart, &[]);
        log_event(Event::UploadRejected, &[("feed", "f"), ("reason", "not a member")]);
    }
}
