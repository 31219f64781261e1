//! Observable events
//!
//! Every log line names one of these.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    BootStart,
    ConfigLoaded,
    CatalogLoaded,
    CatalogSaveFailed,
    Serving,
    ShutdownComplete,

    // Accounts
    UserCreated,
    LoginSucceeded,
    LoginFailed,

    // Feeds and columns
    FeedCreated,
    FeedDeleted,
    FeedUserAdded,
    FeedUserRemoved,
    ColumnCreated,
    ColumnDeleted,

    // Files
    FileUploaded,
    FileDeleted,
    UploadRejected,

    // Requests
    RequestFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CatalogLoaded => "CATALOG_LOADED",
            Event::CatalogSaveFailed => "CATALOG_SAVE_FAILED",
            Event::Serving => "SERVING",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::UserCreated => "USER_CREATED",
            Event::LoginSucceeded => "LOGIN_SUCCEEDED",
            Event::LoginFailed => "LOGIN_FAILED",
            Event::FeedCreated => "FEED_CREATED",
            Event::FeedDeleted => "FEED_DELETED",
            Event::FeedUserAdded => "FEED_USER_ADDED",
            Event::FeedUserRemoved => "FEED_USER_REMOVED",
            Event::ColumnCreated => "COLUMN_CREATED",
            Event::ColumnDeleted => "COLUMN_DELETED",
            Event::FileUploaded => "FILE_UPLOADED",
            Event::FileDeleted => "FILE_DELETED",
            Event::UploadRejected => "UPLOAD_REJECTED",
            Event::RequestFailed => "REQUEST_FAILED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Event::CatalogSaveFailed => Severity::Error,
            Event::LoginFailed | Event::UploadRejected | Event::RequestFailed => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::FileUploaded.as_str(), "FILE_UPLOADED");
        assert_eq!(Event::FeedUserAdded.to_string(), "FEED_USER_ADDED");
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(Event::FeedCreated.severity(), Severity::Info);
        assert_eq!(Event::UploadRejected.severity(), Severity::Warn);
        assert_eq!(Event::CatalogSaveFailed.severity(), Severity::Error);
    }
}
