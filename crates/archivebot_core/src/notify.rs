use std::fmt;
use std::time::Duration;

use crate::{pretty_bytes, pretty_duration, ContentId, Progress, StoreError};

/// Where a reply goes: the requester's nick for private messages, the shared
/// channel otherwise. Resolved once when the command arrives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel(String);

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text delivered for a notification; an error always wins over the message.
pub fn render(error: Option<&StoreError>, message: &str) -> String {
    match error {
        Some(err) => error_text(err),
        None => message.to_string(),
    }
}

pub fn error_text(err: &StoreError) -> String {
    format!("Error: {err}")
}

pub fn fully_archived_text(key: &ContentId, byte_length: u64) -> String {
    format!("{key} has been fully archived ({})", pretty_bytes(byte_length))
}

pub fn status_text(key: &ContentId, progress: Progress) -> String {
    format!(
        "Status {key}: need {}, have {}, %{}",
        progress.need,
        progress.have,
        progress.percent()
    )
}

pub fn uptime_text(uptime: Duration, count: usize) -> String {
    format!(
        "Uptime: {}. Archiving {count} hypercores",
        pretty_duration(uptime)
    )
}
