use std::time::Duration;

use crate::{ArchiveMode, Channel, ContentId, Progress, RequestId, StoreError};

/// Content feed as known when its meta feed finished archiving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentStatus {
    pub key: ContentId,
    pub byte_length: u64,
    /// Already fully archived; no further event will arrive for it.
    pub archived: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Chat line from `from` sent to `to` (the bot's nick or a channel).
    MessageReceived {
        from: String,
        to: String,
        text: String,
    },
    /// Store returned from `add`.
    AddFinished {
        request: RequestId,
        key: ContentId,
        mode: ArchiveMode,
        channel: Channel,
        result: Result<(), StoreError>,
    },
    /// Store returned from `remove`.
    RemoveFinished {
        key: ContentId,
        channel: Channel,
        result: Result<(), StoreError>,
    },
    /// Store listed its feeds for a status query.
    StatusAllFinished {
        channel: Channel,
        uptime: Duration,
        result: Result<usize, StoreError>,
    },
    /// Store resolved a single feed for a status query.
    StatusOneFinished {
        key: ContentId,
        channel: Channel,
        result: Result<Progress, StoreError>,
    },
    /// Store started tracking a feed.
    FeedAdded(ContentId),
    /// Store dropped a feed.
    FeedRemoved(ContentId),
    /// Every block of `key` is present locally.
    FeedArchived {
        key: ContentId,
        byte_length: u64,
        content: Option<ContentStatus>,
    },
    NoOp,
}
