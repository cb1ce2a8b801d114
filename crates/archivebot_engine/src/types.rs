use archivebot_core::{BlockPresence, ContentId, ContentStatus, Progress};

/// Point-in-time view of one feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub key: ContentId,
    /// Declared length in blocks, 0 while unknown.
    pub length: u64,
    /// Bytes of the blocks present locally.
    pub byte_length: u64,
    /// Presence bitfield over `[0, length)`.
    pub present: Vec<bool>,
    pub archived: bool,
}

impl BlockPresence for FeedSnapshot {
    fn length(&self) -> u64 {
        self.length
    }

    fn has(&self, index: u64) -> bool {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.present.get(index).copied())
            .unwrap_or(false)
    }
}

/// A feed and, once discovered, the content feed it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPair {
    pub meta: FeedSnapshot,
    pub content: Option<FeedSnapshot>,
}

impl FeedPair {
    pub fn progress(&self) -> Progress {
        Progress::of_feeds(
            &self.meta,
            self.content
                .as_ref()
                .map(|content| content as &dyn BlockPresence),
        )
    }

    pub fn content_status(&self) -> Option<ContentStatus> {
        self.content.as_ref().map(|content| ContentStatus {
            key: content.key.clone(),
            byte_length: content.byte_length,
            archived: content.archived,
        })
    }
}

/// Events the archive store emits for the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Added(ContentId),
    Removed(ContentId),
    /// Fired once per feed when every block of its declared length is present.
    Archived(ContentId),
}
