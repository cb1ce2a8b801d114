use archivebot_core::{ArchiveMode, ContentId, StoreError};
use tokio::sync::mpsc;

use crate::{FeedPair, StoreEvent};

/// The archiver the bot drives. Implementations own replication and storage;
/// `add`/`remove` must be idempotent.
#[async_trait::async_trait]
pub trait ArchiveStore: Send + Sync {
    async fn add(&self, key: &ContentId, mode: ArchiveMode) -> Result<(), StoreError>;

    async fn remove(&self, key: &ContentId) -> Result<(), StoreError>;

    /// Resolves a meta feed with its content feed, or a content feed on its own.
    async fn get(&self, key: &ContentId) -> Result<FeedPair, StoreError>;

    async fn list(&self) -> Result<Vec<ContentId>, StoreError>;
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: StoreEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<StoreEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::UnboundedSender<StoreEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: StoreEvent) {
        let _ = self.tx.send(event);
    }
}
