use crate::{Channel, ContentId};

/// Identifies one accepted add/track command across its whole lifetime.
pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveMode {
    /// Meta feed and its content feed (`add`).
    Full,
    /// Meta feed only (`track`).
    MetaOnly,
}

/// One in-flight archive request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingEntry {
    /// Waiting for the requested feed itself to be archived.
    AwaitingMeta {
        request: RequestId,
        key: ContentId,
        channel: Channel,
        mode: ArchiveMode,
    },
    /// Meta feed is done; waiting for the content feed it points at.
    AwaitingContent {
        request: RequestId,
        key: ContentId,
        meta_key: ContentId,
        channel: Channel,
    },
}

impl PendingEntry {
    pub fn request(&self) -> RequestId {
        match self {
            PendingEntry::AwaitingMeta { request, .. }
            | PendingEntry::AwaitingContent { request, .. } => *request,
        }
    }

    /// The feed whose completion is awaited.
    pub fn key(&self) -> &ContentId {
        match self {
            PendingEntry::AwaitingMeta { key, .. } | PendingEntry::AwaitingContent { key, .. } => {
                key
            }
        }
    }

    pub fn meta_key(&self) -> Option<&ContentId> {
        match self {
            PendingEntry::AwaitingMeta { .. } => None,
            PendingEntry::AwaitingContent { meta_key, .. } => Some(meta_key),
        }
    }

    pub fn channel(&self) -> &Channel {
        match self {
            PendingEntry::AwaitingMeta { channel, .. }
            | PendingEntry::AwaitingContent { channel, .. } => channel,
        }
    }

    fn references(&self, key: &ContentId) -> bool {
        self.key() == key || self.meta_key() == Some(key)
    }
}

/// In-flight requests. Duplicate keys are allowed: two `add`s for the same feed
/// each get their own entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PendingSet {
    entries: Vec<PendingEntry>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingEntry> {
        self.entries.iter()
    }

    pub fn insert(&mut self, entry: PendingEntry) {
        self.entries.push(entry);
    }

    pub fn contains_request(&self, request: RequestId) -> bool {
        self.entries.iter().any(|entry| entry.request() == request)
    }

    pub fn remove_request(&mut self, request: RequestId) -> Option<PendingEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.request() == request)?;
        Some(self.entries.remove(index))
    }

    /// Drops every entry awaiting `key` or whose meta feed is `key`.
    pub fn remove_referencing(&mut self, key: &ContentId) -> Vec<PendingEntry> {
        self.drain_where(|entry| entry.references(key))
    }

    pub fn take_awaiting_meta(&mut self, key: &ContentId) -> Vec<PendingEntry> {
        self.drain_where(|entry| {
            matches!(entry, PendingEntry::AwaitingMeta { key: awaited, .. } if awaited == key)
        })
    }

    pub fn take_awaiting_content(&mut self, key: &ContentId) -> Vec<PendingEntry> {
        self.drain_where(|entry| {
            matches!(entry, PendingEntry::AwaitingContent { key: awaited, .. } if awaited == key)
        })
    }

    fn drain_where(&mut self, pred: impl Fn(&PendingEntry) -> bool) -> Vec<PendingEntry> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| pred(entry));
        self.entries = kept;
        taken
    }
}
