use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use archivebot_core::{ArchiveMode, ContentId, StoreError};
use engine_logging::{engine_debug, engine_info};
use serde::{Deserialize, Serialize};

use crate::persist::{ensure_archive_dir, AtomicFileWriter, PersistError};
use crate::{ArchiveStore, EventSink, FeedPair, FeedSnapshot, StoreEvent};

pub const REGISTRY_FILENAME: &str = "feeds.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedFeed {
    key: String,
    content: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedRegistry {
    feeds: Vec<PersistedFeed>,
}

/// Block state of a single feed. `blocks[i]` holds the size of block `i` once present.
#[derive(Debug, Clone, Default)]
struct FeedRecord {
    length: Option<u64>,
    blocks: Vec<Option<u64>>,
    archived: bool,
}

impl FeedRecord {
    fn snapshot(&self, key: &ContentId) -> FeedSnapshot {
        FeedSnapshot {
            key: key.clone(),
            length: self.length.unwrap_or(0),
            byte_length: self.blocks.iter().flatten().sum(),
            present: self.blocks.iter().map(Option::is_some).collect(),
            archived: self.archived,
        }
    }

    fn declare_length(&mut self, length: u64) -> Result<(), StoreError> {
        match self.length {
            Some(known) if known != length => Err(StoreError::failed(format!(
                "length already declared as {known}"
            ))),
            Some(_) => Ok(()),
            None => {
                let len = usize::try_from(length)
                    .map_err(|_| StoreError::failed("feed length too large"))?;
                self.length = Some(length);
                self.blocks = vec![None; len];
                Ok(())
            }
        }
    }

    fn put_block(&mut self, index: u64, size: u64) -> Result<(), StoreError> {
        let length = self
            .length
            .ok_or_else(|| StoreError::failed("feed length not declared"))?;
        let slot = usize::try_from(index)
            .ok()
            .and_then(|index| self.blocks.get_mut(index))
            .ok_or_else(|| {
                StoreError::failed(format!("block {index} out of range for length {length}"))
            })?;
        *slot = Some(size);
        Ok(())
    }

    /// Flips to archived the first time every declared block is present.
    fn mark_if_complete(&mut self) -> bool {
        let complete = self.length.is_some() && self.blocks.iter().all(Option::is_some);
        if complete && !self.archived {
            self.archived = true;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone)]
struct TrackedFeed {
    mode: ArchiveMode,
    meta: FeedRecord,
    content: Option<(ContentId, FeedRecord)>,
}

impl TrackedFeed {
    fn new(mode: ArchiveMode) -> Self {
        Self {
            mode,
            meta: FeedRecord::default(),
            content: None,
        }
    }
}

type Feeds = BTreeMap<ContentId, TrackedFeed>;

/// Directory-backed archive store. Tracked keys survive restarts through
/// `feeds.ron`; block state is held in memory and fed by the replication
/// transport through [`LocalArchive::declare_length`], [`LocalArchive::link_content`]
/// and [`LocalArchive::put_block`].
pub struct LocalArchive {
    dir: PathBuf,
    writer: AtomicFileWriter,
    feeds: Mutex<Feeds>,
    sink: Arc<dyn EventSink>,
}

impl LocalArchive {
    /// Opens (or creates) the archive at `dir`. Failure here means the store is
    /// unusable and the caller should stop.
    pub fn open(dir: impl Into<PathBuf>, sink: Arc<dyn EventSink>) -> Result<Self, PersistError> {
        let dir = dir.into();
        ensure_archive_dir(&dir)?;
        let feeds = load_registry(&dir)?;
        engine_info!(
            "Opened archive {:?} with {} tracked feeds",
            dir,
            feeds.len()
        );
        Ok(Self {
            writer: AtomicFileWriter::new(dir.clone()),
            dir,
            feeds: Mutex::new(feeds),
            sink,
        })
    }

    pub fn registry_path(&self) -> PathBuf {
        self.dir.join(REGISTRY_FILENAME)
    }

    /// Records the length of a meta or content feed as learned from a peer.
    pub fn declare_length(&self, feed: &ContentId, length: u64) -> Result<(), StoreError> {
        self.mutate_feed(feed, |record| record.declare_length(length))
    }

    /// Records the content feed a meta feed points at.
    pub fn link_content(&self, meta: &ContentId, content: ContentId) -> Result<(), StoreError> {
        let mut feeds = self.lock()?;
        let tracked = feeds
            .get_mut(meta)
            .ok_or_else(|| StoreError::NotFound(meta.clone()))?;
        match &tracked.content {
            Some((linked, _)) if *linked != content => Err(StoreError::failed(format!(
                "{meta} already references content {linked}"
            ))),
            Some(_) => Ok(()),
            None => {
                engine_debug!("Linked content {} to {}", content, meta);
                tracked.content = Some((content, FeedRecord::default()));
                Ok(())
            }
        }
    }

    /// Stores block `index` of a meta or content feed.
    pub fn put_block(&self, feed: &ContentId, index: u64, size: u64) -> Result<(), StoreError> {
        self.mutate_feed(feed, |record| record.put_block(index, size))
    }

    fn mutate_feed(
        &self,
        feed: &ContentId,
        change: impl FnOnce(&mut FeedRecord) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let archived_now = {
            let mut feeds = self.lock()?;
            let record = find_record_mut(&mut feeds, feed)
                .ok_or_else(|| StoreError::NotFound(feed.clone()))?;
            change(record)?;
            record.mark_if_complete()
        };
        if archived_now {
            self.sink.emit(StoreEvent::Archived(feed.clone()));
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Feeds>, StoreError> {
        self.feeds
            .lock()
            .map_err(|_| StoreError::failed("archive state poisoned"))
    }

    fn save(&self, feeds: &Feeds) -> Result<(), StoreError> {
        let registry = PersistedRegistry {
            feeds: feeds
                .iter()
                .map(|(key, tracked)| PersistedFeed {
                    key: key.to_string(),
                    content: tracked.mode == ArchiveMode::Full,
                })
                .collect(),
        };
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(&registry, pretty)
            .map_err(|err| PersistError::Registry(err.to_string()))?;
        self.writer.write(REGISTRY_FILENAME, &content)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ArchiveStore for LocalArchive {
    async fn add(&self, key: &ContentId, mode: ArchiveMode) -> Result<(), StoreError> {
        // `None` for a newly tracked feed, otherwise whether it is already archived.
        let known = {
            let mut feeds = self.lock()?;
            match feeds.get_mut(key) {
                Some(tracked) => {
                    // `add` after `track` starts fetching content too.
                    let upgrade =
                        mode == ArchiveMode::Full && tracked.mode == ArchiveMode::MetaOnly;
                    if upgrade {
                        tracked.mode = ArchiveMode::Full;
                    }
                    let archived = tracked.meta.archived;
                    if upgrade {
                        self.save(&feeds)?;
                    }
                    Some(archived)
                }
                None => {
                    feeds.insert(key.clone(), TrackedFeed::new(mode));
                    if let Err(err) = self.save(&feeds) {
                        feeds.remove(key);
                        return Err(err);
                    }
                    None
                }
            }
        };
        match known {
            None => self.sink.emit(StoreEvent::Added(key.clone())),
            // Repeat the completion so a new request for a finished feed resolves.
            Some(true) => self.sink.emit(StoreEvent::Archived(key.clone())),
            Some(false) => {}
        }
        Ok(())
    }

    async fn remove(&self, key: &ContentId) -> Result<(), StoreError> {
        {
            let mut feeds = self.lock()?;
            let Some(tracked) = feeds.remove(key) else {
                return Ok(());
            };
            if let Err(err) = self.save(&feeds) {
                feeds.insert(key.clone(), tracked);
                return Err(err);
            }
        }
        self.sink.emit(StoreEvent::Removed(key.clone()));
        Ok(())
    }

    async fn get(&self, key: &ContentId) -> Result<FeedPair, StoreError> {
        let feeds = self.lock()?;
        if let Some(tracked) = feeds.get(key) {
            return Ok(FeedPair {
                meta: tracked.meta.snapshot(key),
                content: tracked
                    .content
                    .as_ref()
                    .map(|(content_key, record)| record.snapshot(content_key)),
            });
        }
        feeds
            .values()
            .filter_map(|tracked| tracked.content.as_ref())
            .find(|(content_key, _)| content_key == key)
            .map(|(content_key, record)| FeedPair {
                meta: record.snapshot(content_key),
                content: None,
            })
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn list(&self) -> Result<Vec<ContentId>, StoreError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

fn find_record_mut<'a>(feeds: &'a mut Feeds, key: &ContentId) -> Option<&'a mut FeedRecord> {
    if feeds.contains_key(key) {
        return feeds.get_mut(key).map(|tracked| &mut tracked.meta);
    }
    feeds
        .values_mut()
        .filter_map(|tracked| tracked.content.as_mut())
        .find(|(content_key, _)| content_key == key)
        .map(|(_, record)| record)
}

fn load_registry(dir: &Path) -> Result<Feeds, PersistError> {
    let path = dir.join(REGISTRY_FILENAME);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Feeds::new()),
        Err(err) => return Err(PersistError::Io(err)),
    };

    let registry: PersistedRegistry =
        ron::from_str(&text).map_err(|err| PersistError::Registry(err.to_string()))?;

    registry
        .feeds
        .into_iter()
        .map(|feed| {
            let key = ContentId::parse(&feed.key)
                .map_err(|err| PersistError::Registry(format!("{}: {err}", feed.key)))?;
            let mode = if feed.content {
                ArchiveMode::Full
            } else {
                ArchiveMode::MetaOnly
            };
            Ok((key, TrackedFeed::new(mode)))
        })
        .collect()
}
