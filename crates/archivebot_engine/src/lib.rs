//! Archive bot engine: store collaborator, event plumbing and the coordinator task.
mod coordinator;
mod local;
mod notify;
mod persist;
mod store;
mod swarm;
mod types;

pub use coordinator::{spawn_coordinator, CoordinatorHandle, Services};
pub use local::{LocalArchive, REGISTRY_FILENAME};
pub use notify::{Dispatcher, Messenger};
pub use persist::{ensure_archive_dir, AtomicFileWriter, PersistError};
pub use store::{ArchiveStore, ChannelEventSink, EventSink};
pub use swarm::{discovery_key, LoggingSwarm, Swarm};
pub use types::{FeedPair, FeedSnapshot, StoreEvent};
