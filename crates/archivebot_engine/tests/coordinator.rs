use std::sync::{Arc, Once};
use std::time::Duration;

use archivebot_core::{ArchiveMode, BotIdentity, BotState, ContentId, StoreError};
use archivebot_engine::{
    spawn_coordinator, ArchiveStore, ChannelEventSink, CoordinatorHandle, Dispatcher, FeedPair,
    LocalArchive, Messenger, Services, StoreEvent, Swarm,
};
use tempfile::TempDir;
use tokio::sync::{mpsc, Notify};
use tokio::time::timeout;

const CHANNEL: &str = "#dat";

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn key(fill: char) -> ContentId {
    ContentId::parse(&fill.to_string().repeat(64)).unwrap()
}

struct ChannelMessenger {
    tx: mpsc::UnboundedSender<(String, String)>,
}

impl Messenger for ChannelMessenger {
    fn say(&self, destination: &str, text: &str) {
        let _ = self.tx.send((destination.to_string(), text.to_string()));
    }
}

struct ChannelSwarm {
    tx: mpsc::UnboundedSender<String>,
}

impl Swarm for ChannelSwarm {
    fn join(&self, key: &ContentId) {
        let _ = self.tx.send(format!("join {key}"));
    }

    fn leave(&self, key: &ContentId) {
        let _ = self.tx.send(format!("leave {key}"));
    }
}

/// Holds `add` until released, then delegates.
struct GatedStore {
    inner: Arc<LocalArchive>,
    gate: Arc<Notify>,
}

#[async_trait::async_trait]
impl ArchiveStore for GatedStore {
    async fn add(&self, key: &ContentId, mode: ArchiveMode) -> Result<(), StoreError> {
        self.gate.notified().await;
        self.inner.add(key, mode).await
    }

    async fn remove(&self, key: &ContentId) -> Result<(), StoreError> {
        self.inner.remove(key).await
    }

    async fn get(&self, key: &ContentId) -> Result<FeedPair, StoreError> {
        self.inner.get(key).await
    }

    async fn list(&self) -> Result<Vec<ContentId>, StoreError> {
        self.inner.list().await
    }
}

/// Reports every `get` on `lookups`. Can hold the reply for one key until
/// released, and can leave the inner store untouched on `remove`.
struct ScriptedStore {
    inner: Arc<LocalArchive>,
    lookups: mpsc::UnboundedSender<ContentId>,
    hold: Option<(ContentId, Arc<Notify>)>,
    keep_on_remove: bool,
}

#[async_trait::async_trait]
impl ArchiveStore for ScriptedStore {
    async fn add(&self, key: &ContentId, mode: ArchiveMode) -> Result<(), StoreError> {
        self.inner.add(key, mode).await
    }

    async fn remove(&self, key: &ContentId) -> Result<(), StoreError> {
        if self.keep_on_remove {
            return Ok(());
        }
        self.inner.remove(key).await
    }

    async fn get(&self, key: &ContentId) -> Result<FeedPair, StoreError> {
        let pair = self.inner.get(key).await;
        let _ = self.lookups.send(key.clone());
        if let Some((held, release)) = &self.hold {
            if held == key {
                release.notified().await;
            }
        }
        pair
    }

    async fn list(&self) -> Result<Vec<ContentId>, StoreError> {
        self.inner.list().await
    }
}

async fn wait_for_lookup(lookups: &mut mpsc::UnboundedReceiver<ContentId>, key: &ContentId) {
    loop {
        let seen = timeout(Duration::from_secs(5), lookups.recv())
            .await
            .expect("lookup in time")
            .expect("store open");
        if seen == *key {
            return;
        }
    }
}

struct FailingStore;

#[async_trait::async_trait]
impl ArchiveStore for FailingStore {
    async fn add(&self, _key: &ContentId, _mode: ArchiveMode) -> Result<(), StoreError> {
        Err(StoreError::failed("store is read-only"))
    }

    async fn remove(&self, _key: &ContentId) -> Result<(), StoreError> {
        Err(StoreError::failed("store is read-only"))
    }

    async fn get(&self, key: &ContentId) -> Result<FeedPair, StoreError> {
        Err(StoreError::NotFound(key.clone()))
    }

    async fn list(&self) -> Result<Vec<ContentId>, StoreError> {
        Err(StoreError::failed("listing unavailable"))
    }
}

struct Harness {
    _dir: TempDir,
    archive: Arc<LocalArchive>,
    events: mpsc::UnboundedSender<StoreEvent>,
    handle: CoordinatorHandle,
    replies: mpsc::UnboundedReceiver<(String, String)>,
    swarm: mpsc::UnboundedReceiver<String>,
}

impl Harness {
    fn start() -> Self {
        Self::start_with(|archive| archive as Arc<dyn ArchiveStore>)
    }

    fn start_with(wrap: impl FnOnce(Arc<LocalArchive>) -> Arc<dyn ArchiveStore>) -> Self {
        init_logging();
        let dir = TempDir::new().unwrap();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let archive = Arc::new(
            LocalArchive::open(dir.path(), Arc::new(ChannelEventSink::new(event_tx.clone())))
                .expect("open archive"),
        );
        let (reply_tx, replies) = mpsc::unbounded_channel();
        let (swarm_tx, swarm) = mpsc::unbounded_channel();
        let services = Services {
            store: wrap(archive.clone()),
            dispatcher: Dispatcher::new(Arc::new(ChannelMessenger { tx: reply_tx })),
            swarm: Arc::new(ChannelSwarm { tx: swarm_tx }),
        };
        let state = BotState::new(BotIdentity::new("archive-bot", CHANNEL));
        let (handle, _task) = spawn_coordinator(state, services, event_rx);
        Self {
            _dir: dir,
            archive,
            events: event_tx,
            handle,
            replies,
            swarm,
        }
    }

    fn say(&self, text: impl Into<String>) {
        self.handle.message_received("alice", CHANNEL, text);
    }

    async fn next_reply(&mut self) -> (String, String) {
        timeout(Duration::from_secs(5), self.replies.recv())
            .await
            .expect("reply in time")
            .expect("messenger open")
    }

    async fn next_text(&mut self) -> String {
        self.next_reply().await.1
    }

    async fn assert_quiet(&mut self) {
        let extra = timeout(Duration::from_millis(150), self.replies.recv()).await;
        assert!(extra.is_err(), "unexpected reply: {extra:?}");
    }
}

#[tokio::test]
async fn add_then_meta_then_content_reports_once() {
    let mut h = Harness::start();
    let meta = key('a');
    let content = key('c');

    h.say(format!("!add {meta}"));
    assert_eq!(h.next_reply().await, (CHANNEL.to_string(), format!("Adding {meta}")));

    h.archive.link_content(&meta, content.clone()).unwrap();
    h.archive.declare_length(&meta, 1).unwrap();
    h.archive.put_block(&meta, 0, 100).unwrap();
    h.archive.declare_length(&content, 2).unwrap();
    h.archive.put_block(&content, 0, 1000).unwrap();
    h.archive.put_block(&content, 1, 337).unwrap();

    assert_eq!(
        h.next_text().await,
        format!("{meta} has been fully archived (1.34 kB)")
    );
    h.assert_quiet().await;
}

#[tokio::test]
async fn private_request_gets_private_completion() {
    let mut h = Harness::start();
    let meta = key('b');

    h.handle
        .message_received("bob", "archive-bot", format!("archive-bot: add {meta}"));
    assert_eq!(h.next_reply().await, ("bob".to_string(), format!("Adding {meta}")));

    h.archive.declare_length(&meta, 1).unwrap();
    h.archive.put_block(&meta, 0, 42).unwrap();
    assert_eq!(
        h.next_reply().await,
        (
            "bob".to_string(),
            format!("{meta} has been fully archived (42 B)")
        )
    );
}

#[tokio::test]
async fn remove_while_add_in_flight_suppresses_ack() {
    let gate = Arc::new(Notify::new());
    let store_gate = gate.clone();
    let mut h = Harness::start_with(move |archive| {
        Arc::new(GatedStore {
            inner: archive,
            gate: store_gate,
        }) as Arc<dyn ArchiveStore>
    });
    let meta = key('a');

    h.say(format!("!add {meta}"));
    h.say(format!("!rm {meta}"));
    assert_eq!(h.next_text().await, format!("Removing {meta}"));

    gate.notify_one();
    h.assert_quiet().await;
}

#[tokio::test]
async fn store_failure_is_reported_and_rolled_back() {
    let mut h = Harness::start_with(|_| Arc::new(FailingStore) as Arc<dyn ArchiveStore>);
    let meta = key('a');

    h.say(format!("!add {meta}"));
    assert_eq!(h.next_text().await, "Error: store is read-only");

    // The rolled-back entry must not react to a late completion.
    let _ = h.events.send(StoreEvent::Archived(meta));
    h.assert_quiet().await;

    h.say("!status");
    assert_eq!(h.next_text().await, "Error: listing unavailable");
}

#[tokio::test]
async fn duplicate_archived_event_is_ignored() {
    let mut h = Harness::start();
    let meta = key('a');

    h.say(format!("!add {meta}"));
    assert_eq!(h.next_text().await, format!("Adding {meta}"));
    h.archive.declare_length(&meta, 0).unwrap();
    assert_eq!(
        h.next_text().await,
        format!("{meta} has been fully archived (0 B)")
    );

    let _ = h.events.send(StoreEvent::Archived(meta));
    h.assert_quiet().await;
}

#[tokio::test]
async fn removing_meta_cancels_content_tracking() {
    let (lookup_tx, mut lookups) = mpsc::unbounded_channel();
    let mut h = Harness::start_with(move |archive| {
        Arc::new(ScriptedStore {
            inner: archive,
            lookups: lookup_tx,
            hold: None,
            keep_on_remove: true,
        }) as Arc<dyn ArchiveStore>
    });
    let meta = key('a');
    let content = key('c');
    let unrelated = key('e');

    h.say(format!("!add {meta}"));
    assert_eq!(h.next_text().await, format!("Adding {meta}"));
    h.archive.link_content(&meta, content.clone()).unwrap();
    h.archive.declare_length(&meta, 0).unwrap();

    // Lookups are serial: once the next one starts, the meta completion is queued.
    let _ = h.events.send(StoreEvent::Archived(unrelated.clone()));
    wait_for_lookup(&mut lookups, &unrelated).await;

    h.say(format!("!rm {meta}"));
    assert_eq!(h.next_text().await, format!("Removing {meta}"));

    // The store still knows the content feed, so only the pending set can stop it.
    let _ = h.events.send(StoreEvent::Archived(content.clone()));
    wait_for_lookup(&mut lookups, &content).await;
    h.assert_quiet().await;
}

#[tokio::test]
async fn content_archived_during_slow_meta_lookup_still_completes() {
    let (lookup_tx, mut lookups) = mpsc::unbounded_channel();
    let release = Arc::new(Notify::new());
    let meta = key('a');
    let content = key('c');
    let hold = (meta.clone(), release.clone());
    let mut h = Harness::start_with(move |archive| {
        Arc::new(ScriptedStore {
            inner: archive,
            lookups: lookup_tx,
            hold: Some(hold),
            keep_on_remove: false,
        }) as Arc<dyn ArchiveStore>
    });

    h.say(format!("!add {meta}"));
    assert_eq!(h.next_text().await, format!("Adding {meta}"));
    h.archive.link_content(&meta, content.clone()).unwrap();
    h.archive.declare_length(&meta, 1).unwrap();
    h.archive.put_block(&meta, 0, 10).unwrap();

    // The meta snapshot sees unfinished content; content finishes before it is delivered.
    wait_for_lookup(&mut lookups, &meta).await;
    h.archive.declare_length(&content, 1).unwrap();
    h.archive.put_block(&content, 0, 2048).unwrap();
    release.notify_one();

    assert_eq!(
        h.next_text().await,
        format!("{meta} has been fully archived (2.05 kB)")
    );
    h.assert_quiet().await;
}

#[tokio::test]
async fn re_adding_an_archived_feed_completes_again() {
    let mut h = Harness::start();
    let meta = key('a');

    h.say(format!("!add {meta}"));
    assert_eq!(h.next_text().await, format!("Adding {meta}"));
    h.archive.declare_length(&meta, 1).unwrap();
    h.archive.put_block(&meta, 0, 9).unwrap();
    let done = format!("{meta} has been fully archived (9 B)");
    assert_eq!(h.next_text().await, done);

    // The ack may or may not precede the completion; the completion must come.
    h.say(format!("!add {meta}"));
    loop {
        let text = h.next_text().await;
        if text == done {
            break;
        }
        assert_eq!(text, format!("Adding {meta}"));
    }
    h.assert_quiet().await;
}

#[tokio::test]
async fn status_reports_progress_and_uptime() {
    let mut h = Harness::start();
    let meta = key('a');

    h.say(format!("!add {meta}"));
    assert_eq!(h.next_text().await, format!("Adding {meta}"));
    h.archive.declare_length(&meta, 4).unwrap();
    h.archive.put_block(&meta, 3, 1).unwrap();

    h.say(format!("archive-bot: status {meta}"));
    assert_eq!(
        h.next_text().await,
        format!("Status {meta}: need 4, have 1, %25")
    );

    h.say("!status");
    let text = h.next_text().await;
    assert!(text.starts_with("Uptime: "), "{text}");
    assert!(text.ends_with(". Archiving 1 hypercores"), "{text}");
}

#[tokio::test]
async fn status_for_unknown_key_is_an_error() {
    let mut h = Harness::start();
    let missing = key('f');

    h.say(format!("!status {missing}"));
    assert_eq!(
        h.next_text().await,
        format!("Error: {missing} is not being archived")
    );
}

#[tokio::test]
async fn ignored_lines_get_no_reply() {
    let mut h = Harness::start();
    h.say("hello everyone");
    h.say("!dance");
    h.say("!add 1234");
    h.assert_quiet().await;
}

#[tokio::test]
async fn store_membership_joins_and_leaves_swarm() {
    let mut h = Harness::start();
    let meta = key('a');

    h.say(format!("!track {meta}"));
    assert_eq!(h.next_text().await, format!("Tracking {meta}"));
    let joined = timeout(Duration::from_secs(5), h.swarm.recv()).await.unwrap();
    assert_eq!(joined, Some(format!("join {meta}")));

    h.say(format!("!remove {meta}"));
    assert_eq!(h.next_text().await, format!("Removing {meta}"));
    let left = timeout(Duration::from_secs(5), h.swarm.recv()).await.unwrap();
    assert_eq!(left, Some(format!("leave {meta}")));
}

#[tokio::test]
async fn disconnected_dispatcher_only_logs() {
    init_logging();
    let dispatcher = Dispatcher::disconnected();
    assert!(!dispatcher.is_connected());
    dispatcher.deliver(&archivebot_core::Channel::new(CHANNEL), "nobody listens");
}
