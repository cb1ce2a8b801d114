use std::sync::Arc;
use std::time::Instant;

use archivebot_core::{update, BotState, ContentId, Effect, Msg};
use engine_logging::{engine_debug, engine_info, engine_trace, engine_warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{ArchiveStore, Dispatcher, StoreEvent, Swarm};

/// Collaborators the coordinator drives.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn ArchiveStore>,
    pub dispatcher: Dispatcher,
    pub swarm: Arc<dyn Swarm>,
}

/// Inbound side of the coordinator. Cheap to clone; every clone feeds the
/// same serial task.
#[derive(Clone)]
pub struct CoordinatorHandle {
    msg_tx: mpsc::UnboundedSender<Msg>,
}

impl CoordinatorHandle {
    pub fn message_received(
        &self,
        from: impl Into<String>,
        to: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.send(Msg::MessageReceived {
            from: from.into(),
            to: to.into(),
            text: text.into(),
        });
    }

    pub fn send(&self, msg: Msg) {
        let _ = self.msg_tx.send(msg);
    }
}

/// Starts the coordinator on the current tokio runtime. It owns `state` for
/// the rest of the process and consumes `events` from the archive store.
pub fn spawn_coordinator(
    state: BotState,
    services: Services,
    events: mpsc::UnboundedReceiver<StoreEvent>,
) -> (CoordinatorHandle, JoinHandle<()>) {
    let (msg_tx, msg_rx) = mpsc::unbounded_channel();
    let (archived_tx, archived_rx) = mpsc::unbounded_channel();
    tokio::spawn(resolve_archived(
        services.store.clone(),
        archived_rx,
        msg_tx.clone(),
    ));
    let coordinator = Coordinator {
        state,
        services,
        started: Instant::now(),
        msg_tx: msg_tx.clone(),
        archived_tx,
    };
    let task = tokio::spawn(coordinator.run(msg_rx, events));
    (CoordinatorHandle { msg_tx }, task)
}

struct Coordinator {
    state: BotState,
    services: Services,
    started: Instant,
    msg_tx: mpsc::UnboundedSender<Msg>,
    archived_tx: mpsc::UnboundedSender<ContentId>,
}

impl Coordinator {
    async fn run(
        mut self,
        mut msg_rx: mpsc::UnboundedReceiver<Msg>,
        mut events: mpsc::UnboundedReceiver<StoreEvent>,
    ) {
        self.join_existing_feeds().await;

        loop {
            tokio::select! {
                Some(msg) = msg_rx.recv() => self.dispatch_msg(msg),
                Some(event) = events.recv() => self.on_store_event(event),
                else => break,
            }
        }
        engine_info!("Coordinator stopped");
    }

    async fn join_existing_feeds(&self) {
        if self.state.identity().announce {
            return;
        }
        match self.services.store.list().await {
            Ok(keys) => {
                for key in keys {
                    self.services.swarm.join(&key);
                }
            }
            Err(err) => engine_warn!("Could not list archived feeds: {}", err),
        }
    }

    fn dispatch_msg(&mut self, msg: Msg) {
        engine_trace!("dispatch {:?}", msg);
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn on_store_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Added(key) => {
                engine_info!("Adding {}", key);
                self.dispatch_msg(Msg::FeedAdded(key));
            }
            StoreEvent::Removed(key) => {
                engine_info!("Removing {}", key);
                self.dispatch_msg(Msg::FeedRemoved(key));
            }
            StoreEvent::Archived(key) => {
                engine_info!("Feed archived {}", key);
                let _ = self.archived_tx.send(key);
            }
        }
    }

    fn run_effect(&self, effect: Effect) {
        match effect {
            Effect::StoreAdd {
                request,
                key,
                mode,
                channel,
            } => {
                let store = self.services.store.clone();
                let msg_tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = store.add(&key, mode).await;
                    if let Err(err) = &result {
                        engine_warn!("add {} failed: {}", key, err);
                    }
                    let _ = msg_tx.send(Msg::AddFinished {
                        request,
                        key,
                        mode,
                        channel,
                        result,
                    });
                });
            }
            Effect::StoreRemove { key, channel } => {
                let store = self.services.store.clone();
                let msg_tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = store.remove(&key).await;
                    if let Err(err) = &result {
                        engine_warn!("remove {} failed: {}", key, err);
                    }
                    let _ = msg_tx.send(Msg::RemoveFinished {
                        key,
                        channel,
                        result,
                    });
                });
            }
            Effect::StatusAll { channel } => {
                let store = self.services.store.clone();
                let msg_tx = self.msg_tx.clone();
                let uptime = self.started.elapsed();
                tokio::spawn(async move {
                    let result = store.list().await.map(|keys| keys.len());
                    let _ = msg_tx.send(Msg::StatusAllFinished {
                        channel,
                        uptime,
                        result,
                    });
                });
            }
            Effect::StatusOne { key, channel } => {
                let store = self.services.store.clone();
                let msg_tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = store.get(&key).await.map(|pair| pair.progress());
                    let _ = msg_tx.send(Msg::StatusOneFinished {
                        key,
                        channel,
                        result,
                    });
                });
            }
            Effect::Say { channel, text } => self.services.dispatcher.deliver(&channel, &text),
            Effect::JoinSwarm { key } => self.services.swarm.join(&key),
            Effect::LeaveSwarm { key } => self.services.swarm.leave(&key),
        }
    }
}

/// Looks up each archived feed's content structure before handing the
/// completion to the state machine. Lookups run one at a time, so completions
/// reach the coordinator in the order the store reported them.
async fn resolve_archived(
    store: Arc<dyn ArchiveStore>,
    mut archived_rx: mpsc::UnboundedReceiver<ContentId>,
    msg_tx: mpsc::UnboundedSender<Msg>,
) {
    while let Some(key) = archived_rx.recv().await {
        match store.get(&key).await {
            Ok(pair) => {
                let msg = Msg::FeedArchived {
                    key,
                    byte_length: pair.meta.byte_length,
                    content: pair.content_status(),
                };
                if msg_tx.send(msg).is_err() {
                    break;
                }
            }
            // Removed between the event and the lookup; nothing left to report.
            Err(err) => engine_debug!("Dropping archived event for {}: {}", key, err),
        }
    }
}
