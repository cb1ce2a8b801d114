use archivebot_core::ContentId;
use engine_logging::engine_info;
use sha2::{Digest, Sha256};

/// Peer discovery for individual feeds. The real swarm lives outside this crate.
pub trait Swarm: Send + Sync {
    fn join(&self, key: &ContentId);
    fn leave(&self, key: &ContentId);
}

/// Topic under which peers announce a feed, so the public key never hits the wire.
pub fn discovery_key(key: &ContentId) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"hypercore");
    hasher.update(key.to_bytes());
    hex::encode(hasher.finalize())
}

/// Records membership changes in the log only.
#[derive(Debug, Clone, Copy)]
pub struct LoggingSwarm {
    port: u16,
}

impl LoggingSwarm {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl Swarm for LoggingSwarm {
    fn join(&self, key: &ContentId) {
        engine_info!(
            "Joining {} discovery={} port={}",
            key,
            discovery_key(key),
            self.port
        );
    }

    fn leave(&self, key: &ContentId) {
        engine_info!(
            "Leaving {} discovery={} port={}",
            key,
            discovery_key(key),
            self.port
        );
    }
}
