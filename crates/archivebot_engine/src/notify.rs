use std::sync::Arc;

use archivebot_core::Channel;
use engine_logging::engine_info;

/// Outbound side of the chat transport. Fire-and-forget.
pub trait Messenger: Send + Sync {
    fn say(&self, destination: &str, text: &str);
}

/// Delivers notifications; without a connected transport they only reach the log.
#[derive(Clone, Default)]
pub struct Dispatcher {
    messenger: Option<Arc<dyn Messenger>>,
}

impl Dispatcher {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self {
            messenger: Some(messenger),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.messenger.is_some()
    }

    pub fn deliver(&self, channel: &Channel, text: &str) {
        engine_info!("-> {}: {}", channel, text);
        if let Some(messenger) = &self.messenger {
            messenger.say(channel.as_str(), text);
        }
    }
}
