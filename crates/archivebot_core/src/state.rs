use crate::{Channel, PendingSet, RequestId};

pub const DEFAULT_BOT_NAME: &str = "archive-bot";

/// How the bot is addressed and where it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub name: String,
    /// Shared channel for replies to channel messages.
    pub channel: String,
    /// Announce-only mode: feeds are served but swarms are not joined per feed.
    pub announce: bool,
}

impl Default for BotIdentity {
    fn default() -> Self {
        Self {
            name: DEFAULT_BOT_NAME.to_string(),
            channel: String::new(),
            announce: false,
        }
    }
}

impl BotIdentity {
    pub fn new(name: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channel: channel.into(),
            announce: false,
        }
    }

    pub fn reply_channel(&self, from: &str, to: &str) -> Channel {
        if to == self.name {
            Channel::new(from)
        } else {
            Channel::new(self.channel.as_str())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BotState {
    identity: BotIdentity,
    pending: PendingSet,
    next_request: RequestId,
}

impl BotState {
    pub fn new(identity: BotIdentity) -> Self {
        Self {
            identity,
            pending: PendingSet::new(),
            next_request: 0,
        }
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    pub(crate) fn pending_mut(&mut self) -> &mut PendingSet {
        &mut self.pending
    }

    pub(crate) fn allocate_request(&mut self) -> RequestId {
        self.next_request += 1;
        self.next_request
    }
}
