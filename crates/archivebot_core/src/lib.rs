//! Archive bot core: command grammar, pending-set state machine and report text.
mod command;
mod effect;
mod error;
mod format;
mod key;
mod msg;
mod notify;
mod pending;
mod progress;
mod state;
mod update;

pub use command::{parse, Command, Operation, ParseError, ParsedCommand};
pub use effect::Effect;
pub use error::StoreError;
pub use format::{pretty_bytes, pretty_duration};
pub use key::{ContentId, KeyError};
pub use msg::{ContentStatus, Msg};
pub use notify::{
    error_text, fully_archived_text, render, status_text, uptime_text, Channel,
};
pub use pending::{ArchiveMode, PendingEntry, PendingSet, RequestId};
pub use progress::{blocks_remaining, compute_progress, BlockPresence, Progress};
pub use state::{BotIdentity, BotState, DEFAULT_BOT_NAME};
pub use update::update;
