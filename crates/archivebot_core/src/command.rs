use thiserror::Error;

use crate::{ContentId, KeyError};

/// Command word as typed by the user. Unrecognized words survive parsing and
/// are dropped when mapped to an [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Track,
    Add,
    Remove,
    Status,
    Unknown(String),
}

impl Command {
    fn from_word(word: &str) -> Self {
        match word {
            "track" => Command::Track,
            "add" => Command::Add,
            "rm" | "remove" => Command::Remove,
            "status" => Command::Status,
            other => Command::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: Command,
    pub key: Option<ContentId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Track(ContentId),
    Add(ContentId),
    Remove(ContentId),
    StatusAll,
    StatusOne(ContentId),
}

impl ParsedCommand {
    /// Maps the command onto something the coordinator acts on. Keyed commands
    /// without a key, and unknown words, yield `None`.
    pub fn operation(&self) -> Option<Operation> {
        match (&self.command, &self.key) {
            (Command::Track, Some(key)) => Some(Operation::Track(key.clone())),
            (Command::Add, Some(key)) => Some(Operation::Add(key.clone())),
            (Command::Remove, Some(key)) => Some(Operation::Remove(key.clone())),
            (Command::Status, Some(key)) => Some(Operation::StatusOne(key.clone())),
            (Command::Status, None) => Some(Operation::StatusAll),
            (Command::Track | Command::Add | Command::Remove, None) => None,
            (Command::Unknown(_), _) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("message is not addressed to the bot")]
    NotAddressed,
    #[error("empty command")]
    Empty,
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),
}

/// Parses one chat line. Accepts `!cmd [key]` and `<bot_name>[digits]: [!]cmd [key]`.
pub fn parse(raw: &str, bot_name: &str) -> Result<ParsedCommand, ParseError> {
    let message = raw.trim();
    let message = match message.strip_prefix('!') {
        Some(rest) => rest,
        None if is_addressed(message, bot_name) => message,
        None => return Err(ParseError::NotAddressed),
    };

    let body = message.rsplit(':').next().unwrap_or(message).trim();
    let body = body.strip_prefix('!').unwrap_or(body);
    if body.is_empty() {
        return Err(ParseError::Empty);
    }

    match body.split_once(' ') {
        None => Ok(ParsedCommand {
            command: Command::from_word(body),
            key: None,
        }),
        Some((word, key)) => Ok(ParsedCommand {
            command: Command::from_word(word),
            key: Some(ContentId::parse(key)?),
        }),
    }
}

fn is_addressed(message: &str, bot_name: &str) -> bool {
    let Some((nick, _)) = message.split_once(':') else {
        return false;
    };
    let nick = nick.trim();
    // Clients append digits to taken nicknames (archive-bot2).
    nick.trim_end_matches(|c: char| c.is_ascii_digit()) == bot_name
}
