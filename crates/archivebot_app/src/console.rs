//! Console chat transport: stdin lines are inbound messages, replies go to stdout.

use archivebot_engine::{CoordinatorHandle, Messenger};
use engine_logging::{engine_info, engine_warn};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Sender identity for lines typed on the console.
pub const CONSOLE_NICK: &str = "operator";

pub struct ConsoleMessenger;

impl Messenger for ConsoleMessenger {
    fn say(&self, destination: &str, text: &str) {
        println!("[{destination}] {text}");
    }
}

/// Where a console line is sent: `/msg <text>` goes privately to the bot,
/// anything else to the shared channel.
pub fn route<'a>(line: &'a str, bot_name: &'a str, channel: &'a str) -> (&'a str, &'a str) {
    match line.strip_prefix("/msg ") {
        Some(text) => (bot_name, text),
        None => (channel, line),
    }
}

pub async fn read_commands(handle: CoordinatorHandle, bot_name: String, channel: String) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let (to, text) = route(&line, &bot_name, &channel);
                handle.message_received(CONSOLE_NICK, to, text);
            }
            Ok(None) => {
                engine_info!("Console closed, no more commands");
                break;
            }
            Err(err) => {
                engine_warn!("Console read failed: {}", err);
                break;
            }
        }
    }
}
