mod cli;
mod console;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use archivebot_core::{BotIdentity, BotState};
use archivebot_engine::{
    spawn_coordinator, ChannelEventSink, Dispatcher, LocalArchive, LoggingSwarm, Services,
};
use clap::Parser;
use engine_logging::{engine_error, engine_info};
use tokio::sync::mpsc;

use crate::console::ConsoleMessenger;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Args::parse();
    logging::initialize(args.log_level(), args.log_destination());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: cli::Args) -> anyhow::Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let archive = LocalArchive::open(&args.cwd, Arc::new(ChannelEventSink::new(event_tx)))
        .with_context(|| format!("could not open archive at {}", args.cwd.display()))?;
    engine_info!(
        "Feed registry available at {}",
        archive.registry_path().display()
    );
    engine_info!(
        "Replicating on port {} (announce only: {})",
        args.port,
        args.announce
    );

    let dispatcher = match &args.channel {
        Some(channel) => {
            engine_info!(
                "Messaging as {} in {} (server {}), reading commands from the console",
                args.name,
                channel,
                args.server
            );
            Dispatcher::new(Arc::new(ConsoleMessenger))
        }
        None => Dispatcher::disconnected(),
    };

    let identity = BotIdentity {
        name: args.name.clone(),
        channel: args.channel.clone().unwrap_or_default(),
        announce: args.announce,
    };
    let services = Services {
        store: Arc::new(archive),
        dispatcher,
        swarm: Arc::new(LoggingSwarm::new(args.port)),
    };
    let (handle, task) = spawn_coordinator(BotState::new(identity), services, event_rx);

    if let Some(channel) = args.channel {
        tokio::spawn(console::read_commands(handle, args.name, channel));
    }

    task.await.context("coordinator stopped unexpectedly")?;
    Ok(())
}
