use crate::{
    error_text, fully_archived_text, parse, render, status_text, uptime_text, ArchiveMode,
    BotState, Channel, ContentId, ContentStatus, Effect, Msg, Operation, PendingEntry,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Every pending-set transition happens here, so callers that feed messages
/// one at a time get serialized transitions for free.
pub fn update(mut state: BotState, msg: Msg) -> (BotState, Vec<Effect>) {
    let effects = match msg {
        Msg::MessageReceived { from, to, text } => {
            // Unaddressed or malformed lines are dropped without a reply.
            let Ok(parsed) = parse(&text, &state.identity().name) else {
                return (state, Vec::new());
            };
            let channel = state.identity().reply_channel(&from, &to);
            match parsed.operation() {
                Some(operation) => apply_operation(&mut state, operation, channel),
                None => Vec::new(),
            }
        }
        Msg::AddFinished {
            request,
            key,
            mode,
            channel,
            result,
        } => match result {
            Err(err) => {
                state.pending_mut().remove_request(request);
                vec![say(channel, error_text(&err))]
            }
            // Removed while the store call was in flight.
            Ok(()) if !state.pending().contains_request(request) => Vec::new(),
            Ok(()) => {
                let verb = match mode {
                    ArchiveMode::Full => "Adding",
                    ArchiveMode::MetaOnly => "Tracking",
                };
                vec![say(channel, format!("{verb} {key}"))]
            }
        },
        Msg::RemoveFinished {
            key,
            channel,
            result,
        } => {
            let text = render(result.err().as_ref(), &format!("Removing {key}"));
            vec![say(channel, text)]
        }
        Msg::StatusAllFinished {
            channel,
            uptime,
            result,
        } => {
            let text = match result {
                Ok(count) => uptime_text(uptime, count),
                Err(err) => error_text(&err),
            };
            vec![say(channel, text)]
        }
        Msg::StatusOneFinished {
            key,
            channel,
            result,
        } => {
            let text = match result {
                Ok(progress) => status_text(&key, progress),
                Err(err) => error_text(&err),
            };
            vec![say(channel, text)]
        }
        Msg::FeedAdded(key) => {
            if state.identity().announce {
                Vec::new()
            } else {
                vec![Effect::JoinSwarm { key }]
            }
        }
        Msg::FeedRemoved(key) => {
            if state.identity().announce {
                Vec::new()
            } else {
                vec![Effect::LeaveSwarm { key }]
            }
        }
        Msg::FeedArchived {
            key,
            byte_length,
            content,
        } => feed_archived(&mut state, key, byte_length, content),
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn apply_operation(state: &mut BotState, operation: Operation, channel: Channel) -> Vec<Effect> {
    match operation {
        Operation::Add(key) => begin_archive(state, key, ArchiveMode::Full, channel),
        Operation::Track(key) => begin_archive(state, key, ArchiveMode::MetaOnly, channel),
        Operation::Remove(key) => {
            // Also cancels a content feed still waiting on this meta key.
            state.pending_mut().remove_referencing(&key);
            vec![Effect::StoreRemove { key, channel }]
        }
        Operation::StatusAll => vec![Effect::StatusAll { channel }],
        Operation::StatusOne(key) => vec![Effect::StatusOne { key, channel }],
    }
}

fn begin_archive(
    state: &mut BotState,
    key: ContentId,
    mode: ArchiveMode,
    channel: Channel,
) -> Vec<Effect> {
    let request = state.allocate_request();
    state.pending_mut().insert(PendingEntry::AwaitingMeta {
        request,
        key: key.clone(),
        channel: channel.clone(),
        mode,
    });
    vec![Effect::StoreAdd {
        request,
        key,
        mode,
        channel,
    }]
}

fn feed_archived(
    state: &mut BotState,
    key: ContentId,
    byte_length: u64,
    content: Option<ContentStatus>,
) -> Vec<Effect> {
    let mut effects = Vec::new();

    for entry in state.pending_mut().take_awaiting_content(&key) {
        if let PendingEntry::AwaitingContent {
            meta_key, channel, ..
        } = entry
        {
            effects.push(say(channel, fully_archived_text(&meta_key, byte_length)));
        }
    }

    for entry in state.pending_mut().take_awaiting_meta(&key) {
        let PendingEntry::AwaitingMeta {
            request,
            channel,
            mode,
            ..
        } = entry
        else {
            continue;
        };
        match (mode, &content) {
            (ArchiveMode::Full, Some(content)) if !content.archived => {
                state.pending_mut().insert(PendingEntry::AwaitingContent {
                    request,
                    key: content.key.clone(),
                    meta_key: key.clone(),
                    channel,
                });
            }
            (ArchiveMode::Full, Some(content)) => {
                effects.push(say(channel, fully_archived_text(&key, content.byte_length)));
            }
            (ArchiveMode::Full, None) | (ArchiveMode::MetaOnly, _) => {
                effects.push(say(channel, fully_archived_text(&key, byte_length)));
            }
        }
    }

    effects
}

fn say(channel: Channel, text: String) -> Effect {
    Effect::Say { channel, text }
}
