use tokio::sync::oneshot;
use twilight_gateway::{CloseFrame, Event, EventTypeFlags, StreamExt};

use super::Bot;
use crate::state::State;

/// Bookkeeping that must follow gateway order, run before the event's handler task is
/// spawned. Caller lookups read voice states and roles from the cache, and `GuildCreate`
/// handlers check which guilds `Ready` already claimed.
fn track_in_order(state: &State, event: &Event) {
    state.cache.update(event);

    if let Event::Ready(ready) = event {
        state.registrar.claim(ready.guilds.iter().map(|guild| guild.id));
    }
}

#[tracing::instrument(skip(bot, shutdown_rx))]
pub async fn runner(mut bot: Bot, mut shutdown_rx: oneshot::Receiver<()>) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown_rx => {
                tracing::info!("Gateway runner received shutdown signal. Exiting event loop.");
                break;
            }

            item = bot.shard.next_event(EventTypeFlags::all()) => {
                let event = match item {
                    None => {
                        tracing::info!("Shard event stream ended. Runner will exit.");
                        break;
                    }
                    Some(Ok(event)) => event,
                    Some(Err(source)) => {
                        tracing::warn!(?source, "Error receiving event from shard");
                        continue;
                    }
                };

                if let Event::GatewayClose(frame) = &event {
                    match shutdown_rx.try_recv() {
                        Ok(_) | Err(tokio::sync::oneshot::error::TryRecvError::Closed) => {
                            tracing::info!(?frame, "Gateway connection closed during planned shutdown.");
                        }
                        Err(tokio::sync::oneshot::error::TryRecvError::Empty) => {
                            tracing::warn!(?frame, "Gateway connection closed unexpectedly by Discord. The runner will exit as this is non-resumable.");
                        }
                    }
                    break;
                }

                track_in_order(&bot.state, &event);

                let state_clone = bot.state.clone();

                tokio::spawn(async move {
                    let _ = state_clone.songbird.process(&event).await;

                    if let Err(e) = super::process(event, state_clone).await {
                        tracing::error!(error = ?e, "Error processing event");
                    }
                });
            }
        }
    }

    tracing::info!("Gateway runner loop ended. Closing shard...");
    bot.shard.close(CloseFrame::NORMAL);

    Ok(())
}
