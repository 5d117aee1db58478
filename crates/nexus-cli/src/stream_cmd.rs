//! `nexus stream` — send a message and render the reply as it streams in.
//!
//! Drives the manager the same way a UI would: start the stream, then poll
//! `get_stream_data` until the session reports done. Ctrl-C cancels.

use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tracing::debug;

use nexus_core::config::Config;
use nexus_stream::{StreamData, StreamManager, StreamOutcome, StreamSettings};

use crate::helpers::{self, StreamPrinter};

/// Run one streamed exchange to completion.
pub async fn run(
    config: &Config,
    conversation_id: &str,
    message: &str,
    base_url: Option<String>,
    raw: bool,
) -> Result<()> {
    let base_url = base_url.unwrap_or_else(|| config.stream.base_url.clone());
    let manager = StreamManager::new(settings_for(config));
    let sweeper = manager.spawn_sweeper();

    helpers::print_banner(conversation_id, &base_url);
    manager.start_stream(conversation_id, message, &base_url);

    let result = follow(&manager, conversation_id, raw, poll_interval_ms(config)).await;

    manager.shutdown();
    manager.drain().await;
    if let Some(sweeper) = sweeper {
        sweeper.await.context("session sweeper panicked")?;
    }

    match result? {
        Some(data) => report(&data),
        None => {
            eprintln!("{}", "· stream cancelled".dimmed());
            Ok(())
        }
    }
}

/// Manager settings for a polling client: the grace window covers at least
/// two polls, so the finished session is seen before it is retired.
fn settings_for(config: &Config) -> StreamSettings {
    let mut settings = StreamSettings::from(&config.stream);
    let min_grace = Duration::from_millis(poll_interval_ms(config)) * 2;
    if settings.grace_period < min_grace {
        debug!(
            grace_ms = settings.grace_period.as_millis() as u64,
            poll_ms = poll_interval_ms(config),
            "Grace period shorter than two polls, raising it"
        );
        settings.grace_period = min_grace;
    }
    settings
}

fn poll_interval_ms(config: &Config) -> u64 {
    config.cli.poll_interval_ms.max(1)
}

/// Poll until the session is done. `None` if cancelled with Ctrl-C.
async fn follow(
    manager: &StreamManager,
    conversation_id: &str,
    raw: bool,
    poll_interval_ms: u64,
) -> Result<Option<StreamData>> {
    let mut printer = StreamPrinter::new(raw);
    let mut ticker = tokio::time::interval(Duration::from_millis(poll_interval_ms));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                debug!(conversation = %conversation_id, "interrupted, cancelling stream");
                manager.cancel_stream(conversation_id);
                return Ok(None);
            }
            _ = ticker.tick() => {
                let Some(data) = manager.get_stream_data(conversation_id) else {
                    bail!("stream for conversation {conversation_id} disappeared");
                };

                let fresh = printer.take_new(&data);
                if !fresh.is_empty() {
                    write!(stdout, "{fresh}")?;
                    stdout.flush()?;
                }
                if data.is_done {
                    return Ok(Some(data));
                }
            }
        }
    }
}

/// Print the final status line; failures become the command's error.
fn report(data: &StreamData) -> Result<()> {
    let elapsed = data
        .finished_at
        .map(|end| (end - data.started_at).num_milliseconds())
        .unwrap_or_default();

    match &data.outcome {
        Some(StreamOutcome::Failed { error }) => bail!("stream failed: {error}"),
        Some(StreamOutcome::Cancelled) => {
            eprintln!("{}", "· stream cancelled".dimmed());
        }
        Some(StreamOutcome::Completed) | None => {
            eprintln!(
                "{} {}",
                "✓".green(),
                format!("{} messages in {} ms", data.messages.len(), elapsed).dimmed()
            );
        }
    }
    if let Some(message) = data.server_error() {
        bail!("server reported an error: {message}");
    }
    Ok(())
}
