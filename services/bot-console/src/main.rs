//! Bot Console - headless monitor for the strategy backend
//!
//! Tails the backend logs and reports every console event:
//! 1. Loads configuration (defaults + `BOT_CONSOLE_*` overrides)
//! 2. Refreshes logs once, then auto-polls on the configured interval
//! 3. Logs state, log, market data and chat events as they arrive
//! 4. Shuts the session down on Ctrl-C

use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use bot_console::{BotConsole, ConsoleConfig, ConsoleEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting Bot Console...");

    let config = ConsoleConfig::load()?;
    info!(
        "Backend: {}, strategy: {}, poll every {}s",
        config.backend_url, config.strategy, config.poll_interval_secs
    );

    let console = BotConsole::new(config)?;
    let mut events = console.subscribe();

    let reporter = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => report(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event reporter lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    if let Err(e) = console.refresh_logs().await {
        error!("Initial log refresh failed: {}", e);
    }
    console.start_polling(None)?;

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down");

    console.shutdown();
    drop(console);
    reporter.await.ok();

    Ok(())
}

fn report(event: &ConsoleEvent) {
    match event {
        ConsoleEvent::StateChanged { state, last_error } => match last_error {
            Some(reason) => warn!("Bot state: {} ({})", state, reason),
            None => info!("Bot state: {}", state),
        },
        ConsoleEvent::LogsUpdated(snapshot) => {
            info!(
                "Logs updated (#{}, {} bytes at {})",
                snapshot.seq,
                snapshot.text.len(),
                snapshot.fetched_at
            );
            if let Some(last) = snapshot.text.lines().last() {
                info!("  last line: {}", last);
            }
        }
        ConsoleEvent::LogsFailed { message } => warn!("Log refresh failed: {}", message),
        ConsoleEvent::MarketData(result) => {
            info!("Market data for {}: {}", result.symbol, result.payload)
        }
        ConsoleEvent::ChatReply(reply) => info!("Chat: {}", reply),
    }
}
