//! voicebot-daemon: keyword dispatch with modal interactive sessions over
//! a single recognition stream
//!
//! One always-on recognition source feeds a keyword dispatcher. The
//! "start" trigger hands the source's single subscription slot to a modal
//! session that runs the interactive walk routine until its stop phrase is
//! heard, then control reverts to the dispatcher. The shipped binary feeds
//! the source from stdin (plain text or replayed JSON event lines) and
//! drives actions through the console gateway; a device bridge plugs in at
//! the same two seams.

mod config;
mod dispatch;
mod feed;
mod gateway;
mod lifecycle;
mod recognition;
mod session;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::gateway::{Actions, ConsoleGateway};
use crate::lifecycle::ShutdownSignal;
use crate::recognition::RecognitionSource;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "voicebot-daemon starting"
    );

    let config = Config::load()?;
    info!(
        stop_phrase = %config.stop_phrase,
        default_steps = config.default_steps,
        event_buffer = config.event_buffer,
        "configuration loaded"
    );

    let shutdown = ShutdownSignal::new();

    let source = RecognitionSource::new(config.event_buffer);
    let actions = Actions::new(Arc::new(ConsoleGateway::new()), config.speech_timing);
    let dispatcher = Dispatcher::new(source.clone(), actions, &config);

    // The dispatcher takes the subscription slot before anything can push.
    let subscription = source.subscribe();
    source.start();

    // Feed EOF ends the feed, not the daemon; already-queued events still
    // dispatch.
    tokio::spawn(feed::run(source.clone()));

    info!("daemon initialized, entering main loop");

    tokio::select! {
        _ = dispatcher.run(subscription) => {
            info!("dispatcher exited");
        }
        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    info!("shutting down...");
    source.stop();
    info!("voicebot-daemon stopped");

    Ok(())
}
