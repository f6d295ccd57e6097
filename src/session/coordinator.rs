//! Session coordinator: the "start" trigger handler
//!
//! Guards the Listening ↔ SessionActive transition. The mode flag is
//! claimed atomically before any session work begins, and a restore guard
//! puts the dispatcher back in charge on every exit path, including a
//! dropped in-flight trigger.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::Config;
use crate::dispatch::{ModeFlag, SlotReturn};
use crate::gateway::Actions;
use crate::recognition::RecognitionSource;
use crate::session::{ModalSession, SessionConfig, WalkRoutine};

/// Creates a modal session on the "start" trigger, rejects a second start
/// while one runs, and restores normal dispatch when the session ends.
pub struct SessionCoordinator {
    source: RecognitionSource,
    actions: Actions,
    mode: Arc<ModeFlag>,
    handoff: Arc<SlotReturn>,
    stop_phrase: String,
    default_steps: u32,
}

/// Undoes the hand-off when dropped: deposits a fresh dispatcher
/// subscription, restarts the source, then releases the mode flag, in
/// that order. Runs exactly once per session on every exit path.
struct RestoreGuard {
    source: RecognitionSource,
    mode: Arc<ModeFlag>,
    handoff: Arc<SlotReturn>,
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        self.handoff.deposit(self.source.subscribe());
        self.source.start();
        self.mode.release();
        info!("dispatcher subscription restored");
    }
}

impl SessionCoordinator {
    pub fn new(
        source: RecognitionSource,
        actions: Actions,
        mode: Arc<ModeFlag>,
        handoff: Arc<SlotReturn>,
        config: &Config,
    ) -> Self {
        Self {
            source,
            actions,
            mode,
            handoff,
            stop_phrase: config.stop_phrase.clone(),
            default_steps: config.default_steps,
        }
    }

    /// Handle one "start" trigger. Never returns an error to the
    /// dispatcher: session failures are contained and spoken here.
    pub async fn trigger(&self, _text: &str) -> anyhow::Result<()> {
        if !self.mode.try_claim() {
            info!("start trigger while session active, rejecting");
            if let Err(e) = self.actions.say("Dynamic mode is already running.").await {
                error!(error = %e, "failed to speak already-running notice");
            }
            return Ok(());
        }

        let _restore = RestoreGuard {
            source: self.source.clone(),
            mode: Arc::clone(&self.mode),
            handoff: Arc::clone(&self.handoff),
        };

        match self.run_session().await {
            Ok(resolved) if resolved.is_empty() => {
                info!("session ended without a resolving utterance");
            }
            Ok(resolved) => {
                if let Err(e) = self
                    .actions
                    .say(&format!(
                        "Exiting dynamic command mode. You said: {}",
                        resolved
                    ))
                    .await
                {
                    error!(error = %e, "failed to speak exit prompt");
                }
            }
            Err(e) => {
                error!(error = %e, "session failed");
                if let Err(e) = self.actions.say("An error occurred in command mode.").await {
                    error!(error = %e, "failed to speak session-error notice");
                }
            }
        }
        Ok(())
    }

    async fn run_session(&self) -> anyhow::Result<String> {
        self.actions
            .say(&format!(
                "Entering dynamic command mode. Say 'walk [number] steps [direction]' or say '{}' to exit.",
                self.stop_phrase
            ))
            .await?;

        let routine = WalkRoutine::new(self.actions.clone(), self.default_steps);
        let config = SessionConfig::new()
            .stop_when(&self.stop_phrase)
            .on_utterance(routine.callback());
        let mut session = ModalSession::new(self.source.clone(), config);
        let resolved = session.start().await?;
        Ok(resolved)
    }
}
