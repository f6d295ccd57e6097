//! Keyword dispatcher: normal-mode routing over the recognition stream
//!
//! The dispatcher owns the command table and the dispatch-mode flag. While
//! listening it consumes the recognition subscription serially; when the
//! "start" trigger fires, the session coordinator takes the subscription
//! slot for a modal session and hands a fresh one back through [`SlotReturn`]
//! when the session ends.

use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dispatch::table::{CommandHandler, CommandTable, HandlerFuture};
use crate::gateway::Actions;
use crate::recognition::{RecognitionEvent, RecognitionSource, Subscription};
use crate::session::SessionCoordinator;

/// Who currently owns event routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// The dispatcher routes events against the command table.
    Listening,
    /// A modal session owns the subscription slot.
    SessionActive,
}

impl std::fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listening => write!(f, "listening"),
            Self::SessionActive => write!(f, "session_active"),
        }
    }
}

/// Shared dispatch-mode flag. Single writer (the session coordinator);
/// the dispatcher reads it on every event.
pub struct ModeFlag {
    mode: Mutex<DispatchMode>,
}

impl ModeFlag {
    pub fn new() -> Self {
        Self {
            mode: Mutex::new(DispatchMode::Listening),
        }
    }

    pub fn current(&self) -> DispatchMode {
        *self.mode.lock().expect("mode flag poisoned")
    }

    /// Attempt the Listening → SessionActive transition. Returns false when
    /// a session already holds the mode.
    pub fn try_claim(&self) -> bool {
        let mut mode = self.mode.lock().expect("mode flag poisoned");
        if *mode == DispatchMode::SessionActive {
            return false;
        }
        *mode = DispatchMode::SessionActive;
        info!(from = %DispatchMode::Listening, to = %DispatchMode::SessionActive, "mode transition");
        true
    }

    /// Return to Listening. Called exactly once per session, from its
    /// restore path.
    pub fn release(&self) {
        let mut mode = self.mode.lock().expect("mode flag poisoned");
        *mode = DispatchMode::Listening;
        info!(from = %DispatchMode::SessionActive, to = %DispatchMode::Listening, "mode transition");
    }
}

impl Default for ModeFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Hand-back point for the dispatcher's subscription after a session ends.
///
/// The coordinator's restore path deposits a fresh subscription here; the
/// dispatch loop adopts it once the in-flight event completes.
pub struct SlotReturn {
    slot: Mutex<Option<Subscription>>,
}

impl SlotReturn {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn deposit(&self, subscription: Subscription) {
        let mut slot = self.slot.lock().expect("slot return poisoned");
        if slot.replace(subscription).is_some() {
            warn!("unclaimed dispatcher subscription replaced");
        }
    }

    pub fn take(&self) -> Option<Subscription> {
        self.slot.lock().expect("slot return poisoned").take()
    }
}

impl Default for SlotReturn {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes recognition events to registered handlers while in listening
/// mode. Construction wires the built-in "start" and "hello" triggers.
pub struct Dispatcher {
    table: Mutex<CommandTable>,
    mode: Arc<ModeFlag>,
    handoff: Arc<SlotReturn>,
    actions: Actions,
    fallback: Mutex<CommandHandler>,
}

impl Dispatcher {
    pub fn new(source: RecognitionSource, actions: Actions, config: &Config) -> Self {
        let mode = Arc::new(ModeFlag::new());
        let handoff = Arc::new(SlotReturn::new());
        let coordinator = Arc::new(SessionCoordinator::new(
            source,
            actions.clone(),
            Arc::clone(&mode),
            Arc::clone(&handoff),
            config,
        ));

        let fallback: CommandHandler = {
            let actions = actions.clone();
            Arc::new(move |text: String| -> HandlerFuture {
                let actions = actions.clone();
                Box::pin(async move {
                    actions
                        .say(&format!(
                            "I heard {}, but I'll only respond to 'start' or 'hello'.",
                            text
                        ))
                        .await?;
                    Ok(())
                })
            })
        };

        let dispatcher = Self {
            table: Mutex::new(CommandTable::new()),
            mode,
            handoff,
            actions: actions.clone(),
            fallback: Mutex::new(fallback),
        };

        dispatcher.register_handler("start", {
            Arc::new(move |text: String| -> HandlerFuture {
                let coordinator = Arc::clone(&coordinator);
                Box::pin(async move { coordinator.trigger(&text).await })
            })
        });
        dispatcher.register_handler("hello", {
            let actions = actions.clone();
            Arc::new(move |_text: String| -> HandlerFuture {
                let actions = actions.clone();
                Box::pin(async move {
                    actions.say("Hello, I am ready.").await?;
                    Ok(())
                })
            })
        });

        dispatcher
    }

    /// Register `handler` for `phrase`. Safe to call while the loop runs.
    pub fn register_handler(&self, phrase: &str, handler: CommandHandler) {
        self.table
            .lock()
            .expect("command table poisoned")
            .register(phrase, handler);
    }

    /// Replace the unrecognized-command fallback.
    pub fn set_fallback(&self, handler: CommandHandler) {
        *self.fallback.lock().expect("fallback handler poisoned") = handler;
    }

    /// Current dispatch mode.
    pub fn mode(&self) -> DispatchMode {
        self.mode.current()
    }

    /// Route one event. Exactly one handler (or the fallback) runs per
    /// routed event; handler failures are contained here and never disturb
    /// the dispatch mode.
    pub async fn handle_event(&self, event: RecognitionEvent) {
        if self.mode.current() == DispatchMode::SessionActive {
            // The session owns the slot; anything showing up here came
            // through a stale path during the hand-off window.
            debug!(text = %event.text, "event ignored while session active");
            return;
        }
        if !event.success {
            warn!(result_code = event.result_code, "recognition failure");
            return;
        }

        let text = event.normalized_text();
        let matched = {
            let table = self.table.lock().expect("command table poisoned");
            table.find(&text)
        };

        match matched {
            Some((phrase, handler)) => {
                info!(%phrase, %text, "command matched");
                if let Err(e) = handler(text).await {
                    error!(%phrase, error = %e, "command handler failed");
                    if let Err(e) = self.actions.say("Error during command execution.").await {
                        error!(error = %e, "failed to speak error notice");
                    }
                }
            }
            None => {
                debug!(%text, "no command matched");
                let fallback = Arc::clone(&*self.fallback.lock().expect("fallback handler poisoned"));
                if let Err(e) = fallback(text).await {
                    error!(error = %e, "fallback handler failed");
                }
            }
        }
    }

    /// Dispatch loop. Owns the dispatcher's subscription; adopts the
    /// replacement deposited by the session coordinator after each
    /// hand-back, draining stragglers from the superseded subscription
    /// first so nothing is silently dropped.
    pub async fn run(&self, mut subscription: Subscription) {
        info!("dispatcher listening");
        loop {
            if let Some(fresh) = self.handoff.take() {
                while let Some(stale) = subscription.try_recv() {
                    self.handle_event(stale).await;
                }
                subscription = fresh;
                continue;
            }
            match subscription.recv().await {
                Some(event) => self.handle_event(event).await,
                None => {
                    info!("recognition stream closed, dispatcher stopping");
                    break;
                }
            }
        }
    }
}
