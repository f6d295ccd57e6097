//! Interactive walk routine: the per-utterance behavior run inside a
//! modal session
//!
//! Accepts `walk <n> steps <direction>` anywhere in an utterance, with an
//! optional step count falling back to the configured default. Utterances
//! that contain digits but not that shape get a format hint; everything
//! else gets a prompt to issue a walk command or say the stop phrase.

use std::sync::Arc;

use regex::Regex;
use tracing::{debug, error};

use crate::gateway::{Actions, MoveDirection};
use crate::session::{UtteranceCallback, UtteranceFuture};

const WALK_PATTERN: &str = r"walk\s+(?:(\d+)\s+)?steps\s+(forward|backward|left|right)";

/// How one utterance was understood.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Parsed {
    Walk { steps: u32, direction: MoveDirection },
    NumbersOnly,
    Unrelated,
}

/// Walk-command interpreter bound to an action gateway. One instance
/// serves a whole session; [`WalkRoutine::callback`] adapts it to the
/// session's per-utterance hook.
pub struct WalkRoutine {
    actions: Actions,
    default_steps: u32,
    pattern: Regex,
}

impl WalkRoutine {
    pub fn new(actions: Actions, default_steps: u32) -> Self {
        Self {
            actions,
            default_steps,
            pattern: Regex::new(WALK_PATTERN).expect("walk pattern is valid"),
        }
    }

    /// Wrap this routine as a session callback. Gateway failures speak the
    /// execution-error notice and still surface to the caller for logging.
    pub fn callback(self) -> UtteranceCallback {
        let routine = Arc::new(self);
        Arc::new(move |text: String| -> UtteranceFuture {
            let routine = Arc::clone(&routine);
            Box::pin(async move {
                if let Err(e) = routine.run(&text).await {
                    if let Err(say_err) = routine
                        .actions
                        .say("Error during command execution.")
                        .await
                    {
                        error!(error = %say_err, "failed to speak execution-error notice");
                    }
                    return Err(e);
                }
                Ok(())
            })
        })
    }

    async fn run(&self, text: &str) -> anyhow::Result<()> {
        match self.parse(text) {
            Parsed::Walk { steps, direction } => {
                debug!(steps, direction = %direction, "walk command parsed");
                self.actions
                    .say(&format!("Executing walk of {} steps {}.", steps, direction))
                    .await?;
                self.actions.walk(steps, direction).await?;
                self.actions.say("Walk command finished.").await?;
            }
            Parsed::NumbersOnly => {
                self.actions
                    .say("I found numbers, but I couldn't understand the command format.")
                    .await?;
            }
            Parsed::Unrelated => {
                self.actions
                    .say(&format!(
                        "I heard {}. Please specify a walk command or say stop.",
                        text
                    ))
                    .await?;
            }
        }
        Ok(())
    }

    /// `text` is already normalized by the session, so matching is plain
    /// lowercase substring work.
    fn parse(&self, text: &str) -> Parsed {
        if let Some(captures) = self.pattern.captures(text) {
            let steps = match captures.get(1) {
                // A digit run too long for u32 is a malformed count, not a
                // huge walk.
                Some(digits) => match digits.as_str().parse() {
                    Ok(steps) => steps,
                    Err(_) => return Parsed::NumbersOnly,
                },
                None => self.default_steps,
            };
            let direction = MoveDirection::parse(&captures[2]).expect("pattern admits only known directions");
            return Parsed::Walk { steps, direction };
        }
        if text.chars().any(|c| c.is_ascii_digit()) {
            return Parsed::NumbersOnly;
        }
        Parsed::Unrelated
    }
}
