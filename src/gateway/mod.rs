//! Action gateway: the device-facing boundary for motion, speech, and
//! animation
//!
//! Everything above this module treats device actions as opaque async calls
//! that either succeed or fail. Transport details (robot SDK, simulator,
//! console) stay behind the trait.

mod console;
#[cfg(test)]
mod recording;
mod speech;

pub use console::ConsoleGateway;
#[cfg(test)]
pub use recording::{GatewayCall, RecordingGateway};
pub use speech::{Actions, SpeechTiming};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by gateway implementations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The device accepted the request but reported failure.
    #[error("device rejected {action} request")]
    Rejected { action: &'static str },
    /// The device link is unavailable.
    #[error("device unreachable: {0}")]
    Unreachable(String),
}

/// Walk directions understood by the device. Forward and backward are
/// straight-line moves; left and right are turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
}

impl MoveDirection {
    /// Parse a lower-cased direction word.
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "forward" => Some(Self::Forward),
            "backward" => Some(Self::Backward),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

impl std::fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Left => "left",
            Self::Right => "right",
        };
        write!(f, "{}", name)
    }
}

/// Device actions as fire-and-forget-with-result async calls.
#[async_trait]
pub trait ActionGateway: Send + Sync {
    /// Walk `steps` steps in `direction`.
    async fn move_steps(&self, steps: u32, direction: MoveDirection) -> Result<(), GatewayError>;

    /// Start text-to-speech for `text`. Resolves when the device accepts
    /// the request, not when playback finishes; see [`SpeechTiming`].
    async fn speak(&self, text: &str) -> Result<(), GatewayError>;

    /// Play a named animation.
    async fn play_named(&self, name: &str) -> Result<(), GatewayError>;
}
