//! Speech pacing and the high-level action wrapper
//!
//! `speak` resolves when the device accepts the text, well before playback
//! finishes. Callers that sequence speech with other actions go through
//! [`Actions::say`], which waits out an estimated playback duration.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use super::{ActionGateway, GatewayError, MoveDirection};

/// Parameters for estimating how long spoken text takes to play.
#[derive(Debug, Clone, Copy)]
pub struct SpeechTiming {
    /// Playback rate for the length-dependent part of the estimate.
    pub chars_per_sec: f32,
    /// Fixed overhead added to every utterance.
    pub base_secs: f32,
}

impl Default for SpeechTiming {
    fn default() -> Self {
        Self {
            chars_per_sec: 6.67,
            base_secs: 2.0,
        }
    }
}

impl SpeechTiming {
    /// Estimated playback duration for `text`. A non-positive rate degrades
    /// to the base overhead alone.
    pub fn estimate(&self, text: &str) -> Duration {
        let secs = if self.chars_per_sec > 0.0 {
            text.chars().count() as f32 / self.chars_per_sec + self.base_secs
        } else {
            self.base_secs
        };
        Duration::from_secs_f32(secs.max(0.0))
    }
}

/// Gateway handle bundled with speech pacing. Cheap to clone; this is what
/// command handlers and session routines hold.
#[derive(Clone)]
pub struct Actions {
    gateway: Arc<dyn ActionGateway>,
    timing: SpeechTiming,
}

impl Actions {
    pub fn new(gateway: Arc<dyn ActionGateway>, timing: SpeechTiming) -> Self {
        Self { gateway, timing }
    }

    /// Speak `text`, then wait out its estimated playback time.
    pub async fn say(&self, text: &str) -> Result<(), GatewayError> {
        self.gateway.speak(text).await?;
        let pause = self.timing.estimate(text);
        debug!(secs = pause.as_secs_f32(), "waiting out speech playback");
        sleep(pause).await;
        Ok(())
    }

    /// Walk `steps` in `direction`.
    pub async fn walk(&self, steps: u32, direction: MoveDirection) -> Result<(), GatewayError> {
        self.gateway.move_steps(steps, direction).await
    }

    /// Play a named animation.
    pub async fn play(&self, name: &str) -> Result<(), GatewayError> {
        self.gateway.play_named(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_scales_with_length() {
        let timing = SpeechTiming {
            chars_per_sec: 10.0,
            base_secs: 2.0,
        };
        assert_eq!(timing.estimate(""), Duration::from_secs_f32(2.0));
        assert_eq!(timing.estimate("0123456789"), Duration::from_secs_f32(3.0));
    }

    #[test]
    fn test_estimate_floors_at_base_for_bad_rate() {
        let timing = SpeechTiming {
            chars_per_sec: 0.0,
            base_secs: 2.0,
        };
        assert_eq!(timing.estimate("whatever length"), Duration::from_secs_f32(2.0));

        let negative = SpeechTiming {
            chars_per_sec: -3.0,
            base_secs: 1.5,
        };
        assert_eq!(negative.estimate("text"), Duration::from_secs_f32(1.5));
    }

    #[test]
    fn test_instant_timing_estimates_zero() {
        let timing = SpeechTiming {
            chars_per_sec: f32::INFINITY,
            base_secs: 0.0,
        };
        assert_eq!(timing.estimate("a long sentence"), Duration::ZERO);
    }
}
