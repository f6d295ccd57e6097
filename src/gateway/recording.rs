//! Recording gateway: captures action calls for assertions in tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{ActionGateway, Actions, GatewayError, MoveDirection, SpeechTiming};

/// One observed gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Move { steps: u32, direction: MoveDirection },
    Speak(String),
    Play(String),
}

/// Records every call; can be armed to fail speech containing a needle.
/// Clones share the same call log.
#[derive(Default, Clone)]
pub struct RecordingGateway {
    calls: Arc<Mutex<Vec<GatewayCall>>>,
    fail_speak_containing: Arc<Mutex<Option<String>>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in call order.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    /// Spoken texts only, in call order.
    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Speak(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn spoken_containing(&self, needle: &str) -> bool {
        self.spoken().iter().any(|text| text.contains(needle))
    }

    /// Make `speak` fail whenever the text contains `needle`. The failing
    /// call is still recorded.
    pub fn fail_speak_containing(&self, needle: &str) {
        *self.fail_speak_containing.lock().expect("failure trigger poisoned") =
            Some(needle.to_string());
    }

    /// Actions wrapper over this gateway with zero speech pacing, so tests
    /// never sit out playback estimates.
    pub fn actions(&self) -> Actions {
        Actions::new(
            Arc::new(self.clone()),
            SpeechTiming {
                chars_per_sec: f32::INFINITY,
                base_secs: 0.0,
            },
        )
    }
}

#[async_trait]
impl ActionGateway for RecordingGateway {
    async fn move_steps(&self, steps: u32, direction: MoveDirection) -> Result<(), GatewayError> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(GatewayCall::Move { steps, direction });
        Ok(())
    }

    async fn speak(&self, text: &str) -> Result<(), GatewayError> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(GatewayCall::Speak(text.to_string()));
        let armed = self.fail_speak_containing.lock().expect("failure trigger poisoned");
        if let Some(needle) = armed.as_deref() {
            if text.contains(needle) {
                return Err(GatewayError::Rejected { action: "speak" });
            }
        }
        Ok(())
    }

    async fn play_named(&self, name: &str) -> Result<(), GatewayError> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(GatewayCall::Play(name.to_string()));
        Ok(())
    }
}
