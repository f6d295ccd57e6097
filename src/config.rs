//! Configuration loading and management

use anyhow::{Context, Result};

use crate::gateway::SpeechTiming;

/// Daemon configuration, read from environment variables with defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Phrase that ends a modal session.
    pub stop_phrase: String,

    /// Step count applied when a walk command omits the number.
    pub default_steps: u32,

    /// Buffer capacity of each recognition subscription.
    pub event_buffer: usize,

    /// Speech playback pacing used by [`crate::gateway::Actions`].
    pub speech_timing: SpeechTiming,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stop_phrase: "stop".to_string(),
            default_steps: 5,
            event_buffer: 32,
            speech_timing: SpeechTiming::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(phrase) = std::env::var("VOICEBOT_STOP_PHRASE") {
            config.stop_phrase = phrase;
        }
        if let Ok(steps) = std::env::var("VOICEBOT_DEFAULT_STEPS") {
            config.default_steps = steps
                .parse()
                .with_context(|| format!("invalid VOICEBOT_DEFAULT_STEPS: {:?}", steps))?;
        }
        if let Ok(buffer) = std::env::var("VOICEBOT_EVENT_BUFFER") {
            config.event_buffer = buffer
                .parse()
                .with_context(|| format!("invalid VOICEBOT_EVENT_BUFFER: {:?}", buffer))?;
        }
        Ok(config)
    }
}
