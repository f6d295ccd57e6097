//! Modal session: exclusive multi-turn takeover of the recognition stream
//!
//! A session claims the subscription slot, consumes every event until its
//! stop phrase matches or it is cancelled, and spawns the per-utterance
//! callback as detached work so slow handlers never block the stream.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::recognition::{normalize, RecognitionSource};

/// Future returned by a per-utterance callback.
pub type UtteranceFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// Callback invoked for each utterance that does not resolve the session.
pub type UtteranceCallback = Arc<dyn Fn(String) -> UtteranceFuture + Send + Sync>;

/// Errors a session can surface to its coordinator.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The subscription was evicted while the session was still running.
    #[error("subscription lost while session active")]
    SubscriptionLost,
}

/// Session behavior, fixed at construction.
#[derive(Default)]
pub struct SessionConfig {
    stop_phrase: Option<String>,
    on_utterance: Option<UtteranceCallback>,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the session when an utterance contains `phrase`.
    pub fn stop_when(mut self, phrase: &str) -> Self {
        let phrase = normalize(phrase);
        if phrase.is_empty() {
            // An empty stop phrase would match every utterance.
            warn!("ignoring empty stop phrase");
        } else {
            self.stop_phrase = Some(phrase);
        }
        self
    }

    /// Run `callback` for each non-resolving utterance.
    pub fn on_utterance(mut self, callback: UtteranceCallback) -> Self {
        self.on_utterance = Some(callback);
        self
    }
}

/// Exclusive consumer of the recognition stream for one interactive
/// exchange. Constructed by the session coordinator, run once, discarded.
pub struct ModalSession {
    id: Uuid,
    source: RecognitionSource,
    config: SessionConfig,
    cancel: CancellationToken,
    active: bool,
}

impl ModalSession {
    pub fn new(source: RecognitionSource, config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            config,
            cancel: CancellationToken::new(),
            active: false,
        }
    }

    /// Token an outer task can use to end the session from outside.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Take the subscription slot and consume events until the stop phrase
    /// matches or the session is cancelled.
    ///
    /// Resolves with the (normalized) utterance that matched the stop
    /// phrase, or an empty string on cancellation. Calling `start` on a
    /// session that is already running returns empty immediately.
    pub async fn start(&mut self) -> Result<String, SessionError> {
        if self.active {
            warn!(session = %self.id, "start called on a running session");
            return Ok(String::new());
        }
        self.active = true;

        let mut subscription = self.source.subscribe();
        self.source.start();
        let cancel = self.cancel.clone();
        info!(session = %self.id, stop_phrase = ?self.config.stop_phrase, "session started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(session = %self.id, "session cancelled");
                    self.stop();
                    return Ok(String::new());
                }
                event = subscription.recv() => {
                    let event = match event {
                        Some(event) => event,
                        None => {
                            warn!(session = %self.id, "subscription lost while session active");
                            self.stop();
                            return Err(SessionError::SubscriptionLost);
                        }
                    };
                    if !event.success {
                        warn!(
                            session = %self.id,
                            result_code = event.result_code,
                            "recognition failure during session"
                        );
                        continue;
                    }
                    let text = event.normalized_text();
                    if text.is_empty() {
                        debug!(session = %self.id, "empty recognition result during session");
                        continue;
                    }
                    if let Some(stop) = &self.config.stop_phrase {
                        if text.contains(stop.as_str()) {
                            info!(session = %self.id, %text, "stop phrase matched");
                            self.stop();
                            return Ok(text);
                        }
                    }
                    match &self.config.on_utterance {
                        Some(callback) => {
                            // Detached on purpose: callback latency must not
                            // hold up stop-phrase detection.
                            let callback = Arc::clone(callback);
                            let session = self.id;
                            tokio::spawn(async move {
                                if let Err(e) = callback(text).await {
                                    warn!(%session, error = %e, "utterance callback failed");
                                }
                            });
                        }
                        None => {
                            debug!(session = %self.id, %text, "utterance ignored, no callback configured");
                        }
                    }
                }
            }
        }
    }

    /// Stop consuming and quiesce the source. Idempotent; safe from the
    /// resolution path, the cancellation path, and outer cleanup.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.source.stop();
        debug!(session = %self.id, "session stopped");
    }
}

impl Drop for ModalSession {
    fn drop(&mut self) {
        // A session dropped mid-flight must not leave the source producing
        // into an abandoned subscription.
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::RecognitionEvent;
    use std::sync::Mutex;
    use std::time::Duration;

    fn recording_callback() -> (Arc<Mutex<Vec<String>>>, UtteranceCallback) {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: UtteranceCallback = Arc::new(move |text: String| -> UtteranceFuture {
            let sink = Arc::clone(&sink);
            Box::pin(async move {
                sink.lock().unwrap().push(text);
                Ok(())
            })
        });
        (seen, callback)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached within 2s");
    }

    #[tokio::test]
    async fn test_stop_phrase_resolves_with_normalized_text() {
        let source = RecognitionSource::new(8);
        let (seen, callback) = recording_callback();
        let config = SessionConfig::new().stop_when("Stop").on_utterance(callback);
        let mut session = ModalSession::new(source.clone(), config);

        let handle = tokio::spawn(async move {
            let result = session.start().await;
            (result, session)
        });
        {
            let seen = Arc::clone(&seen);
            let source = source.clone();
            // First utterance proves the session owns the slot.
            wait_until(move || {
                source.push(RecognitionEvent::text("turn left"));
                !seen.lock().unwrap().is_empty()
            })
            .await;
        }
        assert!(source.push(RecognitionEvent::text("  Please STOP now ")));

        let (result, _session) = handle.await.unwrap();
        assert_eq!(result.unwrap(), "please stop now");
        // The resolving utterance never reaches the callback.
        assert!(!seen.lock().unwrap().iter().any(|t| t.contains("stop")));
        // The source is quiesced.
        assert!(!source.push(RecognitionEvent::text("anyone there")));
    }

    #[tokio::test]
    async fn test_failures_and_empty_results_do_not_resolve() {
        let source = RecognitionSource::new(8);
        let (seen, callback) = recording_callback();
        let config = SessionConfig::new().stop_when("stop").on_utterance(callback);
        let mut session = ModalSession::new(source.clone(), config);

        let handle = tokio::spawn(async move { session.start().await });
        {
            let source = source.clone();
            wait_until(move || source.push(RecognitionEvent::text("warming up"))).await;
        }

        assert!(source.push(RecognitionEvent::failure(-7)));
        assert!(source.push(RecognitionEvent::text("   ")));
        assert!(source.push(RecognitionEvent::text("still here")));
        {
            let seen = Arc::clone(&seen);
            wait_until(move || seen.lock().unwrap().iter().any(|t| t == "still here")).await;
        }

        assert!(source.push(RecognitionEvent::text("stop")));
        assert_eq!(handle.await.unwrap().unwrap(), "stop");
    }

    #[tokio::test]
    async fn test_callbacks_run_detached() {
        let source = RecognitionSource::new(8);
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let slow: UtteranceCallback = Arc::new(move |text: String| -> UtteranceFuture {
            let sink = Arc::clone(&sink);
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                sink.lock().unwrap().push(text);
                Ok(())
            })
        });
        let config = SessionConfig::new().stop_when("stop").on_utterance(slow);
        let mut session = ModalSession::new(source.clone(), config);

        let handle = tokio::spawn(async move { session.start().await });
        {
            let source = source.clone();
            wait_until(move || source.push(RecognitionEvent::text("one"))).await;
        }
        assert!(source.push(RecognitionEvent::text("two")));

        // The stop phrase is honored while both callbacks are still
        // sleeping; resolution does not wait for them.
        assert!(source.push(RecognitionEvent::text("stop")));
        assert_eq!(handle.await.unwrap().unwrap(), "stop");

        wait_until(move || seen.lock().unwrap().len() >= 2).await;
    }

    #[tokio::test]
    async fn test_callback_failure_does_not_abort_session() {
        let source = RecognitionSource::new(8);
        let failing: UtteranceCallback = Arc::new(|_text: String| -> UtteranceFuture {
            Box::pin(async { Err(anyhow::anyhow!("handler blew up")) })
        });
        let config = SessionConfig::new().stop_when("stop").on_utterance(failing);
        let mut session = ModalSession::new(source.clone(), config);

        let handle = tokio::spawn(async move { session.start().await });
        {
            let source = source.clone();
            wait_until(move || source.push(RecognitionEvent::text("kaboom"))).await;
        }
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(source.push(RecognitionEvent::text("stop")));
        assert_eq!(handle.await.unwrap().unwrap(), "stop");
    }

    #[tokio::test]
    async fn test_cancellation_resolves_empty_and_stops_source() {
        let source = RecognitionSource::new(8);
        let (seen, callback) = recording_callback();
        let config = SessionConfig::new().stop_when("stop").on_utterance(callback);
        let mut session = ModalSession::new(source.clone(), config);
        let token = session.cancel_token();

        let handle = tokio::spawn(async move { session.start().await });
        {
            let source = source.clone();
            let seen = Arc::clone(&seen);
            wait_until(move || {
                source.push(RecognitionEvent::text("ping"));
                !seen.lock().unwrap().is_empty()
            })
            .await;
        }

        token.cancel();
        assert_eq!(handle.await.unwrap().unwrap(), "");
        assert!(!source.push(RecognitionEvent::text("gone")));
    }

    #[tokio::test]
    async fn test_drop_while_active_stops_source() {
        let source = RecognitionSource::new(8);
        let (seen, callback) = recording_callback();
        let config = SessionConfig::new().stop_when("stop").on_utterance(callback);
        let mut session = ModalSession::new(source.clone(), config);

        let handle = tokio::spawn(async move { session.start().await });
        {
            let source = source.clone();
            let seen = Arc::clone(&seen);
            wait_until(move || {
                source.push(RecognitionEvent::text("ping"));
                !seen.lock().unwrap().is_empty()
            })
            .await;
        }

        handle.abort();
        {
            let source = source.clone();
            wait_until(move || !source.push(RecognitionEvent::text("probe"))).await;
        }
    }

    #[tokio::test]
    async fn test_eviction_surfaces_subscription_lost() {
        let source = RecognitionSource::new(8);
        let (seen, callback) = recording_callback();
        let config = SessionConfig::new().stop_when("stop").on_utterance(callback);
        let mut session = ModalSession::new(source.clone(), config);

        let handle = tokio::spawn(async move { session.start().await });
        {
            let source = source.clone();
            let seen = Arc::clone(&seen);
            wait_until(move || {
                source.push(RecognitionEvent::text("ping"));
                !seen.lock().unwrap().is_empty()
            })
            .await;
        }

        let _usurper = source.subscribe();
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(SessionError::SubscriptionLost)));
    }

    #[tokio::test]
    async fn test_stop_twice_matches_stop_once() {
        let source = RecognitionSource::new(8);
        let config = SessionConfig::new().stop_when("stop");
        let mut session = ModalSession::new(source.clone(), config);

        let handle = tokio::spawn(async move {
            let result = session.start().await;
            (result, session)
        });
        {
            let source = source.clone();
            wait_until(move || source.push(RecognitionEvent::text("stop"))).await;
        }
        let (result, mut session) = handle.await.unwrap();
        assert_eq!(result.unwrap(), "stop");

        // Resolution already stopped once; further stops are no-ops.
        session.stop();
        session.stop();
        assert!(!source.push(RecognitionEvent::text("probe")));
    }

    #[tokio::test]
    async fn test_start_on_running_session_returns_empty() {
        let source = RecognitionSource::new(8);
        let mut session = ModalSession::new(source, SessionConfig::new().stop_when("stop"));
        session.active = true;

        assert_eq!(session.start().await.unwrap(), "");
        session.active = false;
    }

    #[test]
    fn test_empty_stop_phrase_is_ignored() {
        let config = SessionConfig::new().stop_when("   ");
        assert!(config.stop_phrase.is_none());
    }
}
