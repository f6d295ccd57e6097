//! Ordered trigger-phrase table
//!
//! First registered match wins: phrases are normalized once at registration
//! and matched as substrings of normalized utterance text, scanning in
//! insertion order.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::warn;

use crate::recognition::normalize;

/// Future returned by a command handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A registered command handler. Receives the full normalized utterance
/// that matched its phrase.
pub type CommandHandler = Arc<dyn Fn(String) -> HandlerFuture + Send + Sync>;

/// Insertion-ordered phrase → handler mapping.
#[derive(Default)]
pub struct CommandTable {
    entries: Vec<(String, CommandHandler)>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `phrase`. Re-registering a phrase replaces
    /// the handler but keeps the phrase's original priority position.
    pub fn register(&mut self, phrase: &str, handler: CommandHandler) {
        let key = normalize(phrase);
        if key.is_empty() {
            warn!("ignoring handler registration with empty phrase");
            return;
        }
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = handler,
            None => self.entries.push((key, handler)),
        }
    }

    /// First handler whose phrase occurs within `normalized`, scanning in
    /// insertion order.
    pub fn find(&self, normalized: &str) -> Option<(String, CommandHandler)> {
        self.entries
            .iter()
            .find(|(phrase, _)| normalized.contains(phrase.as_str()))
            .map(|(phrase, handler)| (phrase.clone(), Arc::clone(handler)))
    }
}
