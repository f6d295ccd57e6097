//! Single-slot recognition source
//!
//! The source owns one subscription slot. `subscribe` installs a fresh
//! bounded channel and evicts the previous subscriber, so whoever holds the
//! returned `Subscription` owns every event pushed after that point. An
//! active flag gates production: `stop` quiesces delivery without tearing
//! down the slot. Pushes never block the delivering thread; an event that
//! cannot be delivered is dropped with a log line.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::recognition::RecognitionEvent;

/// Cloneable handle to the single-slot event hub.
#[derive(Clone)]
pub struct RecognitionSource {
    inner: Arc<Inner>,
}

struct Inner {
    slot: Mutex<Option<mpsc::Sender<RecognitionEvent>>>,
    active: AtomicBool,
    capacity: usize,
}

/// Receiving half of the current subscription.
///
/// Owning this value is what "being the registered consumer" means.
/// Dropping it, or being evicted by a later `subscribe` call, ends the
/// subscription; events buffered before eviction stay readable.
pub struct Subscription {
    rx: mpsc::Receiver<RecognitionEvent>,
}

impl Subscription {
    /// Next event, or `None` once the subscription is evicted and drained.
    pub async fn recv(&mut self) -> Option<RecognitionEvent> {
        self.rx.recv().await
    }

    /// Non-blocking receive, used to drain a superseded subscription.
    pub fn try_recv(&mut self) -> Option<RecognitionEvent> {
        self.rx.try_recv().ok()
    }
}

impl RecognitionSource {
    /// Create a source whose subscriptions buffer up to `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(None),
                active: AtomicBool::new(false),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Install a fresh subscription, evicting the previous subscriber.
    ///
    /// Takes effect for events pushed after this call returns; events
    /// already delivered to the evicted subscriber are not redelivered.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let mut slot = self.inner.slot.lock().expect("subscription slot poisoned");
        if slot.replace(tx).is_some() {
            debug!("previous subscription evicted");
        }
        Subscription { rx }
    }

    /// Begin producing events. Idempotent.
    pub fn start(&self) {
        if !self.inner.active.swap(true, Ordering::SeqCst) {
            debug!("recognition source started");
        }
    }

    /// Stop producing events. Idempotent; an event pushed concurrently with
    /// the stop request may still be delivered.
    pub fn stop(&self) {
        if self.inner.active.swap(false, Ordering::SeqCst) {
            debug!("recognition source stopped");
        }
    }

    /// Transport-side entry point. Returns whether the event was delivered
    /// to the current subscriber.
    pub fn push(&self, event: RecognitionEvent) -> bool {
        if !self.inner.active.load(Ordering::SeqCst) {
            trace!(text = %event.text, "event dropped: source stopped");
            return false;
        }
        let slot = self.inner.slot.lock().expect("subscription slot poisoned");
        let tx = match slot.as_ref() {
            Some(tx) => tx,
            None => {
                warn!(text = %event.text, "event dropped: no subscriber installed");
                return false;
            }
        };
        match tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(text = %event.text, "event dropped: subscriber buffer full");
                false
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                warn!(text = %event.text, "event dropped: subscriber gone");
                false
            }
        }
    }
}
