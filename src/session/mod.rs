//! Modal sessions: exclusive takeover of the recognition stream and the
//! coordinator that guards entering and leaving one

mod coordinator;
mod modal;
mod walk;

pub use coordinator::SessionCoordinator;
pub use modal::{ModalSession, SessionConfig, SessionError, UtteranceCallback, UtteranceFuture};
pub use walk::WalkRoutine;
