//! Recognition stream: event types and the single-slot source they flow
//! through

mod event;
mod source;

pub use event::{normalize, RecognitionEvent};
pub use source::{RecognitionSource, Subscription};
