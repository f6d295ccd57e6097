//! Process lifecycle: POSIX signal handling

mod shutdown;

pub use shutdown::ShutdownSignal;
