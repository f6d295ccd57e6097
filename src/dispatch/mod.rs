//! Command dispatch: the table, the mode flag, and the routing loop

mod dispatcher;
mod table;

pub use dispatcher::{DispatchMode, Dispatcher, ModeFlag, SlotReturn};
pub use table::{CommandHandler, CommandTable, HandlerFuture};
