//! Terminal resolution and process dispatch
//!
//! The resolver probes the host for the best available terminal program;
//! the dispatcher turns a composed command into an OS-level launch of a new
//! interactive terminal window or tab.

mod dispatch;
mod resolver;

pub use dispatch::{dispatch, dispatch_with, DispatchResult};
pub use resolver::{resolve, TerminalChoice, TerminalKind};
