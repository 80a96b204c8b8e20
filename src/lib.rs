//! forkterm - fork terminal sessions for delegated agent work
//!
//! An orchestrating agent uses forkterm to delegate a task to an
//! independent process in its own terminal window or tab, and to track
//! that delegated work to completion. The engine composes a safely escaped
//! command line for the target shell, resolves the best available terminal
//! on the host, and spawns it; a small persistent task registry tracks each
//! fork's lifecycle independently of the spawn.
//!
//! Once launched, the new terminal is fully detached: forkterm does not
//! supervise, stream, or signal the spawned session.

pub mod compose;
pub mod domain;
pub mod git;
pub mod paths;
pub mod registry;
pub mod shell;
pub mod terminal;

pub use domain::*;
