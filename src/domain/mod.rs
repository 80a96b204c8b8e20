//! Core domain types for forkterm

mod intent;
mod task;

pub use intent::{ComposedCommand, LaunchIntent};
pub use task::{ForkType, TaskRecord, TaskStatus};
