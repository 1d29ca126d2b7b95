//! Command-line entry points.

mod args;
pub mod build;
pub mod watch;

pub use args::{Cli, Commands, PassArgs};
