//! Core types shared across the stages.

mod mode;
mod state;

pub use mode::BuildMode;
pub use state::{CancelToken, is_shutdown, setup_shutdown_handler};
