//! Build passes over an asset set.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────── BuildSession ───────────────────────────┐
//! │  StageConfig · Codec · TranscodeCache · worker pool                │
//! │                                                                    │
//! │  run_pass(assets) ──► transcode ──► rename ──► (assets, report)    │
//! │                        (parallel)    (single-threaded)             │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stages run in the order named by `pipeline.stages`. A cancelled pass
//! returns [`PassError::Cancelled`] and its asset set is dropped, so no
//! partially renamed set or manifest ever leaves a pass.

mod error;
mod rename;
mod session;
mod stage;
mod transcode;

pub use error::PassError;
pub use rename::{RenameReport, RenameStage};
pub use session::{BuildSession, PassReport};
pub use stage::{PassContext, Stage, StageReport, resolve_stages};
pub use transcode::{ImageResult, ImageState, TranscodeReport, TranscodeStage, transcode_image};
