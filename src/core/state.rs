//! Shutdown and cancellation state.
//!
//! - `SHUTDOWN`: process-wide flag set by Ctrl+C
//! - `CancelToken`: per-pass abort signal handed to every stage

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// The first Ctrl+C sets the shutdown flag so a running watch session can
/// finish its pass and tear down; a second one exits immediately.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SHUTDOWN.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        crate::log!("watch"; "shutting down...");
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Check if shutdown has been requested
///
/// Relaxed ordering: worst case a few more images get processed before stopping
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Cooperative cancellation signal for one pass.
///
/// Cloning shares the flag. A token created with [`CancelToken::linked`]
/// also reports cancelled once process shutdown is requested.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    follow_shutdown: bool,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that is also cancelled by Ctrl+C.
    pub fn linked() -> Self {
        Self {
            flag: Arc::default(),
            follow_shutdown: true,
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || (self.follow_shutdown && is_shutdown())
    }
}
