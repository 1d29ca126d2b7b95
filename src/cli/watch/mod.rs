//! `blaze watch`: rerun passes on change, reusing one session's cache.
//!
//! ```text
//! notify ──► crossbeam channel ──► Debouncer ──► run_once ──► WatchStatus
//!                                     ▲                         │
//!                                     └──── until Ctrl+C ◄──────┘
//! ```

mod debouncer;

use std::path::Path;

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use notify::{RecursiveMode, Watcher};

use self::debouncer::Debouncer;
use super::PassArgs;
use super::build::{open_session, run_once};
use crate::config::StageConfig;
use crate::core::{CancelToken, is_shutdown};
use crate::image::ImageCodec;
use crate::logger::{status_error, status_success, status_warning};
use crate::pipeline::{BuildSession, PassError, PassReport};
use crate::utils::plural::plural_count;
use crate::{debug, log};

pub fn watch(config: StageConfig, args: &PassArgs) -> Result<()> {
    log!("watch"; "{} mode, watching {}", config.mode.label(), args.path.display());

    // Watcher first, so changes made during the initial pass are not lost
    let (tx, rx) = channel::unbounded();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })
    .context("failed to create file watcher")?;
    // Resolved, so event paths compare against the resolved output dir
    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("failed to resolve `{}`", args.path.display()))?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch `{}`", root.display()))?;

    let mut session = open_session(config, args)?;
    rebuild(&mut session, args);

    let result = event_loop(&mut session, args, &rx);
    drop(watcher);
    session.teardown();
    result
}

fn event_loop(
    session: &mut BuildSession<ImageCodec>,
    args: &PassArgs,
    rx: &Receiver<notify::Result<notify::Event>>,
) -> Result<()> {
    let out_dir = args.out_dir();
    let out_dir = out_dir.canonicalize().unwrap_or(out_dir);
    let mut debouncer = Debouncer::new();

    while !is_shutdown() {
        match rx.recv_timeout(debouncer.sleep_duration()) {
            Ok(Ok(event)) => {
                if !touches_output(&event, &out_dir) {
                    debouncer.add_event(&event);
                }
            }
            Ok(Err(err)) => log!("watch"; "watcher error: {}", err),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if let Some(changed) = debouncer.take_if_ready() {
            debug!("watch"; "{} changed", plural_count(changed.len(), "path"));
            rebuild(session, args);
        }
    }
    Ok(())
}

/// Output written inside the watched tree must not trigger another pass.
fn touches_output(event: &notify::Event, out_dir: &Path) -> bool {
    !event.paths.is_empty() && event.paths.iter().all(|p| p.starts_with(out_dir))
}

/// Run one pass and report it on the status line.
fn rebuild(session: &mut BuildSession<ImageCodec>, args: &PassArgs) {
    match run_once(session, args, &CancelToken::linked()) {
        Ok(report) => report_pass(&report),
        Err(err) if matches!(err.downcast_ref::<PassError>(), Some(PassError::Cancelled)) => {
            status_warning("pass cancelled, output left unchanged");
        }
        Err(err) => status_error("pass failed", &format!("{err:#}")),
    }
}

fn report_pass(report: &PassReport) {
    let Some(transcode) = report.transcode() else {
        status_success(&format!("pass {} done", report.pass));
        return;
    };
    let message = format!(
        "pass {}: {} ({} reused)",
        report.pass,
        plural_count(transcode.emitted(), "image"),
        transcode.reused()
    );
    if transcode.failed() > 0 {
        status_error(&message, &format!("{} failed", plural_count(transcode.failed(), "image")));
    } else {
        status_success(&message);
    }
}
