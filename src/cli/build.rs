//! `blaze build`: one pass from disk to disk.

use std::path::Path;

use anyhow::{Context, Result};

use super::PassArgs;
use crate::asset::{AssetSet, scan_dir, write_dir};
use crate::config::StageConfig;
use crate::core::CancelToken;
use crate::image::ImageCodec;
use crate::log;
use crate::pipeline::{BuildSession, PassReport};
use crate::utils::plural::plural_count;
use crate::utils::size::format_bytes;

/// Open a session with the built-in codec.
pub fn open_session(config: StageConfig, args: &PassArgs) -> Result<BuildSession<ImageCodec>> {
    let session = BuildSession::init(config, ImageCodec::new())
        .context("failed to start transcode workers")?
        .with_progress(!args.quiet);
    Ok(session)
}

/// Scan, run a pass, write. Returns the pass report.
pub fn run_once(
    session: &mut BuildSession<ImageCodec>,
    args: &PassArgs,
    cancel: &CancelToken,
) -> Result<PassReport> {
    let out_dir = args.out_dir();
    let input = load_input(&args.path, &out_dir)?;
    let (output, report) = session.run_pass(input, cancel)?;
    write_dir(&output, &out_dir, !args.no_clean)?;

    log!(
        "build";
        "pass {}: {} ({}) written to {} in {:.2?}",
        report.pass,
        plural_count(output.len(), "asset"),
        format_bytes(output.total_bytes()),
        out_dir.display(),
        report.elapsed
    );
    Ok(report)
}

pub fn build(config: StageConfig, args: &PassArgs) -> Result<()> {
    log!("build"; "{} mode", config.mode.label());
    let mut session = open_session(config, args)?;
    let result = run_once(&mut session, args, &CancelToken::linked());
    session.teardown();

    let report = result?;
    if let Some(transcode) = report.transcode()
        && transcode.failed() > 0
    {
        log!("error"; "{} could not be transcoded", plural_count(transcode.failed(), "image"));
    }
    Ok(())
}

fn load_input(path: &Path, out_dir: &Path) -> Result<AssetSet> {
    if !path.is_dir() {
        anyhow::bail!("input `{}` is not a directory", path.display());
    }
    scan_dir(path, Some(out_dir))
}
