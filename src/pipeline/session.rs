//! Build session: owns the cache across passes.
//!
//! ```text
//! init ──► run_pass ──► run_pass ──► ... ──► teardown
//!           (build)      (watch rebuilds reuse the cache)
//! ```

use std::time::{Duration, Instant};

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use super::error::PassError;
use super::stage::{PassContext, StageReport, resolve_stages};
use crate::asset::AssetSet;
use crate::cache::{CacheStats, TranscodeCache};
use crate::config::StageConfig;
use crate::core::CancelToken;
use crate::image::Codec;
use crate::utils::plural::plural_count;
use crate::{debug, log};

/// Summary of one pass.
#[derive(Debug)]
pub struct PassReport {
    /// 1-based pass number within the session.
    pub pass: usize,
    pub stages: Vec<StageReport>,
    pub elapsed: Duration,
}

impl PassReport {
    pub fn transcode(&self) -> Option<&super::TranscodeReport> {
        self.stages.iter().find_map(StageReport::as_transcode)
    }

    pub fn rename(&self) -> Option<&super::RenameReport> {
        self.stages.iter().find_map(StageReport::as_rename)
    }
}

pub struct BuildSession<C: Codec> {
    config: StageConfig,
    codec: C,
    cache: TranscodeCache,
    pool: ThreadPool,
    passes: usize,
    progress: bool,
}

impl<C: Codec + 'static> BuildSession<C> {
    /// Start a session with an empty cache and a worker pool of
    /// `config.workers` threads.
    pub fn init(config: StageConfig, codec: C) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers.max(1))
            .thread_name(|i| format!("blaze-transcode-{i}"))
            .build()?;
        debug!(
            "session";
            "{} mode, {}, budget {} bytes",
            config.mode.label(),
            plural_count(config.workers.max(1), "worker"),
            config.byte_budget
        );
        Ok(Self {
            cache: TranscodeCache::init(config.cache_capacity),
            config,
            codec,
            pool,
            passes: 0,
            progress: false,
        })
    }

    /// Show a progress line while transcoding.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn cache(&self) -> &TranscodeCache {
        &self.cache
    }

    /// Run every configured stage over `assets`.
    ///
    /// On error the partially processed set is dropped; the cache keeps
    /// whatever complete entries were inserted.
    pub fn run_pass(
        &mut self,
        mut assets: AssetSet,
        cancel: &CancelToken,
    ) -> Result<(AssetSet, PassReport), PassError> {
        let started = Instant::now();
        self.passes += 1;
        let stages = resolve_stages::<C>(&self.config.stages)?;

        let ctx = PassContext {
            config: &self.config,
            codec: &self.codec,
            cache: &self.cache,
            pool: &self.pool,
            cancel,
            progress: self.progress,
        };

        let mut reports = Vec::with_capacity(stages.len());
        for stage in &stages {
            ctx.check_cancelled()?;
            debug!("session"; "pass {}: {}", self.passes, stage.name());
            reports.push(stage.run(&mut assets, &ctx)?);
        }

        Ok((
            assets,
            PassReport {
                pass: self.passes,
                stages: reports,
                elapsed: started.elapsed(),
            },
        ))
    }

    /// End the session, clearing the cache.
    pub fn teardown(self) -> CacheStats {
        let stats = self.cache.teardown();
        log!(
            "cache";
            "session closed after {} passes: {} hits, {} misses, {} pruned",
            self.passes,
            stats.hits,
            stats.misses,
            stats.pruned
        );
        stats
    }
}
