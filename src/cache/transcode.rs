//! Fingerprint → variants cache with per-fingerprint work deduplication.
//!
//! # Invariants
//!
//! - At most one entry per fingerprint.
//! - An entry holds every configured format or does not exist: failed
//!   transcodes never insert.
//! - Concurrent requests for one fingerprint run the codec once; later
//!   callers block on the slot and observe the first caller's result.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::asset::AssetSet;
use crate::fingerprint::Fingerprint;
use crate::image::{ImageFormat, TranscodeError};
use crate::{debug, log};

/// One encoded variant of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub format: ImageFormat,
    pub bytes: Arc<[u8]>,
    /// Quality the search settled on.
    pub quality: u8,
    pub budget_met: bool,
}

/// Complete variant set of one image, in configured format order.
pub type Variants = Arc<[Variant]>;

/// Cached result for one fingerprint.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Source paths known to carry this content.
    pub sources: BTreeSet<String>,
    pub variants: Variants,
}

/// How a [`TranscodeCache::get_or_transcode`] call was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Served from an existing entry.
    Hit,
    /// Another caller was transcoding the same fingerprint; its result was reused.
    Shared,
    /// This caller ran the transcode.
    Computed,
}

/// Counters over the cache lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub inserts: usize,
    pub pruned: usize,
    pub clears: usize,
}

/// Result slot shared by concurrent callers for one fingerprint.
type Slot = Arc<Mutex<Option<Result<Variants, TranscodeError>>>>;

/// Session-scoped transcode cache.
pub struct TranscodeCache {
    entries: DashMap<Fingerprint, CacheEntry>,
    /// In-flight fingerprints → result slot
    inflight: DashMap<Fingerprint, Slot>,
    /// Entry count at which the cache is cleared before the next insert
    capacity: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
    inserts: AtomicUsize,
    pruned: AtomicUsize,
    clears: AtomicUsize,
}

impl TranscodeCache {
    /// Start an empty cache for a new session.
    pub fn init(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            inflight: DashMap::new(),
            capacity: capacity.max(1),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
            pruned: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
        }
    }

    /// Cached variants for `fp`, if any.
    pub fn lookup(&self, fp: &Fingerprint) -> Option<Variants> {
        self.entries.get(fp).map(|e| Arc::clone(&e.variants))
    }

    /// Insert a complete variant set.
    ///
    /// Only call once every configured format succeeded.
    pub fn insert(&self, fp: Fingerprint, source: &str, variants: Variants) {
        if !self.entries.contains_key(&fp) && self.entries.len() >= self.capacity {
            log!("cache"; "{} entries reached capacity, clearing", self.entries.len());
            self.entries.clear();
            self.clears.fetch_add(1, Ordering::Relaxed);
        }

        self.entries
            .entry(fp)
            .and_modify(|entry| {
                entry.sources.insert(source.to_string());
                entry.variants = Arc::clone(&variants);
            })
            .or_insert_with(|| CacheEntry {
                sources: BTreeSet::from([source.to_string()]),
                variants: Arc::clone(&variants),
            });
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Return cached variants for `fp`, or run `transcode` exactly once
    /// across concurrent callers and cache its success.
    ///
    /// `source` is recorded on the entry in every successful case so
    /// pruning keeps entries that are still referenced.
    pub fn get_or_transcode<F>(
        &self,
        fp: Fingerprint,
        source: &str,
        transcode: F,
    ) -> Result<(Variants, CacheOutcome), TranscodeError>
    where
        F: FnOnce() -> Result<Variants, TranscodeError>,
    {
        if let Some(variants) = self.hit(&fp, source) {
            return Ok((variants, CacheOutcome::Hit));
        }

        let slot: Slot = Arc::clone(self.inflight.entry(fp).or_default().value());
        let mut state = slot.lock();

        // Someone else finished while we waited for the slot
        if let Some(done) = state.as_ref() {
            let done = done.clone();
            drop(state);
            self.release(&fp);
            return done.map(|variants| {
                self.attach_source(&fp, source);
                (variants, CacheOutcome::Shared)
            });
        }
        if let Some(variants) = self.hit(&fp, source) {
            drop(state);
            self.release(&fp);
            return Ok((variants, CacheOutcome::Hit));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = transcode();
        if let Ok(variants) = &result {
            self.insert(fp, source, Arc::clone(variants));
        }
        *state = Some(result.clone());
        drop(state);
        self.release(&fp);

        result.map(|variants| (variants, CacheOutcome::Computed))
    }

    /// Drop sources absent from `assets`; remove entries left without any.
    ///
    /// Returns the number of removed entries.
    pub fn prune(&self, assets: &AssetSet) -> usize {
        let origins = assets.origins();
        let before = self.entries.len();
        self.entries.retain(|fp, entry| {
            entry.sources.retain(|s| origins.contains(s.as_str()));
            let keep = !entry.sources.is_empty();
            if !keep {
                debug!("cache"; "prune {}", fp);
            }
            keep
        });
        let removed = before.saturating_sub(self.entries.len());
        self.pruned.fetch_add(removed, Ordering::Relaxed);
        removed
    }

    /// Clear everything at the end of a session and report lifetime stats.
    pub fn teardown(&self) -> CacheStats {
        let stats = self.stats();
        self.entries.clear();
        self.inflight.clear();
        stats
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Source paths recorded for `fp`.
    pub fn sources(&self, fp: &Fingerprint) -> Option<BTreeSet<String>> {
        self.entries.get(fp).map(|e| e.sources.clone())
    }

    fn hit(&self, fp: &Fingerprint, source: &str) -> Option<Variants> {
        let mut entry = self.entries.get_mut(fp)?;
        if !entry.sources.contains(source) {
            entry.sources.insert(source.to_string());
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(Arc::clone(&entry.variants))
    }

    /// Record another source for an existing entry.
    ///
    /// Returns `false` if `fp` has no entry.
    pub fn attach_source(&self, fp: &Fingerprint, source: &str) -> bool {
        match self.entries.get_mut(fp) {
            Some(mut entry) => {
                entry.sources.insert(source.to_string());
                true
            }
            None => false,
        }
    }

    /// Forget the in-flight slot once no other caller holds it.
    fn release(&self, fp: &Fingerprint) {
        // map + our clone == 2; more means someone is still waiting on it
        self.inflight.remove_if(fp, |_, slot| Arc::strong_count(slot) <= 2);
    }
}
