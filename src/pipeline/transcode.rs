//! Transcode stage: raster images → size-budgeted variants.
//!
//! ```text
//! candidates ──► fingerprint ──► group by content ──► par_iter (pool)
//!                                                      │
//!                          cache.get_or_transcode ◄────┘
//!                                  │ miss
//!                   probe → decode → fit → search per format
//!
//! prune cache ──► emit: delete original, add `<stem>.<ext>` per format
//! ```
//!
//! Identical content under several paths is transcoded once; each path
//! still gets its own variants, grouped by its original path.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use super::error::PassError;
use super::stage::{PassContext, Stage, StageReport};
use crate::asset::{Asset, AssetSet};
use crate::cache::{CacheOutcome, Variant, Variants};
use crate::config::StageConfig;
use crate::fingerprint::{Fingerprint, fingerprint};
use crate::image::{Codec, TranscodeError, fit, search_quality};
use crate::logger::ProgressLine;
use crate::utils::plural::plural_count;
use crate::utils::size::format_bytes;
use crate::{debug, log};

type Outcome = Result<(Variants, CacheOutcome), TranscodeError>;

/// What happened to one candidate image.
#[derive(Debug, Clone)]
pub enum ImageState {
    /// Replaced by its variants.
    Emitted(CacheOutcome),
    /// A codec step failed; the original is kept.
    Failed(TranscodeError),
    /// Dimensions could not be read; the original is kept.
    Skipped(TranscodeError),
}

#[derive(Debug, Clone)]
pub struct ImageResult {
    pub path: String,
    pub fingerprint: Fingerprint,
    pub state: ImageState,
}

#[derive(Debug, Clone, Default)]
pub struct TranscodeReport {
    /// One result per candidate, in path order.
    pub images: Vec<ImageResult>,
    /// Distinct fingerprints among the candidates.
    pub distinct: usize,
    /// Cache entries dropped by the prune.
    pub pruned: usize,
    /// Variant assets added to the set.
    pub variants: usize,
    /// Bytes of the replaced originals and of their variants.
    pub bytes_before: usize,
    pub bytes_after: usize,
}

impl TranscodeReport {
    pub fn emitted(&self) -> usize {
        self.count(|s| matches!(s, ImageState::Emitted(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ImageState::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ImageState::Skipped(_)))
    }

    /// Candidates served without running the codec.
    pub fn reused(&self) -> usize {
        self.count(|s| {
            matches!(s, ImageState::Emitted(CacheOutcome::Hit | CacheOutcome::Shared))
        })
    }

    pub fn state_of(&self, path: &str) -> Option<&ImageState> {
        self.images.iter().find(|r| r.path == path).map(|r| &r.state)
    }

    fn count(&self, pred: impl Fn(&ImageState) -> bool) -> usize {
        self.images.iter().filter(|r| pred(&r.state)).count()
    }
}

pub struct TranscodeStage;

impl<C: Codec> Stage<C> for TranscodeStage {
    fn name(&self) -> &'static str {
        "transcode"
    }

    fn run(&self, assets: &mut AssetSet, ctx: &PassContext<'_, C>) -> Result<StageReport, PassError> {
        transcode_assets(assets, ctx).map(StageReport::Transcode)
    }
}

/// Whether `asset` should be transcoded under `config`.
fn is_candidate(asset: &Asset, config: &StageConfig) -> bool {
    let ext = asset.extension().to_ascii_lowercase();
    if !config.image_extensions.contains(&ext) {
        return false;
    }
    let under_dir = |path: &str| {
        let path = path.trim_start_matches('/');
        config.image_dir.is_empty()
            || path
                .strip_prefix(config.image_dir.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    };
    under_dir(&asset.path) || asset.source_path.as_deref().is_some_and(under_dir)
}

fn transcode_assets<C: Codec>(
    assets: &mut AssetSet,
    ctx: &PassContext<'_, C>,
) -> Result<TranscodeReport, PassError> {
    let candidates: Vec<&Asset> = assets.iter().filter(|a| is_candidate(a, ctx.config)).collect();

    let fingerprints: Vec<Fingerprint> =
        ctx.pool.install(|| candidates.par_iter().map(|a| fingerprint(&a.bytes)).collect());

    // fingerprint → paths (path order preserved from the set)
    let mut groups: BTreeMap<Fingerprint, Vec<&Asset>> = BTreeMap::new();
    for (asset, fp) in candidates.iter().zip(&fingerprints) {
        groups.entry(*fp).or_default().push(*asset);
    }

    if !candidates.is_empty() {
        debug!(
            "transcode"; "{} ({} distinct)",
            plural_count(candidates.len(), "candidate"),
            groups.len()
        );
    }
    ctx.check_cancelled()?;

    let progress = (ctx.progress && !groups.is_empty())
        .then(|| ProgressLine::new("transcode", &[("images", groups.len())]));

    let outcomes: Vec<(Fingerprint, Option<Outcome>)> =
        ctx.pool.install(|| {
            groups
                .par_iter()
                .map(|(fp, members)| {
                    if ctx.cancel.is_cancelled() {
                        return (*fp, None);
                    }
                    let first = members[0];
                    let result = ctx.cache.get_or_transcode(*fp, first.origin(), || {
                        transcode_image(ctx.codec, ctx.config, &first.bytes, &first.path)
                    });
                    if result.is_ok() {
                        for other in &members[1..] {
                            ctx.cache.attach_source(fp, other.origin());
                        }
                    }
                    if let Some(p) = &progress {
                        p.inc("images");
                    }
                    (*fp, Some(result))
                })
                .collect()
        });

    if let Some(p) = progress {
        p.finish();
    }
    ctx.check_cancelled()?;

    let mut report = TranscodeReport {
        distinct: groups.len(),
        ..Default::default()
    };

    // Resolve every outcome against owned paths before the set is mutated
    let mut plans: Vec<(String, Fingerprint, Outcome)> = Vec::with_capacity(candidates.len());
    let by_fp: BTreeMap<Fingerprint, Outcome> = outcomes
        .into_iter()
        .filter_map(|(fp, result)| result.map(|r| (fp, r)))
        .collect();
    for (fp, members) in &groups {
        let Some(result) = by_fp.get(fp) else {
            return Err(PassError::Cancelled);
        };
        for (i, member) in members.iter().enumerate() {
            // Only the first member ran (or shared) the transcode; the rest reuse it
            let result = match result {
                Ok((variants, outcome)) if i == 0 => Ok((Arc::clone(variants), *outcome)),
                Ok((variants, _)) => Ok((Arc::clone(variants), CacheOutcome::Hit)),
                Err(err) => Err(err.clone()),
            };
            plans.push((member.path.clone(), *fp, result));
        }
    }
    drop(groups);
    drop(candidates);
    plans.sort_by(|a, b| a.0.cmp(&b.0));

    // Entries whose sources vanished; the originals are still in the set here
    report.pruned = ctx.cache.prune(assets);
    if report.pruned > 0 {
        log!("cache"; "pruned {} stale", plural_count(report.pruned, "image"));
    }

    let mut conflicts = variant_conflicts(assets, &plans);
    for (path, fp, result) in plans {
        let result = result.and_then(|ok| match conflicts.remove(&path) {
            Some(taken) => Err(TranscodeError::VariantPathTaken(taken)),
            None => Ok(ok),
        });
        let state = match result {
            Ok((variants, outcome)) => {
                let (before, after) = emit_variants(assets, &path, &variants);
                report.bytes_before += before;
                report.bytes_after += after;
                report.variants += variants.len();
                ImageState::Emitted(outcome)
            }
            Err(err) if err.is_probe_failure() => {
                log!("transcode"; "skipping {}: {}", path, error_chain(&err));
                ImageState::Skipped(err)
            }
            Err(err) => {
                log!("error"; "{}: {}", path, error_chain(&err));
                ImageState::Failed(err)
            }
        };
        report.images.push(ImageResult {
            path,
            fingerprint: fp,
            state,
        });
    }

    if !report.images.is_empty() {
        log!(
            "transcode";
            "{} -> {} ({} -> {}, {} reused)",
            plural_count(report.emitted(), "image"),
            plural_count(report.variants, "variant"),
            format_bytes(report.bytes_before),
            format_bytes(report.bytes_after),
            report.reused()
        );
    }

    Ok(report)
}

/// Candidates whose variant paths are held by another asset, or claimed by
/// a candidate earlier in path order, mapped to the first blocked path.
///
/// Those candidates keep their originals.
fn variant_conflicts(
    assets: &AssetSet,
    plans: &[(String, Fingerprint, Outcome)],
) -> FxHashMap<String, String> {
    let mut claimed: FxHashSet<String> = FxHashSet::default();
    let mut conflicts = FxHashMap::default();
    for (path, _, result) in plans {
        let (Ok((variants, _)), Some(original)) = (result, assets.get(path)) else {
            continue;
        };
        let stem = original.path_without_extension();
        let targets: Vec<String> = variants.iter().map(|v| variant_path(stem, v)).collect();
        let blocked = targets
            .iter()
            .find(|t| claimed.contains(*t) || (*t != path && assets.contains(t)));
        match blocked {
            Some(taken) => {
                conflicts.insert(path.clone(), taken.clone());
            }
            None => claimed.extend(targets),
        }
    }
    conflicts
}

#[inline]
fn variant_path(stem: &str, variant: &Variant) -> String {
    format!("{stem}.{}", variant.format.extension())
}

/// Replace the original at `path` with one asset per variant.
///
/// Returns the original size and the total variant size.
fn emit_variants(assets: &mut AssetSet, path: &str, variants: &[Variant]) -> (usize, usize) {
    let Some(original) = assets.delete(path) else {
        return (0, 0);
    };
    let stem = original.path_without_extension();
    let mut after = 0;
    for variant in variants {
        let mut asset = Asset::new(variant_path(stem, variant), Arc::clone(&variant.bytes))
            .with_sibling_group(original.path.as_str());
        if let Some(source) = &original.source_path {
            asset = asset.with_source(source.as_str());
        }
        after += asset.len();
        assets.emit(asset);
    }
    (original.len(), after)
}

/// Transcode one image into every configured format.
///
/// Each format's search starts at the quality the previous format settled on.
pub fn transcode_image<C: Codec>(
    codec: &C,
    config: &StageConfig,
    bytes: &[u8],
    path: &str,
) -> Result<Variants, TranscodeError> {
    let native = codec.probe(bytes).map_err(TranscodeError::DimensionProbe)?;
    let original = codec.decode(bytes).map_err(TranscodeError::Decode)?;
    let resized = fit(codec, original, native, &config.resize_request())?;
    if resized.was_resized(native) {
        debug!("transcode"; "{}: {} -> {}", path, native, resized.dimensions);
    }

    let mut carried = None;
    let mut variants = Vec::with_capacity(config.formats.len());
    for &format in &config.formats {
        let encoded = search_quality(
            codec,
            &resized.image,
            format,
            config.byte_budget,
            &config.policy,
            carried,
        )?;

        if encoded.budget_met {
            debug!(
                "transcode"; "{} -> {}: quality {} effort {} ({}, {})",
                path,
                format,
                encoded.quality,
                config.policy.codec_effort,
                format_bytes(encoded.bytes.len()),
                plural_count(encoded.attempts as usize, "attempt")
            );
        } else {
            log!(
                "transcode";
                "{} -> {}: over budget ({} > {}) at quality {}",
                path,
                format,
                format_bytes(encoded.bytes.len()),
                format_bytes(config.byte_budget),
                encoded.quality
            );
        }

        carried = Some(encoded.quality);
        variants.push(Variant {
            format,
            bytes: Arc::from(encoded.bytes),
            quality: encoded.quality,
            budget_met: encoded.budget_met,
        });
    }

    Ok(Arc::from(variants))
}

/// `error: cause: cause` on one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TranscodeCache;
    use crate::core::{BuildMode, CancelToken};
    use crate::image::mock::{MockCodec, mock_image};
    use crate::image::{Dimensions, ImageFormat};
    use rayon::ThreadPoolBuilder;

    struct Harness {
        config: StageConfig,
        codec: MockCodec,
        cache: TranscodeCache,
        pool: rayon::ThreadPool,
        cancel: CancelToken,
    }

    impl Harness {
        fn new(codec: MockCodec) -> Self {
            let mut config = StageConfig::for_mode(BuildMode::Production);
            config.byte_budget = 1_000_000;
            Self {
                cache: TranscodeCache::init(config.cache_capacity),
                config,
                codec,
                pool: ThreadPoolBuilder::new().num_threads(4).build().unwrap(),
                cancel: CancelToken::new(),
            }
        }

        fn run(&self, assets: &mut AssetSet) -> Result<TranscodeReport, PassError> {
            let ctx = PassContext {
                config: &self.config,
                codec: &self.codec,
                cache: &self.cache,
                pool: &self.pool,
                cancel: &self.cancel,
                progress: false,
            };
            transcode_assets(assets, &ctx)
        }
    }

    fn image_asset(path: &str, w: u32, h: u32, tag: &str) -> Asset {
        Asset::new(path, mock_image(w, h, tag)).with_source(path)
    }

    #[test]
    fn test_candidate_selection() {
        let config = StageConfig::for_mode(BuildMode::Production);
        assert!(is_candidate(&Asset::new("img/a.png", vec![1]), &config));
        assert!(is_candidate(&Asset::new("img/deep/a.PNG", vec![1]), &config));
        assert!(!is_candidate(&Asset::new("img/a.jpg", vec![1]), &config));
        assert!(!is_candidate(&Asset::new("a.png", vec![1]), &config));
        assert!(!is_candidate(&Asset::new("imgs/a.png", vec![1]), &config));
        // bundler output outside `img/` whose source lives there
        let hashed = Asset::new("static/3f2a.png", vec![1]).with_source("img/logo.png");
        assert!(is_candidate(&hashed, &config));
    }

    #[test]
    fn test_identical_images_transcoded_once() {
        let harness = Harness::new(MockCodec::new());
        let mut assets: AssetSet = [
            image_asset("img/a.png", 40, 20, "same"),
            image_asset("img/b.png", 40, 20, "same"),
            Asset::new("index.html", b"<html>".to_vec()),
        ]
        .into_iter()
        .collect();

        let report = harness.run(&mut assets).unwrap();

        assert_eq!(harness.codec.decode_count(), 1);
        // one resize proxy + one first-fit search encode
        assert_eq!(harness.codec.encode_count(ImageFormat::Avif), 2);
        assert_eq!(harness.codec.encode_count(ImageFormat::Webp), 1);
        assert_eq!(report.emitted(), 2);
        assert_eq!(report.distinct, 1);
        assert_eq!(report.reused(), 1);

        let paths: Vec<_> = assets.paths().collect();
        assert_eq!(
            paths,
            vec!["img/a.avif", "img/a.webp", "img/b.avif", "img/b.webp", "index.html"]
        );
        assert_eq!(assets.get("img/b.webp").unwrap().sibling_group.as_deref(), Some("img/b.png"));
        assert_eq!(assets.get("img/a.avif").unwrap().source_path.as_deref(), Some("img/a.png"));

        // both sources recorded on the single entry
        let fp = fingerprint(&mock_image(40, 20, "same"));
        let sources = harness.cache.sources(&fp).unwrap();
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn test_failed_format_emits_nothing() {
        let harness = Harness::new(MockCodec::new().failing_on(ImageFormat::Webp));
        let mut assets: AssetSet = [image_asset("img/a.png", 10, 10, "a")].into_iter().collect();

        let report = harness.run(&mut assets).unwrap();

        assert!(matches!(report.state_of("img/a.png"), Some(ImageState::Failed(_))));
        assert_eq!(assets.paths().collect::<Vec<_>>(), vec!["img/a.png"]);
        assert!(harness.cache.is_empty());
    }

    #[test]
    fn test_unreadable_image_is_skipped() {
        let harness = Harness::new(MockCodec::new());
        let mut assets: AssetSet = [
            Asset::new("img/broken.png", b"not an image".to_vec()),
            image_asset("img/ok.png", 10, 10, "ok"),
        ]
        .into_iter()
        .collect();

        let report = harness.run(&mut assets).unwrap();

        assert!(matches!(report.state_of("img/broken.png"), Some(ImageState::Skipped(_))));
        assert!(assets.contains("img/broken.png"));
        assert!(assets.contains("img/ok.avif"));
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.emitted(), 1);
    }

    #[test]
    fn test_oversized_image_fits_envelope() {
        let harness = Harness::new(MockCodec::new().with_pixels_per_byte(1000));
        let mut assets: AssetSet = [image_asset("img/wide.png", 4000, 2000, "wide")].into_iter().collect();

        harness.run(&mut assets).unwrap();

        assert_eq!(harness.codec.resizes(), vec![Dimensions::new(3840, 1920)]);
        assert!(assets.contains("img/wide.avif"));
    }

    #[test]
    fn test_second_pass_hits_cache_and_prunes_vanished() {
        let harness = Harness::new(MockCodec::new());
        let pass = |names: &[&str]| -> AssetSet {
            names.iter().map(|n| image_asset(n, 12, 12, n)).collect()
        };

        harness.run(&mut pass(&["img/a.png", "img/b.png"])).unwrap();
        assert_eq!(harness.cache.len(), 2);
        harness.codec.clear_ops();

        // b.png removed, a.png unchanged
        let mut second = pass(&["img/a.png"]);
        let report = harness.run(&mut second).unwrap();

        assert_eq!(harness.codec.decode_count(), 0);
        assert!(matches!(report.state_of("img/a.png"), Some(ImageState::Emitted(CacheOutcome::Hit))));
        assert_eq!(report.pruned, 1);
        assert_eq!(harness.cache.len(), 1);
    }

    #[test]
    fn test_quality_carried_between_formats() {
        let harness = Harness::new(MockCodec::new());
        let mut config = harness.config.clone();
        // 100x100 at quality q → q*100 bytes
        config.byte_budget = 8_000;
        let variants = transcode_image(&harness.codec, &config, &mock_image(100, 100, "q"), "img/q.png").unwrap();

        assert_eq!(variants[0].format, ImageFormat::Avif);
        assert_eq!(variants[0].quality, 80);
        assert_eq!(variants[1].quality, 80);
        assert!(variants.iter().all(|v| v.budget_met));
    }

    #[test]
    fn test_shared_stem_keeps_later_original() {
        let mut harness = Harness::new(MockCodec::new());
        harness.config.image_extensions = vec!["png".to_string(), "jpg".to_string()];
        let mut assets: AssetSet = [
            image_asset("img/a.png", 10, 10, "png"),
            image_asset("img/a.jpg", 10, 10, "jpg"),
        ]
        .into_iter()
        .collect();

        let report = harness.run(&mut assets).unwrap();

        // a.jpg sorts first and claims a.avif / a.webp
        assert!(matches!(report.state_of("img/a.jpg"), Some(ImageState::Emitted(_))));
        assert!(matches!(
            report.state_of("img/a.png"),
            Some(ImageState::Failed(TranscodeError::VariantPathTaken(taken))) if taken == "img/a.avif"
        ));
        assert_eq!(
            assets.paths().collect::<Vec<_>>(),
            vec!["img/a.avif", "img/a.png", "img/a.webp"]
        );
        assert_eq!(assets.get("img/a.avif").unwrap().sibling_group.as_deref(), Some("img/a.jpg"));
        assert_eq!(report.emitted(), 1);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_existing_asset_at_variant_path_is_kept() {
        let harness = Harness::new(MockCodec::new());
        let mut assets: AssetSet = [
            image_asset("img/a.png", 10, 10, "a"),
            Asset::new("img/a.webp", b"hand-tuned".to_vec()),
        ]
        .into_iter()
        .collect();

        let report = harness.run(&mut assets).unwrap();

        assert!(matches!(report.state_of("img/a.png"), Some(ImageState::Failed(_))));
        assert_eq!(assets.paths().collect::<Vec<_>>(), vec!["img/a.png", "img/a.webp"]);
        assert_eq!(&*assets.get("img/a.webp").unwrap().bytes, b"hand-tuned");
    }

    #[test]
    fn test_own_format_replaces_original_in_place() {
        let mut harness = Harness::new(MockCodec::new());
        harness.config.formats = vec![ImageFormat::Avif, ImageFormat::Png];
        let mut assets: AssetSet = [image_asset("img/a.png", 10, 10, "a")].into_iter().collect();

        let report = harness.run(&mut assets).unwrap();

        assert_eq!(report.emitted(), 1);
        assert_eq!(assets.paths().collect::<Vec<_>>(), vec!["img/a.avif", "img/a.png"]);
        assert_eq!(assets.get("img/a.png").unwrap().sibling_group.as_deref(), Some("img/a.png"));
    }

    #[test]
    fn test_cancelled_pass() {
        let harness = Harness::new(MockCodec::new());
        harness.cancel.cancel();
        let mut assets: AssetSet = [image_asset("img/a.png", 10, 10, "a")].into_iter().collect();

        let err = harness.run(&mut assets).unwrap_err();
        assert!(matches!(err, PassError::Cancelled));
        assert_eq!(harness.codec.decode_count(), 0);
    }
}
