//! Envelope fitting and budget-driven downsizing.
//!
//! ```text
//! native ──► fit to max_edge ──► proxy encode ──► ≤ budget? ── yes ──► done
//!                                     ▲                │
//!                                     │                no
//!                                     └── next smaller edge target (M·3/4, M·2/4, ...)
//! ```
//!
//! Every step resamples from the original pixels, and edge targets only
//! ever decrease, so the working image never grows back.

use super::codec::{Codec, Dimensions, EncodeSettings};
use super::error::TranscodeError;
use crate::debug;

/// Parameters for [`fit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeRequest {
    /// Envelope: maximum allowed width/height.
    pub max_edge: u32,
    /// Byte budget the proxy encoding should meet.
    pub byte_budget: usize,
    /// Number of edge targets, as fractions of `max_edge` (`S` → 1, (S-1)/S, ..., 1/S).
    /// `1` disables budget-driven shrinking.
    pub steps: u32,
    /// Encode settings whose output size stands in for the final size.
    pub proxy: EncodeSettings,
}

impl ResizeRequest {
    /// Edge target of step `k` (0-based): `floor(max_edge · (S − k) / S)`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn edge_target(&self, k: u32) -> u32 {
        let steps = u64::from(self.steps.max(1));
        let k = u64::from(k).min(steps - 1);
        ((u64::from(self.max_edge) * (steps - k)) / steps).max(1) as u32
    }
}

/// Working image produced by [`fit`].
#[derive(Debug)]
pub struct Resized<I> {
    pub image: I,
    pub dimensions: Dimensions,
    /// Index of the edge target applied last (0 = envelope only).
    pub step: u32,
    /// Size of the last proxy encoding, if one was made.
    pub proxy_size: Option<usize>,
}

impl<I> Resized<I> {
    /// Whether the working image is smaller than `native`.
    pub fn was_resized(&self, native: Dimensions) -> bool {
        self.dimensions != native
    }
}

/// Bring `original` within the envelope, then shrink while the proxy
/// encoding is over budget and edge targets remain.
pub fn fit<C: Codec>(
    codec: &C,
    original: C::Image,
    native: Dimensions,
    request: &ResizeRequest,
) -> Result<Resized<C::Image>, TranscodeError> {
    let mut dims = native.fit_within(request.max_edge);
    let mut working = if dims == native {
        None
    } else {
        debug!("resize"; "{} -> {} (envelope {})", native, dims, request.max_edge);
        Some(codec.resize(&original, dims).map_err(TranscodeError::Resize)?)
    };

    let mut step = 0;
    let mut proxy_size = None;

    if request.steps > 1 {
        loop {
            let current = working.as_ref().unwrap_or(&original);
            let size = codec
                .encode(current, request.proxy)
                .map_err(|source| TranscodeError::CodecEncode {
                    format: request.proxy.format,
                    source,
                })?
                .len();
            proxy_size = Some(size);

            if size <= request.byte_budget {
                break;
            }

            // Next target that actually shrinks the current dimensions
            let next = (step + 1..request.steps).find_map(|k| {
                let candidate = native.fit_within(request.edge_target(k));
                (candidate.max_edge() < dims.max_edge()).then_some((k, candidate))
            });
            let Some((k, candidate)) = next else {
                break;
            };

            debug!(
                "resize"; "{} over budget ({} > {} bytes), step {} -> {}",
                dims, size, request.byte_budget, k, candidate
            );
            step = k;
            dims = candidate;
            working = Some(codec.resize(&original, dims).map_err(TranscodeError::Resize)?);
        }
    }

    Ok(Resized {
        image: working.unwrap_or(original),
        dimensions: dims,
        step,
        proxy_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageFormat;
    use crate::image::mock::{MockCodec, MockImage};

    fn original(w: u32, h: u32) -> MockImage {
        MockImage {
            dims: Dimensions::new(w, h),
            tag: "photo".to_string(),
        }
    }

    fn request(max_edge: u32, byte_budget: usize, steps: u32) -> ResizeRequest {
        ResizeRequest {
            max_edge,
            byte_budget,
            steps,
            proxy: EncodeSettings {
                format: ImageFormat::Avif,
                quality: 100,
                effort: 0,
            },
        }
    }

    #[test]
    fn test_edge_targets_decrease() {
        let req = request(3840, 0, 4);
        let targets: Vec<_> = (0..4).map(|k| req.edge_target(k)).collect();
        assert_eq!(targets, vec![3840, 2880, 1920, 960]);
        // out-of-range steps clamp to the smallest target
        assert_eq!(req.edge_target(9), 960);
    }

    #[test]
    fn test_envelope_fit_then_within_budget() {
        // 4000x2000 → 3840x1920; proxy size = pixels / 100
        let codec = MockCodec::new().with_pixels_per_byte(100);
        let resized = fit(&codec, original(4000, 2000), Dimensions::new(4000, 2000), &request(3840, 100_000, 4))
            .unwrap();

        assert_eq!(resized.dimensions, Dimensions::new(3840, 1920));
        assert_eq!(resized.step, 0);
        assert_eq!(resized.proxy_size, Some(3840 * 1920 / 100));
        assert_eq!(codec.resizes(), vec![Dimensions::new(3840, 1920)]);
    }

    #[test]
    fn test_shrinks_until_budget_met() {
        let codec = MockCodec::new().with_pixels_per_byte(100);
        // 3840x1920 → 73_728 bytes; 2880x1440 → 41_472; 1920x960 → 18_432
        let resized = fit(&codec, original(4000, 2000), Dimensions::new(4000, 2000), &request(3840, 20_000, 4))
            .unwrap();

        assert_eq!(resized.dimensions, Dimensions::new(1920, 960));
        assert_eq!(resized.step, 2);
        assert_eq!(
            codec.resizes(),
            vec![
                Dimensions::new(3840, 1920),
                Dimensions::new(2880, 1440),
                Dimensions::new(1920, 960),
            ]
        );
    }

    #[test]
    fn test_stops_when_steps_exhausted() {
        let codec = MockCodec::new();
        let resized = fit(&codec, original(4000, 2000), Dimensions::new(4000, 2000), &request(3840, 1, 4))
            .unwrap();

        assert_eq!(resized.dimensions, Dimensions::new(960, 480));
        assert_eq!(resized.step, 3);
        assert!(resized.proxy_size.unwrap() > 1);
    }

    #[test]
    fn test_resizing_is_monotonic() {
        let codec = MockCodec::new();
        fit(&codec, original(5000, 3000), Dimensions::new(5000, 3000), &request(3840, 1, 8)).unwrap();

        let edges: Vec<_> = codec.resizes().iter().map(Dimensions::max_edge).collect();
        assert!(edges.windows(2).all(|w| w[1] < w[0]), "{edges:?}");
    }

    #[test]
    fn test_small_image_skips_non_shrinking_steps() {
        let codec = MockCodec::new();
        // 1000px edge: only the M/4 = 960 target shrinks it
        let resized = fit(&codec, original(1000, 500), Dimensions::new(1000, 500), &request(3840, 1, 4))
            .unwrap();

        assert_eq!(resized.dimensions, Dimensions::new(960, 480));
        assert_eq!(codec.resizes(), vec![Dimensions::new(960, 480)]);
        // one proxy encode per distinct size
        assert_eq!(codec.encode_count(ImageFormat::Avif), 2);
    }

    #[test]
    fn test_single_step_only_fits_envelope() {
        let codec = MockCodec::new();
        let resized = fit(&codec, original(4000, 2000), Dimensions::new(4000, 2000), &request(3840, 1, 1))
            .unwrap();

        assert_eq!(resized.dimensions, Dimensions::new(3840, 1920));
        assert_eq!(resized.proxy_size, None);
        assert_eq!(codec.encode_count(ImageFormat::Avif), 0);
    }

    #[test]
    fn test_untouched_image_returns_original() {
        let codec = MockCodec::new();
        let resized = fit(&codec, original(100, 80), Dimensions::new(100, 80), &request(3840, 1_000_000, 4))
            .unwrap();
        assert!(!resized.was_resized(Dimensions::new(100, 80)));
        assert!(codec.resizes().is_empty());
        assert_eq!(resized.image.tag, "photo");
    }

    #[test]
    fn test_proxy_failure_is_encode_error() {
        let codec = MockCodec::new().failing_on(ImageFormat::Avif);
        let err = fit(&codec, original(10, 10), Dimensions::new(10, 10), &request(3840, 1, 4)).unwrap_err();
        assert!(matches!(err, TranscodeError::CodecEncode { .. }));
    }
}
