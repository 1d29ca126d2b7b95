//! Descending quality search under a byte budget.
//!
//! Quality starts high and drops by a fixed step until an encoding fits the
//! budget or the attempt bound is reached. The search never fails because
//! of the budget: if nothing fits, the last (lowest quality) encoding wins.

use serde::{Deserialize, Serialize};

use super::codec::{Codec, EncodeSettings, ImageFormat};
use super::error::TranscodeError;
use crate::core::BuildMode;

/// Lowest quality the search will ever request.
const MIN_QUALITY: u8 = 1;
const MAX_QUALITY: u8 = 100;

/// Numeric policy of the quality search.
///
/// Defaults differ per [`BuildMode`]; every field can be overridden in
/// the `[search]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPolicy {
    /// Upper bound on encode calls per format.
    pub max_attempts: u32,
    /// Quality decrement between attempts.
    pub quality_step: u8,
    /// Quality of the first attempt when no hint is carried.
    pub starting_quality: u8,
    /// Encoder effort, 0 (fastest) ..= 9.
    pub codec_effort: u8,
}

impl SearchPolicy {
    /// Few coarse attempts at fastest effort.
    pub const DEVELOPMENT: Self = Self {
        max_attempts: 4,
        quality_step: 20,
        starting_quality: 90,
        codec_effort: 0,
    };

    /// Fine-grained search at high effort.
    pub const PRODUCTION: Self = Self {
        max_attempts: 15,
        quality_step: 5,
        starting_quality: 100,
        codec_effort: 6,
    };

    pub const fn for_mode(mode: BuildMode) -> Self {
        match mode {
            BuildMode::Development => Self::DEVELOPMENT,
            BuildMode::Production => Self::PRODUCTION,
        }
    }

    /// Quality of attempt `n` (0-based) when starting from `start`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn quality_at(&self, start: u8, n: u32) -> u8 {
        let drop = u32::from(self.quality_step).saturating_mul(n);
        let q = u32::from(clamp_quality(start)).saturating_sub(drop);
        (q as u8).max(MIN_QUALITY)
    }

    /// Lowest quality a full search from `starting_quality` reaches.
    pub fn floor_quality(&self) -> u8 {
        self.quality_at(self.starting_quality, self.max_attempts.saturating_sub(1))
    }
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self::PRODUCTION
    }
}

/// Result of a quality search for one format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
    /// Quality of the returned encoding; carried into the next format.
    pub quality: u8,
    /// Encode calls made.
    pub attempts: u32,
    /// Whether `bytes` fits the budget.
    pub budget_met: bool,
}

/// Find the first quality (descending) whose encoding fits `budget`.
///
/// `carried` seeds the start quality, typically with the quality the
/// previous format of the same image settled on.
pub fn search_quality<C: Codec>(
    codec: &C,
    image: &C::Image,
    format: ImageFormat,
    budget: usize,
    policy: &SearchPolicy,
    carried: Option<u8>,
) -> Result<Encoded, TranscodeError> {
    let start = clamp_quality(carried.unwrap_or(policy.starting_quality));
    // Lossless encoders ignore quality: one attempt says everything
    let max_attempts = if codec.quality_sensitive(format) {
        policy.max_attempts.max(1)
    } else {
        1
    };

    let mut last: Option<Encoded> = None;
    for n in 0..max_attempts {
        let quality = policy.quality_at(start, n);
        let bytes = codec
            .encode(
                image,
                EncodeSettings {
                    format,
                    quality,
                    effort: policy.codec_effort,
                },
            )
            .map_err(|source| TranscodeError::CodecEncode { format, source })?;

        let budget_met = bytes.len() <= budget;
        let encoded = Encoded {
            format,
            bytes,
            quality,
            attempts: n + 1,
            budget_met,
        };
        if budget_met || quality == MIN_QUALITY {
            return Ok(encoded);
        }
        last = Some(encoded);
    }

    // max_attempts >= 1, so at least one encode happened
    last.ok_or_else(|| TranscodeError::CodecEncode {
        format,
        source: super::CodecError::Encode {
            format,
            reason: "no encode attempted".to_string(),
        },
    })
}

#[inline]
fn clamp_quality(q: u8) -> u8 {
    q.clamp(MIN_QUALITY, MAX_QUALITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Dimensions;
    use crate::image::mock::{MockCodec, MockImage, RecordedOp};

    fn image(w: u32, h: u32) -> MockImage {
        MockImage {
            dims: Dimensions::new(w, h),
            tag: String::new(),
        }
    }

    fn qualities(codec: &MockCodec) -> Vec<u8> {
        codec
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Encode { quality, .. } => Some(quality),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_stops_at_first_fitting_attempt() {
        let codec = MockCodec::new();
        // 100x100 → size == quality * 100
        let policy = SearchPolicy::PRODUCTION;
        let result =
            search_quality(&codec, &image(100, 100), ImageFormat::Avif, 8_000, &policy, None).unwrap();

        assert!(result.budget_met);
        assert_eq!(result.quality, 80);
        assert_eq!(result.attempts, 5);
        assert_eq!(qualities(&codec), vec![100, 95, 90, 85, 80]);
    }

    #[test]
    fn test_first_attempt_fits() {
        let codec = MockCodec::new();
        let result = search_quality(
            &codec,
            &image(10, 10),
            ImageFormat::Avif,
            1_000_000,
            &SearchPolicy::PRODUCTION,
            None,
        )
        .unwrap();
        assert_eq!(result.attempts, 1);
        assert_eq!(result.quality, 100);
    }

    #[test]
    fn test_budget_unmet_returns_last_attempt() {
        let codec = MockCodec::new();
        let policy = SearchPolicy::DEVELOPMENT;
        let result =
            search_quality(&codec, &image(100, 100), ImageFormat::Avif, 10, &policy, None).unwrap();

        assert!(!result.budget_met);
        assert_eq!(result.attempts, policy.max_attempts);
        assert_eq!(result.quality, 30);
        assert_eq!(qualities(&codec), vec![90, 70, 50, 30]);
        assert_eq!(result.bytes.len(), 3_000);
    }

    #[test]
    fn test_never_exceeds_attempt_bound() {
        for max_attempts in 1..20 {
            let codec = MockCodec::new();
            let policy = SearchPolicy {
                max_attempts,
                quality_step: 3,
                starting_quality: 100,
                codec_effort: 0,
            };
            let result =
                search_quality(&codec, &image(50, 50), ImageFormat::Webp, 1, &policy, None).unwrap();
            assert!(result.attempts <= max_attempts);
            assert_eq!(codec.encode_count(ImageFormat::Webp), result.attempts as usize);
        }
    }

    #[test]
    fn test_quality_floor_stops_early() {
        let codec = MockCodec::new();
        let policy = SearchPolicy {
            max_attempts: 50,
            quality_step: 40,
            starting_quality: 100,
            codec_effort: 0,
        };
        let result =
            search_quality(&codec, &image(100, 100), ImageFormat::Avif, 1, &policy, None).unwrap();
        assert_eq!(qualities(&codec), vec![100, 60, 20, 1]);
        assert_eq!(result.quality, 1);
        assert!(!result.budget_met);
    }

    #[test]
    fn test_carried_quality_seeds_start() {
        let codec = MockCodec::new();
        let result = search_quality(
            &codec,
            &image(100, 100),
            ImageFormat::Webp,
            7_000,
            &SearchPolicy::PRODUCTION,
            Some(75),
        )
        .unwrap();
        assert_eq!(qualities(&codec), vec![75, 70]);
        assert_eq!(result.quality, 70);
    }

    #[test]
    fn test_lossless_format_single_attempt() {
        let codec = MockCodec::new().lossless(ImageFormat::Webp);
        let result = search_quality(
            &codec,
            &image(100, 100),
            ImageFormat::Webp,
            10,
            &SearchPolicy::PRODUCTION,
            None,
        )
        .unwrap();
        assert_eq!(result.attempts, 1);
        assert!(!result.budget_met);
    }

    #[test]
    fn test_codec_failure_is_encode_error() {
        let codec = MockCodec::new().failing_on(ImageFormat::Avif);
        let err = search_quality(
            &codec,
            &image(10, 10),
            ImageFormat::Avif,
            100,
            &SearchPolicy::PRODUCTION,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TranscodeError::CodecEncode { format: ImageFormat::Avif, .. }));
    }

    #[test]
    fn test_effort_passed_to_codec() {
        let codec = MockCodec::new();
        search_quality(&codec, &image(4, 4), ImageFormat::Avif, 1_000, &SearchPolicy::PRODUCTION, None)
            .unwrap();
        assert!(matches!(codec.ops()[0], RecordedOp::Encode { effort: 6, .. }));
    }

    #[test]
    fn test_floor_quality() {
        assert_eq!(SearchPolicy::PRODUCTION.floor_quality(), 30);
        assert_eq!(SearchPolicy::DEVELOPMENT.floor_quality(), 30);
        let steep = SearchPolicy {
            max_attempts: 10,
            quality_step: 50,
            starting_quality: 100,
            codec_effort: 0,
        };
        assert_eq!(steep.floor_quality(), 1);
    }
}
