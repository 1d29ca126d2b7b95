//! Recording codec for tests.
//!
//! Inputs are synthetic: `IMG <w>x<h> <anything>`. Encoded size follows a
//! simple model (pixels × quality) so budgets are predictable, and every
//! call is recorded for assertions.

use parking_lot::Mutex;

use super::codec::{Codec, CodecError, Dimensions, EncodeSettings, ImageFormat};

/// Build synthetic image bytes understood by [`MockCodec`].
pub fn mock_image(width: u32, height: u32, tag: &str) -> Vec<u8> {
    format!("IMG {width}x{height} {tag}").into_bytes()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOp {
    Probe,
    Decode(String),
    Resize(Dimensions),
    Encode {
        format: ImageFormat,
        quality: u8,
        effort: u8,
        dims: Dimensions,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockImage {
    pub dims: Dimensions,
    pub tag: String,
}

pub struct MockCodec {
    /// Encoded size = pixels × quality / 100 / `pixels_per_byte`.
    pub pixels_per_byte: u64,
    /// Formats whose encoder always fails.
    pub failing: Vec<ImageFormat>,
    /// Formats treated as lossless (size ignores quality).
    pub lossless: Vec<ImageFormat>,
    ops: Mutex<Vec<RecordedOp>>,
}

impl MockCodec {
    pub fn new() -> Self {
        Self {
            pixels_per_byte: 1,
            failing: Vec::new(),
            lossless: Vec::new(),
            ops: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pixels_per_byte(mut self, n: u64) -> Self {
        self.pixels_per_byte = n.max(1);
        self
    }

    pub fn failing_on(mut self, format: ImageFormat) -> Self {
        self.failing.push(format);
        self
    }

    pub fn lossless(mut self, format: ImageFormat) -> Self {
        self.lossless.push(format);
        self
    }

    /// Size the model predicts for an encode.
    #[allow(clippy::cast_possible_truncation)]
    pub fn predicted_size(&self, dims: Dimensions, format: ImageFormat, quality: u8) -> usize {
        let quality = if self.lossless.contains(&format) { 100 } else { u64::from(quality) };
        ((dims.pixels() * quality / 100 / self.pixels_per_byte).max(1)) as usize
    }

    pub fn ops(&self) -> Vec<RecordedOp> {
        self.ops.lock().clone()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().clear();
    }

    pub fn encode_count(&self, format: ImageFormat) -> usize {
        self.ops
            .lock()
            .iter()
            .filter(|op| matches!(op, RecordedOp::Encode { format: f, .. } if *f == format))
            .count()
    }

    pub fn decode_count(&self) -> usize {
        self.ops
            .lock()
            .iter()
            .filter(|op| matches!(op, RecordedOp::Decode(_)))
            .count()
    }

    pub fn resizes(&self) -> Vec<Dimensions> {
        self.ops
            .lock()
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Resize(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    fn parse(bytes: &[u8]) -> Result<MockImage, CodecError> {
        let text = std::str::from_utf8(bytes).map_err(|e| CodecError::Unreadable(e.to_string()))?;
        let mut parts = text.splitn(3, ' ');
        if parts.next() != Some("IMG") {
            return Err(CodecError::Unreadable("missing IMG header".to_string()));
        }
        let dims = parts
            .next()
            .and_then(|d| d.split_once('x'))
            .and_then(|(w, h)| Some(Dimensions::new(w.parse().ok()?, h.parse().ok()?)))
            .ok_or_else(|| CodecError::Unreadable("bad dimensions".to_string()))?;
        let tag = parts.next().unwrap_or_default().to_string();
        Ok(MockImage { dims, tag })
    }
}

impl Codec for MockCodec {
    type Image = MockImage;

    fn probe(&self, bytes: &[u8]) -> Result<Dimensions, CodecError> {
        self.ops.lock().push(RecordedOp::Probe);
        Self::parse(bytes).map(|img| img.dims)
    }

    fn decode(&self, bytes: &[u8]) -> Result<MockImage, CodecError> {
        let img = Self::parse(bytes)?;
        self.ops.lock().push(RecordedOp::Decode(img.tag.clone()));
        Ok(img)
    }

    fn resize(&self, image: &MockImage, to: Dimensions) -> Result<MockImage, CodecError> {
        self.ops.lock().push(RecordedOp::Resize(to));
        Ok(MockImage {
            dims: to,
            tag: image.tag.clone(),
        })
    }

    fn encode(&self, image: &MockImage, settings: EncodeSettings) -> Result<Vec<u8>, CodecError> {
        self.ops.lock().push(RecordedOp::Encode {
            format: settings.format,
            quality: settings.quality,
            effort: settings.effort,
            dims: image.dims,
        });
        if self.failing.contains(&settings.format) {
            return Err(CodecError::Encode {
                format: settings.format,
                reason: "mock failure".to_string(),
            });
        }
        let size = self.predicted_size(image.dims, settings.format, settings.quality);
        let marker = settings.format.extension().as_bytes()[0];
        Ok(vec![marker; size])
    }

    fn quality_sensitive(&self, format: ImageFormat) -> bool {
        !self.lossless.contains(&format)
    }
}
