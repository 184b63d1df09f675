use std::collections::HashSet;

use crate::foundation::error::{PixelartError, PixelartResult};

/// Channel layout of a [`PixelBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channels {
    /// Three colour channels.
    Rgb,
    /// Three colour channels followed by straight (non-premultiplied) alpha.
    Rgba,
}

impl Channels {
    /// Bytes per pixel.
    pub fn count(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Whether the layout carries an alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba)
    }
}

/// Owned, interleaved 8-bit pixel buffer.
///
/// Zero-area buffers (`width == 0 || height == 0`) are legal and carry no data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channel layout of `data`.
    pub channels: Channels,
    /// Row-major interleaved samples, `width * height * channels.count()` bytes.
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Build a buffer, checking that `data` matches the declared dimensions.
    pub fn new(width: u32, height: u32, channels: Channels, data: Vec<u8>) -> PixelartResult<Self> {
        let expected = expected_len(width, height, channels)?;
        if data.len() != expected {
            return Err(PixelartError::validation(format!(
                "pixel buffer size mismatch: got {} bytes, expected {expected} for {width}x{height} {channels:?}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// A buffer filled with zeros.
    pub fn blank(width: u32, height: u32, channels: Channels) -> PixelartResult<Self> {
        let len = expected_len(width, height, channels)?;
        Ok(Self {
            width,
            height,
            channels,
            data: vec![0u8; len],
        })
    }

    /// `true` when the buffer has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the buffer carries alpha.
    pub fn has_alpha(&self) -> bool {
        self.channels.has_alpha()
    }

    /// Samples of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let n = self.channels.count();
        let idx = (y as usize * self.width as usize + x as usize) * n;
        &self.data[idx..idx + n]
    }

    pub(crate) fn check(&self) -> PixelartResult<()> {
        let expected = expected_len(self.width, self.height, self.channels)?;
        if self.data.len() != expected {
            return Err(PixelartError::validation(format!(
                "pixel buffer size mismatch: got {} bytes, expected {expected}",
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Split into packed RGB samples and an optional alpha plane.
    pub fn split_alpha(&self) -> (Vec<u8>, Option<Vec<u8>>) {
        match self.channels {
            Channels::Rgb => (self.data.clone(), None),
            Channels::Rgba => {
                let px = self.data.len() / 4;
                let mut rgb = Vec::with_capacity(px * 3);
                let mut alpha = Vec::with_capacity(px);
                for s in self.data.chunks_exact(4) {
                    rgb.extend_from_slice(&s[..3]);
                    alpha.push(s[3]);
                }
                (rgb, Some(alpha))
            }
        }
    }

    /// Inverse of [`PixelBuffer::split_alpha`].
    pub fn merge_alpha(
        width: u32,
        height: u32,
        rgb: Vec<u8>,
        alpha: Option<Vec<u8>>,
    ) -> PixelartResult<Self> {
        let Some(alpha) = alpha else {
            return Self::new(width, height, Channels::Rgb, rgb);
        };
        if rgb.len() != alpha.len() * 3 {
            return Err(PixelartError::validation(
                "merge_alpha expects rgb.len() == alpha.len() * 3",
            ));
        }
        let mut data = Vec::with_capacity(alpha.len() * 4);
        for (c, a) in rgb.chunks_exact(3).zip(alpha) {
            data.extend_from_slice(c);
            data.push(a);
        }
        Self::new(width, height, Channels::Rgba, data)
    }

    /// Number of distinct RGB triples, ignoring alpha.
    pub fn distinct_colors(&self) -> usize {
        let n = self.channels.count();
        self.data
            .chunks_exact(n)
            .map(|s| [s[0], s[1], s[2]])
            .collect::<HashSet<_>>()
            .len()
    }

    /// Convert a decoded image, keeping alpha only when the source colour type has it.
    pub fn from_dynamic(img: &image::DynamicImage) -> Self {
        if img.color().has_alpha() {
            Self::from(img.to_rgba8())
        } else {
            Self::from(img.to_rgb8())
        }
    }

    /// Wrap into an `image` value for encoding.
    pub fn into_dynamic(self) -> PixelartResult<image::DynamicImage> {
        let (w, h) = (self.width, self.height);
        let img = match self.channels {
            Channels::Rgb => image::RgbImage::from_raw(w, h, self.data)
                .map(image::DynamicImage::ImageRgb8),
            Channels::Rgba => image::RgbaImage::from_raw(w, h, self.data)
                .map(image::DynamicImage::ImageRgba8),
        };
        img.ok_or_else(|| PixelartError::validation("pixel buffer does not match its dimensions"))
    }

    /// Same pixels with an opaque alpha channel added (no-op when alpha already exists).
    pub fn into_rgba(self) -> Self {
        match self.channels {
            Channels::Rgba => self,
            Channels::Rgb => {
                let mut data = Vec::with_capacity(self.data.len() / 3 * 4);
                for c in self.data.chunks_exact(3) {
                    data.extend_from_slice(c);
                    data.push(255);
                }
                Self {
                    width: self.width,
                    height: self.height,
                    channels: Channels::Rgba,
                    data,
                }
            }
        }
    }
}

impl From<image::RgbImage> for PixelBuffer {
    fn from(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: Channels::Rgb,
            data: img.into_raw(),
        }
    }
}

impl From<image::RgbaImage> for PixelBuffer {
    fn from(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: Channels::Rgba,
            data: img.into_raw(),
        }
    }
}

/// Byte length of a `width x height` buffer with `channels`, guarding against overflow.
pub fn expected_len(width: u32, height: u32, channels: Channels) -> PixelartResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels.count()))
        .ok_or_else(|| PixelartError::validation("pixel buffer size overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/quantize/buffer.rs"]
mod tests;
