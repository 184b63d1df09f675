use std::{io::Read as _, path::Path};

use anyhow::Context as _;

use crate::foundation::error::{PixelartError, PixelartResult};

/// Broad media category; picks the pipeline. Resolved once per conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Single-frame raster image (PNG, JPEG, WebP, BMP, ...).
    Still,
    /// Animated GIF (single-frame GIFs included, so the container is kept).
    Animated,
    /// Container with a video stream and optionally one audio stream.
    Video,
}

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "mkv", "webm", "avi", "mpg", "mpeg", "ts", "flv", "wmv", "3gp",
];

impl MediaKind {
    /// Route by MIME type: `image/gif` is animated, other `image/*` still, `video/*` video.
    pub fn from_mime(mime: &str) -> PixelartResult<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime == "image/gif" {
            Ok(Self::Animated)
        } else if mime.starts_with("image/") {
            Ok(Self::Still)
        } else if mime.starts_with("video/") {
            Ok(Self::Video)
        } else {
            Err(PixelartError::validation(format!(
                "unsupported media type '{mime}'"
            )))
        }
    }

    /// Route by file extension (case-insensitive), `None` when unknown.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if ext == "gif" {
            return Some(Self::Animated);
        }
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            return Some(Self::Video);
        }
        image::ImageFormat::from_extension(&ext).map(|_| Self::Still)
    }

    /// Detect from the path's extension, falling back to the file's leading bytes.
    pub fn detect(path: &Path) -> PixelartResult<Self> {
        if let Some(kind) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
        {
            return Ok(kind);
        }

        let mut head = Vec::with_capacity(32);
        std::fs::File::open(path)
            .with_context(|| format!("open '{}'", path.display()))?
            .take(32)
            .read_to_end(&mut head)
            .with_context(|| format!("read '{}'", path.display()))?;

        Self::sniff(&head).ok_or_else(|| {
            PixelartError::validation(format!(
                "unsupported media type for '{}'",
                path.display()
            ))
        })
    }

    /// Classify leading file bytes.
    pub fn sniff(head: &[u8]) -> Option<Self> {
        if let Ok(fmt) = image::guess_format(head) {
            return Some(match fmt {
                image::ImageFormat::Gif => Self::Animated,
                _ => Self::Still,
            });
        }
        let is_iso_bmff = head.len() >= 8 && &head[4..8] == b"ftyp";
        let is_ebml = head.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]);
        let is_avi = head.len() >= 12 && &head[..4] == b"RIFF" && &head[8..12] == b"AVI ";
        (is_iso_bmff || is_ebml || is_avi).then_some(Self::Video)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Still => "still",
            Self::Animated => "animated",
            Self::Video => "video",
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/kind.rs"]
mod tests;
