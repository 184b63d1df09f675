//! The three conversion pipelines and the dispatcher that routes an input to one of them.

pub(crate) mod animated;
pub(crate) mod still;
pub(crate) mod video;

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    encode::ffmpeg::VideoEncodeOpts,
    foundation::error::{PixelartError, PixelartResult},
    media::kind::MediaKind,
    quantize::params::PixelationParams,
};

/// Summary of a written output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConvertReport {
    /// Pipeline that produced the output.
    pub kind: MediaKind,
    /// Frames written (1 for still images).
    pub frames: u64,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Whether the output carries the source audio track.
    pub has_audio: bool,
}

/// Where converted files go when no explicit output path is given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    /// Directory receiving the outputs.
    pub dir: PathBuf,
}

impl OutputLayout {
    /// Create a layout rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<dir>/<stem>_pixelated.<ext>`, keeping the input's extension.
    pub fn output_path_for(&self, input: &Path) -> PixelartResult<PathBuf> {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                PixelartError::validation(format!(
                    "cannot derive an output name from '{}'",
                    input.display()
                ))
            })?;
        let name = match input.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}_pixelated.{ext}"),
            None => format!("{stem}_pixelated"),
        };
        Ok(self.dir.join(name))
    }
}

/// File-level configuration, usually loaded from JSON.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frame transform parameters.
    pub params: PixelationParams,
    /// Video encoder options.
    pub video: VideoEncodeOpts,
    /// Output directory used when no explicit output path is given.
    pub output_dir: Option<PathBuf>,
}

impl PipelineConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> PixelartResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| PixelartError::validation(format!("invalid pipeline config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: &Path) -> PixelartResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Check every section.
    pub fn validate(&self) -> PixelartResult<()> {
        self.params.validate()?;
        self.video.validate()
    }

    /// Output layout for `output_dir`, if one is configured.
    pub fn layout(&self) -> Option<OutputLayout> {
        self.output_dir.clone().map(OutputLayout::new)
    }
}

/// Convert `input` into `output`, picking the pipeline from `kind` or, when `None`, from the
/// input itself.
pub fn convert(
    input: &Path,
    output: &Path,
    kind: Option<MediaKind>,
    params: &PixelationParams,
    video: &VideoEncodeOpts,
) -> PixelartResult<ConvertReport> {
    params.validate()?;
    if same_file(input, output) {
        return Err(PixelartError::validation(format!(
            "output '{}' would overwrite the input",
            output.display()
        )));
    }

    let kind = match kind {
        Some(kind) => kind,
        None => MediaKind::detect(input)?,
    };
    tracing::debug!(%kind, input = %input.display(), "routing conversion");

    let report = match kind {
        MediaKind::Still => still::process(input, output, params)?,
        MediaKind::Animated => animated::process(input, output, params)?,
        MediaKind::Video => video::process(input, output, params, video)?,
    };
    tracing::info!(
        kind = %report.kind,
        frames = report.frames,
        width = report.width,
        height = report.height,
        has_audio = report.has_audio,
        output = %output.display(),
        "conversion finished"
    );
    Ok(report)
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/mod.rs"]
mod tests;
