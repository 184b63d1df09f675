use std::path::Path;

use crate::{
    encode::ffmpeg::ensure_parent_dir,
    foundation::error::{PixelartError, PixelartResult},
    media::kind::MediaKind,
    pipeline::ConvertReport,
    quantize::{buffer::PixelBuffer, frame::quantize, params::PixelationParams},
};

/// Pixelate a single-frame image, writing it back in the input's own format.
#[tracing::instrument(skip(params), fields(input = %input.display(), output = %output.display()))]
pub fn process(
    input: &Path,
    output: &Path,
    params: &PixelationParams,
) -> PixelartResult<ConvertReport> {
    params.validate()?;

    let reader = image::ImageReader::open(input)
        .map_err(|e| PixelartError::decode(format!("open '{}': {e}", input.display())))?
        .with_guessed_format()
        .map_err(|e| PixelartError::decode(format!("read '{}': {e}", input.display())))?;
    let format = reader.format().ok_or_else(|| {
        PixelartError::decode(format!("'{}' is not a recognised image", input.display()))
    })?;
    let img = reader
        .decode()
        .map_err(|e| PixelartError::decode(format!("decode '{}': {e}", input.display())))?;
    tracing::debug!(
        ?format,
        width = img.width(),
        height = img.height(),
        color = ?img.color(),
        "decoded still image"
    );

    let out = quantize(PixelBuffer::from_dynamic(&img), params)?;
    let report = ConvertReport {
        kind: MediaKind::Still,
        frames: 1,
        width: out.width,
        height: out.height,
        has_audio: false,
    };

    ensure_parent_dir(output)?;
    out.into_dynamic()?
        .save_with_format(output, format)
        .map_err(|e| PixelartError::encode(format!("write '{}': {e}", output.display())))?;
    Ok(report)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/still.rs"]
mod tests;
