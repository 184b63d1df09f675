use std::{fs::File, io::BufReader, path::Path};

use image::AnimationDecoder as _;

use crate::{
    encode::{
        ffmpeg::ensure_parent_dir,
        gif_writer::{DEFAULT_FRAME_DELAY_MS, GifFrame, encode_gif},
    },
    foundation::error::{PixelartError, PixelartResult},
    media::kind::MediaKind,
    pipeline::ConvertReport,
    quantize::{buffer::PixelBuffer, frame::quantize, params::PixelationParams},
};

/// Pixelate every frame of a GIF and write the result as a GIF.
///
/// All frames are decoded up front and the output is assembled in memory, so `output` is
/// either fully written or not touched at all.
#[tracing::instrument(skip(params), fields(input = %input.display(), output = %output.display()))]
pub fn process(
    input: &Path,
    output: &Path,
    params: &PixelationParams,
) -> PixelartResult<ConvertReport> {
    params.validate()?;

    let file = File::open(input)
        .map_err(|e| PixelartError::decode(format!("open '{}': {e}", input.display())))?;
    let decoder = image::codecs::gif::GifDecoder::new(BufReader::new(file))
        .map_err(|e| PixelartError::decode(format!("gif header: {e}")))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| PixelartError::decode(format!("gif frames: {e}")))?;
    if frames.is_empty() {
        return Err(PixelartError::decode("gif contains no frames"));
    }
    tracing::debug!(frames = frames.len(), "decoded gif");

    let mut missing_delays = 0usize;
    let mut out_frames = Vec::with_capacity(frames.len());
    for frame in frames {
        let delay_ms = match frame_delay_ms(frame.delay()) {
            0 => {
                missing_delays += 1;
                DEFAULT_FRAME_DELAY_MS
            }
            ms => ms,
        };
        let buffer = quantize(PixelBuffer::from(frame.into_buffer()), params)?;
        out_frames.push(GifFrame { buffer, delay_ms });
    }
    if missing_delays > 0 && out_frames.len() > 1 {
        tracing::warn!(
            frames = missing_delays,
            default_ms = DEFAULT_FRAME_DELAY_MS,
            "gif frames without a delay, using default"
        );
    }

    let report = ConvertReport {
        kind: MediaKind::Animated,
        frames: out_frames.len() as u64,
        width: out_frames[0].buffer.width,
        height: out_frames[0].buffer.height,
        has_audio: false,
    };
    let bytes = encode_gif(out_frames)?;

    ensure_parent_dir(output)?;
    std::fs::write(output, bytes)
        .map_err(|e| PixelartError::encode(format!("write '{}': {e}", output.display())))?;
    Ok(report)
}

fn frame_delay_ms(delay: image::Delay) -> u32 {
    let (num, den) = delay.numer_denom_ms();
    if den == 0 {
        return 0;
    }
    ((f64::from(num) / f64::from(den)).round()).min(f64::from(u32::MAX)) as u32
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/animated.rs"]
mod tests;
