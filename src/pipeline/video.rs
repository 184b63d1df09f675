use std::path::Path;

use crate::{
    encode::ffmpeg::{AudioPlan, EncodeConfig, OutputContainer, VideoEncodeOpts, VideoEncoder},
    foundation::error::{PixelartError, PixelartResult},
    media::{decode::FrameDecoder, kind::MediaKind, probe::probe_video},
    pipeline::ConvertReport,
    quantize::{frame::quantize, params::PixelationParams},
};

/// Pixelate a video frame by frame, streaming between two ffmpeg processes.
///
/// The source audio track, if any, is carried into `output` untouched where the container
/// allows it. Every failure after parameter validation surfaces as a single
/// [`PixelartError::VideoProcessing`]. A partially written `output` is left in place.
#[tracing::instrument(skip(params, opts), fields(input = %input.display(), output = %output.display()))]
pub fn process(
    input: &Path,
    output: &Path,
    params: &PixelationParams,
    opts: &VideoEncodeOpts,
) -> PixelartResult<ConvertReport> {
    params.validate()?;
    opts.validate()?;
    run(input, output, params, opts).map_err(PixelartError::video)
}

fn run(
    input: &Path,
    output: &Path,
    params: &PixelationParams,
    opts: &VideoEncodeOpts,
) -> PixelartResult<ConvertReport> {
    let info = probe_video(input)?;
    let (width, height) = params.scaled_dims(info.width, info.height)?;
    let audio = AudioPlan::for_source(
        input,
        info.audio.as_ref(),
        OutputContainer::from_path(output),
    );

    let mut encoder = VideoEncoder::start(EncodeConfig {
        width,
        height,
        fps: info.fps,
        out_path: output.to_path_buf(),
        audio,
        opts: opts.clone(),
    })?;
    let mut decoder = FrameDecoder::open(&info)?;

    while let Some((idx, frame)) = decoder.next_frame()? {
        let out = quantize(frame, params)?;
        encoder.write_frame(idx, &out)?;
    }
    decoder.release();

    let frames = encoder.finish()?;
    tracing::debug!(frames, fps = %info.fps, "video encoded");
    Ok(ConvertReport {
        kind: MediaKind::Video,
        frames,
        width,
        height,
        has_audio: info.has_audio(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/video.rs"]
mod tests;
