use crate::{
    foundation::error::{PixelartError, PixelartResult},
    quantize::buffer::PixelBuffer,
};

/// Delay used for frames whose source carried none.
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;

/// One output frame of an animated GIF.
#[derive(Clone, Debug)]
pub struct GifFrame {
    /// Pixels; RGB frames are written fully opaque.
    pub buffer: PixelBuffer,
    /// Display time in milliseconds.
    pub delay_ms: u32,
}

/// Encode `frames` as a GIF held in memory.
///
/// A single frame produces a plain GIF with no loop extension. Several frames loop forever,
/// each one clearing to background before the next. All frames must share one size.
pub fn encode_gif(frames: Vec<GifFrame>) -> PixelartResult<Vec<u8>> {
    let Some(first) = frames.first() else {
        return Err(PixelartError::encode("cannot write a GIF with no frames"));
    };
    let (width, height) = (first.buffer.width, first.buffer.height);
    let (w16, h16) = gif_dims(width, height)?;
    let animated = frames.len() > 1;

    let mut out = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut out, w16, h16, &[])
            .map_err(|e| PixelartError::encode(format!("gif header: {e}")))?;
        if animated {
            encoder
                .set_repeat(gif::Repeat::Infinite)
                .map_err(|e| PixelartError::encode(format!("gif loop extension: {e}")))?;
        }

        for (i, frame) in frames.into_iter().enumerate() {
            if frame.buffer.width != width || frame.buffer.height != height {
                return Err(PixelartError::encode(format!(
                    "gif frame {i} is {}x{}, expected {width}x{height}",
                    frame.buffer.width, frame.buffer.height
                )));
            }
            frame.buffer.check()?;

            let mut rgba = frame.buffer.into_rgba().data;
            // speed 10 is the gif crate default; exact palettes are kept up to 256 colours.
            let mut out_frame = gif::Frame::from_rgba_speed(w16, h16, &mut rgba, 10);
            if animated {
                out_frame.delay = delay_centis(frame.delay_ms);
                out_frame.dispose = gif::DisposalMethod::Background;
            }
            encoder
                .write_frame(&out_frame)
                .map_err(|e| PixelartError::encode(format!("gif frame {i}: {e}")))?;
        }
    }
    Ok(out)
}

/// Milliseconds to GIF centiseconds, rounded, at least one tick.
pub fn delay_centis(delay_ms: u32) -> u16 {
    let cs = (u64::from(delay_ms) + 5) / 10;
    cs.clamp(1, u64::from(u16::MAX)) as u16
}

fn gif_dims(width: u32, height: u32) -> PixelartResult<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(PixelartError::encode("gif dimensions must be non-zero"));
    }
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(PixelartError::encode(format!(
            "{width}x{height} exceeds the GIF size limit of {0}x{0}",
            u16::MAX
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif_writer.rs"]
mod tests;
