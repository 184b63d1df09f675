use crate::foundation::error::{PixelartError, PixelartResult};

const COEF_BITS: u32 = 11;
const COEF_ONE: i64 = 1 << COEF_BITS;

/// Bilinear downsample of a packed plane with `channels` interleaved samples per pixel.
///
/// Sample centres are aligned (`src = (dst + 0.5) * scale - 0.5`) and clamped at the borders, so
/// each output pixel blends the 2x2 source neighbourhood nearest to the centre of its block.
/// Weights are Q11 fixed point and results are rounded to nearest.
pub(crate) fn downsample_linear(
    src: &[u8],
    width: u32,
    height: u32,
    channels: usize,
    dst_width: u32,
    dst_height: u32,
) -> PixelartResult<Vec<u8>> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| PixelartError::validation("resize buffer size overflow"))?;
    if channels == 0 || src.len() != expected {
        return Err(PixelartError::validation(
            "downsample_linear expects src matching width*height*channels",
        ));
    }
    if width == 0 || height == 0 || dst_width == 0 || dst_height == 0 {
        return Err(PixelartError::validation(
            "downsample_linear needs non-zero source and target sizes",
        ));
    }
    if (width, height) == (dst_width, dst_height) {
        return Ok(src.to_vec());
    }

    let xs = taps(width, dst_width);
    let ys = taps(height, dst_height);
    let stride = width as usize * channels;
    let mut out = Vec::with_capacity(dst_width as usize * dst_height as usize * channels);

    for &(y0, y1, wy) in &ys {
        let row0 = &src[y0 * stride..(y0 + 1) * stride];
        let row1 = &src[y1 * stride..(y1 + 1) * stride];
        for &(x0, x1, wx) in &xs {
            for c in 0..channels {
                let a = i64::from(row0[x0 * channels + c]);
                let b = i64::from(row0[x1 * channels + c]);
                let d = i64::from(row1[x0 * channels + c]);
                let e = i64::from(row1[x1 * channels + c]);
                let top = a * (COEF_ONE - wx) + b * wx;
                let bottom = d * (COEF_ONE - wx) + e * wx;
                let acc = top * (COEF_ONE - wy) + bottom * wy;
                out.push(round_q22(acc));
            }
        }
    }
    Ok(out)
}

/// Per output coordinate: the two source indices and the Q11 weight of the second one.
fn taps(src_len: u32, dst_len: u32) -> Vec<(usize, usize, i64)> {
    let scale = f64::from(src_len) / f64::from(dst_len);
    let last = src_len as usize - 1;
    (0..dst_len)
        .map(|d| {
            let f = (f64::from(d) + 0.5) * scale - 0.5;
            let s = f.floor();
            let frac = f - s;
            if s < 0.0 {
                return (0, 0, 0);
            }
            let s = s as usize;
            if s >= last {
                return (last, last, 0);
            }
            (s, s + 1, (frac * COEF_ONE as f64).round() as i64)
        })
        .collect()
}

fn round_q22(acc: i64) -> u8 {
    let shift = 2 * COEF_BITS;
    ((acc + (1 << (shift - 1))) >> shift).clamp(0, 255) as u8
}

/// Nearest-neighbour upscale with exact integer source mapping `sx = dx * src_w / dst_w`.
///
/// Every source pixel expands to a solid rectangle; with `dst_w = src_w * k` each rectangle is
/// exactly `k` wide.
pub(crate) fn upscale_nearest(
    src: &[u8],
    src_width: u32,
    src_height: u32,
    channels: usize,
    dst_width: u32,
    dst_height: u32,
) -> Vec<u8> {
    let (sw, sh) = (src_width as u64, src_height as u64);
    let (dw, dh) = (dst_width as u64, dst_height as u64);
    let mut out = Vec::with_capacity(dw as usize * dh as usize * channels);

    let x_map: Vec<usize> = (0..dw)
        .map(|dx| ((dx * sw / dw) as usize) * channels)
        .collect();

    let stride = sw as usize * channels;
    for dy in 0..dh {
        let sy = (dy * sh / dh) as usize;
        let row = &src[sy * stride..(sy + 1) * stride];
        for &sx in &x_map {
            out.extend_from_slice(&row[sx..sx + channels]);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/quantize/resize.rs"]
mod tests;
