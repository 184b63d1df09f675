use crate::{
    foundation::error::PixelartResult,
    quantize::{buffer::PixelBuffer, kmeans::cluster_rgb, params::PixelationParams, resize},
};

/// Pixelate one frame: smooth downsample, k-means palette reduction, nearest-neighbour upscale.
///
/// Alpha (when present) is resampled alongside the colour but never clustered, so soft edges
/// survive as stepped alpha blocks. Zero-area buffers are returned unchanged.
pub fn quantize(buffer: PixelBuffer, params: &PixelationParams) -> PixelartResult<PixelBuffer> {
    params.validate()?;
    buffer.check()?;
    if buffer.is_empty() {
        return Ok(buffer);
    }

    let (w, h) = (buffer.width, buffer.height);
    let (small_w, small_h) = params.downsampled_dims(w, h);
    let (out_w, out_h) = params.scaled_dims(w, h)?;

    let (rgb, alpha) = buffer.split_alpha();
    drop(buffer);

    let mut small = resize::downsample_linear(&rgb, w, h, 3, small_w, small_h)?;
    if let Some(clustering) = cluster_rgb(&small, params.n_colors, &params.cluster) {
        tracing::trace!(
            small_w,
            small_h,
            k = clustering.palette.len(),
            compactness = clustering.compactness,
            "palette clustered"
        );
        for (px, &label) in small.chunks_exact_mut(3).zip(&clustering.labels) {
            px.copy_from_slice(&clustering.palette.colors[label as usize]);
        }
    }
    let color = resize::upscale_nearest(&small, small_w, small_h, 3, out_w, out_h);

    let alpha = alpha
        .map(|a| -> PixelartResult<Vec<u8>> {
            let small_a = resize::downsample_linear(&a, w, h, 1, small_w, small_h)?;
            Ok(resize::upscale_nearest(
                &small_a, small_w, small_h, 1, out_w, out_h,
            ))
        })
        .transpose()?;

    PixelBuffer::merge_alpha(out_w, out_h, color, alpha)
}

#[cfg(test)]
#[path = "../../tests/unit/quantize/frame.rs"]
mod tests;
