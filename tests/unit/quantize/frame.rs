use proptest::prelude::*;

use super::*;
use crate::quantize::buffer::Channels;

fn gradient(width: u32, height: u32, channels: Channels) -> PixelBuffer {
    let mut data = Vec::with_capacity((width * height) as usize * channels.count());
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            data.extend_from_slice(&[r, g, 128]);
            if channels.has_alpha() {
                data.push(((x + y) * 255 / (width + height).max(1)) as u8);
            }
        }
    }
    PixelBuffer::new(width, height, channels, data).unwrap()
}

fn assert_uniform_blocks(buf: &PixelBuffer, block: u32) {
    for by in (0..buf.height).step_by(block as usize) {
        for bx in (0..buf.width).step_by(block as usize) {
            let first = buf.pixel(bx, by).to_vec();
            for y in by..(by + block).min(buf.height) {
                for x in bx..(bx + block).min(buf.width) {
                    assert_eq!(buf.pixel(x, y), &first[..], "block at ({bx},{by})");
                }
            }
        }
    }
}

#[test]
fn gradient_64_scenario() {
    let params = PixelationParams::new(8, 4, 1).unwrap();
    let out = quantize(gradient(64, 64, Channels::Rgb), &params).unwrap();

    assert_eq!((out.width, out.height, out.channels), (64, 64, Channels::Rgb));
    assert!(out.distinct_colors() <= 4);
    assert_uniform_blocks(&out, 8);
}

#[test]
fn alpha_is_kept_and_resampled_not_clustered() {
    let params = PixelationParams::new(4, 2, 2).unwrap();
    let input = gradient(16, 16, Channels::Rgba);
    let out = quantize(input, &params).unwrap();

    assert_eq!(out.channels, Channels::Rgba);
    assert_eq!((out.width, out.height), (32, 32));

    let alphas: std::collections::HashSet<u8> = out.data.chunks_exact(4).map(|p| p[3]).collect();
    assert!(alphas.len() > 2, "alpha should keep its gradient steps");
    assert_uniform_blocks(&out, 8);
}

#[test]
fn zero_area_passes_through_unchanged() {
    let params = PixelationParams::new(4, 4, 3).unwrap();
    let input = PixelBuffer::new(0, 5, Channels::Rgba, Vec::new()).unwrap();
    let out = quantize(input.clone(), &params).unwrap();
    assert_eq!(out, input);
}

#[test]
fn one_by_one_is_scaled() {
    let params = PixelationParams::new(16, 16, 3).unwrap();
    let input = PixelBuffer::new(1, 1, Channels::Rgb, vec![200, 100, 50]).unwrap();
    let out = quantize(input, &params).unwrap();
    assert_eq!((out.width, out.height), (3, 3));
    assert!(out.data.chunks_exact(3).all(|p| p == [200, 100, 50]));
}

#[test]
fn zero_colors_keeps_smoothed_colours() {
    let params = PixelationParams::new(2, 0, 1).unwrap();
    let input = PixelBuffer::new(2, 2, Channels::Rgb, vec![10; 12]).unwrap();
    let out = quantize(input, &params).unwrap();
    assert!(out.data.iter().all(|&v| v == 10));
}

#[test]
fn requantizing_keeps_block_structure_and_colours() {
    let params = PixelationParams::new(8, 6, 1).unwrap();
    let once = quantize(gradient(64, 48, Channels::Rgb), &params).unwrap();
    let twice = quantize(once.clone(), &params).unwrap();
    assert_uniform_blocks(&twice, 8);
    assert_eq!(once, twice);
}

#[test]
fn invalid_params_and_buffers_are_rejected() {
    let bad = PixelationParams {
        pixel_size: 0,
        ..PixelationParams::default()
    };
    assert!(quantize(gradient(4, 4, Channels::Rgb), &bad).is_err());

    let broken = PixelBuffer {
        width: 4,
        height: 4,
        channels: Channels::Rgb,
        data: vec![0; 7],
    };
    assert!(quantize(broken, &PixelationParams::default()).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn output_dims_alpha_and_palette_bounds(
        w in 1u32..40,
        h in 1u32..40,
        pixel_size in 1u32..10,
        n_colors in 0u32..8,
        upscale in 1u32..4,
        alpha in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let channels = if alpha { Channels::Rgba } else { Channels::Rgb };
        let mut params = PixelationParams::new(pixel_size, n_colors, upscale).unwrap();
        params.cluster.seed = seed;
        params.cluster.attempts = 2;

        let out = quantize(gradient(w, h, channels), &params).unwrap();
        prop_assert_eq!((out.width, out.height), (w * upscale, h * upscale));
        prop_assert_eq!(out.channels, channels);

        let (sw, sh) = params.downsampled_dims(w, h);
        if n_colors > 0 {
            prop_assert!(out.distinct_colors() <= (n_colors as usize).min((sw * sh) as usize));
        }
        if w % pixel_size == 0 && h % pixel_size == 0 {
            assert_uniform_blocks(&out, pixel_size * upscale);
        }
    }
}
