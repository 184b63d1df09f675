use super::*;
use crate::quantize::buffer::Channels;

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> PixelBuffer {
    let data = rgba.repeat((w * h) as usize);
    PixelBuffer::new(w, h, Channels::Rgba, data).unwrap()
}

fn decode(bytes: &[u8]) -> (gif::Repeat, Vec<(u16, u16, u16, gif::DisposalMethod)>) {
    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::RGBA);
    let mut dec = opts.read_info(bytes).unwrap();
    let mut frames = Vec::new();
    while let Some(f) = dec.read_next_frame().unwrap() {
        frames.push((f.width, f.height, f.delay, f.dispose));
    }
    (dec.repeat(), frames)
}

#[test]
fn delays_round_to_centiseconds_with_floor_of_one() {
    assert_eq!(delay_centis(100), 10);
    assert_eq!(delay_centis(40), 4);
    assert_eq!(delay_centis(45), 5);
    assert_eq!(delay_centis(44), 4);
    assert_eq!(delay_centis(0), 1);
    assert_eq!(delay_centis(3), 1);
    assert_eq!(delay_centis(u32::MAX), u16::MAX);
}

#[test]
fn animated_gif_loops_forever_with_per_frame_delays() {
    let frames = vec![
        GifFrame {
            buffer: solid(8, 6, [255, 0, 0, 255]),
            delay_ms: 100,
        },
        GifFrame {
            buffer: solid(8, 6, [0, 255, 0, 255]),
            delay_ms: 40,
        },
        GifFrame {
            buffer: solid(8, 6, [0, 0, 255, 255]),
            delay_ms: 250,
        },
    ];
    let bytes = encode_gif(frames).unwrap();
    let (repeat, frames) = decode(&bytes);
    assert_eq!(repeat, gif::Repeat::Infinite);
    assert_eq!(frames.len(), 3);
    let delays: Vec<u16> = frames.iter().map(|f| f.2).collect();
    assert_eq!(delays, vec![10, 4, 25]);
    assert!(frames.iter().all(|f| (f.0, f.1) == (8, 6)));
    assert!(
        frames
            .iter()
            .all(|f| f.3 == gif::DisposalMethod::Background)
    );
}

#[test]
fn single_frame_has_no_loop_extension() {
    let frames = vec![GifFrame {
        buffer: solid(4, 4, [9, 9, 9, 255]),
        delay_ms: 500,
    }];
    let bytes = encode_gif(frames).unwrap();
    let (repeat, frames) = decode(&bytes);
    assert_ne!(repeat, gif::Repeat::Infinite);
    assert_eq!(frames.len(), 1);
}

#[test]
fn exact_palette_survives_encoding() {
    let mut data = Vec::new();
    for i in 0..16u8 {
        data.extend_from_slice(&[i * 16, 255 - i * 16, 7, 255]);
    }
    let buffer = PixelBuffer::new(4, 4, Channels::Rgba, data.clone()).unwrap();
    let bytes = encode_gif(vec![GifFrame {
        buffer,
        delay_ms: 100,
    }])
    .unwrap();

    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::RGBA);
    let mut dec = opts.read_info(bytes.as_slice()).unwrap();
    let frame = dec.read_next_frame().unwrap().unwrap();
    assert_eq!(&frame.buffer[..], data.as_slice());
}

#[test]
fn rejects_empty_mismatched_and_oversized_input() {
    assert_eq!(
        encode_gif(Vec::new()).unwrap_err().kind(),
        crate::ErrorKind::Encode
    );

    let mixed = vec![
        GifFrame {
            buffer: solid(4, 4, [0, 0, 0, 255]),
            delay_ms: 100,
        },
        GifFrame {
            buffer: solid(5, 4, [0, 0, 0, 255]),
            delay_ms: 100,
        },
    ];
    assert!(encode_gif(mixed).is_err());

    assert!(gif_dims(70_000, 1).is_err());
    assert!(gif_dims(0, 1).is_err());
    assert_eq!(gif_dims(320, 240).unwrap(), (320, 240));
}

#[test]
fn rgb_frames_are_written_opaque() {
    let buffer = PixelBuffer::new(2, 1, Channels::Rgb, vec![1, 2, 3, 200, 100, 50]).unwrap();
    let bytes = encode_gif(vec![GifFrame {
        buffer,
        delay_ms: 100,
    }])
    .unwrap();
    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::RGBA);
    let mut dec = opts.read_info(bytes.as_slice()).unwrap();
    let frame = dec.read_next_frame().unwrap().unwrap();
    assert_eq!(&frame.buffer[..], &[1u8, 2, 3, 255, 200, 100, 50, 255][..]);
}
