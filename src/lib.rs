//! pixelart turns still images, animated GIFs and videos into pixel art.
//!
//! Every frame goes through the same transform ([`quantize`]):
//!
//! 1. **Pixelate**: bilinear downsample by `pixel_size` so each output block becomes one pixel.
//! 2. **Reduce**: k-means in RGB space picks at most `n_colors` colours per frame.
//! 3. **Upscale**: integer nearest-neighbour back to `upscale_factor` times the source size,
//!    keeping hard block edges.
//!
//! Alpha is carried through the resizes but never clustered.
//!
//! Three pipelines wrap the transform, selected by [`MediaKind`]:
//!
//! - still images are decoded and re-encoded in their own format with the `image` crate,
//! - GIFs are decoded fully, converted frame by frame and written back in one write,
//! - videos stream between two system `ffmpeg` processes over raw `rgb24` pipes, with the source
//!   audio track remuxed into the output.
//!
//! [`convert`] picks the pipeline for a path and returns a [`ConvertReport`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod encode;
mod foundation;
mod media;
mod pipeline;
mod quantize;

pub use encode::ffmpeg::{
    AudioPlan, EncodeConfig, OutputContainer, VideoEncodeOpts, VideoEncoder, ensure_parent_dir,
};
pub use encode::gif_writer::{DEFAULT_FRAME_DELAY_MS, GifFrame, delay_centis, encode_gif};
pub use foundation::core::{Fps, FrameIndex};
pub use foundation::error::{ErrorKind, PixelartError, PixelartResult};
pub use media::decode::FrameDecoder;
pub use media::kind::MediaKind;
pub use media::probe::{
    AudioStreamInfo, VideoSourceInfo, is_ffmpeg_on_path, is_ffprobe_on_path, parse_probe_json,
    probe_video,
};
pub use pipeline::animated::process as process_animated;
pub use pipeline::still::process as process_still;
pub use pipeline::video::process as process_video;
pub use pipeline::{ConvertReport, OutputLayout, PipelineConfig, convert};
pub use quantize::buffer::{Channels, PixelBuffer};
pub use quantize::frame::quantize;
pub use quantize::kmeans::{Clustering, Palette, cluster_rgb};
pub use quantize::params::{ClusterOpts, DEFAULT_N_COLORS, DEFAULT_PIXEL_SIZE, PixelationParams};
