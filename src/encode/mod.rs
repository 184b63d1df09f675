//! Output writers: the ffmpeg video encoder process and the in-memory GIF encoder.

pub(crate) mod ffmpeg;
pub(crate) mod gif_writer;
