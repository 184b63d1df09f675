//! Input side: media-kind routing, ffprobe metadata and the streaming ffmpeg frame decoder.

pub(crate) mod decode;
pub(crate) mod kind;
pub(crate) mod probe;
