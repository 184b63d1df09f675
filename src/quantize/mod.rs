//! Frame transform: block pixelation, palette reduction and hard-edged upscaling.
//!
//! Nothing in here knows about files or containers; pipelines hand in a [`buffer::PixelBuffer`]
//! and get one back.

pub(crate) mod buffer;
pub(crate) mod frame;
pub(crate) mod kmeans;
pub(crate) mod params;
pub(crate) mod resize;
