use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::foundation::{
    core::Fps,
    error::{PixelartError, PixelartResult},
};

/// What the video pipeline needs to know about a source before decoding.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VideoSourceInfo {
    /// Probed file.
    pub source_path: PathBuf,
    /// Coded width of the first video stream.
    pub width: u32,
    /// Coded height of the first video stream.
    pub height: u32,
    /// Exact frame rate of the first video stream.
    pub fps: Fps,
    /// Container duration in seconds, when reported.
    pub duration_sec: Option<f64>,
    /// First audio stream, if any. Never decoded, only remuxed.
    pub audio: Option<AudioStreamInfo>,
}

/// Opaque handle on a source audio track.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AudioStreamInfo {
    /// ffmpeg codec name (`aac`, `opus`, `mp3`, ...), when reported.
    pub codec_name: Option<String>,
}

impl VideoSourceInfo {
    /// `true` when the source carries an audio stream.
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Run `ffprobe` on `source_path` and extract stream geometry, rate and audio presence.
#[tracing::instrument]
pub fn probe_video(source_path: &Path) -> PixelartResult<VideoSourceInfo> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| PixelartError::video_msg(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(PixelartError::video(PixelartError::decode(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        ))));
    }

    let info = parse_probe_json(source_path, &out.stdout).map_err(PixelartError::video)?;
    tracing::debug!(
        width = info.width,
        height = info.height,
        fps = %info.fps,
        has_audio = info.has_audio(),
        "probed video source"
    );
    Ok(info)
}

/// Interpret `ffprobe -print_format json -show_streams -show_format` output.
pub fn parse_probe_json(source_path: &Path, json: &[u8]) -> PixelartResult<VideoSourceInfo> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| PixelartError::decode(format!("ffprobe json parse failed: {e}")))?;

    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| PixelartError::decode("no video stream found"))?;
    let width = video_stream
        .width
        .filter(|&w| w > 0)
        .ok_or_else(|| PixelartError::decode("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .filter(|&h| h > 0)
        .ok_or_else(|| PixelartError::decode("missing video height from ffprobe"))?;

    // r_frame_rate is the container's base rate; some muxers leave it 0/0 and only fill avg.
    let fps = [&video_stream.r_frame_rate, &video_stream.avg_frame_rate]
        .into_iter()
        .flatten()
        .find_map(|s| Fps::parse_ratio(s).ok())
        .ok_or_else(|| PixelartError::decode("invalid video frame rate from ffprobe"))?;

    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok());

    let audio = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .map(|s| AudioStreamInfo {
            codec_name: s.codec_name.clone(),
        });

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps,
        duration_sec,
        audio,
    })
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    tool_responds("ffmpeg")
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    tool_responds("ffprobe")
}

fn tool_responds(bin: &str) -> bool {
    Command::new(bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/media/probe.rs"]
mod tests;
