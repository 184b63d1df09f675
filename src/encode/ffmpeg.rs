use std::{
    ffi::OsString,
    io::{Read, Write as _},
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
    thread::JoinHandle,
};

use crate::{
    foundation::{
        core::{Fps, FrameIndex},
        error::{PixelartError, PixelartResult},
    },
    media::probe::{AudioStreamInfo, is_ffmpeg_on_path},
    quantize::buffer::{Channels, PixelBuffer},
};

/// User-facing knobs for the video encoder.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VideoEncodeOpts {
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
    /// Constant rate factor passed to the video codec; codec default when `None`.
    pub crf: Option<u8>,
}

impl Default for VideoEncodeOpts {
    fn default() -> Self {
        Self {
            overwrite: true,
            crf: None,
        }
    }
}

impl VideoEncodeOpts {
    /// Range-check the options.
    pub fn validate(&self) -> PixelartResult<()> {
        if let Some(crf) = self.crf
            && crf > 63
        {
            return Err(PixelartError::validation("crf must be <= 63"));
        }
        Ok(())
    }
}

/// Output container, derived from the output file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputContainer {
    /// `.mp4` / `.m4v`
    Mp4,
    /// `.mov`
    Mov,
    /// `.mkv`
    Mkv,
    /// `.webm`
    Webm,
    /// `.avi`
    Avi,
    /// Anything else; ffmpeg picks the muxer from the extension.
    Other,
}

impl OutputContainer {
    /// Classify `path` by extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("mp4" | "m4v") => Self::Mp4,
            Some("mov") => Self::Mov,
            Some("mkv") => Self::Mkv,
            Some("webm") => Self::Webm,
            Some("avi") => Self::Avi,
            _ => Self::Other,
        }
    }

    fn video_codec(self) -> &'static str {
        match self {
            Self::Webm => "libvpx-vp9",
            _ => "libx264",
        }
    }

    fn reencode_audio_codec(self) -> &'static str {
        match self {
            Self::Webm => "libopus",
            _ => "aac",
        }
    }

    /// Whether an audio stream of `codec` can be stream-copied into this container.
    pub fn can_copy_audio(self, codec: &str) -> bool {
        match self {
            Self::Mp4 => matches!(
                codec,
                "aac" | "mp3" | "alac" | "ac3" | "eac3" | "opus" | "flac"
            ),
            Self::Mov => matches!(codec, "aac" | "mp3" | "alac" | "ac3" | "eac3"),
            Self::Mkv => true,
            Self::Webm => matches!(codec, "opus" | "vorbis"),
            Self::Avi => matches!(codec, "mp3" | "ac3" | "pcm_s16le"),
            Self::Other => false,
        }
    }

    fn faststart(self) -> bool {
        matches!(self, Self::Mp4 | Self::Mov)
    }
}

/// How the source audio ends up in the output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AudioPlan {
    /// No audio stream in the output.
    None,
    /// Lossless stream copy from `source`.
    Copy {
        /// File the audio stream is read from.
        source: PathBuf,
    },
    /// Re-encode from `source` with `codec`.
    Reencode {
        /// File the audio stream is read from.
        source: PathBuf,
        /// ffmpeg encoder name.
        codec: &'static str,
    },
}

impl AudioPlan {
    /// Pick copy or re-encode for `audio` in `container`.
    pub fn for_source(
        source: &Path,
        audio: Option<&AudioStreamInfo>,
        container: OutputContainer,
    ) -> Self {
        let Some(audio) = audio else {
            return Self::None;
        };
        let source = source.to_path_buf();
        match audio.codec_name.as_deref() {
            Some(codec) if container.can_copy_audio(codec) => Self::Copy { source },
            codec => {
                tracing::warn!(
                    codec = codec.unwrap_or("unknown"),
                    ?container,
                    "audio cannot be stream-copied, re-encoding"
                );
                Self::Reencode {
                    source,
                    codec: container.reencode_audio_codec(),
                }
            }
        }
    }
}

/// Everything needed to launch one encoder process.
#[derive(Clone, Debug)]
pub struct EncodeConfig {
    /// Width of the raw frames written to the encoder (already scaled).
    pub width: u32,
    /// Height of the raw frames written to the encoder (already scaled).
    pub height: u32,
    /// Exact input frame rate.
    pub fps: Fps,
    /// Output file.
    pub out_path: PathBuf,
    /// Audio handling.
    pub audio: AudioPlan,
    /// Encoder knobs.
    pub opts: VideoEncodeOpts,
}

impl EncodeConfig {
    /// Check dimensions and options.
    pub fn validate(&self) -> PixelartResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PixelartError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(PixelartError::validation("encode fps must be non-zero"));
        }
        self.opts.validate()
    }

    /// Chroma layout for the output. 4:2:0 needs even dimensions; odd sizes keep their exact
    /// geometry with 4:4:4.
    pub fn output_pix_fmt(&self) -> &'static str {
        if self.width.is_multiple_of(2) && self.height.is_multiple_of(2) {
            "yuv420p"
        } else {
            "yuv444p"
        }
    }

    /// Full ffmpeg argument list (without the program name).
    pub fn ffmpeg_args(&self) -> Vec<OsString> {
        let container = OutputContainer::from_path(&self.out_path);
        let mut args: Vec<OsString> = Vec::new();
        let mut push = |items: &[&str]| args.extend(items.iter().map(OsString::from));

        push(&[if self.opts.overwrite { "-y" } else { "-n" }]);
        push(&["-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgb24"]);
        push(&["-s", &format!("{}x{}", self.width, self.height)]);
        // For rawvideo input, `-r` before `-i` sets the input rate; keep it rational.
        push(&["-r", &self.fps.to_string()]);
        push(&["-i", "pipe:0"]);

        let audio_source = match &self.audio {
            AudioPlan::None => None,
            AudioPlan::Copy { source } | AudioPlan::Reencode { source, .. } => Some(source),
        };
        if let Some(source) = audio_source {
            args.push("-i".into());
            args.push(source.as_os_str().to_owned());
        }

        let mut push = |items: &[&str]| args.extend(items.iter().map(OsString::from));
        push(&["-map", "0:v:0"]);
        push(&["-c:v", container.video_codec()]);
        if let Some(crf) = self.opts.crf {
            push(&["-crf", &crf.to_string()]);
            if container == OutputContainer::Webm {
                push(&["-b:v", "0"]);
            }
        }
        push(&["-pix_fmt", self.output_pix_fmt()]);

        match &self.audio {
            AudioPlan::None => push(&["-an"]),
            AudioPlan::Copy { .. } => push(&["-map", "1:a:0", "-c:a", "copy", "-shortest"]),
            AudioPlan::Reencode { codec, .. } => {
                push(&["-map", "1:a:0", "-c:a", *codec, "-shortest"])
            }
        }
        if container.faststart() {
            push(&["-movflags", "+faststart"]);
        }
        args.push(self.out_path.as_os_str().to_owned());
        args
    }
}

/// Encoder process fed raw `rgb24` frames over its stdin.
///
/// Writes block when ffmpeg falls behind; stdin is closed before waiting in [`finish`] so the
/// two ends cannot deadlock.
///
/// [`finish`]: VideoEncoder::finish
pub struct VideoEncoder {
    cfg: EncodeConfig,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
    last_idx: Option<FrameIndex>,
    frames_written: u64,
}

impl VideoEncoder {
    /// Validate `cfg` and spawn `ffmpeg`.
    pub fn start(cfg: EncodeConfig) -> PixelartResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.opts.overwrite && cfg.out_path.exists() {
            return Err(PixelartError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(PixelartError::video_msg(
                "ffmpeg is required for video encoding, but was not found on PATH",
            ));
        }
        if cfg.output_pix_fmt() != "yuv420p" {
            tracing::warn!(
                width = cfg.width,
                height = cfg.height,
                "odd output dimensions, encoding as yuv444p"
            );
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.args(cfg.ffmpeg_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        tracing::debug!(?cmd, "spawning ffmpeg encoder");

        let mut child = cmd.spawn().map_err(|e| {
            PixelartError::video_msg(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child.stdin.take();
        let stderr_drain = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut stderr_bytes = Vec::new();
                stderr.read_to_end(&mut stderr_bytes)?;
                Ok(stderr_bytes)
            })
        });

        let mut encoder = Self {
            scratch: vec![0u8; cfg.width as usize * cfg.height as usize * 3],
            cfg,
            child: Some(child),
            stdin,
            stderr_drain,
            last_idx: None,
            frames_written: 0,
        };
        if encoder.stdin.is_none() {
            encoder.abort();
            return Err(PixelartError::video_msg(
                "failed to open ffmpeg stdin (unexpected)",
            ));
        }
        Ok(encoder)
    }

    /// Write one frame. Indices must be strictly increasing.
    pub fn write_frame(&mut self, idx: FrameIndex, frame: &PixelBuffer) -> PixelartResult<()> {
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(PixelartError::video_msg(
                "ffmpeg encoder received out-of-order frame index",
            ));
        }
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(PixelartError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }

        let bytes: &[u8] = match frame.channels {
            Channels::Rgb => &frame.data,
            Channels::Rgba => {
                flatten_rgba_over_black(&mut self.scratch, &frame.data)?;
                &self.scratch
            }
        };
        if bytes.len() != self.scratch.len() {
            return Err(PixelartError::validation(
                "frame data size mismatch with width*height*3",
            ));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(PixelartError::video_msg(
                "ffmpeg encoder is already finalized",
            ));
        };
        stdin.write_all(bytes).map_err(|e| {
            PixelartError::video_msg(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        self.last_idx = Some(idx);
        self.frames_written += 1;
        Ok(())
    }

    /// Frames accepted so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Close stdin, wait for ffmpeg to flush and exit, and check its status.
    pub fn finish(mut self) -> PixelartResult<u64> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| PixelartError::video_msg("ffmpeg encoder not started"))?;

        let status = child.wait().map_err(|e| {
            PixelartError::video_msg(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PixelartError::video_msg("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| {
                    PixelartError::video_msg(format!("ffmpeg stderr read failed: {e}"))
                })?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(PixelartError::video_msg(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(self.frames_written)
    }

    /// Kill and reap the encoder without finalizing the output. Idempotent, and safe after the
    /// process was terminated from outside.
    pub fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for VideoEncoder {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> PixelartResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Composite straight-alpha RGBA over black into packed RGB.
fn flatten_rgba_over_black(dst: &mut [u8], src: &[u8]) -> PixelartResult<()> {
    if !src.len().is_multiple_of(4) || dst.len() != src.len() / 4 * 3 {
        return Err(PixelartError::validation(
            "flatten_rgba_over_black expects rgba8 input matching the rgb24 scratch",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(3).zip(src.chunks_exact(4)) {
        let a = u32::from(s[3]);
        for c in 0..3 {
            d[c] = ((u32::from(s[c]) * a + 127) / 255) as u8;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
