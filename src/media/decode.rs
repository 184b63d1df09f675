use std::{
    io::Read,
    process::{Child, ChildStdout, Command, Stdio},
    thread::JoinHandle,
};

use crate::{
    foundation::{
        core::FrameIndex,
        error::{PixelartError, PixelartResult},
    },
    media::probe::VideoSourceInfo,
    quantize::buffer::{Channels, PixelBuffer, expected_len},
};

/// Streaming decoder: a system `ffmpeg` process writing raw `rgb24` frames to a pipe, read one
/// frame at a time in decode order.
pub struct FrameDecoder {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    width: u32,
    height: u32,
    frame_len: usize,
    next_idx: u64,
}

impl FrameDecoder {
    /// Spawn the decoder for the first video stream of `source`.
    pub fn open(source: &VideoSourceInfo) -> PixelartResult<Self> {
        let frame_len = expected_len(source.width, source.height, Channels::Rgb)?;
        if frame_len == 0 {
            return Err(PixelartError::decode(
                "decoded video frame size is zero (invalid source dimensions)",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-v", "error", "-nostdin", "-noautorotate", "-i"])
            .arg(&source.source_path)
            .args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        tracing::debug!(?cmd, "spawning ffmpeg decoder");

        let mut child = cmd.spawn().map_err(|e| {
            PixelartError::video_msg(format!(
                "failed to spawn ffmpeg decoder (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdout = child.stdout.take();
        let stderr_drain = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut bytes = Vec::new();
                stderr.read_to_end(&mut bytes)?;
                Ok(bytes)
            })
        });

        let mut decoder = Self {
            child: Some(child),
            stdout,
            stderr_drain,
            width: source.width,
            height: source.height,
            frame_len,
            next_idx: 0,
        };
        if decoder.stdout.is_none() {
            decoder.release();
            return Err(PixelartError::video_msg(
                "failed to open ffmpeg decoder stdout (unexpected)",
            ));
        }
        Ok(decoder)
    }

    /// Read the next frame, or `None` once the stream ends cleanly.
    pub fn next_frame(&mut self) -> PixelartResult<Option<(FrameIndex, PixelBuffer)>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut data = vec![0u8; self.frame_len];
        let mut filled = 0usize;
        while filled < data.len() {
            match stdout.read(&mut data[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    return Err(PixelartError::video_msg(format!(
                        "failed to read frame from ffmpeg decoder: {e}"
                    )));
                }
            }
        }

        if filled == 0 {
            self.stdout = None;
            self.wait_for_exit()?;
            return Ok(None);
        }
        if filled < data.len() {
            return Err(PixelartError::decode(format!(
                "truncated video frame {}: got {filled} of {} bytes",
                self.next_idx, self.frame_len
            )));
        }

        let idx = FrameIndex(self.next_idx);
        self.next_idx += 1;
        let buf = PixelBuffer::new(self.width, self.height, Channels::Rgb, data)?;
        Ok(Some((idx, buf)))
    }

    /// Frames handed out so far.
    pub fn frames_read(&self) -> u64 {
        self.next_idx
    }

    /// Kill (if still running) and reap the decoder. Idempotent, and safe after the process was
    /// terminated from outside.
    pub fn release(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }

    fn wait_for_exit(&mut self) -> PixelartResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().map_err(|e| {
            PixelartError::video_msg(format!("failed to wait for ffmpeg decoder: {e}"))
        })?;
        let stderr = match self.stderr_drain.take() {
            Some(handle) => handle.join().ok().and_then(|r| r.ok()).unwrap_or_default(),
            None => Vec::new(),
        };
        if !status.success() {
            return Err(PixelartError::decode(format!(
                "ffmpeg decoder exited with status {status}: {}",
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(())
    }
}

impl Drop for FrameDecoder {
    fn drop(&mut self) {
        self.release();
    }
}
