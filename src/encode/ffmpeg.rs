use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::JoinHandle;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::Frame;
use crate::foundation::error::{SceneError, SceneResult};
use crate::foundation::math::mul_div255_u16;

/// Bounded frame queue depth between the render loop and the pipe writer.
///
/// When the encoder's stdin stalls, the writer thread stops draining and
/// `push_frame` blocks on the full channel until it resumes; that channel is
/// the backpressure contract.
const PIPE_DEPTH_FRAMES: usize = 4;

/// Video encoding parameters for one [`EncoderSession`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VideoParams {
    /// x264 preset.
    pub preset: String,
    /// x264 constant-rate-factor quality level.
    pub crf: u8,
    /// Overwrite the output file if it exists.
    pub overwrite: bool,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl Default for VideoParams {
    fn default() -> Self {
        Self {
            preset: "medium".into(),
            crf: 23,
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// One encoder subprocess and its input pipe.
///
/// The session spawns `ffmpeg` reading raw RGBA frames on stdin at a fixed
/// rate and writing one compressed container. Frames travel through a bounded
/// channel to a dedicated writer thread; [`EncoderSession::end`] closes the
/// stream, awaits process exit, and reports a nonzero status as
/// [`SceneError::Encode`].
pub struct EncoderSession {
    out_path: PathBuf,
    params: VideoParams,

    child: Option<Child>,
    frame_tx: Option<SyncSender<Vec<u8>>>,
    writer: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,

    expected_len: usize,
    last_idx: Option<u64>,
}

impl EncoderSession {
    /// Create a session that will encode into `out_path`.
    pub fn new(out_path: impl Into<PathBuf>, params: VideoParams) -> Self {
        Self {
            out_path: out_path.into(),
            params,
            child: None,
            frame_tx: None,
            writer: None,
            stderr_drain: None,
            expected_len: 0,
            last_idx: None,
        }
    }

    /// The configured output path.
    pub fn out_path(&self) -> &Path {
        &self.out_path
    }

    fn spawn(&mut self, cfg: &SinkConfig) -> SceneResult<()> {
        if cfg.canvas.width == 0 || cfg.canvas.height == 0 {
            return Err(SceneError::validation(
                "encoder width/height must be non-zero",
            ));
        }
        if !cfg.canvas.width.is_multiple_of(2) || !cfg.canvas.height.is_multiple_of(2) {
            return Err(SceneError::validation(
                "encoder width/height must be even (required for yuv420p output)",
            ));
        }
        if !(cfg.speed.is_finite() && cfg.speed > 0.0) {
            return Err(SceneError::validation("playback speed must be > 0"));
        }

        ensure_parent_dir(&self.out_path)?;
        if !self.params.overwrite && self.out_path.exists() {
            return Err(SceneError::validation(format!(
                "output file '{}' already exists",
                self.out_path.display()
            )));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.arg(if self.params.overwrite { "-y" } else { "-n" });

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.canvas.width, cfg.canvas.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
        ]);

        if let Some(audio) = cfg.audio.as_ref() {
            if audio.start_offset > 0.0 {
                cmd.args(["-ss", &format!("{}", audio.start_offset)]);
            }
            if let Some(trim) = audio.trim {
                cmd.args(["-t", &format!("{trim}")]);
            }
            cmd.arg("-i").arg(&audio.path);
            if (cfg.speed - 1.0).abs() > f64::EPSILON {
                cmd.args(["-filter:a", &format!("atempo={}", cfg.speed)]);
            }
            cmd.args(["-c:a", "aac", "-shortest"]);
        } else {
            cmd.arg("-an");
        }

        cmd.args([
            "-c:v",
            "libx264",
            "-preset",
            &self.params.preset,
            "-crf",
            &self.params.crf.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ]);
        cmd.arg(&self.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            SceneError::resource(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SceneError::resource("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| SceneError::resource("failed to open ffmpeg stderr"))?;

        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        let (tx, rx) = sync_channel::<Vec<u8>>(PIPE_DEPTH_FRAMES);
        let writer = std::thread::spawn(move || pipe_writer(rx, &mut stdin));

        self.expected_len = cfg.canvas.raster_len();
        self.child = Some(child);
        self.frame_tx = Some(tx);
        self.writer = Some(writer);
        self.stderr_drain = Some(stderr_drain);
        self.last_idx = None;
        Ok(())
    }

    fn finalize(&mut self) -> SceneResult<()> {
        // Closing the sender ends the writer's receive loop, which closes the
        // pipe and lets ffmpeg flush.
        drop(self.frame_tx.take());

        let writer_result = match self.writer.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| SceneError::resource("ffmpeg pipe writer thread panicked"))?,
            None => Ok(()),
        };

        let mut child = self
            .child
            .take()
            .ok_or_else(|| SceneError::validation("encoder session not started"))?;
        let status = child
            .wait()
            .map_err(|e| SceneError::resource(format!("failed to wait for ffmpeg: {e}")))?;

        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| SceneError::resource("ffmpeg stderr drain thread panicked"))?
                .unwrap_or_default(),
            None => Vec::new(),
        };
        let stderr = String::from_utf8_lossy(&stderr_bytes).trim().to_string();

        if !status.success() {
            return Err(SceneError::encode(status.code().unwrap_or(-1), stderr));
        }
        if let Err(e) = writer_result {
            // Exit status was clean but the pipe broke mid-stream.
            return Err(SceneError::encode(
                -1,
                format!("frame pipe closed early: {e}; {stderr}"),
            ));
        }
        Ok(())
    }
}

impl FrameSink for EncoderSession {
    fn begin(&mut self, cfg: SinkConfig) -> SceneResult<()> {
        self.spawn(&cfg)
    }

    fn push_frame(&mut self, idx: u64, frame: &Frame) -> SceneResult<()> {
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(SceneError::validation(
                "encoder received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.data.len() != self.expected_len {
            return Err(SceneError::validation(
                "frame data size mismatch with encoder canvas",
            ));
        }

        let mut flat = vec![0u8; self.expected_len];
        flatten_premul_over_bg(&mut flat, &frame.data, self.params.bg_rgba)?;

        let tx = self
            .frame_tx
            .as_ref()
            .ok_or_else(|| SceneError::validation("encoder session not started"))?;
        // Blocks while the bounded queue is full: backpressure from the
        // subprocess input buffer propagates to the render loop here.
        tx.send(flat).map_err(|_| {
            SceneError::encode(-1, "ffmpeg input pipe closed before all frames were written")
        })?;
        Ok(())
    }

    fn end(&mut self) -> SceneResult<()> {
        self.finalize()
    }
}

impl Drop for EncoderSession {
    fn drop(&mut self) {
        // Abandoned session (error path): kill the subprocess rather than
        // block on a flush that will never be observed.
        drop(self.frame_tx.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn pipe_writer(rx: Receiver<Vec<u8>>, stdin: &mut ChildStdin) -> std::io::Result<()> {
    while let Ok(frame) = rx.recv() {
        stdin.write_all(&frame)?;
    }
    stdin.flush()
}

/// Flatten premultiplied RGBA8 over an opaque background for the encoder,
/// which does not understand premultiplied alpha.
fn flatten_premul_over_bg(dst: &mut [u8], src_premul: &[u8], bg_rgba: [u8; 4]) -> SceneResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(SceneError::validation(
            "flatten_premul_over_bg expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (u16::from(s[0]) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (u16::from(s[1]) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (u16::from(s[2]) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> SceneResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
