use std::path::PathBuf;

use crate::foundation::core::{Canvas, Fps, Frame};
use crate::foundation::error::SceneResult;

/// Configuration handed to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output canvas.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Optional pre-mixed audio track to mux in.
    pub audio: Option<AudioInput>,
    /// Global playback speed; a speed-adjust filter is applied to the audio
    /// when this is not 1.0.
    pub speed: f64,
}

/// A pre-mixed audio input, optionally sliced for one timeline segment.
#[derive(Debug, Clone)]
pub struct AudioInput {
    /// Path to the mixed audio track.
    pub path: PathBuf,
    /// Seek offset into the track, seconds.
    pub start_offset: f64,
    /// Trim length in seconds; `None` takes the rest of the track.
    pub trim: Option<f64>,
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// `push_frame` is called with strictly increasing frame indices; a sink may
/// suspend the caller to apply backpressure.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> SceneResult<()>;
    /// Push one frame, blocking while downstream is full.
    fn push_frame(&mut self, idx: u64, frame: &Frame) -> SceneResult<()>;
    /// Flush and finalize. Called once after the last frame.
    fn end(&mut self) -> SceneResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u64, Frame)>,
    ended: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(u64, Frame)] {
        &self.frames
    }

    /// Whether `end` was called.
    pub fn ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> SceneResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &Frame) -> SceneResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> SceneResult<()> {
        self.ended = true;
        Ok(())
    }
}
