use crate::foundation::error::{SceneError, SceneResult};

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> SceneResult<Self> {
        if num == 0 {
            return Err(SceneError::validation("Fps num must be > 0"));
        }
        if den == 0 {
            return Err(SceneError::validation("Fps den must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Timeline time in seconds for a 0-based frame index.
    pub fn frame_to_secs(self, frame: u64) -> f64 {
        (frame as f64) * self.frame_duration_secs()
    }

    /// Total frame count covering `secs` seconds (ceiling semantics; the last
    /// partial frame period still produces a frame).
    pub fn frames_covering_secs(self, secs: f64) -> u64 {
        (secs * self.as_f64()).ceil().max(0.0) as u64
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Byte length of one RGBA8 raster for this canvas.
    pub fn raster_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

/// Half-open time interval `[start, end)` in timeline seconds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeWindow {
    /// Inclusive window start.
    pub start: f64,
    /// Exclusive window end.
    pub end: f64,
}

impl TimeWindow {
    /// Create a validated window with `start <= end`.
    pub fn new(start: f64, end: f64) -> SceneResult<Self> {
        if !(start.is_finite() && end.is_finite()) {
            return Err(SceneError::validation("TimeWindow bounds must be finite"));
        }
        if start > end {
            return Err(SceneError::validation("TimeWindow start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Window length in seconds.
    pub fn duration(self) -> f64 {
        self.end - self.start
    }

    /// Return `true` when `t` lies inside `[start, end)`.
    pub fn contains(self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}

/// One rendered frame: a flat premultiplied RGBA8 raster.
///
/// `data.len()` is always `width * height * 4`. Frames are ephemeral: the
/// compositor produces one per tick and the encoder consumes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 bytes, row-major.
    pub data: Vec<u8>,
}

impl Frame {
    /// Fully transparent frame sized to `canvas`.
    pub fn transparent(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0u8; canvas.raster_len()],
        }
    }

    /// Frame filled with a single premultiplied RGBA8 pixel value.
    pub fn solid(canvas: Canvas, rgba: [u8; 4]) -> Self {
        let mut data = vec![0u8; canvas.raster_len()];
        for px in data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        Self {
            width: canvas.width,
            height: canvas.height,
            data,
        }
    }

    /// Validate that this frame matches `canvas` and its internal size
    /// invariant.
    pub fn check_matches(&self, canvas: Canvas) -> SceneResult<()> {
        if self.width != canvas.width || self.height != canvas.height {
            return Err(SceneError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                self.width, self.height, canvas.width, canvas.height
            )));
        }
        if self.data.len() != canvas.raster_len() {
            return Err(SceneError::validation(
                "frame data size mismatch with width*height*4",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
