use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use rayon::prelude::*;

use crate::encode::ffmpeg::EncoderSession;
use crate::foundation::error::{SceneError, SceneResult};
use crate::render::pipeline::{RenderOpts, mix_timeline_audio, render_range_into};
use crate::render::scratch::ScratchDir;
use crate::timeline::Timeline;

/// Parallel/segmented rendering configuration.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ParallelOpts {
    /// Segment length in seconds; the final segment is truncated to the
    /// remainder.
    pub segment_duration_secs: f64,
    /// Maximum concurrently running segment pipelines.
    pub max_concurrency: usize,
}

impl Default for ParallelOpts {
    fn default() -> Self {
        Self {
            segment_duration_secs: 10.0,
            max_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl ParallelOpts {
    fn validate(&self) -> SceneResult<()> {
        if !(self.segment_duration_secs.is_finite() && self.segment_duration_secs > 0.0) {
            return Err(SceneError::validation(
                "segment_duration_secs must be > 0",
            ));
        }
        if self.max_concurrency == 0 {
            return Err(SceneError::validation("max_concurrency must be >= 1"));
        }
        Ok(())
    }
}

/// One contiguous timeline slice rendered by an independent encoder
/// subprocess.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSegment {
    /// Slice start in seconds.
    pub start_time: f64,
    /// Slice end in seconds (exclusive).
    pub end_time: f64,
    /// Ascending segment index; concatenation order.
    pub index: usize,
    /// First absolute frame of the slice.
    pub first_frame: u64,
    /// Frame count of the slice.
    pub frame_count: u64,
}

impl RenderSegment {
    /// Slice length in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Partition `[0, total_frames)` into fixed-length segments.
///
/// Segment boundaries land on whole frames so the union reproduces the
/// serial frame sequence exactly: the sum of `frame_count` over all segments
/// equals `total_frames`.
pub fn plan_segments(
    timeline: &Timeline,
    segment_duration_secs: f64,
) -> SceneResult<Vec<RenderSegment>> {
    if !(segment_duration_secs.is_finite() && segment_duration_secs > 0.0) {
        return Err(SceneError::validation("segment_duration_secs must be > 0"));
    }

    let fps = timeline.fps();
    let total_frames = timeline.total_frames();
    let frames_per_segment = ((segment_duration_secs * fps.as_f64()).round() as u64).max(1);

    let mut segments = Vec::new();
    let mut first = 0u64;
    while first < total_frames {
        let count = frames_per_segment.min(total_frames - first);
        let index = segments.len();
        segments.push(RenderSegment {
            start_time: fps.frame_to_secs(first),
            end_time: fps.frame_to_secs(first + count),
            index,
            first_frame: first,
            frame_count: count,
        });
        first += count;
    }
    Ok(segments)
}

/// Segmented render: bounded-concurrency segment pipelines, then lossless
/// stream-copy concatenation in ascending segment index order.
///
/// Every element is initialized eagerly across the whole timeline before any
/// segment starts, and the mixed audio track is built once and sliced per
/// segment. One segment's hard failure fails the whole render; there is no
/// per-segment retry.
pub fn render_parallel(
    timeline: &mut Timeline,
    out_path: &Path,
    opts: &RenderOpts,
    parallel: &ParallelOpts,
) -> SceneResult<PathBuf> {
    parallel.validate()?;

    // Eager init up front: shared expensive resources are ready before any
    // segment task runs, so no segment races a lazy load.
    let mut result = timeline.init_elements();
    if result.is_ok() {
        result = run_segments(timeline, out_path, opts, parallel);
    }
    // Teardown runs whether the segments succeeded or failed.
    timeline.dispose_elements();
    result?;
    Ok(out_path.to_path_buf())
}

fn run_segments(
    timeline: &Timeline,
    out_path: &Path,
    opts: &RenderOpts,
    parallel: &ParallelOpts,
) -> SceneResult<()> {
    let scratch = ScratchDir::create()?;
    let audio = mix_timeline_audio(timeline, &scratch)?;
    let segments = plan_segments(timeline, parallel.segment_duration_secs)?;
    tracing::info!(
        segments = segments.len(),
        max_concurrency = parallel.max_concurrency,
        "starting segmented render"
    );

    // The pool's thread bound is the concurrency semaphore: at most
    // `max_concurrency` segment pipelines run at once, each with its own
    // cursor, scratch raster, and encoder subprocess.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallel.max_concurrency)
        .build()
        .map_err(|e| SceneError::validation(format!("failed to build segment pool: {e}")))?;

    pool.install(|| {
        segments
            .par_iter()
            .map(|segment| {
                let seg_path = scratch.segment_path(segment.index);
                let mut session = EncoderSession::new(&seg_path, opts.video.clone());
                render_range_into(
                    timeline,
                    &mut session,
                    audio.clone(),
                    opts.speed,
                    segment.first_frame,
                    segment.frame_count,
                    segment.start_time,
                )?;
                tracing::debug!(index = segment.index, "segment finished");
                Ok(())
            })
            .collect::<SceneResult<Vec<()>>>()
    })?;

    let segment_paths: Vec<PathBuf> = segments
        .iter()
        .map(|s| scratch.segment_path(s.index))
        .collect();
    concat_segments(&segment_paths, &scratch.manifest_path(), out_path)
}

/// Write the concat manifest (absolute path per line) and stream-copy the
/// segments into `out_path` with the concat demuxer.
///
/// Input order is ascending segment index regardless of which segment
/// finished first.
pub fn concat_segments(
    segment_paths: &[PathBuf],
    manifest_path: &Path,
    out_path: &Path,
) -> SceneResult<()> {
    std::fs::write(manifest_path, build_concat_manifest(segment_paths)).map_err(|e| {
        SceneError::resource(format!(
            "failed to write concat manifest '{}': {e}",
            manifest_path.display()
        ))
    })?;

    let output = Command::new("ffmpeg")
        .args(["-y", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i"])
        .arg(manifest_path)
        .args(["-c", "copy"])
        .arg(out_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| SceneError::resource(format!("failed to run ffmpeg concat: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SceneError::encode(
            output.status.code().unwrap_or(-1),
            stderr.trim().to_string(),
        ));
    }
    Ok(())
}

/// Concat-demuxer manifest body: one `file '<absolute path>'` line per
/// segment, single quotes escaped the way the demuxer expects.
pub(crate) fn build_concat_manifest(segment_paths: &[PathBuf]) -> String {
    let mut manifest = String::new();
    for path in segment_paths {
        let escaped = path.to_string_lossy().replace('\'', "'\\''");
        manifest.push_str(&format!("file '{escaped}'\n"));
    }
    manifest
}

#[cfg(test)]
#[path = "../../tests/unit/render/parallel.rs"]
mod tests;
