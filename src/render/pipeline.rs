use std::path::{Path, PathBuf};

use crate::audio::mix::mix_streams;
use crate::encode::ffmpeg::{EncoderSession, VideoParams};
use crate::encode::sink::{AudioInput, FrameSink, SinkConfig};
use crate::foundation::error::SceneResult;
use crate::render::parallel::{ParallelOpts, render_parallel};
use crate::render::scratch::ScratchDir;
use crate::timeline::{Timeline, TimelineCursor};

/// Options for [`render`].
#[derive(Clone, Debug)]
pub struct RenderOpts {
    /// Video encoding parameters.
    pub video: VideoParams,
    /// Global playback speed applied at the encoder (audio `atempo`).
    pub speed: f64,
    /// When set, render as concurrent timeline segments and concatenate.
    pub parallel: Option<ParallelOpts>,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            video: VideoParams::default(),
            speed: 1.0,
            parallel: None,
        }
    }
}

/// Render the whole timeline to `out_path`.
///
/// Serial by default: one encoder session consumes every frame in increasing
/// time order. With [`RenderOpts::parallel`] set, the timeline is partitioned
/// into segments rendered by bounded-concurrency encoder subprocesses and
/// stream-copy concatenated (see [`render_parallel`]).
///
/// Resolves with the final output path, or rejects with exactly one typed
/// error. Fatal errors abort the render; segment temp files are cleaned up,
/// but a partially-written final output is not guaranteed removed when the
/// encoder died mid-write.
pub fn render(
    timeline: &mut Timeline,
    out_path: impl Into<PathBuf>,
    opts: &RenderOpts,
) -> SceneResult<PathBuf> {
    let out_path = out_path.into();
    timeline.validate()?;

    if let Some(parallel) = &opts.parallel {
        return render_parallel(timeline, &out_path, opts, parallel);
    }

    let mut result = timeline.init_elements();
    if result.is_ok() {
        result = encode_serial(timeline, &out_path, opts);
    }
    // Teardown runs whether the encode succeeded or failed.
    timeline.dispose_elements();
    result?;
    Ok(out_path)
}

fn encode_serial(timeline: &Timeline, out_path: &Path, opts: &RenderOpts) -> SceneResult<()> {
    let scratch = ScratchDir::create()?;
    let audio = mix_timeline_audio(timeline, &scratch)?;

    let mut session = EncoderSession::new(out_path, opts.video.clone());
    render_range_into(
        timeline,
        &mut session,
        audio,
        opts.speed,
        0,
        timeline.total_frames(),
        0.0,
    )
}

/// Mix every element audio stream into one track inside `scratch`.
pub(crate) fn mix_timeline_audio(
    timeline: &Timeline,
    scratch: &ScratchDir,
) -> SceneResult<Option<PathBuf>> {
    let streams = timeline.audio_streams();
    mix_streams(&streams, &scratch.audio_path())
}

/// Drive `sink` with frames `[first_frame, first_frame + frame_count)`,
/// sampling the timeline at `time_base + local_frame / fps`.
///
/// Frames are pushed strictly in increasing order; the sink applies its own
/// backpressure.
pub(crate) fn render_range_into(
    timeline: &Timeline,
    sink: &mut dyn FrameSink,
    audio: Option<PathBuf>,
    speed: f64,
    first_frame: u64,
    frame_count: u64,
    audio_offset: f64,
) -> SceneResult<()> {
    let fps = timeline.fps();
    sink.begin(SinkConfig {
        canvas: timeline.canvas(),
        fps,
        audio: audio.map(|path| AudioInput {
            path,
            start_offset: audio_offset,
            trim: Some(fps.frame_to_secs(frame_count)),
        }),
        speed,
    })?;

    let mut cursor = TimelineCursor::new(timeline);
    for local in 0..frame_count {
        let t = fps.frame_to_secs(first_frame + local);
        let frame = cursor.frame_at(t)?;
        sink.push_frame(local, &frame)?;
    }
    sink.end()
}

/// Convenience check mirrored from the encoder: is the external encoder
/// binary reachable?
pub fn encoder_available() -> bool {
    crate::encode::ffmpeg::is_ffmpeg_on_path()
}

/// Render into an arbitrary sink without touching ffmpeg, serially.
///
/// The test-facing entry point behind [`render`]: identical frame ordering
/// and count, pluggable sink.
pub fn render_into_sink(timeline: &mut Timeline, sink: &mut dyn FrameSink) -> SceneResult<()> {
    timeline.validate()?;
    let mut result = timeline.init_elements();
    if result.is_ok() {
        let total = timeline.total_frames();
        result = render_range_into(timeline, sink, None, 1.0, 0, total, 0.0);
    }
    timeline.dispose_elements();
    result
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
