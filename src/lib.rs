//! Scenecast turns a declarative, timed scene description into an encoded
//! video file by driving an external `ffmpeg` process.
//!
//! # Pipeline overview
//!
//! 1. **Resolve**: per-property [`Animation`]s combine into a
//!    [`TransformState`] for each element at each instant.
//! 2. **Composite**: the [`Timeline`] turns a point in time into one RGBA
//!    raster: either the z-ordered composite of all active elements, or a
//!    cross-blend between frozen segment endpoints while a
//!    [`TransitionSpec`] is active.
//! 3. **Encode**: an [`EncoderSession`] streams raw frames to `ffmpeg` with
//!    backpressure and finalizes the container; element audio is merged by a
//!    filter graph ([`mix_streams`]) built once per render.
//! 4. **Parallel mode** (optional): the timeline is partitioned into
//!    [`RenderSegment`]s rendered by bounded-concurrency encoder
//!    subprocesses and losslessly concatenated.
//!
//! Concrete per-type drawing (text layout, image decode, shape fill) is out
//! of scope: element types live outside this crate behind the narrow
//! [`Element`] contract.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod audio;
mod composition;
mod effects;
mod encode;
mod foundation;
mod render;

/// Timeline state and per-frame compositing.
pub mod timeline;

pub use animation::anim::{AnimSource, Animation, Fill, Keyframe, Property};
pub use animation::ease::Ease;
pub use animation::resolve::{TransformState, resolve_transform};
pub use audio::mix::{build_mix_args, mix_streams};
pub use composition::element::{ActiveWindow, AudioStream, Element, SolidElement};
pub use composition::group::{GroupElement, MAX_GROUP_DEPTH};
pub use effects::composite::{over, over_in_place};
pub use effects::transitions::{
    BlendBuilder, BlendCache, CrossfadeBlend, HardCutBlend, TransitionBlend, TransitionRegistry,
    TransitionSpec, WipeBlend, WipeDir,
};
pub use encode::ffmpeg::{EncoderSession, VideoParams, ensure_parent_dir, is_ffmpeg_on_path};
pub use encode::sink::{AudioInput, FrameSink, InMemorySink, SinkConfig};
pub use foundation::core::{Canvas, Fps, Frame, TimeWindow};
pub use foundation::error::{SceneError, SceneResult};
pub use render::parallel::{
    ParallelOpts, RenderSegment, concat_segments, plan_segments, render_parallel,
};
pub use render::pipeline::{RenderOpts, encoder_available, render, render_into_sink};
pub use timeline::{Timeline, TimelineBuilder, TimelineCursor};
