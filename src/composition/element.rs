use std::path::PathBuf;

use crate::animation::anim::Animation;
use crate::animation::resolve::{TransformState, resolve_transform};
use crate::foundation::core::{Canvas, Frame, TimeWindow};
use crate::foundation::error::SceneResult;

/// Activity descriptor reported by an element: when it is on screen and at
/// which stacking position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveWindow {
    /// Inclusive start time, seconds.
    pub start: f64,
    /// Exclusive end time, seconds.
    pub end: f64,
    /// Stacking order; higher values composite on top.
    pub z_index: i32,
}

impl ActiveWindow {
    /// The half-open `[start, end)` interval.
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start,
            end: self.end,
        }
    }
}

/// One audio stream contributed by an element, described for the mixer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioStream {
    /// Source file path.
    pub path: PathBuf,
    /// Delay before the stream starts on the output timeline, seconds.
    pub start_offset: f64,
    /// Mix weight for this stream.
    pub volume: f64,
    /// Loop the source for the whole output duration.
    pub looped: bool,
}

/// The element contract: a timed visual/audio unit with its own render logic.
///
/// Concrete drawing (text layout, image decode, shape fill) lives outside
/// this crate; implementors only need to honor this narrow capability set.
///
/// Lifecycle: constructed during config parsing, [`Element::init`] before the
/// first frame (eagerly for every element in parallel mode), queried once per
/// output frame while active, [`Element::dispose`] at pipeline teardown.
pub trait Element: Send + Sync {
    /// When this element is active and at which z position.
    fn active_window(&self) -> ActiveWindow;

    /// Resolve the element's visual state at absolute time `t`.
    fn compute_transform_at(&self, t: f64) -> TransformState;

    /// Produce the element's frame at absolute time `t`, with its own
    /// transform already baked in. `None` means nothing to contribute.
    ///
    /// A [`SceneError::Draw`](crate::SceneError::Draw) return is transient:
    /// the compositor logs it and skips this element for the frame. Any other
    /// error (a missing or corrupt resource, say) aborts the render.
    fn produce_frame_at(&self, t: f64) -> SceneResult<Option<Frame>>;

    /// Audio streams this element contributes to the final mix.
    fn audio_streams(&self) -> Vec<AudioStream> {
        Vec::new()
    }

    /// Load resources. Called once before the first frame query.
    fn init(&mut self) -> SceneResult<()> {
        Ok(())
    }

    /// Release resources at pipeline teardown.
    fn dispose(&mut self) {}
}

/// A uniform color card: the reference implementation of the contract.
///
/// Covers the whole canvas with `color`, modulated by resolved opacity. Used
/// throughout the test suite and as a template for external element types.
pub struct SolidElement {
    window: ActiveWindow,
    canvas: Canvas,
    color: [u8; 4],
    /// Extra delay after `window.start` before the element becomes visible.
    appear_delay: f64,
    base: TransformState,
    animations: Vec<Animation>,
    audio: Vec<AudioStream>,
}

impl SolidElement {
    /// Create a solid card active over `[start, end)` with straight-alpha
    /// `color`.
    pub fn new(canvas: Canvas, start: f64, end: f64, z_index: i32, color: [u8; 4]) -> Self {
        Self {
            window: ActiveWindow {
                start,
                end,
                z_index,
            },
            canvas,
            color,
            appear_delay: 0.0,
            base: TransformState::default(),
            animations: Vec::new(),
            audio: Vec::new(),
        }
    }

    /// Attach an animation.
    pub fn with_animation(mut self, anim: Animation) -> Self {
        self.animations.push(anim);
        self
    }

    /// Delay visibility past the window start (opacity is forced to 0 until
    /// then; position still resolves).
    pub fn with_appear_delay(mut self, delay: f64) -> Self {
        self.appear_delay = delay;
        self
    }

    /// Attach an audio stream descriptor.
    pub fn with_audio(mut self, stream: AudioStream) -> Self {
        self.audio.push(stream);
        self
    }

    /// Replace the base transform the animations resolve against.
    pub fn with_base(mut self, base: TransformState) -> Self {
        self.base = base;
        self
    }
}

impl Element for SolidElement {
    fn active_window(&self) -> ActiveWindow {
        self.window
    }

    fn compute_transform_at(&self, t: f64) -> TransformState {
        resolve_transform(
            &self.base,
            &self.animations,
            t,
            self.window.start + self.appear_delay,
        )
    }

    fn produce_frame_at(&self, t: f64) -> SceneResult<Option<Frame>> {
        let state = self.compute_transform_at(t);
        if state.opacity <= 0.0 {
            return Ok(None);
        }

        let alpha = (f64::from(self.color[3]) * state.opacity).round() as u8;
        let premul = |c: u8| -> u8 {
            ((u16::from(c) * u16::from(alpha) + 127) / 255) as u8
        };
        Ok(Some(Frame::solid(
            self.canvas,
            [
                premul(self.color[0]),
                premul(self.color[1]),
                premul(self.color[2]),
                alpha,
            ],
        )))
    }

    fn audio_streams(&self) -> Vec<AudioStream> {
        self.audio.clone()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/element.rs"]
mod tests;
