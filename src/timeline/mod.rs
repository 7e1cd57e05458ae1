//! Timeline state and per-frame compositing.

use std::collections::HashMap;

use crate::composition::element::{AudioStream, Element};
use crate::effects::composite::over_in_place;
use crate::effects::transitions::{BlendCache, TransitionRegistry, TransitionSpec};
use crate::foundation::core::{Canvas, Fps, Frame};
use crate::foundation::error::{SceneError, SceneResult};

/// The scene timeline: elements, transition schedule, and the transition
/// registry for one render.
///
/// A `Timeline` is read-mostly once built: concurrent segment tasks share it
/// immutably and keep their own [`TimelineCursor`] for scratch state.
pub struct Timeline {
    canvas: Canvas,
    fps: Fps,
    duration: f64,
    elements: Vec<Box<dyn Element>>,
    transitions: Vec<TransitionSpec>,
    registry: TransitionRegistry,
}

/// Builder for [`Timeline`].
pub struct TimelineBuilder {
    canvas: Canvas,
    fps: Fps,
    duration: f64,
    elements: Vec<Box<dyn Element>>,
    transitions: Vec<TransitionSpec>,
    registry: TransitionRegistry,
}

impl TimelineBuilder {
    /// Start a timeline covering `[0, duration)` seconds.
    pub fn new(canvas: Canvas, fps: Fps, duration: f64) -> Self {
        Self {
            canvas,
            fps,
            duration,
            elements: Vec::new(),
            transitions: Vec::new(),
            registry: TransitionRegistry::with_builtins(),
        }
    }

    /// Add an element.
    pub fn element(mut self, element: Box<dyn Element>) -> Self {
        self.elements.push(element);
        self
    }

    /// Schedule a transition.
    pub fn transition(mut self, spec: TransitionSpec) -> Self {
        self.transitions.push(spec);
        self
    }

    /// Replace the transition registry (custom blends).
    pub fn registry(mut self, registry: TransitionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Validate and finish the timeline.
    pub fn build(self) -> SceneResult<Timeline> {
        let timeline = Timeline {
            canvas: self.canvas,
            fps: self.fps,
            duration: self.duration,
            elements: self.elements,
            transitions: self.transitions,
            registry: self.registry,
        };
        timeline.validate()?;
        Ok(timeline)
    }
}

impl Timeline {
    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Output frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Total timeline duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Total output frame count: `ceil(duration * fps)`.
    pub fn total_frames(&self) -> u64 {
        self.fps.frames_covering_secs(self.duration)
    }

    /// Audio streams contributed by every element, offset to timeline time.
    pub fn audio_streams(&self) -> Vec<AudioStream> {
        self.elements
            .iter()
            .flat_map(|e| e.audio_streams())
            .collect()
    }

    /// Validate canvas, fps, duration, elements, and transitions.
    pub fn validate(&self) -> SceneResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(SceneError::validation("canvas must be non-empty"));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(SceneError::validation("fps numerator and denominator must be > 0"));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(SceneError::validation("timeline duration must be > 0"));
        }
        for element in &self.elements {
            let win = element.active_window();
            if !(win.start.is_finite() && win.end.is_finite()) || win.start > win.end {
                return Err(SceneError::validation(
                    "element active window must be finite with start <= end",
                ));
            }
        }
        for spec in &self.transitions {
            spec.validate()?;
        }
        Ok(())
    }

    /// Initialize every element (resource loads). The parallel orchestrator
    /// calls this eagerly across the whole timeline before any segment runs.
    pub fn init_elements(&mut self) -> SceneResult<()> {
        for element in &mut self.elements {
            element.init()?;
        }
        Ok(())
    }

    /// Dispose every element at pipeline teardown.
    pub fn dispose_elements(&mut self) {
        for element in &mut self.elements {
            element.dispose();
        }
    }

    /// The transition active at `t`, if any. Overlapping specs resolve to
    /// the one with the latest `start_time`.
    pub fn active_transition(&self, t: f64) -> Option<&TransitionSpec> {
        self.transitions
            .iter()
            .filter(|spec| spec.window().contains(t))
            .max_by(|a, b| {
                a.start_time
                    .partial_cmp(&b.start_time)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Composite all elements active at `t` in z-order, ignoring transitions.
    ///
    /// Per-element draw errors are logged and skipped; anything else aborts.
    fn composite_elements_at(&self, t: f64) -> SceneResult<Frame> {
        let mut active: Vec<&dyn Element> = self
            .elements
            .iter()
            .map(|e| e.as_ref())
            .filter(|e| e.active_window().window().contains(t))
            .collect();
        // Stable by construction order within equal z.
        active.sort_by_key(|e| e.active_window().z_index);

        let mut out = Frame::transparent(self.canvas);
        for element in active {
            match element.produce_frame_at(t) {
                Ok(Some(frame)) => {
                    frame.check_matches(self.canvas)?;
                    over_in_place(&mut out.data, &frame.data, 1.0)?;
                }
                Ok(None) => {}
                Err(err) if !err.is_fatal() => {
                    tracing::warn!(t, error = %err, "element draw failed, skipping for this frame");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(out)
    }
}

/// Per-task cursor over a shared [`Timeline`].
///
/// Owns the scratch state one frame loop needs: the built-blend cache and the
/// frozen transition endpoint frames. Never shared across concurrent segment
/// tasks.
pub struct TimelineCursor<'a> {
    timeline: &'a Timeline,
    blend_cache: BlendCache,
    // Keyed per spec instance: two transitions sharing a blend signature
    // still freeze their own endpoint rasters.
    frozen: HashMap<(u64, u64), (Frame, Frame)>,
}

impl<'a> TimelineCursor<'a> {
    /// Create a cursor over `timeline`.
    pub fn new(timeline: &'a Timeline) -> Self {
        Self {
            timeline,
            blend_cache: BlendCache::default(),
            frozen: HashMap::new(),
        }
    }

    /// Produce the output frame for absolute time `t`.
    ///
    /// When a transition is active the result is the blend of the composited
    /// rasters frozen at the transition's endpoints; element compositing is
    /// skipped entirely for that frame. Otherwise all active elements are
    /// composited in z-order.
    pub fn frame_at(&mut self, t: f64) -> SceneResult<Frame> {
        let Some(spec) = self.timeline.active_transition(t) else {
            return self.timeline.composite_elements_at(t);
        };

        let key = (spec.signature(), spec.start_time.to_bits());
        if !self.frozen.contains_key(&key) {
            let from = self.timeline.composite_elements_at(spec.start_time)?;
            let to = self.timeline.composite_elements_at(spec.end_time())?;
            self.frozen.insert(key, (from, to));
        }
        let (from, to) = self
            .frozen
            .get(&key)
            .ok_or_else(|| SceneError::validation("frozen transition endpoints missing"))?;

        let progress = ((t - spec.start_time) / spec.duration).clamp(0.0, 1.0);
        let eased = spec.ease.apply(progress) as f32;

        let blend = self
            .timeline
            .registry
            .resolve(spec, self.timeline.canvas, &mut self.blend_cache)?;
        let mut out = Frame::transparent(self.timeline.canvas);
        blend.blend(&from.data, &to.data, &mut out.data, eased)?;
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/compositor.rs"]
mod tests;
