use crate::animation::anim::Animation;
use crate::animation::resolve::{TransformState, resolve_transform};
use crate::composition::element::{ActiveWindow, AudioStream, Element};
use crate::effects::composite::over_in_place;
use crate::foundation::core::{Canvas, Frame};
use crate::foundation::error::{SceneError, SceneResult};
use crate::foundation::math::mul_div255_u8;

/// Maximum nesting depth for [`GroupElement`] trees.
pub const MAX_GROUP_DEPTH: usize = 16;

/// An element that contains a nested sub-timeline of child elements.
///
/// Children declare their windows in group-local time; the group maps
/// absolute time to local time and composites active children in z-order,
/// then applies its own resolved opacity. Self-similar composition is a tree:
/// nesting depth is tracked at construction and bounded by
/// [`MAX_GROUP_DEPTH`] to guard against malformed configs.
pub struct GroupElement {
    window: ActiveWindow,
    canvas: Canvas,
    base: TransformState,
    animations: Vec<Animation>,
    children: Vec<Box<dyn Element>>,
    depth: usize,
}

impl GroupElement {
    /// Create an empty group active over `[start, end)`.
    pub fn new(canvas: Canvas, start: f64, end: f64, z_index: i32) -> Self {
        Self {
            window: ActiveWindow {
                start,
                end,
                z_index,
            },
            canvas,
            base: TransformState::default(),
            animations: Vec::new(),
            children: Vec::new(),
            depth: 1,
        }
    }

    /// Add a leaf child.
    pub fn with_element(mut self, child: Box<dyn Element>) -> Self {
        self.children.push(child);
        self
    }

    /// Add a nested group child, rejecting trees deeper than
    /// [`MAX_GROUP_DEPTH`].
    pub fn with_group(mut self, child: GroupElement) -> SceneResult<Self> {
        let depth = self.depth.max(child.depth + 1);
        if depth > MAX_GROUP_DEPTH {
            return Err(SceneError::validation(format!(
                "group nesting depth {depth} exceeds the maximum of {MAX_GROUP_DEPTH}"
            )));
        }
        self.depth = depth;
        self.children.push(Box::new(child));
        Ok(self)
    }

    /// Attach an animation to the group itself.
    pub fn with_animation(mut self, anim: Animation) -> Self {
        self.animations.push(anim);
        self
    }

    /// Current nesting depth of this group tree.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Element for GroupElement {
    fn active_window(&self) -> ActiveWindow {
        self.window
    }

    fn compute_transform_at(&self, t: f64) -> TransformState {
        resolve_transform(&self.base, &self.animations, t, self.window.start)
    }

    fn produce_frame_at(&self, t: f64) -> SceneResult<Option<Frame>> {
        let state = self.compute_transform_at(t);
        if state.opacity <= 0.0 {
            return Ok(None);
        }

        let local = t - self.window.start;
        let mut active: Vec<&dyn Element> = self
            .children
            .iter()
            .map(|c| c.as_ref())
            .filter(|c| c.active_window().window().contains(local))
            .collect();
        if active.is_empty() {
            return Ok(None);
        }
        active.sort_by_key(|c| c.active_window().z_index);

        let mut out = Frame::transparent(self.canvas);
        for child in active {
            if let Some(frame) = child.produce_frame_at(local)? {
                frame.check_matches(self.canvas)?;
                over_in_place(&mut out.data, &frame.data, 1.0)?;
            }
        }

        if state.opacity < 1.0 {
            apply_opacity(&mut out.data, state.opacity);
        }
        Ok(Some(out))
    }

    fn audio_streams(&self) -> Vec<AudioStream> {
        let mut streams = Vec::new();
        for child in &self.children {
            for mut stream in child.audio_streams() {
                // Child offsets are group-local; shift onto the timeline.
                stream.start_offset += self.window.start;
                streams.push(stream);
            }
        }
        streams
    }

    fn init(&mut self) -> SceneResult<()> {
        for child in &mut self.children {
            child.init()?;
        }
        Ok(())
    }

    fn dispose(&mut self) {
        for child in &mut self.children {
            child.dispose();
        }
    }
}

fn apply_opacity(data: &mut [u8], opacity: f64) {
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    for px in data.chunks_exact_mut(4) {
        for c in px.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), op);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/group.rs"]
mod tests;
