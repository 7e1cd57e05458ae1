use crate::animation::ease::Ease;
use crate::foundation::core::TimeWindow;
use crate::foundation::error::{SceneError, SceneResult};
use crate::foundation::math::lerp_f64;

/// Animatable transform property id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    /// Horizontal position.
    X,
    /// Vertical position.
    Y,
    /// Horizontal scale factor.
    ScaleX,
    /// Vertical scale factor.
    ScaleY,
    /// 2D rotation in degrees.
    Rotation,
    /// 3D rotation about the X axis, degrees.
    RotationX,
    /// 3D rotation about the Y axis, degrees.
    RotationY,
    /// 3D rotation about the Z axis, degrees.
    RotationZ,
    /// Opacity in `[0, 1]`.
    Opacity,
    /// Z-axis translation.
    TranslateZ,
}

/// Boundary/fill policy: which side of the animation window holds a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fill {
    /// No value outside the window.
    None,
    /// Hold `to` after the window ends.
    Forwards,
    /// Hold `from` before the window starts.
    Backwards,
    /// Hold on both sides.
    #[default]
    Both,
}

impl Fill {
    fn backwards(self) -> bool {
        matches!(self, Self::Backwards | Self::Both)
    }

    fn forwards(self) -> bool {
        matches!(self, Self::Forwards | Self::Both)
    }
}

/// One keyframe of a keyframed animation, at normalized time `t` in `[0, 1]`.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    /// Normalized position inside the animation window.
    pub t: f64,
    /// Value at `t`.
    pub value: f64,
    /// Easing applied across the segment that *ends* at this key. When unset,
    /// the previous key's easing applies, then linear.
    pub ease: Option<Ease>,
}

/// Value source for an animation: a two-point tween or an ordered keyframe
/// list.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimSource {
    /// Interpolate `from` to `to` across the whole window.
    Tween {
        /// Start value.
        from: f64,
        /// End value.
        to: f64,
    },
    /// Piecewise interpolation through keyframes sorted ascending by `t`.
    Keyframes(Vec<Keyframe>),
}

/// One per-property animation attached to an element.
///
/// Effective window = `[start_time + delay, start_time + delay + duration)`.
/// Outside the window, [`Animation::value_at`] applies the [`Fill`] policy.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Animation {
    /// Property this animation drives.
    pub property: Property,
    /// Absolute timeline start in seconds.
    pub start_time: f64,
    /// Extra delay before the window opens, seconds.
    pub delay: f64,
    /// Window length in seconds, must be > 0.
    pub duration: f64,
    /// Easing applied to window progress (tween source only; keyframes carry
    /// per-segment easing).
    pub ease: Ease,
    /// Boundary hold policy outside the window.
    pub fill: Fill,
    /// When `true` the sampled value is an additive delta on top of the base
    /// value rather than an absolute replacement.
    pub is_offset: bool,
    /// Value source.
    pub source: AnimSource,
}

impl Animation {
    /// Build a tween animation with default fill (`Both`) and no offset.
    pub fn tween(property: Property, start_time: f64, duration: f64, from: f64, to: f64) -> Self {
        Self {
            property,
            start_time,
            delay: 0.0,
            duration,
            ease: Ease::Linear,
            fill: Fill::Both,
            is_offset: false,
            source: AnimSource::Tween { from, to },
        }
    }

    /// Replace the easing id.
    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Replace the fill policy.
    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    /// Mark the sampled value as an additive offset.
    pub fn as_offset(mut self) -> Self {
        self.is_offset = true;
        self
    }

    /// Delay the window open by `delay` seconds after `start_time`.
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    /// The effective half-open window `[start_time+delay, ..+duration)`.
    pub fn window(&self) -> TimeWindow {
        let start = self.start_time + self.delay;
        TimeWindow {
            start,
            end: start + self.duration,
        }
    }

    /// Return `true` when the window contains `t`.
    pub fn is_running(&self, t: f64) -> bool {
        self.window().contains(t)
    }

    /// Return `true` when the window has opened at or before `t`.
    pub fn has_started(&self, t: f64) -> bool {
        t >= self.window().start
    }

    /// First value of the source (`from`, or the first keyframe's value).
    pub fn from_value(&self) -> f64 {
        match &self.source {
            AnimSource::Tween { from, .. } => *from,
            AnimSource::Keyframes(keys) => keys.first().map(|k| k.value).unwrap_or(0.0),
        }
    }

    /// Terminal value of the source (`to`, or the last keyframe's value).
    pub fn to_value(&self) -> f64 {
        match &self.source {
            AnimSource::Tween { to, .. } => *to,
            AnimSource::Keyframes(keys) => keys.last().map(|k| k.value).unwrap_or(0.0),
        }
    }

    /// Validate static invariants: positive duration, finite times, and
    /// keyframes sorted ascending by normalized `t`.
    pub fn validate(&self) -> SceneResult<()> {
        if !(self.start_time.is_finite() && self.delay.is_finite() && self.duration.is_finite()) {
            return Err(SceneError::animation("animation times must be finite"));
        }
        if self.duration <= 0.0 {
            return Err(SceneError::animation("animation duration must be > 0"));
        }
        if let AnimSource::Keyframes(keys) = &self.source {
            if keys.is_empty() {
                return Err(SceneError::animation(
                    "keyframe animation must have at least one key",
                ));
            }
            if !keys.iter().all(|k| k.t.is_finite() && k.value.is_finite()) {
                return Err(SceneError::animation("keyframe t/value must be finite"));
            }
            if !keys.windows(2).all(|w| w[0].t <= w[1].t) {
                return Err(SceneError::animation(
                    "keyframes must be sorted ascending by t",
                ));
            }
        }
        Ok(())
    }

    /// Sample the animation at absolute timeline time `t`.
    ///
    /// Returns `None` outside the window when the fill policy excludes that
    /// side; otherwise the boundary value before/after the window and the
    /// eased interpolation inside it.
    pub fn value_at(&self, t: f64) -> Option<f64> {
        let window = self.window();
        if t < window.start {
            return self.fill.backwards().then(|| self.from_value());
        }
        if t >= window.end {
            return self.fill.forwards().then(|| self.to_value());
        }

        let progress = (t - window.start) / self.duration;
        Some(match &self.source {
            AnimSource::Tween { from, to } => lerp_f64(*from, *to, self.ease.apply(progress)),
            AnimSource::Keyframes(keys) => sample_keyframes(keys, progress),
        })
    }
}

/// Sample a sorted keyframe list at normalized progress.
///
/// Queries outside `[0, 1]` clamp to the nearest boundary key. The segment
/// between key `k` and key `k+1` eases with `k+1`'s easing, falling back to
/// `k`'s, then linear.
fn sample_keyframes(keys: &[Keyframe], progress: f64) -> f64 {
    debug_assert!(!keys.is_empty());
    let idx = keys.partition_point(|k| k.t <= progress);

    if idx == 0 {
        return keys[0].value;
    }
    if idx >= keys.len() {
        return keys[keys.len() - 1].value;
    }

    let a = &keys[idx - 1];
    let b = &keys[idx];
    let denom = b.t - a.t;
    if denom <= 0.0 {
        return a.value;
    }

    let seg_t = (progress - a.t) / denom;
    let ease = b.ease.or(a.ease).unwrap_or(Ease::Linear);
    lerp_f64(a.value, b.value, ease.apply(seg_t))
}

#[cfg(test)]
#[path = "../../tests/unit/animation/anim.rs"]
mod tests;
