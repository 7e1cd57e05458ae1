use smallvec::SmallVec;

use crate::animation::anim::{Animation, Property};

/// Fully resolved visual state of one element at one instant.
///
/// A pure function of `(element, time)`; see [`resolve_transform`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransformState {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
    /// 2D rotation, degrees.
    pub rotation: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// 3D rotation about X, degrees.
    pub rotation_x: f64,
    /// 3D rotation about Y, degrees.
    pub rotation_y: f64,
    /// 3D rotation about Z, degrees.
    pub rotation_z: f64,
    /// Z-axis translation.
    pub translate_z: f64,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            opacity: 1.0,
            rotation_x: 0.0,
            rotation_y: 0.0,
            rotation_z: 0.0,
            translate_z: 0.0,
        }
    }
}

impl TransformState {
    /// The single additive rotation pool applied when compositing in 2D.
    ///
    /// All four rotation properties feed this sum; `rotation_x`/`rotation_y`
    /// deliberately contribute alongside `rotation`/`rotation_z` to match the
    /// established behavior (see DESIGN.md).
    pub fn effective_rotation_2d(&self) -> f64 {
        self.rotation + self.rotation_x + self.rotation_y + self.rotation_z
    }
}

type Contributors<'a> = SmallVec<[&'a Animation; 4]>;

/// Resolve the visual state of one element at time `t` from its base state
/// and all animations targeting it.
///
/// Combination rules across animations on the same property:
/// - absolute `X`/`Y` overwrite the base; `is_offset` `X`/`Y` accumulate
///   additively on top;
/// - `ScaleX`/`ScaleY` pick one contributor (running beats finished beats
///   not-yet-started, see [`combine_scale`]) to model sequential scale steps;
/// - all rotation properties sum additively;
/// - `Opacity` multiplies across contributors;
/// - `TranslateZ` is last-writer-wins in declaration order.
///
/// Before `visible_from` (element start plus its own delay) opacity is forced
/// to 0 while position still resolves, so offset animations can pre-stage.
pub fn resolve_transform(
    base: &TransformState,
    anims: &[Animation],
    t: f64,
    visible_from: f64,
) -> TransformState {
    let mut out = *base;

    out.x = combine_position(anims, Property::X, t, base.x);
    out.y = combine_position(anims, Property::Y, t, base.y);
    out.scale_x = combine_scale(anims, Property::ScaleX, t, base.scale_x);
    out.scale_y = combine_scale(anims, Property::ScaleY, t, base.scale_y);
    out.rotation = base.rotation + sum_contributions(anims, Property::Rotation, t);
    out.rotation_x = base.rotation_x + sum_contributions(anims, Property::RotationX, t);
    out.rotation_y = base.rotation_y + sum_contributions(anims, Property::RotationY, t);
    out.rotation_z = base.rotation_z + sum_contributions(anims, Property::RotationZ, t);
    out.opacity = combine_opacity(anims, t, base.opacity);
    out.translate_z = combine_last_writer(anims, Property::TranslateZ, t, base.translate_z);

    if t < visible_from {
        out.opacity = 0.0;
    }
    out
}

fn targeting<'a>(anims: &'a [Animation], property: Property) -> Contributors<'a> {
    anims.iter().filter(|a| a.property == property).collect()
}

fn combine_position(anims: &[Animation], property: Property, t: f64, base: f64) -> f64 {
    let mut absolute = None;
    let mut offset = 0.0;
    for anim in targeting(anims, property) {
        let Some(v) = anim.value_at(t) else { continue };
        if anim.is_offset {
            offset += v;
        } else {
            absolute = Some(v);
        }
    }
    absolute.unwrap_or(base) + offset
}

/// Scale steps are sequential, not cumulative: a running animation wins
/// (latest window start breaks ties), else the terminal value of the
/// animation that finished last, else the first animation's current value.
fn combine_scale(anims: &[Animation], property: Property, t: f64, base: f64) -> f64 {
    let contributors = targeting(anims, property);
    if contributors.is_empty() {
        return base;
    }

    let mut running: Option<&Animation> = None;
    for anim in &contributors {
        if !anim.is_running(t) {
            continue;
        }
        let later = running.is_none_or(|cur| anim.window().start >= cur.window().start);
        if later {
            running = Some(anim);
        }
    }
    if let Some(anim) = running
        && let Some(v) = anim.value_at(t)
    {
        return v;
    }

    let mut finished: Option<&Animation> = None;
    for anim in &contributors {
        if anim.window().end > t {
            continue;
        }
        let later = finished.is_none_or(|cur| anim.window().end >= cur.window().end);
        if later {
            finished = Some(anim);
        }
    }
    if let Some(anim) = finished {
        return anim.to_value();
    }

    contributors[0].value_at(t).unwrap_or(base)
}

fn sum_contributions(anims: &[Animation], property: Property, t: f64) -> f64 {
    targeting(anims, property)
        .iter()
        .filter_map(|a| a.value_at(t))
        .sum()
}

fn combine_opacity(anims: &[Animation], t: f64, base: f64) -> f64 {
    let mut opacity = base;
    for anim in targeting(anims, Property::Opacity) {
        if let Some(v) = anim.value_at(t) {
            opacity *= v;
        }
    }
    opacity.clamp(0.0, 1.0)
}

fn combine_last_writer(anims: &[Animation], property: Property, t: f64, base: f64) -> f64 {
    let mut value = base;
    for anim in targeting(anims, property) {
        if let Some(v) = anim.value_at(t) {
            value = v;
        }
    }
    value
}

#[cfg(test)]
#[path = "../../tests/unit/animation/resolve.rs"]
mod tests;
