use std::collections::HashMap;
use std::sync::Arc;

use xxhash_rust::xxh3::Xxh3;

use crate::animation::ease::Ease;
use crate::effects::composite::crossfade;
use crate::foundation::core::{Canvas, TimeWindow};
use crate::foundation::error::{SceneError, SceneResult};

/// A timed cross-blend between the frozen end-state of one timeline segment
/// and the frozen start-state of the next.
///
/// `end_time = start_time + duration`. Overlapping specs are permitted; the
/// timeline resolves overlap with "latest `start_time` wins".
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TransitionSpec {
    /// Registered blend name (e.g. `"crossfade"`, `"wipe"`). Unregistered
    /// names fall back to a hard switch at progress 0.5.
    pub name: String,
    /// Absolute timeline start in seconds.
    pub start_time: f64,
    /// Blend length in seconds, must be > 0.
    pub duration: f64,
    /// Easing applied to progress before blending.
    pub ease: Ease,
    /// Blend-specific parameters, interpreted by the builder.
    pub params: serde_json::Value,
}

impl TransitionSpec {
    /// Build a spec with linear easing and no params.
    pub fn new(name: impl Into<String>, start_time: f64, duration: f64) -> Self {
        Self {
            name: name.into(),
            start_time,
            duration,
            ease: Ease::Linear,
            params: serde_json::Value::Null,
        }
    }

    /// Exclusive end time.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// The half-open active window `[start_time, end_time)`.
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time,
            end: self.end_time(),
        }
    }

    /// Validate name and timing invariants.
    pub fn validate(&self) -> SceneResult<()> {
        if self.name.trim().is_empty() {
            return Err(SceneError::validation("transition name must be non-empty"));
        }
        if !(self.start_time.is_finite() && self.duration.is_finite()) {
            return Err(SceneError::validation("transition times must be finite"));
        }
        if self.duration <= 0.0 {
            return Err(SceneError::validation("transition duration must be > 0"));
        }
        Ok(())
    }

    /// Stable fingerprint of the `(name, duration, params)` signature, used
    /// as the built-blend cache key.
    pub fn signature(&self) -> u64 {
        let mut h = Xxh3::new();
        h.update(self.name.as_bytes());
        h.update(&self.duration.to_bits().to_le_bytes());
        h.update(self.params.to_string().as_bytes());
        h.digest()
    }
}

/// Pixel blend keyed by eased progress over two equal-size RGBA rasters.
///
/// Implementations are pure functions of `progress`, which is what makes
/// caching a built blend per spec signature safe.
pub trait TransitionBlend: Send + Sync {
    /// Blend `from` and `to` into `out` at eased `progress` in `[0, 1]`.
    ///
    /// Contract: progress 0 reproduces `from` byte-for-byte, progress 1
    /// reproduces `to` byte-for-byte.
    fn blend(&self, from: &[u8], to: &[u8], out: &mut [u8], progress: f32) -> SceneResult<()>;
}

/// Builds a [`TransitionBlend`] from a spec and the output canvas.
pub trait BlendBuilder: Send + Sync {
    /// Construct the blend, parsing `spec.params`.
    fn build(&self, spec: &TransitionSpec, canvas: Canvas) -> SceneResult<Arc<dyn TransitionBlend>>;
}

impl<F> BlendBuilder for F
where
    F: Fn(&TransitionSpec, Canvas) -> SceneResult<Arc<dyn TransitionBlend>> + Send + Sync,
{
    fn build(&self, spec: &TransitionSpec, canvas: Canvas) -> SceneResult<Arc<dyn TransitionBlend>> {
        self(spec, canvas)
    }
}

/// Name → blend-builder registry, owned per render.
///
/// Deliberately an instance, not a process-wide static, so custom blends
/// never leak across renders or tests.
#[derive(Default)]
pub struct TransitionRegistry {
    builders: HashMap<String, Arc<dyn BlendBuilder>>,
}

impl TransitionRegistry {
    /// Empty registry. Every name resolves to the hard-switch fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in blends: `crossfade` (alias
    /// `fade`) and `wipe`.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        let fade: Arc<dyn BlendBuilder> =
            Arc::new(|_spec: &TransitionSpec, _canvas: Canvas| {
                Ok(Arc::new(CrossfadeBlend) as Arc<dyn TransitionBlend>)
            });
        reg.builders.insert("crossfade".into(), Arc::clone(&fade));
        reg.builders.insert("fade".into(), fade);
        reg.builders.insert(
            "wipe".into(),
            Arc::new(|spec: &TransitionSpec, canvas: Canvas| {
                Ok(Arc::new(WipeBlend::from_params(&spec.params, canvas)?)
                    as Arc<dyn TransitionBlend>)
            }),
        );
        reg
    }

    /// Register (or replace) a custom blend builder under `name`.
    pub fn register(&mut self, name: impl Into<String>, builder: Arc<dyn BlendBuilder>) {
        self.builders.insert(name.into().to_ascii_lowercase(), builder);
    }

    /// Return `true` when `name` has a registered builder.
    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(&name.to_ascii_lowercase())
    }

    /// Resolve the blend for `spec`, using `cache` to reuse a previously
    /// built blend with the same `(name, duration, params)` signature.
    pub fn resolve(
        &self,
        spec: &TransitionSpec,
        canvas: Canvas,
        cache: &mut BlendCache,
    ) -> SceneResult<Arc<dyn TransitionBlend>> {
        let key = spec.signature();
        if let Some(blend) = cache.built.get(&key) {
            return Ok(Arc::clone(blend));
        }

        let name = spec.name.trim().to_ascii_lowercase();
        let blend = match self.builders.get(&name) {
            Some(builder) => builder.build(spec, canvas)?,
            None => {
                tracing::debug!(name = %spec.name, "unregistered transition, using hard switch");
                Arc::new(HardCutBlend) as Arc<dyn TransitionBlend>
            }
        };
        cache.built.insert(key, Arc::clone(&blend));
        Ok(blend)
    }
}

/// Per-cursor cache of built blends keyed by spec signature.
#[derive(Default)]
pub struct BlendCache {
    built: HashMap<u64, Arc<dyn TransitionBlend>>,
}

impl BlendCache {
    /// Number of blends built so far.
    pub fn len(&self) -> usize {
        self.built.len()
    }

    /// Return `true` when nothing has been built yet.
    pub fn is_empty(&self) -> bool {
        self.built.is_empty()
    }
}

fn check_blend_buffers(from: &[u8], to: &[u8], out: &[u8]) -> SceneResult<()> {
    if from.len() != to.len() || from.len() != out.len() || !from.len().is_multiple_of(4) {
        return Err(SceneError::validation(
            "transition blend expects equal-length rgba8 buffers",
        ));
    }
    Ok(())
}

/// Default blend: per-channel linear cross-fade `from*(1-t) + to*t`.
pub struct CrossfadeBlend;

impl TransitionBlend for CrossfadeBlend {
    fn blend(&self, from: &[u8], to: &[u8], out: &mut [u8], progress: f32) -> SceneResult<()> {
        check_blend_buffers(from, to, out)?;
        for ((o, f), t) in out
            .chunks_exact_mut(4)
            .zip(from.chunks_exact(4))
            .zip(to.chunks_exact(4))
        {
            let px = crossfade([f[0], f[1], f[2], f[3]], [t[0], t[1], t[2], t[3]], progress);
            o.copy_from_slice(&px);
        }
        Ok(())
    }
}

/// Fallback blend for unregistered names: `from` below progress 0.5, `to`
/// at and above it.
pub struct HardCutBlend;

impl TransitionBlend for HardCutBlend {
    fn blend(&self, from: &[u8], to: &[u8], out: &mut [u8], progress: f32) -> SceneResult<()> {
        check_blend_buffers(from, to, out)?;
        out.copy_from_slice(if progress < 0.5 { from } else { to });
        Ok(())
    }
}

/// Direction the wipe edge travels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WipeDir {
    /// Edge sweeps from the left edge to the right.
    LeftToRight,
    /// Edge sweeps from the right edge to the left.
    RightToLeft,
    /// Edge sweeps from the top edge to the bottom.
    TopToBottom,
    /// Edge sweeps from the bottom edge to the top.
    BottomToTop,
}

/// Directional wipe with an optional softened edge.
pub struct WipeBlend {
    width: u32,
    height: u32,
    dir: WipeDir,
    soft_edge: f32,
}

impl WipeBlend {
    /// Parse wipe params `{ "dir": "...", "soft_edge": 0..1 }`.
    pub fn from_params(params: &serde_json::Value, canvas: Canvas) -> SceneResult<Self> {
        let params = if params.is_null() {
            None
        } else {
            Some(
                params
                    .as_object()
                    .ok_or_else(|| SceneError::validation("wipe params must be an object"))?,
            )
        };

        let dir = match params.and_then(|p| p.get("dir")).and_then(|v| v.as_str()) {
            None => WipeDir::LeftToRight,
            Some(s) => match s.trim().to_ascii_lowercase().as_str() {
                "left_to_right" | "ltr" => WipeDir::LeftToRight,
                "right_to_left" | "rtl" => WipeDir::RightToLeft,
                "top_to_bottom" | "ttb" => WipeDir::TopToBottom,
                "bottom_to_top" | "btt" => WipeDir::BottomToTop,
                other => {
                    return Err(SceneError::validation(format!("unknown wipe.dir '{other}'")));
                }
            },
        };

        let soft_edge = match params
            .and_then(|p| p.get("soft_edge"))
            .and_then(|v| v.as_f64())
        {
            None => 0.0,
            Some(v) => {
                let f = v as f32;
                if !f.is_finite() {
                    return Err(SceneError::validation("wipe.soft_edge must be finite"));
                }
                f.clamp(0.0, 1.0)
            }
        };

        Ok(Self {
            width: canvas.width,
            height: canvas.height,
            dir,
            soft_edge,
        })
    }
}

impl TransitionBlend for WipeBlend {
    fn blend(&self, from: &[u8], to: &[u8], out: &mut [u8], progress: f32) -> SceneResult<()> {
        check_blend_buffers(from, to, out)?;
        let expected = (self.width as usize) * (self.height as usize) * 4;
        if from.len() != expected {
            return Err(SceneError::validation(
                "wipe blend expects buffers matching width*height*4",
            ));
        }

        let t = progress.clamp(0.0, 1.0);
        let axis_len = match self.dir {
            WipeDir::LeftToRight | WipeDir::RightToLeft => self.width as f32,
            WipeDir::TopToBottom | WipeDir::BottomToTop => self.height as f32,
        };
        let soft_px = self.soft_edge * axis_len;

        let edge = t * (axis_len + 2.0 * soft_px) - soft_px;
        let a_edge = edge - soft_px;
        let b_edge = edge + soft_px;

        for y in 0..self.height {
            for x in 0..self.width {
                let pos = match self.dir {
                    WipeDir::LeftToRight => x as f32,
                    WipeDir::RightToLeft => (self.width - 1 - x) as f32,
                    WipeDir::TopToBottom => y as f32,
                    WipeDir::BottomToTop => (self.height - 1 - y) as f32,
                };

                let m = if soft_px <= 0.0 {
                    if pos < edge { 1.0 } else { 0.0 }
                } else {
                    1.0 - smoothstep(a_edge, b_edge, pos)
                };

                let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
                let fp = [from[idx], from[idx + 1], from[idx + 2], from[idx + 3]];
                let tp = [to[idx], to[idx + 1], to[idx + 2], to[idx + 3]];
                out[idx..idx + 4].copy_from_slice(&crossfade(fp, tp, m));
            }
        }
        Ok(())
    }
}

fn smoothstep(a: f32, b: f32, x: f32) -> f32 {
    if x <= a {
        return 0.0;
    }
    if x >= b {
        return 1.0;
    }
    let t = (x - a) / (b - a);
    (t * t * (3.0 - 2.0 * t)).clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transitions.rs"]
mod tests;
