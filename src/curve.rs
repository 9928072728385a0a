//! Curves sampled by the baker.
//!
//! Anything that maps a normalized position `t` in [0,1] to a scalar can feed a
//! channel. [`Keyframes`] is the authored representation stored in project
//! files; closures and [`Constant`] are handy for callers that compute values
//! directly.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Keys closer than this are treated as the same time.
pub const KEY_EPSILON: f32 = 1e-4;

/// Value of a channel whose curve is missing or has no keys.
pub const DEFAULT_VALUE: f32 = 1.0;

pub trait Curve {
    /// Evaluate the curve at `t`. Callers only pass values in [0,1].
    fn evaluate(&self, t: f32) -> f32;
}

impl<F> Curve for F
where
    F: Fn(f32) -> f32,
{
    fn evaluate(&self, t: f32) -> f32 {
        self(t)
    }
}

/// Flat curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constant(pub f32);

impl Curve for Constant {
    fn evaluate(&self, _t: f32) -> f32 {
        self.0
    }
}

// ------------------------- Easing -------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    SmoothStep,
    /// Hold the start value until the next key.
    Step,
}

impl Easing {
    pub const ALL: [Easing; 6] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::SmoothStep,
        Easing::Step,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Easing::Linear => "Linear",
            Easing::EaseIn => "EaseIn",
            Easing::EaseOut => "EaseOut",
            Easing::EaseInOut => "EaseInOut",
            Easing::SmoothStep => "SmoothStep",
            Easing::Step => "Step",
        }
    }

    /// Reshape a segment parameter `u` in [0,1].
    pub fn apply(&self, u: f32) -> f32 {
        match self {
            Easing::Linear => u,
            Easing::EaseIn => u * u,
            Easing::EaseOut => 1.0 - (1.0 - u) * (1.0 - u),
            Easing::EaseInOut => {
                if u < 0.5 {
                    2.0 * u * u
                } else {
                    1.0 - (-2.0 * u + 2.0).powi(2) / 2.0
                }
            }
            Easing::SmoothStep => u * u * (3.0 - 2.0 * u),
            Easing::Step => {
                if u >= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

// ------------------------- Keyframes -------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Keyframe {
    pub t: f32,
    pub v: f32,
    /// Shape of the segment that starts at this key.
    #[serde(default)]
    pub easing: Easing,
}

impl Keyframe {
    pub fn new(t: f32, v: f32) -> Self {
        Self {
            t,
            v,
            easing: Easing::Linear,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Piecewise keyframe curve.
///
/// Keys are kept sorted by time with no two keys within `KEY_EPSILON`. When
/// keys collide, the earliest time is kept and the value written last wins,
/// both when building a list and in [`Keyframes::upsert`]. Outside the keyed
/// range the nearest end value holds, and an empty list evaluates to
/// [`DEFAULT_VALUE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct Keyframes {
    keys: Vec<Keyframe>,
}

impl Default for Keyframes {
    fn default() -> Self {
        Self::constant_one()
    }
}

impl From<Vec<Keyframe>> for Keyframes {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}

impl From<Keyframes> for Vec<Keyframe> {
    fn from(curve: Keyframes) -> Self {
        curve.keys
    }
}

impl Keyframes {
    pub fn new(keys: Vec<Keyframe>) -> Self {
        Self {
            keys: normalize(keys),
        }
    }

    pub fn empty() -> Self {
        Self { keys: Vec::new() }
    }

    /// `(0, 1) -> (1, 1)`, the state a freshly reset channel starts in.
    pub fn constant_one() -> Self {
        Self::constant(1.0)
    }

    pub fn constant(v: f32) -> Self {
        Self::new(vec![Keyframe::new(0.0, v), Keyframe::new(1.0, v)])
    }

    /// Straight ramp from `from` at t=0 to `to` at t=1.
    pub fn linear(from: f32, to: f32) -> Self {
        Self::new(vec![Keyframe::new(0.0, from), Keyframe::new(1.0, to)])
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn sample(&self, t: f32, default: f32) -> f32 {
        if self.keys.is_empty() {
            return default;
        }
        if self.keys.len() == 1 {
            return self.keys[0].v;
        }
        let mut prev = &self.keys[0];
        for k in &self.keys[1..] {
            if t <= k.t {
                let denom = (k.t - prev.t).max(KEY_EPSILON);
                let mut u = ((t - prev.t) / denom).clamp(0.0, 1.0);
                u = prev.easing.apply(u);
                return lerp(prev.v, k.v, u);
            }
            prev = k;
        }
        prev.v
    }

    /// Set the value at `t`. A key already within `KEY_EPSILON` keeps its time
    /// and easing and takes the new value.
    pub fn upsert(&mut self, t: f32, v: f32) {
        if !t.is_finite() {
            return;
        }
        if let Some(existing) = self
            .keys
            .iter_mut()
            .find(|key| (key.t - t).abs() < KEY_EPSILON)
        {
            existing.v = v;
            return;
        }
        let at = self.keys.partition_point(|key| key.t < t);
        self.keys.insert(at, Keyframe::new(t, v));
    }

    pub fn set_easing(&mut self, index: usize, easing: Easing) -> bool {
        match self.keys.get_mut(index) {
            Some(key) => {
                key.easing = easing;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<Keyframe> {
        if index < self.keys.len() {
            Some(self.keys.remove(index))
        } else {
            None
        }
    }

    /// Pull every key into [0,1]. Keys that land on the same time collapse.
    pub fn clamp_times(&mut self) {
        for k in &mut self.keys {
            k.t = k.t.clamp(0.0, 1.0);
        }
        self.keys = normalize(std::mem::take(&mut self.keys));
    }
}

impl Curve for Keyframes {
    fn evaluate(&self, t: f32) -> f32 {
        self.sample(t, DEFAULT_VALUE)
    }
}

fn lerp(a: f32, b: f32, u: f32) -> f32 {
    a + (b - a) * u
}

/// Sort, drop non-finite times and merge duplicates.
///
/// A run of duplicates is anchored at its earliest key: every later key
/// closer than `KEY_EPSILON` to the anchor time merges into it. The merged
/// key keeps the anchor time and takes value and easing from whichever key
/// in the run was written last.
fn normalize(keys: Vec<Keyframe>) -> Vec<Keyframe> {
    let mut indexed: Vec<(usize, Keyframe)> = keys
        .into_iter()
        .enumerate()
        .filter(|(_, k)| k.t.is_finite())
        .collect();
    // stable, so equal times keep their write order
    indexed.sort_by(|a, b| a.1.t.partial_cmp(&b.1.t).unwrap_or(Ordering::Equal));
    let mut out: Vec<(usize, Keyframe)> = Vec::with_capacity(indexed.len());
    let mut anchor = f32::NEG_INFINITY;
    for (order, key) in indexed {
        match out.last_mut() {
            Some((last_order, last)) if key.t - anchor < KEY_EPSILON => {
                if order > *last_order {
                    *last_order = order;
                    last.v = key.v;
                    last.easing = key.easing;
                }
            }
            _ => {
                anchor = key.t;
                out.push((order, key));
            }
        }
    }
    out.into_iter().map(|(_, key)| key).collect()
}
