//! Skeleton clips: timestamped frames of named joint positions.
//!
//! Input is loosely typed capture JSON (`{"frames": [{"t": 0.0, "joints": {...}}, ...]}`).
//! Malformed pieces never fail deserialization: a bad joint entry becomes an absent joint,
//! a non-numeric timestamp becomes a synthesized one, a non-object frame becomes an empty
//! frame.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::coerce::coerce_finite;
use crate::geometry::Vec3;

pub const LEFT_WRIST: &str = "POSE_LEFT_WRIST";
pub const RIGHT_WRIST: &str = "POSE_RIGHT_WRIST";
pub const NOSE: &str = "POSE_NOSE";
pub const LEFT_SHOULDER: &str = "POSE_LEFT_SHOULDER";
pub const RIGHT_SHOULDER: &str = "POSE_RIGHT_SHOULDER";

/// Frame rate assumed when a frame carries no usable timestamp.
pub const FALLBACK_FPS: f64 = 30.0;

/// One sample of a clip.
///
/// `joints` maps a joint name to its position, or to `None` when the entry was present but
/// malformed. Both cases read as "absent" through [`joint_at`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct Frame {
    pub t: Option<f64>,
    pub joints: BTreeMap<String, Option<Vec3>>,
}

impl Frame {
    /// An empty frame with an explicit timestamp.
    pub fn at(t: f64) -> Self {
        Self {
            t: Some(t),
            joints: BTreeMap::new(),
        }
    }

    pub fn with_joint(mut self, key: &str, position: Vec3) -> Self {
        self.joints.insert(key.to_string(), Some(position));
        self
    }

    /// Parses a frame from capture JSON, degrading malformed parts to absence.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        // Only real JSON numbers count as timestamps.
        let t = obj
            .get("t")
            .and_then(Value::as_f64)
            .filter(|t| t.is_finite());

        let joints = obj
            .get("joints")
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .map(|(k, v)| (k.clone(), parse_joint(v)))
                    .collect()
            })
            .unwrap_or_default();

        Self { t, joints }
    }
}

impl From<Value> for Frame {
    fn from(value: Value) -> Self {
        Frame::from_value(&value)
    }
}

/// Reads `{x, y, z?}`. `z` defaults to 0 when omitted (2D capture) but a present, non-numeric
/// `z` makes the whole joint absent.
fn parse_joint(value: &Value) -> Option<Vec3> {
    let obj = value.as_object()?;
    let x = coerce_finite(obj.get("x")?)?;
    let y = coerce_finite(obj.get("y")?)?;
    let z = match obj.get("z") {
        None => 0.0,
        Some(z) => coerce_finite(z)?,
    };
    Some(Vec3::new(x, y, z))
}

/// An ordered sequence of frames; insertion order is temporal order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawClip")]
pub struct SkeletonClip {
    frames: Vec<Frame>,
}

#[derive(Deserialize)]
struct RawClip {
    #[serde(default)]
    frames: Value,
}

impl From<RawClip> for SkeletonClip {
    fn from(raw: RawClip) -> Self {
        let frames = match raw.frames {
            Value::Array(items) => items.iter().map(Frame::from_value).collect(),
            _ => Vec::new(),
        };
        Self { frames }
    }
}

impl SkeletonClip {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Yields `(timestamp, position)` for every frame where `key` is present, in order.
    pub fn observations<'a>(&'a self, key: &'a str) -> impl Iterator<Item = (f64, Vec3)> + 'a {
        self.frames
            .iter()
            .enumerate()
            .filter_map(move |(i, f)| joint_at(f, key).map(|p| (time_of(f, i), p)))
    }
}

/// Position of `key` in `frame`, or `None` when absent or malformed.
pub fn joint_at(frame: &Frame, key: &str) -> Option<Vec3> {
    frame.joints.get(key).copied().flatten()
}

/// The frame's own timestamp, or `index / 30` when it has none.
pub fn time_of(frame: &Frame, index: usize) -> f64 {
    frame.t.unwrap_or(index as f64 / FALLBACK_FPS)
}
