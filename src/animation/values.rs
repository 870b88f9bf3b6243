use glam::{Affine3A, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Values that a keyframe channel can blend between two samples.
pub trait Interpolatable: Sized {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self;
}

impl Interpolatable for f32 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start + (end - start) * t
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start.lerp(*end, t)
    }
}

impl Interpolatable for Quat {
    /// Spherical; the result is always a unit quaternion.
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start.slerp(*end, t).normalize()
    }
}

/// Rotation, scale and translation of one joint for one clip state.
///
/// Defaults to the identity transform. Persisted with the keys
/// `rotation`, `scale` and `translation`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformData {
    pub rotation: Quat,
    pub scale: Vec3,
    pub translation: Vec3,
}

impl Default for TransformData {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TransformData {
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
        translation: Vec3::ZERO,
    };

    #[must_use]
    pub fn new(rotation: Quat, translation: Vec3, scale: Vec3) -> Self {
        Self {
            rotation,
            scale,
            translation,
        }
    }

    pub fn set(&mut self, other: &TransformData) {
        *self = *other;
    }

    /// Composes the affine transform described by this data.
    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Overwrites `transform` with this data.
    pub fn apply_to(&self, transform: &mut Affine3A) {
        *transform = self.to_affine();
    }
}

impl Interpolatable for TransformData {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        Self {
            rotation: Quat::interpolate_linear(&start.rotation, &end.rotation, t),
            scale: Vec3::interpolate_linear(&start.scale, &end.scale, t),
            translation: Vec3::interpolate_linear(&start.translation, &end.translation, t),
        }
    }
}

/// The trigger currently reported by a [`TriggerChannel`](super::TriggerChannel).
///
/// `armed` stays set until an applier consumes the trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerData {
    current_trigger: Option<String>,
    current_index: usize,
    armed: bool,
}

impl TriggerData {
    #[must_use]
    pub fn current_trigger(&self) -> Option<&str> {
        self.current_trigger.as_deref()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn set_armed(&mut self, armed: bool) {
        self.armed = armed;
    }

    /// Points the trigger at `key`/`index`.
    ///
    /// A `None` key disarms. Re-arming with the key and index already held
    /// leaves the armed flag untouched so a trigger fires once per crossing.
    pub fn arm(&mut self, key: Option<&str>, index: usize) {
        match key {
            None => {
                self.current_trigger = None;
                self.current_index = index;
                self.armed = false;
            }
            Some(key) => {
                if self.current_trigger.as_deref() != Some(key) || self.current_index != index {
                    self.current_trigger = Some(key.to_owned());
                    self.current_index = index;
                    self.armed = true;
                }
            }
        }
    }
}

/// Per-channel playback output stored in a clip state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelValue {
    Transform(TransformData),
    Trigger(TriggerData),
}

impl ChannelValue {
    #[must_use]
    pub fn as_transform(&self) -> Option<&TransformData> {
        match self {
            ChannelValue::Transform(data) => Some(data),
            ChannelValue::Trigger(_) => None,
        }
    }

    #[must_use]
    pub fn as_trigger(&self) -> Option<&TriggerData> {
        match self {
            ChannelValue::Trigger(data) => Some(data),
            ChannelValue::Transform(_) => None,
        }
    }

    pub fn as_trigger_mut(&mut self) -> Option<&mut TriggerData> {
        match self {
            ChannelValue::Trigger(data) => Some(data),
            ChannelValue::Transform(_) => None,
        }
    }
}
