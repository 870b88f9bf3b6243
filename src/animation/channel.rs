use glam::{Affine3A, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::animation::values::{ChannelValue, Interpolatable, TransformData, TriggerData};
use crate::errors::{Result, SinewError};

/// Prefix of channels that drive a skeleton joint; the joint index follows.
pub const JOINT_CHANNEL_PREFIX: &str = "_jnt";

/// Builds the channel name used for joint `index`.
#[must_use]
pub fn joint_channel_name(index: usize) -> String {
    format!("{JOINT_CHANNEL_PREFIX}{index}")
}

/// Extracts the joint index from a joint channel name.
#[must_use]
pub fn joint_index_from_channel_name(name: &str) -> Option<usize> {
    name.strip_prefix(JOINT_CHANNEL_PREFIX)?.parse().ok()
}

/// Where a clock time falls within a channel's sample times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplePosition {
    /// Exactly on a sample (also used for clamping outside the time range).
    Exact(usize),
    /// Between `index` and `index + 1`, `progress` in (0, 1).
    Between { index: usize, progress: f64 },
}

/// Maps `clock_time` onto `times`.
///
/// `times` must be non-empty and non-decreasing.
#[must_use]
pub fn locate_sample(times: &[f32], clock_time: f64) -> SamplePosition {
    let last = times.len() - 1;
    if times.len() == 1 || clock_time < 0.0 || clock_time <= f64::from(times[0]) {
        return SamplePosition::Exact(0);
    }
    if clock_time >= f64::from(times[last]) {
        return SamplePosition::Exact(last);
    }

    // Greatest index with times[i] < clock_time; ties resolve to the lower index.
    let index = times
        .partition_point(|&t| f64::from(t) < clock_time)
        .saturating_sub(1);
    let t0 = f64::from(times[index]);
    let t1 = f64::from(times[index + 1]);

    SamplePosition::Between {
        index,
        progress: (clock_time - t0) / (t1 - t0),
    }
}

fn validate_times(name: &str, times: &[f32]) -> Result<()> {
    if times.is_empty() {
        return Err(SinewError::invalid(format!(
            "channel '{name}' must have at least one sample time"
        )));
    }
    if times.windows(2).any(|w| w[1] < w[0]) {
        return Err(SinewError::invalid(format!(
            "channel '{name}' sample times must be non-decreasing"
        )));
    }
    Ok(())
}

fn validate_len(name: &str, what: &str, len: usize, expected: usize) -> Result<()> {
    if len == expected {
        Ok(())
    } else {
        Err(SinewError::invalid(format!(
            "channel '{name}': {what} has {len} entries, expected {expected}"
        )))
    }
}

fn validate_sub_range(sample_count: usize, start: usize, end: usize) -> Result<()> {
    if start > end {
        return Err(SinewError::invalid("start sample > end sample"));
    }
    if end >= sample_count {
        return Err(SinewError::invalid("end sample >= sample count"));
    }
    Ok(())
}

/// A named, time-sampled curve writing into a caller-owned value.
pub trait KeyframeChannel {
    type Value;

    fn name(&self) -> &str;

    fn times(&self) -> &[f32];

    /// Writes sample `index` into `out`, unmodified.
    fn set_current_sample(&self, index: usize, out: &mut Self::Value);

    /// Writes the blend of samples `index` and `index + 1` into `out`.
    fn set_current_sample_between(&self, index: usize, progress: f64, out: &mut Self::Value);

    fn create_state_data_object(&self) -> Self::Value;

    fn sample_count(&self) -> usize {
        self.times().len()
    }

    fn max_time(&self) -> f64 {
        self.times().last().copied().map_or(0.0, f64::from)
    }

    fn update_sample(&self, clock_time: f64, out: &mut Self::Value) {
        match locate_sample(self.times(), clock_time) {
            SamplePosition::Exact(index) => self.set_current_sample(index, out),
            SamplePosition::Between { index, progress } => {
                self.set_current_sample_between(index, progress, out);
            }
        }
    }
}

// ============================================================================
// TransformChannel
// ============================================================================

#[derive(Deserialize)]
struct RawTransformChannel {
    name: String,
    times: Vec<f32>,
    rotations: Vec<Quat>,
    translations: Vec<Vec3>,
    scales: Vec<Vec3>,
}

impl TryFrom<RawTransformChannel> for TransformChannel {
    type Error = SinewError;

    fn try_from(raw: RawTransformChannel) -> Result<Self> {
        TransformChannel::new(raw.name, raw.times, raw.rotations, raw.translations, raw.scales)
    }
}

/// Rotation/translation/scale keys for one joint (or any transform target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTransformChannel")]
pub struct TransformChannel {
    name: String,
    times: Vec<f32>,
    rotations: Vec<Quat>,
    translations: Vec<Vec3>,
    scales: Vec<Vec3>,
}

impl TransformChannel {
    pub fn new(
        name: impl Into<String>,
        times: Vec<f32>,
        rotations: Vec<Quat>,
        translations: Vec<Vec3>,
        scales: Vec<Vec3>,
    ) -> Result<Self> {
        let name = name.into();
        validate_times(&name, &times)?;
        validate_len(&name, "rotations", rotations.len(), times.len())?;
        validate_len(&name, "translations", translations.len(), times.len())?;
        validate_len(&name, "scales", scales.len(), times.len())?;

        Ok(Self {
            name,
            times,
            rotations,
            translations,
            scales,
        })
    }

    /// Builds a channel from full transforms, decomposing each into TRS.
    pub fn from_transforms(
        name: impl Into<String>,
        times: Vec<f32>,
        transforms: &[Affine3A],
    ) -> Result<Self> {
        let mut rotations = Vec::with_capacity(transforms.len());
        let mut translations = Vec::with_capacity(transforms.len());
        let mut scales = Vec::with_capacity(transforms.len());
        for transform in transforms {
            let (scale, rotation, translation) = transform.to_scale_rotation_translation();
            rotations.push(rotation);
            translations.push(translation);
            scales.push(scale);
        }
        Self::new(name, times, rotations, translations, scales)
    }

    /// A channel driving joint `joint_index`.
    pub fn joint(
        joint_index: usize,
        times: Vec<f32>,
        rotations: Vec<Quat>,
        translations: Vec<Vec3>,
        scales: Vec<Vec3>,
    ) -> Result<Self> {
        Self::new(
            joint_channel_name(joint_index),
            times,
            rotations,
            translations,
            scales,
        )
    }

    #[must_use]
    pub fn rotations(&self) -> &[Quat] {
        &self.rotations
    }

    #[must_use]
    pub fn translations(&self) -> &[Vec3] {
        &self.translations
    }

    #[must_use]
    pub fn scales(&self) -> &[Vec3] {
        &self.scales
    }

    /// The joint this channel drives, if it is a joint channel.
    #[must_use]
    pub fn joint_index(&self) -> Option<usize> {
        joint_index_from_channel_name(&self.name)
    }

    /// Sample `index` as transform data.
    #[must_use]
    pub fn transform_data(&self, index: usize) -> TransformData {
        TransformData {
            rotation: self.rotations[index],
            scale: self.scales[index],
            translation: self.translations[index],
        }
    }

    /// Copies samples `start..=end` into a new channel.
    pub fn sub_channel(&self, name: impl Into<String>, start: usize, end: usize) -> Result<Self> {
        validate_sub_range(self.times.len(), start, end)?;
        Self::new(
            name,
            self.times[start..=end].to_vec(),
            self.rotations[start..=end].to_vec(),
            self.translations[start..=end].to_vec(),
            self.scales[start..=end].to_vec(),
        )
    }
}

impl KeyframeChannel for TransformChannel {
    type Value = TransformData;

    fn name(&self) -> &str {
        &self.name
    }

    fn times(&self) -> &[f32] {
        &self.times
    }

    fn set_current_sample(&self, index: usize, out: &mut TransformData) {
        *out = self.transform_data(index);
    }

    fn set_current_sample_between(&self, index: usize, progress: f64, out: &mut TransformData) {
        if progress == 0.0 {
            self.set_current_sample(index, out);
            return;
        } else if progress == 1.0 {
            self.set_current_sample(index + 1, out);
            return;
        }

        let t = progress as f32;
        out.rotation =
            Quat::interpolate_linear(&self.rotations[index], &self.rotations[index + 1], t);
        out.translation = Vec3::interpolate_linear(
            &self.translations[index],
            &self.translations[index + 1],
            t,
        );
        out.scale = Vec3::interpolate_linear(&self.scales[index], &self.scales[index + 1], t);
    }

    fn create_state_data_object(&self) -> TransformData {
        TransformData::default()
    }
}

// ============================================================================
// TriggerChannel
// ============================================================================

#[derive(Deserialize)]
struct RawTriggerChannel {
    name: String,
    times: Vec<f32>,
    keys: Vec<Option<String>>,
}

impl TryFrom<RawTriggerChannel> for TriggerChannel {
    type Error = SinewError;

    fn try_from(raw: RawTriggerChannel) -> Result<Self> {
        TriggerChannel::new(raw.name, raw.times, raw.keys)
    }
}

/// Keyed events fired as playback crosses sample times.
///
/// A `None` key marks a span with no active trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTriggerChannel")]
pub struct TriggerChannel {
    name: String,
    times: Vec<f32>,
    keys: Vec<Option<String>>,
}

impl TriggerChannel {
    pub fn new(
        name: impl Into<String>,
        times: Vec<f32>,
        keys: Vec<Option<String>>,
    ) -> Result<Self> {
        let name = name.into();
        validate_times(&name, &times)?;
        validate_len(&name, "keys", keys.len(), times.len())?;
        Ok(Self { name, times, keys })
    }

    #[must_use]
    pub fn keys(&self) -> &[Option<String>] {
        &self.keys
    }

    /// Copies samples `start..=end` into a new channel.
    pub fn sub_channel(&self, name: impl Into<String>, start: usize, end: usize) -> Result<Self> {
        validate_sub_range(self.times.len(), start, end)?;
        Self::new(
            name,
            self.times[start..=end].to_vec(),
            self.keys[start..=end].to_vec(),
        )
    }
}

impl KeyframeChannel for TriggerChannel {
    type Value = TriggerData;

    fn name(&self) -> &str {
        &self.name
    }

    fn times(&self) -> &[f32] {
        &self.times
    }

    fn set_current_sample(&self, index: usize, out: &mut TriggerData) {
        out.arm(self.keys[index].as_deref(), index);
    }

    fn set_current_sample_between(&self, index: usize, progress: f64, out: &mut TriggerData) {
        let index = if progress == 1.0 { index + 1 } else { index };
        self.set_current_sample(index, out);
    }

    fn create_state_data_object(&self) -> TriggerData {
        TriggerData::default()
    }
}

// ============================================================================
// AnimationChannel
// ============================================================================

/// Any channel a clip can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnimationChannel {
    Transform(TransformChannel),
    Trigger(TriggerChannel),
}

impl From<TransformChannel> for AnimationChannel {
    fn from(channel: TransformChannel) -> Self {
        AnimationChannel::Transform(channel)
    }
}

impl From<TriggerChannel> for AnimationChannel {
    fn from(channel: TriggerChannel) -> Self {
        AnimationChannel::Trigger(channel)
    }
}

impl AnimationChannel {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            AnimationChannel::Transform(c) => c.name(),
            AnimationChannel::Trigger(c) => c.name(),
        }
    }

    #[must_use]
    pub fn times(&self) -> &[f32] {
        match self {
            AnimationChannel::Transform(c) => c.times(),
            AnimationChannel::Trigger(c) => c.times(),
        }
    }

    #[must_use]
    pub fn max_time(&self) -> f64 {
        match self {
            AnimationChannel::Transform(c) => c.max_time(),
            AnimationChannel::Trigger(c) => c.max_time(),
        }
    }

    #[must_use]
    pub fn create_state_data_object(&self) -> ChannelValue {
        match self {
            AnimationChannel::Transform(c) => ChannelValue::Transform(c.create_state_data_object()),
            AnimationChannel::Trigger(c) => ChannelValue::Trigger(c.create_state_data_object()),
        }
    }

    #[must_use]
    pub fn as_transform(&self) -> Option<&TransformChannel> {
        match self {
            AnimationChannel::Transform(c) => Some(c),
            AnimationChannel::Trigger(_) => None,
        }
    }

    #[must_use]
    pub fn as_trigger(&self) -> Option<&TriggerChannel> {
        match self {
            AnimationChannel::Trigger(c) => Some(c),
            AnimationChannel::Transform(_) => None,
        }
    }

    /// Samples into `value`, replacing it first if it holds the wrong kind.
    pub fn update_sample(&self, clock_time: f64, value: &mut ChannelValue) {
        match (self, value) {
            (AnimationChannel::Transform(c), ChannelValue::Transform(data)) => {
                c.update_sample(clock_time, data);
            }
            (AnimationChannel::Trigger(c), ChannelValue::Trigger(data)) => {
                c.update_sample(clock_time, data);
            }
            (channel, value) => {
                log::warn!(
                    "Channel '{}' found a value of another kind in its clip state, resetting it",
                    channel.name()
                );
                *value = channel.create_state_data_object();
                channel.update_sample(clock_time, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_ties_go_to_lower_index() {
        let times = [0.0, 1.0, 1.0, 2.0];
        assert_eq!(
            locate_sample(&times, 1.5),
            SamplePosition::Between {
                index: 2,
                progress: 0.5
            }
        );
        // Exactly on an interior key: previous interval at full progress.
        assert_eq!(
            locate_sample(&[0.0, 1.0, 2.0], 1.0),
            SamplePosition::Between {
                index: 0,
                progress: 1.0
            }
        );
    }

    #[test]
    fn locate_clamps_outside_range() {
        let times = [0.5, 1.0, 2.0];
        assert_eq!(locate_sample(&times, -1.0), SamplePosition::Exact(0));
        assert_eq!(locate_sample(&times, 0.25), SamplePosition::Exact(0));
        assert_eq!(locate_sample(&times, 2.0), SamplePosition::Exact(2));
        assert_eq!(locate_sample(&times, 9.0), SamplePosition::Exact(2));
        assert_eq!(locate_sample(&[3.0], 100.0), SamplePosition::Exact(0));
    }

    #[test]
    fn joint_channel_names_round_trip() {
        assert_eq!(joint_channel_name(12), "_jnt12");
        assert_eq!(joint_index_from_channel_name("_jnt12"), Some(12));
        assert_eq!(joint_index_from_channel_name("_jntx"), None);
        assert_eq!(joint_index_from_channel_name("hips"), None);
    }

    #[test]
    fn rejects_decreasing_times() {
        let err = TriggerChannel::new("t", vec![1.0, 0.5], vec![None, None]);
        assert!(matches!(err, Err(SinewError::InvalidArgument(_))));
    }

    #[test]
    fn sub_channel_range_is_validated() {
        let channel =
            TriggerChannel::new("t", vec![0.0, 1.0, 2.0], vec![None, Some("a".into()), None])
                .unwrap();
        let sub = channel.sub_channel("sub", 1, 2).unwrap();
        assert_eq!(sub.times(), &[1.0, 2.0]);
        assert_eq!(sub.keys()[0].as_deref(), Some("a"));

        assert!(channel.sub_channel("bad", 2, 1).is_err());
        assert!(channel.sub_channel("bad", 0, 3).is_err());
    }
}
