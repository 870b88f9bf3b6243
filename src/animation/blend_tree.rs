//! Blend Tree
//!
//! A blend tree turns the per-clip channel outputs held in [`ClipStates`] into
//! one set of channel values, which a [`BlendTreeApplier`] then writes into a
//! [`SkeletonPose`].
//!
//! Node kinds form a closed set ([`BlendNode`]); each answers a single
//! question, "what are your channel values right now?":
//!
//! - [`ClipSource`]: one clip's outputs, optionally masked by channel
//! - [`BinaryLerpSource`]: weighted blend of two child nodes
//! - [`ManagedTransformSource`]: joint transforms set procedurally

use std::sync::Arc;

use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::animation::channel::{joint_channel_name, joint_index_from_channel_name};
use crate::animation::clip::AnimationClip;
use crate::animation::clip_state::AnimationClipState;
use crate::animation::manager::ClipStates;
use crate::animation::values::{ChannelValue, Interpolatable, TransformData};
use crate::errors::{Result, SinewError};
use crate::skeleton::{Skeleton, SkeletonPose};

/// Channel name -> current value.
pub type SourceData = FxHashMap<String, ChannelValue>;

// ============================================================================
// Nodes
// ============================================================================

/// Node of a blend tree.
#[derive(Debug, Clone)]
pub enum BlendNode {
    Clip(ClipSource),
    Lerp(Box<BinaryLerpSource>),
    Managed(ManagedTransformSource),
}

impl BlendNode {
    /// The values this node contributes given the current clip states.
    #[must_use]
    pub fn source_data(&self, states: &ClipStates) -> SourceData {
        match self {
            BlendNode::Clip(source) => source.source_data(states),
            BlendNode::Lerp(source) => source.source_data(states),
            BlendNode::Managed(source) => source.source_data(),
        }
    }

    /// Whether this node would output a value for `channel_name`.
    #[must_use]
    pub fn provides(&self, channel_name: &str, states: &ClipStates) -> bool {
        match self {
            BlendNode::Clip(source) => {
                source.mask.allows(channel_name)
                    && states
                        .get(source.clip.id())
                        .is_some_and(|s| s.channel_data().contains_key(channel_name))
            }
            BlendNode::Lerp(source) => [&source.source_a, &source.source_b]
                .into_iter()
                .flatten()
                .any(|child| child.provides(channel_name, states)),
            BlendNode::Managed(source) => source.data.contains_key(channel_name),
        }
    }

    /// False once every clip below this node has stopped playing.
    ///
    /// Clips without a state yet count as playing, since the manager starts
    /// them on their first update. Managed sources never stop.
    #[must_use]
    pub fn is_active(&self, states: &ClipStates) -> bool {
        match self {
            BlendNode::Clip(source) => states
                .get(source.clip.id())
                .is_none_or(AnimationClipState::is_active),
            BlendNode::Lerp(source) => [&source.source_a, &source.source_b]
                .into_iter()
                .flatten()
                .any(|child| child.is_active(states)),
            BlendNode::Managed(_) => true,
        }
    }

    /// Appends every clip referenced below this node to `out`.
    pub fn collect_clips(&self, out: &mut Vec<Arc<AnimationClip>>) {
        match self {
            BlendNode::Clip(source) => {
                if !out.iter().any(|c| c.id() == source.clip.id()) {
                    out.push(source.clip.clone());
                }
            }
            BlendNode::Lerp(source) => {
                for child in [&source.source_a, &source.source_b].into_iter().flatten() {
                    child.collect_clips(out);
                }
            }
            BlendNode::Managed(_) => {}
        }
    }

    /// Clears the armed flag of trigger `channel_name` in the clip state whose
    /// value this node passed on.
    ///
    /// A lerp node hands on A's value when both children have one (see
    /// [`combine_source_data`]), so only that child is disarmed.
    pub fn disarm_trigger(&self, channel_name: &str, states: &mut ClipStates) {
        match self {
            BlendNode::Clip(source) => {
                if !source.mask.allows(channel_name) {
                    return;
                }
                let trigger = states
                    .get_mut(source.clip.id())
                    .and_then(|s| s.channel_data_mut().get_mut(channel_name))
                    .and_then(ChannelValue::as_trigger_mut);
                if let Some(trigger) = trigger {
                    trigger.set_armed(false);
                }
            }
            BlendNode::Lerp(source) => {
                let passed_on = [&source.source_a, &source.source_b]
                    .into_iter()
                    .flatten()
                    .find(|child| child.provides(channel_name, states));
                if let Some(child) = passed_on {
                    child.disarm_trigger(channel_name, states);
                }
            }
            BlendNode::Managed(_) => {}
        }
    }
}

impl From<ClipSource> for BlendNode {
    fn from(source: ClipSource) -> Self {
        BlendNode::Clip(source)
    }
}

impl From<BinaryLerpSource> for BlendNode {
    fn from(source: BinaryLerpSource) -> Self {
        BlendNode::Lerp(Box::new(source))
    }
}

impl From<ManagedTransformSource> for BlendNode {
    fn from(source: ManagedTransformSource) -> Self {
        BlendNode::Managed(source)
    }
}

/// Which channels of a clip a [`ClipSource`] passes on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChannelMask {
    #[default]
    All,
    /// Everything except these channels.
    Exclude(Vec<String>),
    /// Only these channels.
    Include(Vec<String>),
}

impl ChannelMask {
    #[must_use]
    pub fn exclude_joints(joints: &[usize]) -> Self {
        ChannelMask::Exclude(joints.iter().copied().map(joint_channel_name).collect())
    }

    #[must_use]
    pub fn include_joints(joints: &[usize]) -> Self {
        ChannelMask::Include(joints.iter().copied().map(joint_channel_name).collect())
    }

    #[must_use]
    pub fn allows(&self, channel_name: &str) -> bool {
        match self {
            ChannelMask::All => true,
            ChannelMask::Exclude(names) => !names.iter().any(|n| n == channel_name),
            ChannelMask::Include(names) => names.iter().any(|n| n == channel_name),
        }
    }
}

/// Outputs of a single clip as sampled by the owning manager.
#[derive(Debug, Clone)]
pub struct ClipSource {
    pub clip: Arc<AnimationClip>,
    pub mask: ChannelMask,
}

impl ClipSource {
    #[must_use]
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        Self {
            clip,
            mask: ChannelMask::All,
        }
    }

    #[must_use]
    pub fn with_mask(mut self, mask: ChannelMask) -> Self {
        self.mask = mask;
        self
    }

    /// Empty until the clip has a state in `states`.
    #[must_use]
    pub fn source_data(&self, states: &ClipStates) -> SourceData {
        let Some(state) = states.get(self.clip.id()) else {
            return SourceData::default();
        };
        state
            .channel_data()
            .iter()
            .filter(|(name, _)| self.mask.allows(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Blends two child nodes by `blend_weight` (0 = all A, 1 = all B).
///
/// Transform channels present on both sides are interpolated; a channel
/// present on one side only is taken at full weight. Other values come from
/// A, or from B when A lacks them.
#[derive(Debug, Clone, Default)]
pub struct BinaryLerpSource {
    pub source_a: Option<BlendNode>,
    pub source_b: Option<BlendNode>,
    pub blend_weight: f64,
}

impl BinaryLerpSource {
    #[must_use]
    pub fn new(
        source_a: impl Into<BlendNode>,
        source_b: impl Into<BlendNode>,
        blend_weight: f64,
    ) -> Self {
        Self {
            source_a: Some(source_a.into()),
            source_b: Some(source_b.into()),
            blend_weight,
        }
    }

    #[must_use]
    pub fn source_data(&self, states: &ClipStates) -> SourceData {
        let data_a = self.source_a.as_ref().map(|s| s.source_data(states));
        let data_b = self.source_b.as_ref().map(|s| s.source_data(states));
        combine_source_data(data_a, data_b, self.blend_weight)
    }
}

/// Merges two source maps as described on [`BinaryLerpSource`].
#[must_use]
pub fn combine_source_data(
    data_a: Option<SourceData>,
    data_b: Option<SourceData>,
    blend_weight: f64,
) -> SourceData {
    let (mut data_a, mut data_b) = match (data_a, data_b) {
        (Some(a), Some(b)) => (a, b),
        (Some(only), None) | (None, Some(only)) => return only,
        (None, None) => return SourceData::default(),
    };

    let weight = blend_weight as f32;
    let mut result = SourceData::default();
    for (name, value_a) in data_a.drain() {
        let value = match (value_a, data_b.remove(&name)) {
            (ChannelValue::Transform(a), Some(ChannelValue::Transform(b))) => {
                ChannelValue::Transform(TransformData::interpolate_linear(&a, &b, weight))
            }
            (value_a, _) => value_a,
        };
        result.insert(name, value);
    }
    result.extend(data_b);
    result
}

/// Joint transforms supplied directly by game code.
#[derive(Debug, Clone, Default)]
pub struct ManagedTransformSource {
    data: FxHashMap<String, TransformData>,
}

impl ManagedTransformSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, joint_index: usize) -> &mut TransformData {
        self.data.entry(joint_channel_name(joint_index)).or_default()
    }

    pub fn set_joint_transform_data(&mut self, joint_index: usize, data: &TransformData) {
        self.entry(joint_index).set(data);
    }

    pub fn set_joint_translation(&mut self, joint_index: usize, translation: Vec3) {
        self.entry(joint_index).translation = translation;
    }

    pub fn set_joint_scale(&mut self, joint_index: usize, scale: Vec3) {
        self.entry(joint_index).scale = scale;
    }

    pub fn set_joint_rotation(&mut self, joint_index: usize, rotation: Quat) {
        self.entry(joint_index).rotation = rotation;
    }

    #[must_use]
    pub fn joint_transform_data(&self, joint_index: usize) -> Option<&TransformData> {
        self.data.get(&joint_channel_name(joint_index))
    }

    /// Seeds the given joints from the first sample of `clip`'s joint channels.
    pub fn init_joints_by_index(&mut self, clip: &AnimationClip, joints: &[usize]) -> Result<()> {
        for &joint_index in joints {
            let channel = clip
                .find_channel_by_name(&joint_channel_name(joint_index))
                .and_then(|c| c.as_transform())
                .ok_or_else(|| SinewError::JointIndexOutOfBounds {
                    context: format!("no joint channel in clip '{}'", clip.name()),
                    index: joint_index,
                })?;
            self.set_joint_transform_data(joint_index, &channel.transform_data(0));
        }
        Ok(())
    }

    /// Like [`init_joints_by_index`](Self::init_joints_by_index), resolving names
    /// against `skeleton`.
    pub fn init_joints_by_name(
        &mut self,
        skeleton: &Skeleton,
        clip: &AnimationClip,
        joint_names: &[&str],
    ) -> Result<()> {
        let indices = joint_names
            .iter()
            .map(|name| {
                skeleton.find_joint_by_name(name).ok_or_else(|| {
                    SinewError::invalid(format!(
                        "joint '{name}' not found in skeleton '{}'",
                        skeleton.name()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.init_joints_by_index(clip, &indices)
    }

    #[must_use]
    pub fn source_data(&self) -> SourceData {
        self.data
            .iter()
            .map(|(name, data)| (name.clone(), ChannelValue::Transform(*data)))
            .collect()
    }
}

// ============================================================================
// Appliers
// ============================================================================

/// Resolves a blend tree into a pose once per manager update.
pub trait BlendTreeApplier {
    fn apply_to(
        &mut self,
        pose: &mut SkeletonPose,
        root: Option<&BlendNode>,
        states: &mut ClipStates,
    );
}

/// Invoked when an armed trigger with a registered key is applied.
pub trait TriggerCallback {
    fn do_trigger(&mut self, key: &str, pose: &SkeletonPose);
}

impl<F: FnMut(&str, &SkeletonPose)> TriggerCallback for F {
    fn do_trigger(&mut self, key: &str, pose: &SkeletonPose) {
        self(key, pose);
    }
}

/// Handle for removing a trigger callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

type CallbackList = SmallVec<[(CallbackId, Box<dyn TriggerCallback>); 2]>;

/// Writes joint channels into local joint transforms and dispatches triggers.
///
/// Joint channel values replace the pose's local transforms; joints without
/// a value keep their previous local transform. After writing, global
/// transforms are recomputed and armed triggers are dispatched (in channel
/// name order) to the callbacks registered for their key, then disarmed.
#[derive(Default)]
pub struct SimpleAnimationApplier {
    trigger_callbacks: FxHashMap<String, CallbackList>,
    next_callback_id: u64,
}

impl SimpleAnimationApplier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_trigger_callback(
        &mut self,
        key: impl Into<String>,
        callback: impl TriggerCallback + 'static,
    ) -> CallbackId {
        let id = CallbackId(self.next_callback_id);
        self.next_callback_id += 1;
        self.trigger_callbacks
            .entry(key.into())
            .or_default()
            .push((id, Box::new(callback)));
        id
    }

    pub fn remove_trigger_callback(&mut self, key: &str, id: CallbackId) -> bool {
        let Some(list) = self.trigger_callbacks.get_mut(key) else {
            return false;
        };
        let before = list.len();
        list.retain(|(cid, _)| *cid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.trigger_callbacks.remove(key);
        }
        removed
    }
}

impl std::fmt::Debug for SimpleAnimationApplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleAnimationApplier")
            .field("trigger_keys", &self.trigger_callbacks.len())
            .finish_non_exhaustive()
    }
}

impl BlendTreeApplier for SimpleAnimationApplier {
    fn apply_to(
        &mut self,
        pose: &mut SkeletonPose,
        root: Option<&BlendNode>,
        states: &mut ClipStates,
    ) {
        let Some(root) = root else {
            return;
        };
        let data = root.source_data(states);

        let joint_count = pose.local_joint_transforms().len();
        let mut armed = Vec::new();
        for (name, value) in &data {
            match value {
                ChannelValue::Transform(transform) => {
                    let Some(joint_index) = joint_index_from_channel_name(name) else {
                        continue;
                    };
                    if joint_index >= joint_count {
                        log::warn!(
                            "Channel '{name}' targets joint {joint_index}, skeleton '{}' has {joint_count}",
                            pose.skeleton().name()
                        );
                        continue;
                    }
                    transform.apply_to(&mut pose.local_joint_transforms_mut()[joint_index]);
                }
                ChannelValue::Trigger(trigger) => {
                    if let (true, Some(key)) = (trigger.is_armed(), trigger.current_trigger()) {
                        armed.push((name.as_str(), key));
                    }
                }
            }
        }

        pose.update_transforms();

        armed.sort_unstable();
        for (channel_name, key) in armed {
            match self.trigger_callbacks.get_mut(key) {
                Some(callbacks) => {
                    for (_, callback) in callbacks.iter_mut() {
                        callback.do_trigger(key, pose);
                    }
                }
                None => log::debug!("Trigger '{key}' on channel '{channel_name}' has no callback"),
            }
            root.disarm_trigger(channel_name, states);
        }
    }
}
