//! Animation Module
//!
//! Keyframe channels, clips, per-manager playback state, blend trees and the
//! layer state machine that picks a blend tree per frame.
//!
//! Data flows one way each frame:
//! [`AnimationManager::update`] computes every active clip's local time,
//! [`AnimationClip::update`] samples each channel into the clip's
//! [`AnimationClipState`], and the [`BlendTreeApplier`] resolves the blend
//! tree into the target [`SkeletonPose`](crate::skeleton::SkeletonPose).

pub mod blend_tree;
pub mod channel;
pub mod clip;
pub mod clip_state;
pub mod layer;
pub mod manager;
pub mod values;

pub use blend_tree::{
    BinaryLerpSource, BlendNode, BlendTreeApplier, CallbackId, ChannelMask, ClipSource,
    ManagedTransformSource, SimpleAnimationApplier, SourceData, TriggerCallback,
};
pub use channel::{
    AnimationChannel, JOINT_CHANNEL_PREFIX, KeyframeChannel, SamplePosition, TransformChannel,
    TriggerChannel, joint_channel_name, joint_index_from_channel_name,
};
pub use clip::{AnimationClip, ClipId};
pub use clip_state::{AnimationClipState, AnimationListener, ListenerId, LoopCount};
pub use layer::{AnimationLayer, BlendType, Fade, LayerState, SteadyState, Transition};
pub use manager::{AnimationManager, ClipStates};
pub use values::{ChannelValue, Interpolatable, TransformData, TriggerData};
