#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod animation;
pub mod errors;
pub mod settings;
pub mod skeleton;
pub mod skinning;
pub mod utils;

pub use animation::{
    AnimationChannel, AnimationClip, AnimationClipState, AnimationLayer, AnimationManager,
    BlendNode, BlendTreeApplier, LoopCount, SimpleAnimationApplier, SteadyState, TransformChannel,
    TransformData, Transition, TriggerChannel,
};
pub use errors::{Result, SinewError};
pub use settings::{ClipPlayback, SkinningMode, SkinningSettings};
pub use skeleton::{AttachmentPoint, Joint, PoseListener, Skeleton, SkeletonPose};
pub use skinning::{MeshData, SkinnedMesh, VertexBuffer};
pub use utils::time::{Clock, ManualClock, Timer};
