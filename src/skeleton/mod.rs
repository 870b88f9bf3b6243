//! Skeleton Module
//!
//! The static joint hierarchy and its per-instance poses:
//!
//! - [`Joint`] / [`Skeleton`]: immutable bind-pose hierarchy, parents first
//! - [`SkeletonPose`]: local and global joint transforms plus the matrix palette
//! - [`PoseListener`]: hook run after every pose recomputation
//! - [`AttachmentPoint`]: a pose listener following one joint

pub mod attachment;
pub mod hierarchy;
pub mod joint;
pub mod pose;

pub use attachment::AttachmentPoint;
pub use hierarchy::Skeleton;
pub use joint::Joint;
pub use pose::{PoseListener, SkeletonPose};
