use glam::Affine3A;

use crate::skeleton::pose::{PoseListener, SkeletonPose};

/// Follows one joint of a pose, e.g. to hold a weapon in a hand.
///
/// After each pose update `world_transform` is the joint's global transform
/// followed by `offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentPoint {
    pub joint_index: usize,
    pub offset: Affine3A,
    world_transform: Affine3A,
}

impl AttachmentPoint {
    #[must_use]
    pub fn new(joint_index: usize, offset: Affine3A) -> Self {
        Self {
            joint_index,
            offset,
            world_transform: Affine3A::IDENTITY,
        }
    }

    #[must_use]
    pub fn world_transform(&self) -> &Affine3A {
        &self.world_transform
    }
}

impl PoseListener for AttachmentPoint {
    fn pose_updated(&mut self, pose: &SkeletonPose) {
        let Some(global) = pose.global_joint_transforms().get(self.joint_index) else {
            log::warn!(
                "AttachmentPoint: joint {} not in skeleton '{}', skipping",
                self.joint_index,
                pose.skeleton().name()
            );
            return;
        };
        self.world_transform = *global * self.offset;
    }
}
