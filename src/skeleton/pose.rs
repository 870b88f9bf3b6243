use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use glam::{Affine3A, Mat4};

use crate::animation::clip_state::ListenerId;
use crate::skeleton::hierarchy::Skeleton;

/// Notified after every full pose recomputation.
pub trait PoseListener {
    fn pose_updated(&mut self, pose: &SkeletonPose);
}

/// Lets a listener stay readable by its owner while registered on a pose.
impl<L: PoseListener> PoseListener for Rc<RefCell<L>> {
    fn pose_updated(&mut self, pose: &SkeletonPose) {
        self.borrow_mut().pose_updated(pose);
    }
}

/// A [`Skeleton`] in a specific pose.
///
/// Local joint transforms are written by a blend tree applier;
/// [`update_transforms`](Self::update_transforms) then derives the global
/// transforms and the skinning matrix palette.
pub struct SkeletonPose {
    skeleton: Arc<Skeleton>,
    local_transforms: Vec<Affine3A>,
    global_transforms: Vec<Affine3A>,
    matrix_palette: Vec<Mat4>,
    listeners: Vec<(ListenerId, Box<dyn PoseListener>)>,
    next_listener_id: u64,
}

impl std::fmt::Debug for SkeletonPose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkeletonPose")
            .field("skeleton", &self.skeleton.name())
            .field("joints", &self.local_transforms.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl SkeletonPose {
    /// Creates a pose in bind pose with global transforms and palette computed.
    #[must_use]
    pub fn new(skeleton: Arc<Skeleton>) -> Self {
        let count = skeleton.joint_count();
        let mut pose = Self {
            skeleton,
            local_transforms: vec![Affine3A::IDENTITY; count],
            global_transforms: vec![Affine3A::IDENTITY; count],
            matrix_palette: vec![Mat4::IDENTITY; count],
            listeners: Vec::new(),
            next_listener_id: 0,
        };
        pose.set_to_bind_pose();
        pose.update_transforms();
        pose
    }

    #[must_use]
    pub fn skeleton(&self) -> &Arc<Skeleton> {
        &self.skeleton
    }

    #[must_use]
    pub fn local_joint_transforms(&self) -> &[Affine3A] {
        &self.local_transforms
    }

    pub fn local_joint_transforms_mut(&mut self) -> &mut [Affine3A] {
        &mut self.local_transforms
    }

    #[must_use]
    pub fn global_joint_transforms(&self) -> &[Affine3A] {
        &self.global_transforms
    }

    /// Per joint: global transform × inverse bind pose.
    #[must_use]
    pub fn matrix_palette(&self) -> &[Mat4] {
        &self.matrix_palette
    }

    /// Recomputes global transforms and the palette from the local transforms,
    /// then notifies pose listeners.
    pub fn update_transforms(&mut self) {
        let joints = self.skeleton.joints();
        for (i, joint) in joints.iter().enumerate() {
            // Parents precede children, so the parent's global is already current.
            self.global_transforms[i] = match joint.parent_index {
                Some(parent) => self.global_transforms[parent] * self.local_transforms[i],
                None => self.local_transforms[i],
            };

            self.matrix_palette[i] =
                Mat4::from(self.global_transforms[i] * joint.inverse_bind_pose);
        }

        self.fire_pose_updated();
    }

    /// Resets local transforms so the skeleton matches its bind pose.
    pub fn set_to_bind_pose(&mut self) {
        let joints = self.skeleton.joints();
        for (i, joint) in joints.iter().enumerate() {
            // Model-space bind transform of this joint.
            let bind = joint.inverse_bind_pose.inverse();
            self.local_transforms[i] = match joint.parent_index {
                Some(parent) => joints[parent].inverse_bind_pose * bind,
                None => bind,
            };
        }
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    pub fn add_pose_listener(&mut self, listener: impl PoseListener + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn remove_pose_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    #[must_use]
    pub fn pose_listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn fire_pose_updated(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        // Listeners read the pose while being mutated themselves.
        let mut listeners = std::mem::take(&mut self.listeners);
        for (_, listener) in &mut listeners {
            listener.pose_updated(self);
        }
        self.listeners = listeners;
    }
}
