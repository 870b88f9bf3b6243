use glam::Affine3A;

/// One articulation point of a [`Skeleton`](super::Skeleton).
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// Display / lookup name.
    pub name: String,
    /// Position of this joint in the skeleton's joint array.
    pub index: usize,
    /// Index of the parent joint, `None` for roots.
    pub parent_index: Option<usize>,
    /// Inverse of the joint space -> model space transform in bind pose.
    pub inverse_bind_pose: Affine3A,
}

impl Joint {
    #[must_use]
    pub fn new(name: impl Into<String>, index: usize, parent_index: Option<usize>) -> Self {
        Self {
            name: name.into(),
            index,
            parent_index,
            inverse_bind_pose: Affine3A::IDENTITY,
        }
    }

    #[must_use]
    pub fn with_inverse_bind_pose(mut self, inverse_bind_pose: Affine3A) -> Self {
        self.inverse_bind_pose = inverse_bind_pose;
        self
    }

    /// Uses `bind_pose` (joint -> model space) and stores its inverse.
    #[must_use]
    pub fn with_bind_pose(self, bind_pose: Affine3A) -> Self {
        self.with_inverse_bind_pose(bind_pose.inverse())
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_index.is_none()
    }
}

impl std::fmt::Display for Joint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Joint: '{}'", self.name)
    }
}
