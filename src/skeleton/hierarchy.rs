use uuid::Uuid;

use crate::errors::{Result, SinewError};
use crate::skeleton::joint::Joint;

/// The immutable joint hierarchy shared by every pose built from it.
///
/// Joints are ordered so that a parent always precedes its children; the
/// constructor rejects any other layout. This lets pose updates walk the
/// array front to back.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub id: Uuid,
    name: String,
    joints: Vec<Joint>,
}

impl Skeleton {
    pub fn new(name: impl Into<String>, joints: Vec<Joint>) -> Result<Self> {
        let name = name.into();
        for (i, joint) in joints.iter().enumerate() {
            if joint.index != i {
                return Err(SinewError::invalid(format!(
                    "skeleton '{name}': joint '{}' has index {} but sits at position {i}",
                    joint.name, joint.index
                )));
            }
            if let Some(parent) = joint.parent_index
                && parent >= i
            {
                return Err(SinewError::invalid(format!(
                    "skeleton '{name}': joint '{}' (index {i}) has parent {parent}, parents must precede children",
                    joint.name
                )));
            }
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            joints,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub fn find_joint_by_name(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }
}
