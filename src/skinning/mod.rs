//! Skinning Module
//!
//! Deforms mesh geometry by a [`SkeletonPose`](crate::skeleton::SkeletonPose):
//!
//! - [`SkinnedMesh`]: per-vertex joint influences, CPU deformation and GPU upload
//! - [`SkinningShader`] / [`MeshRenderer`]: the seams to the host renderer
//! - [`VertexBuffer`] / [`MeshData`] / [`BoundingBox`]: geometry containers
//!
//! A skin reacts to pose updates once it is registered as a pose listener:
//!
//! ```rust,ignore
//! let skin = Rc::new(RefCell::new(SkinnedMesh::new("body", bind_pose, joints, weights)?));
//! manager.pose_mut().add_pose_listener(Rc::clone(&skin));
//! manager.update()?;
//! skin.borrow().render(&mut renderer);
//! ```

pub mod mesh;
pub mod shader;
pub mod skinned_mesh;

pub use mesh::{BoundingBox, MeshData, VertexBuffer};
pub use shader::{
    AttributeFormat, JOINT_IDS_ATTRIBUTE, JOINT_PALETTE_UNIFORM, MeshRenderer, SkinningShader,
    WEIGHTS_ATTRIBUTE,
};
pub use skinned_mesh::{MAX_INFLUENCES, SkinPoseApplyLogic, SkinnedMesh};
