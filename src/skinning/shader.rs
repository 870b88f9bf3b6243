//! GPU skinning contract.
//!
//! The shader program itself lives with the renderer. This module fixes the
//! names and layouts it must accept:
//!
//! | Name | Kind | Layout |
//! |------|------|--------|
//! | `Weights` | vertex attribute | 4 × f32 per vertex |
//! | `JointIDs` | vertex attribute | 4 × u32 per vertex |
//! | `JointPalette` | uniform array | one column-major 4×4 f32 matrix per joint |

use crate::skinning::mesh::MeshData;

pub const WEIGHTS_ATTRIBUTE: &str = "Weights";
pub const JOINT_IDS_ATTRIBUTE: &str = "JointIDs";
pub const JOINT_PALETTE_UNIFORM: &str = "JointPalette";

/// Component layout of a per-vertex attribute upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeFormat {
    Float32x4,
    Uint32x4,
}

/// Shader state accepting skinning attributes and the joint palette.
pub trait SkinningShader {
    /// `data` holds one `format`-sized element per vertex.
    fn set_attribute(&mut self, name: &str, format: AttributeFormat, data: &[u8]);

    /// `data` holds `count` column-major 4×4 f32 matrices.
    fn set_uniform_mat4_array(&mut self, name: &str, data: &[u8], count: usize);
}

/// Draws mesh data.
pub trait MeshRenderer {
    fn render(&mut self, data: &MeshData);
}
