use glam::DVec3;

use crate::errors::{Result, SinewError};
use crate::settings::{SkinningMode, SkinningSettings};
use crate::skeleton::{PoseListener, SkeletonPose};
use crate::skinning::mesh::{BoundingBox, MeshData, VertexBuffer};
use crate::skinning::shader::{
    AttributeFormat, JOINT_IDS_ATTRIBUTE, JOINT_PALETTE_UNIFORM, MeshRenderer, SkinningShader,
    WEIGHTS_ATTRIBUTE,
};

/// Joint influences stored per vertex.
pub const MAX_INFLUENCES: usize = 4;

/// Replaces the default reaction of a skin to a pose update, e.g. to skip
/// off-screen skins or throttle updates.
pub trait SkinPoseApplyLogic {
    fn do_apply(&mut self, skin: &mut SkinnedMesh, pose: &SkeletonPose);
}

impl<F: FnMut(&mut SkinnedMesh, &SkeletonPose)> SkinPoseApplyLogic for F {
    fn do_apply(&mut self, skin: &mut SkinnedMesh, pose: &SkeletonPose) {
        self(skin, pose);
    }
}

/// A mesh deformed by a skeleton pose.
///
/// `bind_pose` holds the geometry as authored. In CPU mode every pose update
/// writes the deformed geometry into [`mesh_data`](Self::mesh_data); in GPU
/// mode only the palette is sent to the shader and the bind pose is what
/// gets drawn.
pub struct SkinnedMesh {
    name: String,
    bind_pose: MeshData,
    mesh_data: MeshData,
    joint_indices: Vec<[u16; MAX_INFLUENCES]>,
    weights: Vec<[f32; MAX_INFLUENCES]>,
    use_gpu: bool,
    gpu_shader: Option<Box<dyn SkinningShader>>,
    auto_update_bounds: bool,
    bounds: Option<BoundingBox>,
    custom_applier: Option<Box<dyn SkinPoseApplyLogic>>,
    // Bumped whenever the custom applier is set or cleared.
    applier_generation: u64,
}

impl std::fmt::Debug for SkinnedMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkinnedMesh")
            .field("name", &self.name)
            .field("vertices", &self.bind_pose.vertex_count())
            .field("use_gpu", &self.use_gpu)
            .field("has_shader", &self.gpu_shader.is_some())
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl SkinnedMesh {
    /// Weights of each vertex are expected to sum to 1.
    pub fn new(
        name: impl Into<String>,
        bind_pose: MeshData,
        joint_indices: Vec<[u16; MAX_INFLUENCES]>,
        weights: Vec<[f32; MAX_INFLUENCES]>,
    ) -> Result<Self> {
        let name = name.into();
        if bind_pose.vertices.len() % 3 != 0 {
            return Err(SinewError::invalid(format!(
                "skin '{name}': vertex buffer length {} is not a multiple of 3",
                bind_pose.vertices.len()
            )));
        }
        let vertex_count = bind_pose.vertex_count();
        if let Some(normals) = &bind_pose.normals
            && normals.len() != bind_pose.vertices.len()
        {
            return Err(SinewError::invalid(format!(
                "skin '{name}': {} normal floats for {} vertex floats",
                normals.len(),
                bind_pose.vertices.len()
            )));
        }
        check_influence_len(&name, "joint indices", joint_indices.len(), vertex_count)?;
        check_influence_len(&name, "weights", weights.len(), vertex_count)?;

        Ok(Self {
            name,
            mesh_data: bind_pose.clone(),
            bind_pose,
            joint_indices,
            weights,
            use_gpu: false,
            gpu_shader: None,
            auto_update_bounds: false,
            bounds: None,
            custom_applier: None,
            applier_generation: 0,
        })
    }

    #[must_use]
    pub fn with_settings(mut self, settings: &SkinningSettings) -> Self {
        self.auto_update_bounds = settings.auto_update_bounds;
        self.set_use_gpu(settings.mode == SkinningMode::Gpu);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn bind_pose_data(&self) -> &MeshData {
        &self.bind_pose
    }

    /// The geometry produced by the last CPU skinning pass.
    #[must_use]
    pub fn mesh_data(&self) -> &MeshData {
        &self.mesh_data
    }

    #[must_use]
    pub fn joint_indices(&self) -> &[[u16; MAX_INFLUENCES]] {
        &self.joint_indices
    }

    pub fn set_joint_indices(&mut self, joint_indices: Vec<[u16; MAX_INFLUENCES]>) -> Result<()> {
        check_influence_len(
            &self.name,
            "joint indices",
            joint_indices.len(),
            self.bind_pose.vertex_count(),
        )?;
        self.joint_indices = joint_indices;
        self.upload_weights_and_joints();
        Ok(())
    }

    #[must_use]
    pub fn weights(&self) -> &[[f32; MAX_INFLUENCES]] {
        &self.weights
    }

    pub fn set_weights(&mut self, weights: Vec<[f32; MAX_INFLUENCES]>) -> Result<()> {
        check_influence_len(&self.name, "weights", weights.len(), self.bind_pose.vertex_count())?;
        self.weights = weights;
        self.upload_weights_and_joints();
        Ok(())
    }

    #[must_use]
    pub fn is_use_gpu(&self) -> bool {
        self.use_gpu
    }

    pub fn set_use_gpu(&mut self, use_gpu: bool) {
        self.use_gpu = use_gpu;
        self.upload_weights_and_joints();
    }

    /// The shader must accept the attributes and uniform described in
    /// [`shader`](crate::skinning::shader).
    pub fn set_gpu_shader(&mut self, shader: impl SkinningShader + 'static) {
        self.gpu_shader = Some(Box::new(shader));
        self.upload_weights_and_joints();
    }

    pub fn gpu_shader_mut(&mut self) -> Option<&mut (dyn SkinningShader + 'static)> {
        self.gpu_shader.as_deref_mut()
    }

    #[must_use]
    pub fn is_auto_update_bounds(&self) -> bool {
        self.auto_update_bounds
    }

    /// Only honoured in CPU mode.
    pub fn set_auto_update_bounds(&mut self, auto_update_bounds: bool) {
        self.auto_update_bounds = auto_update_bounds;
    }

    #[must_use]
    pub fn bounds(&self) -> Option<&BoundingBox> {
        self.bounds.as_ref()
    }

    pub fn update_model_bound(&mut self) {
        self.bounds = BoundingBox::from_buffer(&self.mesh_data.vertices);
    }

    pub fn set_custom_applier(&mut self, logic: impl SkinPoseApplyLogic + 'static) {
        self.custom_applier = Some(Box::new(logic));
        self.applier_generation += 1;
    }

    pub fn clear_custom_applier(&mut self) {
        self.custom_applier = None;
        self.applier_generation += 1;
    }

    #[must_use]
    pub fn has_custom_applier(&self) -> bool {
        self.custom_applier.is_some()
    }

    // ========================================================================
    // Skinning
    // ========================================================================

    /// Deforms the mesh by `pose` on the CPU, or binds its palette for the GPU.
    pub fn apply_pose(&mut self, pose: &SkeletonPose) {
        if self.use_gpu {
            if let Some(shader) = self.gpu_shader.as_mut() {
                let palette = pose.matrix_palette();
                shader.set_uniform_mat4_array(
                    JOINT_PALETTE_UNIFORM,
                    bytemuck::cast_slice(palette),
                    palette.len(),
                );
            }
        } else {
            self.apply_pose_cpu(pose);
        }
    }

    fn apply_pose_cpu(&mut self, pose: &SkeletonPose) {
        let palette = pose.matrix_palette();
        let vertex_count = self.bind_pose.vertex_count();
        let bind_vertices = self.bind_pose.vertices.as_slice();
        let bind_normals = self.bind_pose.normals.as_ref().map(VertexBuffer::as_slice);

        let MeshData { vertices, normals } = &mut self.mesh_data;
        let store_vertices = vertices.write();
        if store_vertices.len() != bind_vertices.len() {
            store_vertices.resize(bind_vertices.len(), 0.0);
        }
        let mut store_normals = match bind_normals {
            Some(bind) => {
                let store = normals
                    .get_or_insert_with(VertexBuffer::default)
                    .write();
                if store.len() != bind.len() {
                    store.resize(bind.len(), 0.0);
                }
                Some(store)
            }
            None => None,
        };

        for i in 0..vertex_count {
            let range = i * 3..i * 3 + 3;
            let bind_vertex = read_dvec3(&bind_vertices[range.clone()]);
            let bind_normal = bind_normals.map(|n| read_dvec3(&n[range.clone()]));

            let mut vertex_sum = DVec3::ZERO;
            let mut normal_sum = DVec3::ZERO;

            for (&joint, &weight) in self.joint_indices[i].iter().zip(&self.weights[i]) {
                if weight == 0.0 {
                    continue;
                }
                let joint_matrix = palette[usize::from(joint)].as_dmat4();
                let weight = f64::from(weight);

                vertex_sum += joint_matrix.transform_point3(bind_vertex) * weight;
                if let Some(bind_normal) = bind_normal {
                    normal_sum += joint_matrix.transform_vector3(bind_normal) * weight;
                }
            }

            store_vertices[range.clone()].copy_from_slice(&vertex_sum.as_vec3().to_array());
            if let Some(store) = store_normals.as_mut() {
                store[range].copy_from_slice(&normal_sum.as_vec3().to_array());
            }
        }
    }

    /// Draws the deformed geometry (CPU) or the bind pose (GPU).
    pub fn render(&self, renderer: &mut dyn MeshRenderer) {
        if self.use_gpu {
            renderer.render(&self.bind_pose);
        } else {
            renderer.render(&self.mesh_data);
        }
    }

    fn upload_weights_and_joints(&mut self) {
        if !self.use_gpu {
            return;
        }
        let Some(shader) = self.gpu_shader.as_mut() else {
            return;
        };
        shader.set_attribute(
            WEIGHTS_ATTRIBUTE,
            AttributeFormat::Float32x4,
            bytemuck::cast_slice(&self.weights),
        );
        let joint_ids: Vec<[u32; MAX_INFLUENCES]> = self
            .joint_indices
            .iter()
            .map(|ids| ids.map(u32::from))
            .collect();
        shader.set_attribute(
            JOINT_IDS_ATTRIBUTE,
            AttributeFormat::Uint32x4,
            bytemuck::cast_slice(&joint_ids),
        );
    }
}

impl PoseListener for SkinnedMesh {
    fn pose_updated(&mut self, pose: &SkeletonPose) {
        if let Some(mut logic) = self.custom_applier.take() {
            let generation = self.applier_generation;
            logic.do_apply(self, pose);
            // The logic may have replaced or cleared itself.
            if self.applier_generation == generation {
                self.custom_applier = Some(logic);
            }
            return;
        }

        self.apply_pose(pose);
        if !self.use_gpu && self.auto_update_bounds {
            self.update_model_bound();
        }
    }
}

fn read_dvec3(xyz: &[f32]) -> DVec3 {
    DVec3::new(f64::from(xyz[0]), f64::from(xyz[1]), f64::from(xyz[2]))
}

fn check_influence_len(name: &str, what: &str, len: usize, vertex_count: usize) -> Result<()> {
    if len == vertex_count {
        Ok(())
    } else {
        Err(SinewError::invalid(format!(
            "skin '{name}': {len} {what} entries for {vertex_count} vertices"
        )))
    }
}
