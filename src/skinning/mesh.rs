use glam::Vec3;

/// A tightly packed `xyz` float buffer with a change counter.
///
/// The version is bumped on every write pass so upload code can tell when the
/// CPU copy moved ahead of its GPU mirror.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBuffer {
    data: Vec<f32>,
    version: u64,
}

impl VertexBuffer {
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data, version: 0 }
    }

    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Self {
        Self::new(points.iter().flat_map(|p| p.to_array()).collect())
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable access; bumps the version.
    pub fn write(&mut self) -> &mut Vec<f32> {
        self.version += 1;
        &mut self.data
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of `xyz` triples held.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.data.len() / 3
    }

    /// Triple `index` as a vector.
    #[must_use]
    pub fn point(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.data[index * 3..index * 3 + 3])
    }
}

/// Positions and (optionally) normals of a mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: VertexBuffer,
    pub normals: Option<VertexBuffer>,
}

impl MeshData {
    #[must_use]
    pub fn new(vertices: VertexBuffer, normals: Option<VertexBuffer>) -> Self {
        Self { vertices, normals }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.vertex_count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Tight box around every `xyz` triple in `buffer`, `None` when empty.
    #[must_use]
    pub fn from_buffer(buffer: &VertexBuffer) -> Option<Self> {
        if buffer.vertex_count() == 0 {
            return None;
        }
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for i in 0..buffer.vertex_count() {
            let p = buffer.point(i);
            min = min.min(p);
            max = max.max(p);
        }
        Some(Self { min, max })
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}
