use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::camera::CameraState;
use crate::error::ShadingError;

/// Object-space vertex as produced by mesh storage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexAttributes {
    pub position: Vec3,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub uv: Vec2,
    pub instance_index: u32,
}

/// World matrices for every drawable instance, indexed by instance index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceTransforms {
    matrices: Vec<Mat4>,
}

impl InstanceTransforms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a world matrix and returns its instance index.
    pub fn push(&mut self, matrix: Mat4) -> u32 {
        self.matrices.push(matrix);
        (self.matrices.len() - 1) as u32
    }

    pub fn get(&self, index: u32) -> Option<&Mat4> {
        self.matrices.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn as_slice(&self) -> &[Mat4] {
        &self.matrices
    }

    /// Confirms every vertex refers to an existing transform.
    pub fn check_indices<'a>(
        &self,
        vertices: impl IntoIterator<Item = &'a VertexAttributes>,
    ) -> Result<(), ShadingError> {
        for vertex in vertices {
            if self.get(vertex.instance_index).is_none() {
                return Err(ShadingError::MissingInstance {
                    index: vertex.instance_index,
                    count: self.len(),
                });
            }
        }
        Ok(())
    }
}

impl From<Vec<Mat4>> for InstanceTransforms {
    fn from(matrices: Vec<Mat4>) -> Self {
        Self { matrices }
    }
}

/// Per-vertex output of the transform stage, interpolated per pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadedFragment {
    pub world_position: Vec3,
    pub world_normal: Vec3,
    pub world_tangent: Vec3,
    pub world_binormal: Vec3,
    pub uv: Vec2,
    pub clip_position: Vec4,
}

impl ShadedFragment {
    /// Blends three fragments with barycentric `weights`.
    ///
    /// Directions are not renormalized here; the shading stage does that.
    pub fn interpolate(a: &Self, b: &Self, c: &Self, weights: Vec3) -> Self {
        let [wa, wb, wc] = weights.to_array();
        Self {
            world_position: a.world_position * wa + b.world_position * wb + c.world_position * wc,
            world_normal: a.world_normal * wa + b.world_normal * wb + c.world_normal * wc,
            world_tangent: a.world_tangent * wa + b.world_tangent * wb + c.world_tangent * wc,
            world_binormal: a.world_binormal * wa + b.world_binormal * wb + c.world_binormal * wc,
            uv: a.uv * wa + b.uv * wb + c.uv * wc,
            clip_position: a.clip_position * wa + b.clip_position * wb + c.clip_position * wc,
        }
    }
}

/// Geometry transform stage for one vertex and its instance matrix.
///
/// Normals and tangents go through the model matrix directly, which is
/// only exact for uniform scale. The binormal is `normal x tangent` with no
/// re-orthogonalization. Zero-length inputs yield NaN directions.
#[inline]
pub fn transform_vertex(
    vertex: &VertexAttributes,
    model: &Mat4,
    camera: &CameraState,
) -> ShadedFragment {
    let world = *model * vertex.position.extend(1.0);
    let clip_position = camera.projection * camera.view * world;
    let world_normal = (*model * vertex.normal.extend(0.0)).truncate().normalize();
    let world_tangent = (*model * vertex.tangent.extend(0.0)).truncate().normalize();
    let world_binormal = world_normal.cross(world_tangent).normalize();
    ShadedFragment {
        world_position: world.truncate(),
        world_normal,
        world_tangent,
        world_binormal,
        uv: vertex.uv,
        clip_position,
    }
}

/// Runs the transform stage over a batch, checking instance indices once up
/// front so the per-vertex work cannot fail.
pub fn run_vertex_stage(
    vertices: &[VertexAttributes],
    transforms: &InstanceTransforms,
    camera: &CameraState,
) -> Result<Vec<ShadedFragment>, ShadingError> {
    use rayon::prelude::*;

    transforms.check_indices(vertices)?;
    let matrices = transforms.as_slice();
    Ok(vertices
        .par_iter()
        .map(|vertex| transform_vertex(vertex, &matrices[vertex.instance_index as usize], camera))
        .collect())
}
