use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::transform::VertexAttributes;

/// Object-space vertex stored in a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub uv: Vec2,
}

/// Indexed triangle list with counter-clockwise front faces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Square in the XZ plane facing +Y, `size` units wide, split into
    /// `subdivisions` quads per side.
    pub fn plane(size: f32, subdivisions: u32) -> Self {
        let cells = subdivisions.max(1);
        let row = cells + 1;
        let mut vertices = Vec::with_capacity((row * row) as usize);
        for z in 0..=cells {
            for x in 0..=cells {
                let u = x as f32 / cells as f32;
                let v = z as f32 / cells as f32;
                vertices.push(Vertex {
                    position: Vec3::new((u - 0.5) * size, 0.0, (v - 0.5) * size),
                    normal: Vec3::Y,
                    tangent: Vec3::ZERO,
                    uv: Vec2::new(u, v),
                });
            }
        }

        let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
        for z in 0..cells {
            for x in 0..cells {
                let i0 = z * row + x;
                let i1 = i0 + 1;
                let i2 = i0 + row;
                let i3 = i2 + 1;
                indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
            }
        }

        let mut mesh = Self { vertices, indices };
        mesh.compute_tangents();
        mesh
    }

    /// Latitude/longitude sphere centred on the origin.
    pub fn uv_sphere(radius: f32, sectors: u32, stacks: u32) -> Self {
        let sectors = sectors.max(3);
        let stacks = stacks.max(2);
        let mut vertices = Vec::with_capacity(((sectors + 1) * (stacks + 1)) as usize);
        for stack in 0..=stacks {
            let v = stack as f32 / stacks as f32;
            let phi = v * PI;
            for sector in 0..=sectors {
                let u = sector as f32 / sectors as f32;
                let theta = u * TAU;
                let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                vertices.push(Vertex {
                    position: normal * radius,
                    normal,
                    tangent: Vec3::ZERO,
                    uv: Vec2::new(u, v),
                });
            }
        }

        let row = sectors + 1;
        let mut indices = Vec::with_capacity((sectors * stacks * 6) as usize);
        for stack in 0..stacks {
            for sector in 0..sectors {
                let i0 = stack * row + sector;
                let i1 = i0 + 1;
                let i2 = i0 + row;
                let i3 = i2 + 1;
                if stack != 0 {
                    indices.extend_from_slice(&[i0, i1, i2]);
                }
                if stack != stacks - 1 {
                    indices.extend_from_slice(&[i1, i3, i2]);
                }
            }
        }

        let mut mesh = Self { vertices, indices };
        mesh.compute_tangents();
        mesh
    }

    /// Recomputes per-vertex tangents from the UV layout.
    ///
    /// Triangles with degenerate UVs are skipped. Vertices that end up
    /// without a tangent get an arbitrary direction perpendicular to their
    /// normal.
    pub fn compute_tangents(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.vertices.len()];

        for triangle in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            let (v0, v1, v2) = (self.vertices[i0], self.vertices[i1], self.vertices[i2]);
            let delta_pos1 = v1.position - v0.position;
            let delta_pos2 = v2.position - v0.position;
            let delta_uv1 = v1.uv - v0.uv;
            let delta_uv2 = v2.uv - v0.uv;

            let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
            if det.abs() <= f32::EPSILON {
                continue;
            }
            let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) / det;
            accum[i0] += tangent;
            accum[i1] += tangent;
            accum[i2] += tangent;
        }

        for (vertex, tangent) in self.vertices.iter_mut().zip(accum) {
            vertex.tangent = tangent
                .try_normalize()
                .unwrap_or_else(|| vertex.normal.any_orthonormal_vector());
        }
    }

    /// Vertex records for drawing this mesh as instance `instance_index`.
    pub fn vertex_attributes(&self, instance_index: u32) -> Vec<VertexAttributes> {
        self.vertices
            .iter()
            .map(|vertex| VertexAttributes {
                position: vertex.position,
                normal: vertex.normal,
                tangent: vertex.tangent,
                uv: vertex.uv,
                instance_index,
            })
            .collect()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_front_faces_point_along_normals(mesh: &Mesh) {
        for triangle in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|i| mesh.vertices[triangle[i] as usize]);
            let face = (b.position - a.position).cross(c.position - a.position);
            let normal = a.normal + b.normal + c.normal;
            assert!(face.dot(normal) > 0.0, "triangle {triangle:?} is wound clockwise");
        }
    }

    #[test]
    fn plane_has_expected_topology() {
        let mesh = Mesh::plane(2.0, 4);
        assert_eq!(mesh.vertices.len(), 25);
        assert_eq!(mesh.triangle_count(), 32);
        assert_front_faces_point_along_normals(&mesh);
    }

    #[test]
    fn plane_tangents_follow_u() {
        let mesh = Mesh::plane(1.0, 2);
        for vertex in &mesh.vertices {
            assert!(vertex.tangent.abs_diff_eq(Vec3::X, 1e-5));
        }
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let mesh = Mesh::uv_sphere(2.0, 16, 8);
        for vertex in &mesh.vertices {
            assert!((vertex.position.length() - 2.0).abs() < 1e-4);
            assert!((vertex.normal.length() - 1.0).abs() < 1e-4);
        }
        assert_front_faces_point_along_normals(&mesh);
    }

    #[test]
    fn sphere_tangents_are_unit_and_perpendicular() {
        let mesh = Mesh::uv_sphere(1.0, 32, 8);
        for vertex in &mesh.vertices {
            assert!((vertex.tangent.length() - 1.0).abs() < 1e-4);
            assert!(vertex.tangent.dot(vertex.normal).abs() < 0.2);
        }
    }

    #[test]
    fn degenerate_uvs_fall_back_to_perpendicular_tangent() {
        let mut mesh = Mesh {
            vertices: vec![
                Vertex {
                    position: Vec3::ZERO,
                    normal: Vec3::Z,
                    ..Vertex::default()
                },
                Vertex {
                    position: Vec3::X,
                    normal: Vec3::Z,
                    ..Vertex::default()
                },
                Vertex {
                    position: Vec3::Y,
                    normal: Vec3::Z,
                    ..Vertex::default()
                },
            ],
            indices: vec![0, 1, 2],
        };
        mesh.compute_tangents();
        for vertex in &mesh.vertices {
            assert!((vertex.tangent.length() - 1.0).abs() < 1e-5);
            assert!(vertex.tangent.dot(Vec3::Z).abs() < 1e-5);
        }
    }

    #[test]
    fn vertex_attributes_carry_instance() {
        let mesh = Mesh::plane(1.0, 1);
        let attributes = mesh.vertex_attributes(7);
        assert_eq!(attributes.len(), mesh.vertices.len());
        assert!(attributes.iter().all(|a| a.instance_index == 7));
    }
}
