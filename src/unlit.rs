//! Unlit textured path: transform, pass UV and color through, output the raw
//! texture sample.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::texture::TextureSampler;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnlitVertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub color: Vec4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnlitVarying {
    pub clip_position: Vec4,
    pub uv: Vec2,
    pub color: Vec4,
}

impl UnlitVarying {
    pub fn interpolate(a: &Self, b: &Self, c: &Self, weights: Vec3) -> Self {
        let [wa, wb, wc] = weights.to_array();
        Self {
            clip_position: a.clip_position * wa + b.clip_position * wb + c.clip_position * wc,
            uv: a.uv * wa + b.uv * wb + c.uv * wc,
            color: a.color * wa + b.color * wb + c.color * wc,
        }
    }
}

#[inline]
pub fn unlit_vertex(vertex: &UnlitVertex, model: &Mat4, view_projection: &Mat4) -> UnlitVarying {
    UnlitVarying {
        clip_position: *view_projection * *model * vertex.position.extend(1.0),
        uv: vertex.uv,
        color: vertex.color,
    }
}

/// The vertex color is carried along but not applied.
#[inline]
pub fn unlit_fragment(varying: &UnlitVarying, texture: &dyn TextureSampler) -> Vec4 {
    texture.sample(varying.uv)
}
