//! CPU reference rasterizer.
//!
//! A draw runs in four passes: the vertex stage over all vertices, triangle
//! coverage in parallel, a sequential depth resolve, then fragment shading
//! in parallel with one task per framebuffer slot.

use std::path::Path;

use anyhow::{Context, Result};
use glam::{Mat4, Vec2, Vec3, Vec4};
use log::debug;
use rayon::prelude::*;

use crate::display::to_rgba8;
use crate::error::ShadingError;
use crate::frame::FrameSnapshot;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::shading::shade_fragment;
use crate::texture::TextureSampler;
use crate::transform::{run_vertex_stage, ShadedFragment};
use crate::unlit::{unlit_fragment, unlit_vertex, UnlitVarying, UnlitVertex};

/// Depth the buffer is cleared to; anything at or beyond it is discarded.
pub const CLEAR_DEPTH: f32 = 1.0;

/// Per-vertex output that the rasterizer can place and interpolate.
pub trait Varying: Copy + Send + Sync {
    fn clip_position(&self) -> Vec4;
    fn interpolate(a: &Self, b: &Self, c: &Self, weights: Vec3) -> Self;
}

impl Varying for ShadedFragment {
    fn clip_position(&self) -> Vec4 {
        self.clip_position
    }

    fn interpolate(a: &Self, b: &Self, c: &Self, weights: Vec3) -> Self {
        ShadedFragment::interpolate(a, b, c, weights)
    }
}

impl Varying for UnlitVarying {
    fn clip_position(&self) -> Vec4 {
        self.clip_position
    }

    fn interpolate(a: &Self, b: &Self, c: &Self, weights: Vec3) -> Self {
        UnlitVarying::interpolate(a, b, c, weights)
    }
}

/// Color and depth targets for software rendering. Row 0 is the top row.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    color: Vec<Vec4>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![Vec4::W; len],
            depth: vec![CLEAR_DEPTH; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fills the color target and resets depth.
    pub fn clear(&mut self, color: Vec4) {
        self.color.fill(color);
        self.depth.fill(CLEAR_DEPTH);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        self.color[self.index(x, y)]
    }

    pub fn depth(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }

    pub fn color(&self) -> &[Vec4] {
        &self.color
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Quantizes the color target to tightly packed RGBA8 rows.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.color.iter().flat_map(|color| to_rgba8(*color)).collect()
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        let image = image::RgbaImage::from_raw(self.width, self.height, self.to_rgba8())
            .context("framebuffer dimensions do not match its pixel data")?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("failed to write image to {}", path.display()))
    }

    /// Draws a mesh instance through the PBR path. Returns the number of
    /// pixels that were shaded.
    pub fn draw_pbr(
        &mut self,
        mesh: &Mesh,
        instance_index: u32,
        material: &Material,
        frame: &FrameSnapshot,
    ) -> Result<usize, ShadingError> {
        let attributes = mesh.vertex_attributes(instance_index);
        let fragments = run_vertex_stage(&attributes, &frame.transforms, &frame.camera)?;
        self.draw(&fragments, &mesh.indices, |fragment| {
            shade_fragment(fragment, material, &frame.camera, &frame.lights)
        })
    }

    /// Draws textured geometry without lighting.
    pub fn draw_unlit(
        &mut self,
        vertices: &[UnlitVertex],
        indices: &[u32],
        model: &Mat4,
        view_projection: &Mat4,
        texture: &dyn TextureSampler,
    ) -> Result<usize, ShadingError> {
        let varyings: Vec<UnlitVarying> = vertices
            .par_iter()
            .map(|vertex| unlit_vertex(vertex, model, view_projection))
            .collect();
        self.draw(&varyings, indices, |varying| unlit_fragment(varying, texture))
    }

    /// Rasterizes an indexed triangle list and shades every pixel that
    /// survives the depth test.
    pub fn draw<V, F>(
        &mut self,
        varyings: &[V],
        indices: &[u32],
        shade: F,
    ) -> Result<usize, ShadingError>
    where
        V: Varying,
        F: Fn(&V) -> Vec4 + Sync,
    {
        if indices.len() % 3 != 0 {
            return Err(ShadingError::PartialTriangle(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= varyings.len()) {
            return Err(ShadingError::IndexOutOfRange {
                index,
                count: varyings.len(),
            });
        }

        let (width, height) = (self.width, self.height);
        let coverage: Vec<Option<Vec<Coverage<V>>>> = indices
            .par_chunks_exact(3)
            .map(|triangle| {
                let corners = [
                    &varyings[triangle[0] as usize],
                    &varyings[triangle[1] as usize],
                    &varyings[triangle[2] as usize],
                ];
                rasterize_triangle(corners, width, height)
            })
            .collect();

        let rejected = coverage.iter().filter(|covered| covered.is_none()).count();
        if rejected > 0 {
            debug!("rejected {rejected} triangle(s) crossing the near plane");
        }

        let mut resolved: Vec<Option<V>> = vec![None; self.depth.len()];
        for sample in coverage.into_iter().flatten().flatten() {
            if sample.depth < self.depth[sample.pixel] {
                self.depth[sample.pixel] = sample.depth;
                resolved[sample.pixel] = Some(sample.varying);
            }
        }

        self.color
            .par_iter_mut()
            .zip(resolved.par_iter())
            .for_each(|(out, slot)| {
                if let Some(varying) = slot {
                    *out = shade(varying);
                }
            });

        let shaded = resolved.iter().filter(|slot| slot.is_some()).count();
        debug!("shaded {shaded} pixel(s) from {} triangle(s)", indices.len() / 3);
        Ok(shaded)
    }
}

struct Coverage<V> {
    pixel: usize,
    depth: f32,
    varying: V,
}

/// Turns screen-space barycentrics into perspective-correct weights.
pub(crate) fn perspective_weights(screen: Vec3, clip_w: Vec3) -> Vec3 {
    let weighted = screen / clip_w;
    weighted / (weighted.x + weighted.y + weighted.z)
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// `None` when the triangle has a vertex at or behind the eye plane.
fn rasterize_triangle<V: Varying>(
    corners: [&V; 3],
    width: u32,
    height: u32,
) -> Option<Vec<Coverage<V>>> {
    let clip = corners.map(|corner| corner.clip_position());
    if clip.iter().any(|position| position.w <= 0.0) {
        return None;
    }

    let ndc = clip.map(|position| position.truncate() / position.w);
    let facing = edge(ndc[0].truncate(), ndc[1].truncate(), ndc[2].truncate());
    if !(facing > 0.0) {
        return Some(Vec::new());
    }

    let size = Vec2::new(width as f32, height as f32);
    let screen = ndc.map(|p| Vec2::new(p.x + 1.0, 1.0 - p.y) * 0.5 * size);
    let area = edge(screen[0], screen[1], screen[2]);

    let min = screen[0].min(screen[1]).min(screen[2]).floor().max(Vec2::ZERO);
    let max = screen[0].max(screen[1]).max(screen[2]).ceil().min(size);
    let (x0, y0) = (min.x as u32, min.y as u32);
    let (x1, y1) = (max.x as u32, max.y as u32);

    let depths = Vec3::new(ndc[0].z, ndc[1].z, ndc[2].z);
    let clip_w = Vec3::new(clip[0].w, clip[1].w, clip[2].w);
    let mut covered = Vec::new();
    for y in y0..y1 {
        for x in x0..x1 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let screen_weights = Vec3::new(
                edge(screen[1], screen[2], p),
                edge(screen[2], screen[0], p),
                edge(screen[0], screen[1], p),
            ) / area;
            if screen_weights.min_element() < 0.0 {
                continue;
            }
            let depth = screen_weights.dot(depths);
            if !(0.0..CLEAR_DEPTH).contains(&depth) {
                continue;
            }
            let weights = perspective_weights(screen_weights, clip_w);
            covered.push(Coverage {
                pixel: y as usize * width as usize + x as usize,
                depth,
                varying: V::interpolate(corners[0], corners[1], corners[2], weights),
            });
        }
    }
    Some(covered)
}
