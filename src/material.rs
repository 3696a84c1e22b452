use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::display::GAMMA;
use crate::error::ShadingError;
use crate::texture::{SolidTexture, TextureSampler};

/// Per-material constants.
///
/// `factors` packs `(metallic, roughness, ao, uv_scale)` in that order, the
/// same layout the uniform buffer uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialParameters {
    /// Linear RGBA base color.
    pub base_color: Vec4,
    pub factors: Vec4,
}

impl MaterialParameters {
    pub fn new(base_color: Vec4, metallic: f32, roughness: f32, ao: f32, uv_scale: f32) -> Self {
        Self {
            base_color,
            factors: Vec4::new(metallic, roughness, ao, uv_scale),
        }
    }

    #[inline]
    pub fn metallic(&self) -> f32 {
        self.factors.x
    }

    #[inline]
    pub fn roughness(&self) -> f32 {
        self.factors.y
    }

    #[inline]
    pub fn ao(&self) -> f32 {
        self.factors.z
    }

    #[inline]
    pub fn uv_scale(&self) -> f32 {
        self.factors.w
    }

    /// Authoring-time range checks. The evaluator itself never clamps.
    pub fn validate(&self) -> Result<(), ShadingError> {
        check("metallic", self.metallic(), "[0, 1]", |v| (0.0..=1.0).contains(&v))?;
        check("roughness", self.roughness(), "(0, 1]", |v| v > 0.0 && v <= 1.0)?;
        check("ao", self.ao(), "[0, 1]", |v| (0.0..=1.0).contains(&v))?;
        check("uv_scale", self.uv_scale(), "finite values", f32::is_finite)?;
        Ok(())
    }

    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color.into(),
            factors: self.factors.into(),
        }
    }
}

impl Default for MaterialParameters {
    fn default() -> Self {
        Self::new(Vec4::ONE, 0.0, 1.0, 1.0, 1.0)
    }
}

fn check(
    name: &'static str,
    value: f32,
    range: &'static str,
    ok: impl Fn(f32) -> bool,
) -> Result<(), ShadingError> {
    if ok(value) {
        Ok(())
    } else {
        Err(ShadingError::MaterialOutOfRange { name, value, range })
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub factors: [f32; 4],
}

/// Normal-map texel that decodes to the unperturbed tangent-space normal.
///
/// Normal maps are gamma-decoded with `1 / GAMMA` before the `[0, 1]` to
/// `[-1, 1]` remap, so "flat" is `0.5^GAMMA` rather than `0.5`.
pub fn neutral_normal_texel() -> Vec4 {
    let flat = 0.5f32.powf(GAMMA);
    Vec4::new(flat, flat, 1.0, 1.0)
}

/// Material parameters plus the four texture bindings sampled by the
/// shading evaluator.
#[derive(Debug, Clone)]
pub struct Material {
    pub params: MaterialParameters,
    pub albedo: Arc<dyn TextureSampler>,
    pub normal: Arc<dyn TextureSampler>,
    /// Roughness in green, metallic in blue.
    pub roughness_metallic: Arc<dyn TextureSampler>,
    /// Occlusion in red.
    pub occlusion: Arc<dyn TextureSampler>,
}

impl Material {
    /// Material driven purely by its parameters: white albedo, flat normals
    /// and unit roughness/metallic/occlusion maps.
    pub fn from_params(params: MaterialParameters) -> Self {
        Self {
            params,
            albedo: Arc::new(SolidTexture(Vec4::ONE)),
            normal: Arc::new(SolidTexture(neutral_normal_texel())),
            roughness_metallic: Arc::new(SolidTexture(Vec4::ONE)),
            occlusion: Arc::new(SolidTexture(Vec4::ONE)),
        }
    }

    pub fn with_albedo(mut self, texture: Arc<dyn TextureSampler>) -> Self {
        self.albedo = texture;
        self
    }

    pub fn with_normal(mut self, texture: Arc<dyn TextureSampler>) -> Self {
        self.normal = texture;
        self
    }

    pub fn with_roughness_metallic(mut self, texture: Arc<dyn TextureSampler>) -> Self {
        self.roughness_metallic = texture;
        self
    }

    pub fn with_occlusion(mut self, texture: Arc<dyn TextureSampler>) -> Self {
        self.occlusion = texture;
        self
    }

    /// UV after the material's tiling scale.
    #[inline]
    pub fn tiled_uv(&self, uv: Vec2) -> Vec2 {
        uv * self.params.uv_scale()
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::from_params(MaterialParameters::default())
    }
}
