//! Cook-Torrance microfacet BRDF: GGX distribution, Smith/Schlick-GGX
//! geometry and Schlick Fresnel.

use std::f32::consts::PI;

use glam::Vec3;

/// Reflectance at normal incidence for dielectrics.
pub const DIELECTRIC_F0: f32 = 0.04;

/// Guards the specular denominator when light or view graze the surface.
pub const SPECULAR_EPSILON: f32 = 1.0e-4;

/// GGX / Trowbridge-Reitz normal distribution.
///
/// Uses `alpha = roughness^2`. Tends towards a delta as roughness goes to
/// zero; callers keep roughness above zero.
#[inline]
pub fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let alpha = roughness * roughness;
    let alpha2 = alpha * alpha;
    let denom = n_dot_h * n_dot_h * (alpha2 - 1.0) + 1.0;
    alpha2 / (PI * denom * denom)
}

/// Schlick-GGX single-direction masking term with direct-lighting `k`.
#[inline]
pub fn geometry_schlick_ggx(n_dot_x: f32, roughness: f32) -> f32 {
    let r = roughness + 1.0;
    let k = r * r / 8.0;
    n_dot_x / (n_dot_x * (1.0 - k) + k)
}

/// Smith shadowing-masking: product of view and light terms.
#[inline]
pub fn geometry_smith(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    geometry_schlick_ggx(n_dot_v, roughness) * geometry_schlick_ggx(n_dot_l, roughness)
}

/// Schlick approximation of Fresnel reflectance.
#[inline]
pub fn fresnel_schlick(h_dot_v: f32, f0: Vec3) -> Vec3 {
    f0 + (Vec3::ONE - f0) * (1.0 - h_dot_v).clamp(0.0, 1.0).powi(5)
}

/// Base reflectance blended between dielectric and metal.
#[inline]
pub fn base_reflectance(albedo: Vec3, metallic: f32) -> Vec3 {
    Vec3::splat(DIELECTRIC_F0).lerp(albedo, metallic)
}

/// Outgoing radiance towards `v` for unit light arriving along `l`, scaled by
/// `light_color` and the cosine term.
///
/// `n`, `l` and `v` must be normalized. Back-facing light or view yields
/// zero.
#[inline]
pub fn evaluate_brdf(
    n: Vec3,
    l: Vec3,
    v: Vec3,
    albedo: Vec3,
    roughness: f32,
    metallic: f32,
    light_color: Vec3,
) -> Vec3 {
    let h = (v + l).normalize();
    let n_dot_l = n.dot(l).clamp(0.0, 1.0);
    let n_dot_v = n.dot(v).clamp(0.0, 1.0);
    let n_dot_h = n.dot(h).clamp(0.0, 1.0);
    let h_dot_v = h.dot(v).clamp(0.0, 1.0);

    let f0 = base_reflectance(albedo, metallic);
    let f = fresnel_schlick(h_dot_v, f0);
    let d = distribution_ggx(n_dot_h, roughness);
    let g = geometry_smith(n_dot_v, n_dot_l, roughness);

    let specular = d * g * f / (4.0 * n_dot_v * n_dot_l + SPECULAR_EPSILON);
    let k_d = (Vec3::ONE - f) * (1.0 - metallic);
    let diffuse = k_d * albedo / PI;

    (diffuse + specular) * light_color * n_dot_l
}
