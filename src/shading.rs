//! PBR shading evaluator.
//!
//! Every function here is a pure numeric kernel over one fragment. Inputs
//! outside their expected domains produce Inf/NaN rather than errors; the
//! invariants are only asserted in debug builds.

use glam::{Vec3, Vec4};

use crate::brdf::evaluate_brdf;
use crate::camera::CameraState;
use crate::display::{gamma_decode, tone_map_and_encode, GAMMA};
use crate::light::{PointLightSet, MAX_POINT_LIGHTS};
use crate::material::Material;
use crate::transform::ShadedFragment;

/// Physical surface quantities reconstructed from a material at one UV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    /// Linear albedo.
    pub albedo: Vec3,
    /// World-space shading normal.
    pub normal: Vec3,
    pub roughness: f32,
    pub metallic: f32,
    pub occlusion: f32,
}

/// Linear albedo: texture times base color, decoded from display gamma.
#[inline]
pub fn decode_albedo(material: &Material, fragment: &ShadedFragment) -> Vec3 {
    let uv = material.tiled_uv(fragment.uv);
    let texel = material.albedo.sample(uv) * material.params.base_color;
    gamma_decode(texel.truncate())
}

/// Maps a normal-map texel through the fragment's tangent basis.
///
/// The texel is decoded with `pow(x, 1 / 2.2)` before the `[-1, 1]` remap.
#[inline]
pub fn reconstruct_normal(fragment: &ShadedFragment, texel: Vec4) -> Vec3 {
    let tangent_space = (texel.truncate().powf(1.0 / GAMMA) * 2.0 - Vec3::ONE).normalize();
    let world = fragment.world_tangent * tangent_space.x
        + fragment.world_binormal * tangent_space.y
        + fragment.world_normal * tangent_space.z;
    world.normalize()
}

/// Samples all four material maps for a fragment.
pub fn sample_surface(material: &Material, fragment: &ShadedFragment) -> SurfaceSample {
    let params = &material.params;
    let uv = material.tiled_uv(fragment.uv);
    let packed = material.roughness_metallic.sample(uv);
    let roughness = packed.y * params.roughness();
    let metallic = packed.z * params.metallic();
    let occlusion = material.occlusion.sample(uv).x * params.ao();

    debug_assert!(
        roughness > 0.0 && roughness <= 1.0,
        "roughness {roughness} outside (0, 1]"
    );
    debug_assert!(
        (0.0..=1.0).contains(&metallic),
        "metallic {metallic} outside [0, 1]"
    );

    SurfaceSample {
        albedo: decode_albedo(material, fragment),
        normal: reconstruct_normal(fragment, material.normal.sample(uv)),
        roughness,
        metallic,
        occlusion,
    }
}

/// Sums the BRDF over the active lights, before occlusion.
#[inline]
pub fn accumulate_lights(
    surface: &SurfaceSample,
    world_position: Vec3,
    view: Vec3,
    lights: &PointLightSet,
) -> Vec3 {
    debug_assert!(lights.len() <= MAX_POINT_LIGHTS);
    let mut radiance = Vec3::ZERO;
    for light in lights.active() {
        let to_light = light.position - world_position;
        let distance = to_light.length();
        let l = to_light.normalize();
        let attenuation = light.attenuation(distance);
        radiance += evaluate_brdf(
            surface.normal,
            l,
            view,
            surface.albedo,
            surface.roughness,
            surface.metallic,
            light.color,
        ) * attenuation;
    }
    radiance
}

/// Linear HDR radiance leaving the fragment towards the camera.
pub fn shade(
    fragment: &ShadedFragment,
    material: &Material,
    camera: &CameraState,
    lights: &PointLightSet,
) -> Vec3 {
    let surface = sample_surface(material, fragment);
    let view = (camera.eye - fragment.world_position).normalize();
    accumulate_lights(&surface, fragment.world_position, view, lights) * surface.occlusion
}

/// Full fragment stage: shading followed by display mapping.
#[inline]
pub fn shade_fragment(
    fragment: &ShadedFragment,
    material: &Material,
    camera: &CameraState,
    lights: &PointLightSet,
) -> Vec4 {
    tone_map_and_encode(shade(fragment, material, camera, lights))
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;
    use std::sync::Arc;

    use glam::{Mat4, Vec2};

    use super::*;
    use crate::brdf::distribution_ggx;
    use crate::light::PointLight;
    use crate::material::MaterialParameters;
    use crate::texture::{
        AddressMode, FilterMode, SamplerDescriptor, SolidTexture, Texture2d, TextureSampler,
    };

    fn fragment_at_origin() -> ShadedFragment {
        ShadedFragment {
            world_position: Vec3::ZERO,
            world_normal: Vec3::Z,
            world_tangent: Vec3::X,
            world_binormal: Vec3::Y,
            uv: Vec2::splat(0.5),
            clip_position: Vec4::new(0.0, 0.0, 0.5, 1.0),
        }
    }

    fn grey_material(metallic: f32) -> Material {
        let albedo = 0.5f32.powf(1.0 / GAMMA);
        Material::from_params(MaterialParameters::new(Vec4::ONE, metallic, 0.5, 1.0, 1.0))
            .with_albedo(Arc::new(SolidTexture(Vec4::new(albedo, albedo, albedo, 1.0))))
    }

    fn camera_at(eye: Vec3) -> CameraState {
        CameraState::new(Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y), Mat4::IDENTITY, eye)
    }

    fn overhead_light() -> PointLight {
        PointLight::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ONE, 10.0, 5.0)
    }

    #[test]
    fn albedo_is_decoded_to_linear() {
        let albedo = decode_albedo(&grey_material(0.0), &fragment_at_origin());
        assert!(albedo.abs_diff_eq(Vec3::splat(0.5), 1e-5));
    }

    #[test]
    fn albedo_multiplies_base_color() {
        let mut material = Material::default();
        material.params.base_color = Vec4::new(1.0, 0.5, 0.0, 1.0);
        let albedo = decode_albedo(&material, &fragment_at_origin());
        assert!(albedo.abs_diff_eq(Vec3::new(1.0, 0.5f32.powf(GAMMA), 0.0), 1e-6));
    }

    #[test]
    fn neutral_normal_texel_keeps_geometric_normal() {
        let normal = reconstruct_normal(
            &fragment_at_origin(),
            crate::material::neutral_normal_texel(),
        );
        assert!(normal.abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn normal_map_tilts_along_tangent() {
        let texel = Vec4::new(1.0, 0.5f32.powf(GAMMA), 1.0, 1.0);
        let normal = reconstruct_normal(&fragment_at_origin(), texel);
        let expected = Vec3::new(1.0, 0.0, 1.0).normalize();
        assert!(normal.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn roughness_and_metallic_come_from_green_and_blue() {
        let material = Material::from_params(MaterialParameters::new(Vec4::ONE, 0.5, 0.8, 0.5, 1.0))
            .with_roughness_metallic(Arc::new(SolidTexture(Vec4::new(0.0, 0.5, 1.0, 1.0))))
            .with_occlusion(Arc::new(SolidTexture(Vec4::new(0.5, 0.0, 0.0, 1.0))));
        let surface = sample_surface(&material, &fragment_at_origin());
        assert_eq!(surface.roughness, 0.4);
        assert_eq!(surface.metallic, 0.5);
        assert_eq!(surface.occlusion, 0.25);
    }

    /// 2x1 texture: `left` for u in [0, 0.5), `right` for u in [0.5, 1).
    fn two_texels(left: Vec4, right: Vec4, filter: FilterMode) -> Arc<dyn TextureSampler> {
        let sampler = SamplerDescriptor {
            address_mode: AddressMode::Repeat,
            filter,
        };
        Arc::new(Texture2d::from_texels(2, 1, vec![left, right], sampler).unwrap())
    }

    fn split_material(uv_scale: f32) -> Material {
        let tilted = Vec4::new(1.0, 0.5f32.powf(GAMMA), 1.0, 1.0);
        Material::from_params(MaterialParameters::new(Vec4::ONE, 1.0, 1.0, 1.0, uv_scale))
            .with_albedo(two_texels(Vec4::ONE, Vec4::W, FilterMode::Nearest))
            .with_normal(two_texels(
                crate::material::neutral_normal_texel(),
                tilted,
                FilterMode::Nearest,
            ))
            .with_roughness_metallic(two_texels(
                Vec4::new(0.0, 1.0, 0.0, 1.0),
                Vec4::new(0.0, 0.5, 1.0, 1.0),
                FilterMode::Nearest,
            ))
            .with_occlusion(two_texels(
                Vec4::ONE,
                Vec4::new(0.5, 0.0, 0.0, 1.0),
                FilterMode::Nearest,
            ))
    }

    #[test]
    fn uv_scale_tiles_every_map() {
        let mut fragment = fragment_at_origin();
        fragment.uv = Vec2::new(0.3, 0.5);

        let plain = sample_surface(&split_material(1.0), &fragment);
        assert_eq!(plain.albedo, Vec3::ONE);
        assert!(plain.normal.abs_diff_eq(Vec3::Z, 1e-5));
        assert_eq!(plain.roughness, 1.0);
        assert_eq!(plain.metallic, 0.0);
        assert_eq!(plain.occlusion, 1.0);

        // u = 0.3 * 2 lands in the right-hand texel of every map.
        let tiled_material = split_material(2.0);
        assert_eq!(decode_albedo(&tiled_material, &fragment), Vec3::ZERO);
        let tiled = sample_surface(&tiled_material, &fragment);
        assert_eq!(tiled.albedo, Vec3::ZERO);
        assert!(tiled
            .normal
            .abs_diff_eq(Vec3::new(1.0, 0.0, 1.0).normalize(), 1e-5));
        assert_eq!(tiled.roughness, 0.5);
        assert_eq!(tiled.metallic, 1.0);
        assert_eq!(tiled.occlusion, 0.5);
    }

    #[test]
    fn huge_uv_scale_shades_without_overflow() {
        let params = MaterialParameters::new(Vec4::ONE, 0.0, 0.5, 1.0, 1.0e20);
        assert!(params.validate().is_ok());
        let checker = Texture2d::from_rgba8(
            2,
            2,
            &[
                0, 0, 0, 255, 255, 255, 255, 255, //
                255, 255, 255, 255, 0, 0, 0, 255,
            ],
            SamplerDescriptor::default(),
        )
        .unwrap();
        let material = Material::from_params(params).with_albedo(Arc::new(checker));
        let lights = PointLightSet::from_lights(&[overhead_light()]);
        let color = shade(
            &fragment_at_origin(),
            &material,
            &camera_at(Vec3::new(0.0, 0.0, 5.0)),
            &lights,
        );
        assert!(color.is_finite());
    }

    #[test]
    fn no_lights_means_black() {
        let color = shade(
            &fragment_at_origin(),
            &grey_material(0.0),
            &camera_at(Vec3::new(0.0, 0.0, 5.0)),
            &PointLightSet::new(),
        );
        assert_eq!(color, Vec3::ZERO);
    }

    #[test]
    fn head_on_light_matches_hand_computation() {
        let lights = PointLightSet::from_lights(&[overhead_light()]);
        let color = shade(
            &fragment_at_origin(),
            &grey_material(0.0),
            &camera_at(Vec3::new(0.0, 0.0, 5.0)),
            &lights,
        );
        // N = L = V = H, so F = F0 = 0.04, G = 1 and attenuation = 10 / 2.
        let specular = distribution_ggx(1.0, 0.5) * 0.04 / (4.0 + 1.0e-4);
        let diffuse = 0.96 * 0.5 / PI;
        let expected = (diffuse + specular) * 5.0;
        assert!(color.abs_diff_eq(Vec3::splat(expected), 1e-4), "{color}");
    }

    #[test]
    fn occlusion_scales_after_summation() {
        let lights = PointLightSet::from_lights(&[
            overhead_light(),
            PointLight::new(Vec3::new(3.0, 0.0, 3.0), Vec3::new(1.0, 0.2, 0.2), 4.0, 2.0),
        ]);
        let camera = camera_at(Vec3::new(0.0, 1.0, 5.0));
        let open = grey_material(0.0);
        let mut occluded = grey_material(0.0);
        occluded.params.factors.z = 0.25;
        let lit = shade(&fragment_at_origin(), &open, &camera, &lights);
        let dim = shade(&fragment_at_origin(), &occluded, &camera, &lights);
        assert!(dim.abs_diff_eq(lit * 0.25, 1e-6));
    }

    #[test]
    fn every_active_light_contributes() {
        let light = PointLight::new(Vec3::new(0.0, 0.0, 4.0), Vec3::ONE, 0.1, 3.0);
        let camera = camera_at(Vec3::new(0.0, 0.0, 5.0));
        let material = grey_material(0.0);
        let one = shade(
            &fragment_at_origin(),
            &material,
            &camera,
            &PointLightSet::from_lights(&[light]),
        );
        let full = shade(
            &fragment_at_origin(),
            &material,
            &camera,
            &PointLightSet::from_lights(&[light; MAX_POINT_LIGHTS]),
        );
        assert!(full.abs_diff_eq(one * MAX_POINT_LIGHTS as f32, 1e-4));
    }

    #[test]
    fn lights_past_count_are_ignored() {
        let mut buffer = PointLightSet::from_lights(&[overhead_light()]).to_uniform();
        for slot in buffer.lights.iter_mut().skip(1) {
            *slot = (&PointLight::new(Vec3::new(0.0, 0.0, 1.0), Vec3::ONE, 1.0e6, 1.0)).into();
        }
        let camera = camera_at(Vec3::new(0.0, 0.0, 5.0));
        let material = grey_material(0.0);
        let from_buffer = shade(
            &fragment_at_origin(),
            &material,
            &camera,
            &PointLightSet::from(&buffer),
        );
        let single = shade(
            &fragment_at_origin(),
            &material,
            &camera,
            &PointLightSet::from_lights(&[overhead_light()]),
        );
        assert_eq!(from_buffer, single);
    }

    #[test]
    fn light_behind_surface_is_ignored() {
        let lights = PointLightSet::from_lights(&[PointLight::new(
            Vec3::new(0.0, 3.0, -4.0),
            Vec3::ONE,
            10.0,
            5.0,
        )]);
        let color = shade(
            &fragment_at_origin(),
            &grey_material(0.0),
            &camera_at(Vec3::new(0.0, 0.0, 5.0)),
            &lights,
        );
        assert_eq!(color, Vec3::ZERO);
    }

    #[test]
    fn fragment_output_is_display_range() {
        let lights = PointLightSet::from_lights(&[overhead_light()]);
        let color = shade_fragment(
            &fragment_at_origin(),
            &grey_material(0.0),
            &camera_at(Vec3::new(0.0, 0.0, 5.0)),
            &lights,
        );
        assert!(color.x > 0.0 && color.x < 1.0);
        assert_eq!(color.x, color.y);
        assert_eq!(color.y, color.z);
        assert_eq!(color.w, 1.0);
    }
}
