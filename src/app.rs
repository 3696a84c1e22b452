use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use log::{info, warn};

use crate::camera::CameraState;
use crate::frame::{FrameSnapshot, FrameState};
use crate::light::PointLightSet;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::raster::Framebuffer;
use crate::scene::{Scene, SceneObject};
use crate::transform::InstanceTransforms;

/// A scene mesh ready to be drawn.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub name: String,
    pub mesh: Mesh,
    pub instance_index: u32,
    pub material: Material,
}

pub fn print_summary(scene: &Scene) {
    println!(
        "Loaded scene with {} objects ({} lights)",
        scene.objects.len(),
        scene.lights.len()
    );
    for object in &scene.objects {
        println!(" - {} ({})", object.name, object.object_type);
    }
}

pub fn camera_from_scene(scene: &Scene, aspect: f32) -> CameraState {
    let default_position = Vec3::new(0.0, 2.0, 6.0);
    let Some(camera) = scene.camera() else {
        return CameraState::perspective_look_at(
            default_position,
            Vec3::ZERO,
            Vec3::Y,
            60f32.to_radians(),
            aspect.max(0.01),
            0.1,
            100.0,
        );
    };

    let rotation = rotation_matrix(camera.rotation);
    let forward = (rotation * Vec3::NEG_Z.extend(0.0)).truncate();
    let up = (rotation * Vec3::Y.extend(0.0)).truncate();
    CameraState::perspective_look_at(
        camera.position,
        camera.position + forward,
        up,
        camera.fov.to_radians(),
        aspect.max(0.01),
        0.1,
        100.0,
    )
}

/// Validated point lights from the scene, truncated to capacity.
pub fn lights_from_scene(scene: &Scene) -> Result<PointLightSet> {
    for (object, light) in scene
        .objects
        .iter()
        .filter(|o| o.object_type == "light")
        .zip(&scene.lights)
    {
        light
            .validate()
            .with_context(|| format!("light {} is invalid", object.name))?;
    }
    Ok(PointLightSet::from_lights(&scene.lights))
}

/// Builds the frame snapshot and the draw list for every renderable mesh.
pub fn build_frame(scene: &Scene, aspect: f32) -> Result<(FrameSnapshot, Vec<DrawItem>)> {
    let mut transforms = InstanceTransforms::new();
    let mut items = Vec::new();
    for object in scene.meshes() {
        let Some(mesh) = mesh_for(object) else {
            warn!(
                "skipping {}: unknown mesh {:?}",
                object.name,
                object.mesh.as_deref().unwrap_or_default()
            );
            continue;
        };
        let params = object.material_parameters();
        params
            .validate()
            .with_context(|| format!("mesh {} has an invalid material", object.name))?;
        items.push(DrawItem {
            name: object.name.clone(),
            mesh,
            instance_index: transforms.push(model_matrix(object)),
            material: Material::from_params(params),
        });
    }

    let snapshot = FrameSnapshot {
        camera: camera_from_scene(scene, aspect),
        transforms,
        lights: lights_from_scene(scene)?,
    };
    Ok((snapshot, items))
}

/// Renders the scene into a new framebuffer of the given size.
pub fn render_scene(scene: &Scene, width: u32, height: u32) -> Result<Framebuffer> {
    let (snapshot, items) = build_frame(scene, width as f32 / height.max(1) as f32)?;
    let state = FrameState::new();
    state.publish(snapshot);
    let frame = state.snapshot();

    let mut target = Framebuffer::new(width, height);
    draw_items(&mut target, &items, &frame)?;
    Ok(target)
}

/// Draws every item in order, stopping at the first one that fails.
pub fn draw_items(
    target: &mut Framebuffer,
    items: &[DrawItem],
    frame: &FrameSnapshot,
) -> Result<()> {
    for item in items {
        let pixels = target
            .draw_pbr(&item.mesh, item.instance_index, &item.material, frame)
            .with_context(|| format!("failed to draw {}", item.name))?;
        info!("{}: {pixels} pixel(s)", item.name);
    }
    Ok(())
}

fn rotation_matrix(degrees: Vec3) -> Mat4 {
    Mat4::from_rotation_z(degrees.z.to_radians())
        * Mat4::from_rotation_y(degrees.y.to_radians())
        * Mat4::from_rotation_x(degrees.x.to_radians())
}

fn model_matrix(object: &SceneObject) -> Mat4 {
    Mat4::from_translation(object.position)
        * rotation_matrix(object.rotation)
        * Mat4::from_scale(object.scale)
}

fn mesh_for(object: &SceneObject) -> Option<Mesh> {
    match object.mesh.as_deref().unwrap_or("sphere") {
        "sphere" => Some(Mesh::uv_sphere(1.0, 32, 16)),
        "plane" => Some(Mesh::plane(1.0, 4)),
        _ => None,
    }
}
