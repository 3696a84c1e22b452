use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::light::PointLight;
use crate::material::MaterialParameters;

/// Scene description loaded from XML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub lights: Vec<PointLight>,
}

impl Scene {
    /// Parses a `<scene>` document of `<object>` entries.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let mut objects = Vec::new();

        for node in document.descendants().filter(|n| n.has_tag_name("object")) {
            let mut object = SceneObject::default();
            object.name = required_text(&node, "name")?;
            object.object_type = optional_text(&node, "type").unwrap_or_else(|| "mesh".to_string());
            object.mesh = optional_text(&node, "mesh");
            object.color = parse_color(optional_text(&node, "color"), object.color)?;
            object.position = parse_vec3(optional_text(&node, "position"), object.position)?;
            object.rotation = parse_vec3(optional_text(&node, "rotation"), object.rotation)?;
            object.scale = parse_vec3(optional_text(&node, "scale"), object.scale)?;
            object.fov = parse_f32(optional_text(&node, "fov"), object.fov)?;
            object.intensity = parse_f32(optional_text(&node, "intensity"), object.intensity)?;
            object.radius = parse_f32(optional_text(&node, "radius"), object.radius)?;
            object.metallic = parse_f32(optional_text(&node, "metallic"), object.metallic)?;
            object.roughness = parse_f32(optional_text(&node, "roughness"), object.roughness)?;
            object.ao = parse_f32(optional_text(&node, "ao"), object.ao)?;
            object.uv_scale = parse_f32(optional_text(&node, "uv_scale"), object.uv_scale)?;
            objects.push(object);
        }

        let lights = objects
            .iter()
            .filter(|obj| obj.object_type == "light")
            .map(SceneObject::point_light)
            .collect();

        Ok(Self { objects, lights })
    }

    pub fn camera(&self) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.object_type == "camera")
    }

    pub fn meshes(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.object_type == "mesh")
    }
}

/// One `<object>` entry. Which fields matter depends on `object_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<String>,
    #[serde(default = "default_color")]
    pub color: Vec3,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default)]
    pub metallic: f32,
    #[serde(default = "default_roughness")]
    pub roughness: f32,
    #[serde(default = "default_ao")]
    pub ao: f32,
    #[serde(default = "default_uv_scale")]
    pub uv_scale: f32,
}

impl SceneObject {
    pub fn point_light(&self) -> PointLight {
        PointLight::new(self.position, self.color, self.intensity, self.radius)
    }

    /// Material factors for a mesh; `color` becomes the base color.
    pub fn material_parameters(&self) -> MaterialParameters {
        MaterialParameters::new(
            self.color.extend(1.0),
            self.metallic,
            self.roughness,
            self.ao,
            self.uv_scale,
        )
    }
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: String::new(),
            object_type: String::new(),
            mesh: None,
            color: default_color(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            fov: default_fov(),
            intensity: default_intensity(),
            radius: default_radius(),
            metallic: 0.0,
            roughness: default_roughness(),
            ao: default_ao(),
            uv_scale: default_uv_scale(),
        }
    }
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_fov() -> f32 {
    60.0
}

fn default_intensity() -> f32 {
    1.0
}

fn default_radius() -> f32 {
    10.0
}

fn default_roughness() -> f32 {
    0.5
}

fn default_ao() -> f32 {
    1.0
}

fn default_uv_scale() -> f32 {
    1.0
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    match value {
        Some(value) => parse_components(&value, "vector"),
        None => Ok(default),
    }
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    match value {
        Some(value) => Ok(parse_components(&value, "color")? / 255.0),
        None => Ok(default),
    }
}

fn parse_components(value: &str, what: &str) -> Result<Vec3> {
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("failed to parse {what} component {component:?}: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match numbers[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(anyhow!(
            "{what} needs 3 components, got {} in {value:?}",
            numbers.len()
        )),
    }
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}
