use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ShadingError;

/// Maximum number of point lights evaluated per fragment.
pub const MAX_POINT_LIGHTS: usize = 16;

/// Omnidirectional light with a soft, radius-controlled falloff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub radius: f32,
}

impl PointLight {
    pub fn new(position: Vec3, color: Vec3, intensity: f32, radius: f32) -> Self {
        Self {
            position,
            color,
            intensity,
            radius,
        }
    }

    /// Checks the invariants the evaluator relies on.
    pub fn validate(&self) -> Result<(), ShadingError> {
        if !(self.radius > 0.0) {
            return Err(ShadingError::InvalidLightRadius(self.radius));
        }
        if !(self.intensity >= 0.0) {
            return Err(ShadingError::InvalidLightIntensity(self.intensity));
        }
        Ok(())
    }

    /// Radiance scale at `distance` from the light.
    #[inline]
    pub fn attenuation(&self, distance: f32) -> f32 {
        attenuation(self.intensity, self.radius, distance)
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: Vec3::ONE,
            intensity: 1.0,
            radius: 1.0,
        }
    }
}

/// Inverse-square style falloff bounded by `radius`.
///
/// Equals `intensity` at the light and approaches zero with distance without
/// ever reaching it.
#[inline]
pub fn attenuation(intensity: f32, radius: f32, distance: f32) -> f32 {
    debug_assert!(radius > 0.0, "point light radius must be positive");
    intensity / (1.0 + (distance * distance) / (radius * radius))
}

/// Fixed-capacity snapshot of the active point lights for one frame.
///
/// Only the first `len()` entries are ever handed to the evaluator; the
/// count cannot exceed [`MAX_POINT_LIGHTS`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightSet {
    count: usize,
    lights: [PointLight; MAX_POINT_LIGHTS],
}

impl PointLightSet {
    /// Creates an empty light set.
    pub fn new() -> Self {
        Self {
            count: 0,
            lights: [PointLight::default(); MAX_POINT_LIGHTS],
        }
    }

    /// Builds a set from the first [`MAX_POINT_LIGHTS`] lights of a slice.
    pub fn from_lights(lights: &[PointLight]) -> Self {
        if lights.len() > MAX_POINT_LIGHTS {
            warn!(
                "dropping {} point light(s) beyond capacity {MAX_POINT_LIGHTS}",
                lights.len() - MAX_POINT_LIGHTS
            );
        }
        let mut set = Self::new();
        for light in lights.iter().take(MAX_POINT_LIGHTS) {
            set.lights[set.count] = *light;
            set.count += 1;
        }
        set
    }

    /// Appends a validated light.
    pub fn push(&mut self, light: PointLight) -> Result<(), ShadingError> {
        if self.count == MAX_POINT_LIGHTS {
            return Err(ShadingError::LightCapacityExceeded {
                capacity: MAX_POINT_LIGHTS,
            });
        }
        light.validate()?;
        self.lights[self.count] = light;
        self.count += 1;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The active lights, in insertion order.
    #[inline]
    pub fn active(&self) -> &[PointLight] {
        &self.lights[..self.count]
    }

    /// Packs the set into its uniform buffer layout.
    pub fn to_uniform(&self) -> PointLightBuffer {
        let mut buffer = PointLightBuffer::zeroed();
        for (slot, light) in buffer.lights.iter_mut().zip(self.active()) {
            *slot = light.into();
        }
        buffer.count = self.count as u32;
        buffer
    }
}

impl Default for PointLightSet {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&PointLightBuffer> for PointLightSet {
    /// Decodes a uniform buffer, clamping a corrupt count to capacity.
    fn from(buffer: &PointLightBuffer) -> Self {
        let count = buffer.count as usize;
        if count > MAX_POINT_LIGHTS {
            warn!("light buffer count {count} exceeds capacity {MAX_POINT_LIGHTS}; clamping");
        }
        let mut set = Self::new();
        set.count = count.min(MAX_POINT_LIGHTS);
        for (slot, uniform) in set.lights.iter_mut().zip(&buffer.lights) {
            *slot = uniform.into();
        }
        set
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightUniform {
    /// World position; `w` is padding.
    pub position: [f32; 4],
    /// Linear color; `w` is padding.
    pub color: [f32; 4],
    pub intensity: f32,
    pub radius: f32,
    pub _pad: [f32; 2],
}

impl From<&PointLight> for PointLightUniform {
    fn from(light: &PointLight) -> Self {
        Self {
            position: light.position.extend(1.0).into(),
            color: light.color.extend(1.0).into(),
            intensity: light.intensity,
            radius: light.radius,
            _pad: [0.0; 2],
        }
    }
}

impl From<&PointLightUniform> for PointLight {
    fn from(uniform: &PointLightUniform) -> Self {
        Self {
            position: Vec3::from_slice(&uniform.position[..3]),
            color: Vec3::from_slice(&uniform.color[..3]),
            intensity: uniform.intensity,
            radius: uniform.radius,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightBuffer {
    pub lights: [PointLightUniform; MAX_POINT_LIGHTS],
    pub count: u32,
    pub _pad: [u32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light(x: f32) -> PointLight {
        PointLight::new(Vec3::new(x, 0.0, 0.0), Vec3::ONE, 1.0, 2.0)
    }

    #[test]
    fn attenuation_at_source_is_intensity() {
        assert_eq!(attenuation(7.5, 3.0, 0.0), 7.5);
    }

    #[test]
    fn attenuation_decreases_and_stays_positive() {
        let mut previous = attenuation(10.0, 5.0, 0.0);
        for step in 1..200 {
            let value = attenuation(10.0, 5.0, step as f32 * 0.5);
            assert!(value < previous);
            assert!(value > 0.0);
            previous = value;
        }
        assert!(attenuation(10.0, 5.0, 1.0e6) < 1.0e-9);
        assert!(attenuation(10.0, 5.0, 1.0e6) >= 0.0);
    }

    #[test]
    fn push_rejects_past_capacity() {
        let mut set = PointLightSet::new();
        for i in 0..MAX_POINT_LIGHTS {
            set.push(light(i as f32)).unwrap();
        }
        assert_eq!(
            set.push(light(99.0)),
            Err(ShadingError::LightCapacityExceeded {
                capacity: MAX_POINT_LIGHTS
            })
        );
        assert_eq!(set.len(), MAX_POINT_LIGHTS);
    }

    #[test]
    fn push_validates_light() {
        let mut set = PointLightSet::new();
        let bad = PointLight {
            radius: 0.0,
            ..PointLight::default()
        };
        assert_eq!(set.push(bad), Err(ShadingError::InvalidLightRadius(0.0)));
        let dark = PointLight {
            intensity: -1.0,
            ..PointLight::default()
        };
        assert_eq!(set.push(dark), Err(ShadingError::InvalidLightIntensity(-1.0)));
        assert!(set.is_empty());
    }

    #[test]
    fn from_lights_truncates_to_capacity() {
        let lights: Vec<_> = (0..20).map(|i| light(i as f32)).collect();
        let set = PointLightSet::from_lights(&lights);
        assert_eq!(set.len(), MAX_POINT_LIGHTS);
        assert_eq!(set.active().last().unwrap().position.x, 15.0);
    }

    #[test]
    fn uniform_round_trip_preserves_lights() {
        let set = PointLightSet::from_lights(&[light(1.0), light(2.0)]);
        let buffer = set.to_uniform();
        assert_eq!(buffer.count, 2);
        assert_eq!(PointLightSet::from(&buffer).active(), set.active());
    }

    #[test]
    fn corrupt_buffer_count_is_clamped() {
        let mut buffer = PointLightSet::from_lights(&[light(1.0)]).to_uniform();
        buffer.count = 20;
        let set = PointLightSet::from(&buffer);
        assert_eq!(set.len(), MAX_POINT_LIGHTS);
        assert_eq!(set.active().len(), MAX_POINT_LIGHTS);
    }

    #[test]
    fn uniform_layout_is_sixteen_byte_aligned() {
        assert_eq!(std::mem::size_of::<PointLightUniform>(), 48);
        assert_eq!(std::mem::size_of::<PointLightBuffer>() % 16, 0);
    }
}
