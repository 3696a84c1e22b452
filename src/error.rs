use thiserror::Error;

/// Errors reported when frame data is assembled at the boundary of the
/// shading core.
///
/// The per-fragment kernel never produces these; they are raised while
/// packing lights, validating materials or binding instances, before any
/// fragment is shaded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShadingError {
    #[error("point light set is full ({capacity} lights)")]
    LightCapacityExceeded { capacity: usize },

    #[error("point light radius must be positive, got {0}")]
    InvalidLightRadius(f32),

    #[error("point light intensity must be non-negative, got {0}")]
    InvalidLightIntensity(f32),

    #[error("material {name} factor {value} is outside {range}")]
    MaterialOutOfRange {
        name: &'static str,
        value: f32,
        range: &'static str,
    },

    #[error("instance index {index} has no transform ({count} available)")]
    MissingInstance { index: u32, count: usize },

    #[error("index count {0} is not a multiple of 3")]
    PartialTriangle(usize),

    #[error("vertex index {index} is out of range ({count} vertices)")]
    IndexOutOfRange { index: u32, count: usize },

    #[error("texture data has {actual} elements, expected {expected}")]
    TextureSize { expected: usize, actual: usize },
}
