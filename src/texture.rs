use std::fmt;

use glam::{Vec2, Vec4};

use crate::error::ShadingError;

/// Pure UV lookup used by the shading stages.
///
/// Implementations must be free of observable side effects so that any
/// number of fragments can sample concurrently.
pub trait TextureSampler: fmt::Debug + Send + Sync {
    fn sample(&self, uv: Vec2) -> Vec4;
}

/// Texture returning the same texel everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidTexture(pub Vec4);

impl TextureSampler for SolidTexture {
    #[inline]
    fn sample(&self, _uv: Vec2) -> Vec4 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressMode {
    Repeat,
    #[default]
    MirrorRepeat,
    ClampToEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SamplerDescriptor {
    pub address_mode: AddressMode,
    pub filter: FilterMode,
}

/// CPU-resident 2D texture with normalized float texels.
///
/// Row 0 is at `v = 0`.
#[derive(Clone, PartialEq)]
pub struct Texture2d {
    width: u32,
    height: u32,
    texels: Vec<Vec4>,
    sampler: SamplerDescriptor,
}

impl Texture2d {
    pub fn from_texels(
        width: u32,
        height: u32,
        texels: Vec<Vec4>,
        sampler: SamplerDescriptor,
    ) -> Result<Self, ShadingError> {
        let expected = width as usize * height as usize;
        if expected == 0 || texels.len() != expected {
            return Err(ShadingError::TextureSize {
                expected,
                actual: texels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            texels,
            sampler,
        })
    }

    /// Decodes tightly packed RGBA8 data. No color space conversion is done.
    pub fn from_rgba8(
        width: u32,
        height: u32,
        data: &[u8],
        sampler: SamplerDescriptor,
    ) -> Result<Self, ShadingError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(ShadingError::TextureSize {
                expected,
                actual: data.len(),
            });
        }
        let texels = data
            .chunks_exact(4)
            .map(|px| {
                Vec4::new(
                    px[0] as f32 / 255.0,
                    px[1] as f32 / 255.0,
                    px[2] as f32 / 255.0,
                    px[3] as f32 / 255.0,
                )
            })
            .collect();
        Self::from_texels(width, height, texels, sampler)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn sampler(&self) -> SamplerDescriptor {
        self.sampler
    }

    /// Fetches a texel with the texture's address mode applied.
    pub fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = wrap(x, self.width, self.sampler.address_mode);
        let y = wrap(y, self.height, self.sampler.address_mode);
        self.texels[y * self.width as usize + x]
    }
}

impl fmt::Debug for Texture2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture2d")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sampler", &self.sampler)
            .finish()
    }
}

impl TextureSampler for Texture2d {
    fn sample(&self, uv: Vec2) -> Vec4 {
        let x = uv.x * self.width as f32;
        let y = uv.y * self.height as f32;
        match self.sampler.filter {
            FilterMode::Nearest => self.texel(x.floor() as i64, y.floor() as i64),
            FilterMode::Linear => {
                let x = x - 0.5;
                let y = y - 0.5;
                let x0 = x.floor();
                let y0 = y.floor();
                let tx = x - x0;
                let ty = y - y0;
                let (x0, y0) = (x0 as i64, y0 as i64);
                let (x1, y1) = (x0.saturating_add(1), y0.saturating_add(1));
                let top = self.texel(x0, y0).lerp(self.texel(x1, y0), tx);
                let bottom = self.texel(x0, y1).lerp(self.texel(x1, y1), tx);
                top.lerp(bottom, ty)
            }
        }
    }
}

fn wrap(coord: i64, size: u32, mode: AddressMode) -> usize {
    let size = size as i64;
    let index = match mode {
        AddressMode::Repeat => coord.rem_euclid(size),
        AddressMode::ClampToEdge => coord.clamp(0, size - 1),
        AddressMode::MirrorRepeat => {
            let period = size * 2;
            let m = coord.rem_euclid(period);
            if m < size {
                m
            } else {
                period - 1 - m
            }
        }
    };
    index as usize
}
