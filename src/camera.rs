use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Camera parameters for one frame. Read-only to the shading core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub view: Mat4,
    pub projection: Mat4,
    /// World-space eye position.
    pub eye: Vec3,
}

impl CameraState {
    pub fn new(view: Mat4, projection: Mat4, eye: Vec3) -> Self {
        Self {
            view,
            projection,
            eye,
        }
    }

    /// Builds a camera whose eye is recovered from the inverse view matrix.
    pub fn from_view_projection(view: Mat4, projection: Mat4) -> Self {
        let eye = view.inverse().col(3).truncate();
        Self::new(view, projection, eye)
    }

    /// Right-handed perspective camera looking from `eye` towards `target`.
    ///
    /// `fov_y` is in radians; depth maps to `[0, 1]`.
    pub fn perspective_look_at(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self::new(
            Mat4::look_at_rh(eye, target, up),
            Mat4::perspective_rh(fov_y, aspect, near, far),
            eye,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn to_uniform(&self) -> CameraUniform {
        CameraUniform {
            view: self.view.to_cols_array_2d(),
            proj: self.projection.to_cols_array_2d(),
            inv_view: self.view.inverse().to_cols_array_2d(),
            inv_proj: self.projection.inverse().to_cols_array_2d(),
            camera_position: self.eye.extend(1.0).into(),
        }
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::perspective_look_at(
            Vec3::new(0.0, 2.0, 6.0),
            Vec3::ZERO,
            Vec3::Y,
            60f32.to_radians(),
            1.0,
            0.1,
            100.0,
        )
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub inv_view: [[f32; 4]; 4],
    pub inv_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
}
