//! Physically based shading core for the Crystal runtime.
//!
//! The numeric kernel (`brdf`, `shading`, `display`, `transform`, `unlit`)
//! is pure per-vertex and per-fragment math over immutable frame inputs. The
//! remaining modules assemble those inputs and drive the kernel through a
//! CPU reference rasterizer so the results can be inspected headlessly.

pub mod app;
pub mod brdf;
pub mod camera;
pub mod display;
pub mod error;
pub mod frame;
pub mod light;
pub mod material;
pub mod mesh;
pub mod raster;
pub mod scene;
pub mod shading;
pub mod texture;
pub mod transform;
pub mod unlit;

pub use app::{build_frame, print_summary, render_scene, DrawItem};
pub use camera::{CameraState, CameraUniform};
pub use display::{tone_map_and_encode, GAMMA};
pub use error::ShadingError;
pub use frame::{FrameSnapshot, FrameState};
pub use light::{PointLight, PointLightBuffer, PointLightSet, MAX_POINT_LIGHTS};
pub use material::{Material, MaterialParameters, MaterialUniform};
pub use mesh::{Mesh, Vertex};
pub use raster::{Framebuffer, Varying};
pub use scene::{Scene, SceneObject};
pub use shading::{shade, shade_fragment};
pub use texture::{SolidTexture, Texture2d, TextureSampler};
pub use transform::{
    run_vertex_stage, transform_vertex, InstanceTransforms, ShadedFragment, VertexAttributes,
};
pub use unlit::{unlit_fragment, unlit_vertex, UnlitVarying, UnlitVertex};
