pub mod animation;
pub mod camera;
pub mod choreography;
pub mod config;
pub mod constants;
pub mod error;
pub mod gltf_scene;
pub mod host;
pub mod orbit;
pub mod picking;
pub mod rig;
pub mod scene;
pub mod timeline;

pub use animation::AnimationSet;
pub use camera::Camera;
pub use choreography::{srgb_hex_to_linear, Choreography, DynamicLight, FogState, ProgressSignals};
pub use config::AppConfig;
pub use constants::*;
pub use error::SceneError;
pub use gltf_scene::{parse_scene, SceneAsset, Vertex};
pub use host::{HostBridge, HostFlags, HostValue, Player};
pub use orbit::OrbitControls;
pub use rig::{rig_scene, SceneRig};
pub use scene::SceneGraph;
pub use timeline::{wheel_delta_pixels, PlaybackMode, Timeline};

// Shaders bundled as string constants
pub static SCENE_WGSL: &str = include_str!("../../shaders/scene.wgsl");
pub static SHADOW_WGSL: &str = include_str!("../../shaders/shadow.wgsl");
