use crate::core::{
    srgb_hex_to_linear, Camera, DynamicLight, FogState, ENV_INTENSITY, FILL_LIGHT_COLOR,
    FILL_LIGHT_INTENSITY, FILL_LIGHT_POSITION, KEY_LIGHT_COLOR, KEY_LIGHT_INTENSITY,
    KEY_LIGHT_POSITION, SHADOW_BIAS, SHADOW_MAP_SIZE, TONE_MAPPING_EXPOSURE,
};
use glam::{Mat4, Vec3};

#[repr(C)]
#[derive(Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct DirLightGpu {
    pub(crate) direction: [f32; 4],
    pub(crate) color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct SpotLightGpu {
    pub(crate) position: [f32; 4],
    pub(crate) direction: [f32; 4],
    pub(crate) color: [f32; 4],
    pub(crate) cones: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct Globals {
    pub(crate) view_proj: [[f32; 4]; 4],
    pub(crate) light_view_proj: [[f32; 4]; 4],
    pub(crate) camera_pos: [f32; 4],
    pub(crate) fog_color: [f32; 4],
    pub(crate) fog_params: [f32; 4],
    pub(crate) shadow_params: [f32; 4],
    pub(crate) dir_lights: [DirLightGpu; 3],
    pub(crate) spots: [SpotLightGpu; 2],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct ShadowGlobals {
    pub(crate) light_view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct ModelUniform {
    pub(crate) model: [[f32; 4]; 4],
    pub(crate) normal: [[f32; 4]; 4],
    pub(crate) flags: [u32; 4],
}

impl ModelUniform {
    pub(crate) fn new(world: Mat4, receive_shadow: bool, joint_offset: Option<u32>, catcher: bool) -> Self {
        Self {
            model: world.to_cols_array_2d(),
            normal: world.inverse().transpose().to_cols_array_2d(),
            flags: [
                receive_shadow as u32,
                joint_offset.is_some() as u32,
                joint_offset.unwrap_or(0),
                catcher as u32,
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct MaterialUniform {
    pub(crate) base_color: [f32; 4],
    pub(crate) emissive: [f32; 4],
    pub(crate) pbr: [f32; 4],
}

/// A spotlight as seen by the renderer this frame.
#[derive(Clone, Copy, Debug)]
pub struct SpotPose {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub distance: f32,
    pub angle: f32,
    pub penumbra: f32,
    pub decay: f32,
}

/// Per-frame lighting inputs.
#[derive(Clone, Debug, Default)]
pub struct Lighting {
    pub fog: FogState,
    pub dynamic: DynamicLight,
    pub spots: Vec<SpotPose>,
}

fn dir_light(position: [f32; 3], color: Vec3, intensity: f32) -> DirLightGpu {
    let dir = Vec3::from_array(position).normalize_or_zero();
    DirLightGpu {
        direction: dir.extend(0.0).to_array(),
        color: (color * intensity).extend(1.0).to_array(),
    }
}

pub(crate) fn pack_globals(
    camera: &Camera,
    light_view_proj: Mat4,
    lighting: &Lighting,
    env_max_mip: f32,
) -> Globals {
    let mut spots = [SpotLightGpu::default(); 2];
    for (slot, s) in spots.iter_mut().zip(&lighting.spots) {
        *slot = SpotLightGpu {
            position: s.position.extend(s.distance).to_array(),
            direction: s.direction.extend(s.decay).to_array(),
            color: (s.color * s.intensity).extend(1.0).to_array(),
            cones: [
                s.angle.cos(),
                (s.angle * (1.0 - s.penumbra)).cos(),
                0.0,
                0.0,
            ],
        };
    }
    let dynamic = &lighting.dynamic;
    Globals {
        view_proj: camera.view_projection().to_cols_array_2d(),
        light_view_proj: light_view_proj.to_cols_array_2d(),
        camera_pos: camera.eye.extend(1.0).to_array(),
        fog_color: lighting.fog.color.extend(1.0).to_array(),
        fog_params: [
            lighting.fog.near,
            lighting.fog.far,
            ENV_INTENSITY,
            TONE_MAPPING_EXPOSURE,
        ],
        shadow_params: [SHADOW_BIAS, 1.0 / SHADOW_MAP_SIZE as f32, env_max_mip, 0.0],
        dir_lights: [
            dir_light(
                KEY_LIGHT_POSITION,
                srgb_hex_to_linear(KEY_LIGHT_COLOR),
                KEY_LIGHT_INTENSITY,
            ),
            dir_light(
                FILL_LIGHT_POSITION,
                srgb_hex_to_linear(FILL_LIGHT_COLOR),
                FILL_LIGHT_INTENSITY,
            ),
            dir_light(dynamic.position.to_array(), dynamic.color, dynamic.intensity),
        ],
        spots,
    }
}
