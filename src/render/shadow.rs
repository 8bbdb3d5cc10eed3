use crate::core::{
    KEY_LIGHT_POSITION, SHADOW_BOTTOM, SHADOW_FAR, SHADOW_LEFT, SHADOW_NEAR, SHADOW_RIGHT,
    SHADOW_TOP,
};
use glam::{Mat4, Vec3};

/// Orthographic view-projection of the key light, aimed at the origin.
pub fn key_light_view_proj() -> Mat4 {
    let eye = Vec3::from_array(KEY_LIGHT_POSITION);
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
    let proj = Mat4::orthographic_rh(
        SHADOW_LEFT,
        SHADOW_RIGHT,
        SHADOW_BOTTOM,
        SHADOW_TOP,
        SHADOW_NEAR,
        SHADOW_FAR,
    );
    proj * view
}
