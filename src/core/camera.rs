use super::constants::{
    DEFAULT_CAMERA_POSITION, DEFAULT_FOV_DEGREES, DEFAULT_ZFAR, DEFAULT_ZNEAR,
};
use super::scene::CameraProjection;
use glam::{Mat4, Vec3};

/// Right-handed perspective camera.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
    /// When set, the view comes from this world matrix instead of a look-at.
    pub world: Option<Mat4>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::from_array(DEFAULT_CAMERA_POSITION),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: 1.0,
            fovy_radians: DEFAULT_FOV_DEGREES.to_radians(),
            znear: DEFAULT_ZNEAR,
            zfar: DEFAULT_ZFAR,
            world: None,
        }
    }
}

impl Camera {
    /// Camera driven by an authored node; looks down the node's local -Z.
    pub fn from_node(world: Mat4, projection: &CameraProjection, aspect: f32) -> Self {
        let eye = world.transform_point3(Vec3::ZERO);
        let forward = world.transform_vector3(Vec3::NEG_Z).normalize_or_zero();
        Self {
            eye,
            target: eye + forward,
            up: world.transform_vector3(Vec3::Y).normalize_or_zero(),
            aspect,
            fovy_radians: projection.yfov_radians,
            znear: projection.znear,
            zfar: projection.zfar,
            world: Some(world),
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect.max(1e-3), self.znear, self.zfar)
    }

    pub fn view_matrix(&self) -> Mat4 {
        match self.world {
            Some(world) => world.inverse(),
            None => Mat4::look_at_rh(self.eye, self.target, self.up),
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
