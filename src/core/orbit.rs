use super::constants::{
    ORBIT_DAMPING, ORBIT_MAX_DISTANCE, ORBIT_MAX_POLAR, ORBIT_MIN_DISTANCE, ORBIT_ZOOM_PIXELS_PER_STEP,
    ORBIT_ZOOM_SPEED,
};
use glam::{Vec2, Vec3};

const POLAR_EPS: f32 = 0.0001;

/// Damped orbit around a fixed center. Panning is not supported.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_polar: f32,

    pub center: Vec3,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,

    rotate_delta: Vec2,
}

impl OrbitControls {
    /// Start orbiting `center` from the current `eye` position.
    pub fn from_eye(eye: Vec3, center: Vec3) -> Self {
        let offset = eye - center;
        let radius = offset.length().max(1e-4);
        let mut controls = Self {
            rotate_speed: 1.0,
            zoom_speed: ORBIT_ZOOM_SPEED,
            damping_factor: ORBIT_DAMPING,
            min_distance: ORBIT_MIN_DISTANCE,
            max_distance: ORBIT_MAX_DISTANCE,
            max_polar: ORBIT_MAX_POLAR,
            center,
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            rotate_delta: Vec2::ZERO,
        };
        controls.clamp();
        controls
    }

    /// Queue a drag of `dx`,`dy` pixels on a viewport `screen_height` tall.
    pub fn rotate_pixels(&mut self, dx: f32, dy: f32, screen_height: f32) {
        let per_pixel = std::f32::consts::TAU / screen_height.max(1.0);
        self.rotate_delta.x -= dx * per_pixel * self.rotate_speed;
        self.rotate_delta.y -= dy * per_pixel * self.rotate_speed;
    }

    /// Wheel zoom; positive deltas move away from the center.
    pub fn zoom(&mut self, wheel_delta_px: f32) {
        if wheel_delta_px == 0.0 || !wheel_delta_px.is_finite() {
            return;
        }
        let steps = wheel_delta_px.abs() / ORBIT_ZOOM_PIXELS_PER_STEP;
        let scale = (1.0 - self.zoom_speed).powf(steps);
        if wheel_delta_px > 0.0 {
            self.radius /= scale;
        } else {
            self.radius *= scale;
        }
        self.clamp();
    }

    /// Apply damped rotation for a frame of `dt_sec` and return the eye.
    pub fn update(&mut self, dt_sec: f32) -> Vec3 {
        let retention = (1.0 - self.damping_factor).powf(dt_sec.max(0.0) * 60.0);
        let applied = self.rotate_delta * (1.0 - retention);
        self.theta += applied.x;
        self.phi += applied.y;
        self.rotate_delta *= retention;
        self.clamp();
        self.eye()
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        self.center
            + Vec3::new(
                self.radius * sin_phi * sin_theta,
                self.radius * cos_phi,
                self.radius * sin_phi * cos_theta,
            )
    }

    fn clamp(&mut self) {
        let max_phi = self.max_polar.min(std::f32::consts::PI - POLAR_EPS);
        self.phi = self.phi.clamp(POLAR_EPS, max_phi);
        self.radius = self.radius.clamp(self.min_distance, self.max_distance);
    }
}
