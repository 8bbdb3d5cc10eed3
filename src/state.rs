use crate::core::picking::{nearest_hit, screen_to_world_ray};
use crate::core::{
    AnimationSet, AppConfig, Camera, Choreography, HostBridge, OrbitControls, SceneAsset, SceneRig,
    Timeline,
};
use glam::{Vec2, Vec3};

/// Everything produced by a successful asset load.
pub struct LoadedScene {
    pub asset: SceneAsset,
    pub rig: SceneRig,
    pub animations: AnimationSet,
}

/// Mutable state shared between the frame loop, input handlers and loader.
pub struct AppState {
    pub config: AppConfig,
    pub timeline: Timeline,
    pub host: HostBridge,
    pub choreography: Choreography,
    pub orbit: Option<OrbitControls>,
    /// `Some` once the asset is loaded; the per-frame logic is gated on it.
    pub scene: Option<LoadedScene>,
    /// Camera used for the last rendered frame.
    pub camera: Camera,
}

impl AppState {
    pub fn new(config: AppConfig, host: HostBridge) -> Self {
        Self {
            config,
            timeline: Timeline::new(),
            host,
            choreography: Choreography::new(),
            orbit: None,
            scene: None,
            camera: Camera::default(),
        }
    }

    /// Toggle debug orbit. Entering seeds the orbit from the last camera,
    /// looking at the origin.
    pub fn toggle_debug_orbit(&mut self) {
        if self.timeline.toggle_debug_orbit() {
            self.orbit = Some(OrbitControls::from_eye(self.camera.eye, Vec3::ZERO));
        } else {
            self.orbit = None;
        }
    }

    /// Route a wheel delta (already in pixels) to the orbit zoom in debug
    /// mode, otherwise to the timeline target.
    pub fn on_wheel(&mut self, delta_px: f32) {
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.zoom(delta_px);
            return;
        }
        let scroll_enabled = self.host.flags().scroll_enabled;
        if self.timeline.apply_wheel(delta_px, scroll_enabled) {
            log::trace!("[timeline] target {:.4}", self.timeline.target());
        }
    }

    pub fn on_drag(&mut self, dx: f32, dy: f32, screen_height: f32) {
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.rotate_pixels(dx, dy, screen_height);
        }
    }

    /// Sound index of the nearest string under a canvas pixel.
    pub fn pick_string(&self, px: Vec2, width: f32, height: f32) -> Option<usize> {
        let scene = self.scene.as_ref()?;
        let (origin, dir) =
            screen_to_world_ray(self.camera.view_projection(), width, height, px);
        let bounds = scene
            .rig
            .string_bounds(&scene.asset.graph, &scene.asset.meshes);
        nearest_hit(origin, dir, bounds.iter().map(|(i, b)| (*i, b))).map(|(i, _)| i)
    }
}
