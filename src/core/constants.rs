/// Timeline, lighting and scene tuning constants.
///
/// Every window boundary below was tuned by hand against the baked street
/// animation; keep them literal even where neighbouring windows leave gaps.
// Timeline domain (seconds of the baked animation)
pub const TIMELINE_START: f32 = 0.0;
pub const TIMELINE_END: f32 = 38.3;

// Manual scroll mapping
pub const SCROLL_PIXELS_PER_SECOND: f32 = 1300.0;
pub const LERP_FACTOR: f32 = 0.04; // per frame
pub const SNAP_EPSILON: f32 = 0.00025;

// Wheel delta normalisation for DOM_DELTA_LINE events
pub const WHEEL_LINE_PIXELS: f32 = 16.0;

// Dynamic light ("light3") defaults
pub const LIGHT3_COLOR: u32 = 0xFFFFFF;
pub const LIGHT3_INTENSITY: f32 = 3.25;
pub const LIGHT3_POSITION: [f32; 3] = [-4.0, 2.0, -3.5];
pub const LIGHT3_SWEEP_OFFSET: f32 = 20.5;

// Finale: z sweep, color shift and intensity pulse
pub const FINALE_START: f32 = 34.0;
pub const FINALE_RAMP_SECS: f32 = 3.5;
pub const FINALE_Z_FROM: f32 = -3.5;
pub const FINALE_Z_TO: f32 = 3.5;
pub const FINALE_ACCENT_COLOR: u32 = 0xE18121;
pub const PULSE_HZ: f32 = 2.0;
pub const PULSE_MIN_INTENSITY: f32 = 0.2;
pub const PULSE_MAX_INTENSITY: f32 = 5.0;

// Fog
pub const FOG_LIGHT_COLOR: u32 = 0xF3F1ED;
pub const FOG_DARK_COLOR: u32 = 0x222221;
pub const FOG_NEAR: f32 = 1.0;
pub const FOG_LIGHT_FAR: f32 = 25.0;
pub const FOG_DARK_FAR: f32 = 15.0;

// Fixed lights
pub const KEY_LIGHT_COLOR: u32 = 0xFFF9EE;
pub const KEY_LIGHT_INTENSITY: f32 = 2.0;
pub const KEY_LIGHT_POSITION: [f32; 3] = [-2.0, 6.0, 4.0];
pub const FILL_LIGHT_COLOR: u32 = 0xEEF9FF;
pub const FILL_LIGHT_INTENSITY: f32 = 0.5;
pub const FILL_LIGHT_POSITION: [f32; 3] = [3.0, 2.0, -5.0];

// Key light shadow camera
pub const SHADOW_MAP_SIZE: u32 = 1024;
pub const SHADOW_BIAS: f32 = -0.01;
pub const SHADOW_LEFT: f32 = -5.0;
pub const SHADOW_RIGHT: f32 = 5.0;
pub const SHADOW_TOP: f32 = 5.0;
pub const SHADOW_BOTTOM: f32 = -15.0;
pub const SHADOW_NEAR: f32 = 1.0;
pub const SHADOW_FAR: f32 = 13.0;

// Shadow catcher ground plane
pub const GROUND_SIZE: f32 = 100.0;
pub const GROUND_SHADOW_OPACITY: f32 = 0.25;

// Advert spotlights
pub const ADVERT_SPOT_INTENSITY: f32 = 12.0;
pub const ADVERT_SPOT_DISTANCE: f32 = 5.0;
pub const ADVERT_SPOT_ANGLE: f32 = std::f32::consts::PI * 0.45;
pub const ADVERT_SPOT_PENUMBRA: f32 = 0.5;
pub const ADVERT_SPOT_DECAY: f32 = 1.0;

// Environment
pub const ENV_INTENSITY: f32 = 2.25;
pub const TONE_MAPPING_EXPOSURE: f32 = 1.0;

// Default camera (replaced by an authored camera when the asset has one)
pub const DEFAULT_FOV_DEGREES: f32 = 35.0;
pub const DEFAULT_ZNEAR: f32 = 0.1;
pub const DEFAULT_ZFAR: f32 = 100.0;
pub const DEFAULT_CAMERA_POSITION: [f32; 3] = [0.0, 0.0, 20.0];

// Debug orbit controls
pub const ORBIT_MIN_DISTANCE: f32 = 3.0;
pub const ORBIT_MAX_DISTANCE: f32 = 200.0;
pub const ORBIT_MAX_POLAR: f32 = 2.1;
pub const ORBIT_DAMPING: f32 = 0.05;
pub const ORBIT_ZOOM_SPEED: f32 = 0.05;
pub const ORBIT_ZOOM_PIXELS_PER_STEP: f32 = 100.0;

// Pointer gesture: a press that moves less than this many pixels is a click
pub const CLICK_SLOP_PX: f32 = 4.0;

// Asset layout relative to the asset base URL
pub const MODEL_DIR: &str = "models/";
pub const MODEL_FILE: &str = "street_01.glb";
pub const ENV_DIR: &str = "env/";
pub const ENV_FACES: [&str; 6] = ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"];
pub const STRING_SOUNDS: [&str; 6] = [
    "sounds/string-1.mp3",
    "sounds/string-2.mp3",
    "sounds/string-3.mp3",
    "sounds/string-4.mp3",
    "sounds/string-5.mp3",
    "sounds/string-6.mp3",
];

// Named scene nodes
pub const SHADOW_CASTERS: [&str; 5] = ["amyMain", "guitarMain", "ballMain", "advert1", "advert2"];
pub const SHADOW_CASTER_GROUPS: [&str; 3] = ["guitarMain", "advert1", "advert2"];
pub const STRING_NODES: [&str; 6] = [
    "string-_E",
    "string-A",
    "string-D",
    "string-G",
    "string-B",
    "string-E",
];
pub const ADVERT_MARKERS: [(&str, u32); 2] = [("advertLight1", 0x9DCD5D), ("advertLight2", 0xE6A8AC)];

// Host player variables
pub const VAR_AUTO_ANIMATE: &str = "autoAnimate";
pub const VAR_SCROLL_ENABLED: &str = "scrollEnabled";
pub const VAR_MESH_LOADED: &str = "meshLoaded";
pub const PROGRESS_VAR_PREFIX: &str = "progressNum_";
pub const PROGRESS_SIGNAL_COUNT: usize = 8;
