use super::constants::*;
use glam::Vec3;

/// Convert a `0xRRGGBB` sRGB color to linear RGB.
pub fn srgb_hex_to_linear(hex: u32) -> Vec3 {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xFF) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec3::new(channel(16), channel(8), channel(0))
}

/// Linear distance fog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FogState {
    pub color: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Default for FogState {
    fn default() -> Self {
        Self {
            color: srgb_hex_to_linear(FOG_LIGHT_COLOR),
            near: FOG_NEAR,
            far: FOG_LIGHT_FAR,
        }
    }
}

/// The secondary directional light whose position, color and intensity
/// follow the timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DynamicLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for DynamicLight {
    fn default() -> Self {
        Self {
            position: Vec3::from_array(LIGHT3_POSITION),
            color: srgb_hex_to_linear(LIGHT3_COLOR),
            intensity: LIGHT3_INTENSITY,
        }
    }
}

/// Progress values for one frame. `None` means "not in window, do not send".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProgressSignals {
    values: [Option<f32>; PROGRESS_SIGNAL_COUNT],
}

impl ProgressSignals {
    #[inline]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied().flatten()
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: f32) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = Some(value);
        }
    }

    /// Signals emitted this frame, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Host variable name for a signal index, e.g. `progressNum_3`.
    pub fn var_name(index: usize) -> String {
        format!("{PROGRESS_VAR_PREFIX}{index}")
    }
}

/// One end of a time window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Edge {
    Open(f32),
    Closed(f32),
    Unbounded,
}

/// Time window over `anim_num`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Window {
    pub lower: Edge,
    pub upper: Edge,
}

impl Window {
    /// `(lo, hi)`
    pub const fn open(lo: f32, hi: f32) -> Self {
        Self {
            lower: Edge::Open(lo),
            upper: Edge::Open(hi),
        }
    }

    /// `(-inf, hi)`
    pub const fn below(hi: f32) -> Self {
        Self {
            lower: Edge::Unbounded,
            upper: Edge::Open(hi),
        }
    }

    /// `(lo, +inf)`
    pub const fn after(lo: f32) -> Self {
        Self {
            lower: Edge::Open(lo),
            upper: Edge::Unbounded,
        }
    }

    /// `[lo, +inf)`
    pub const fn from(lo: f32) -> Self {
        Self {
            lower: Edge::Closed(lo),
            upper: Edge::Unbounded,
        }
    }

    pub fn contains(&self, t: f32) -> bool {
        let above_lower = match self.lower {
            Edge::Open(lo) => t > lo,
            Edge::Closed(lo) => t >= lo,
            Edge::Unbounded => true,
        };
        let below_upper = match self.upper {
            Edge::Open(hi) => t < hi,
            Edge::Closed(hi) => t <= hi,
            Edge::Unbounded => true,
        };
        above_lower && below_upper
    }
}

/// Mutable view handed to each rule effect.
pub struct Stage<'a> {
    pub anim_num: f32,
    pub elapsed_sec: f32,
    pub fog: &'a mut FogState,
    pub light: &'a mut DynamicLight,
    pub progress: &'a mut ProgressSignals,
}

/// A timeline rule: when `window` contains `anim_num`, run `effect`.
pub struct Rule {
    pub name: &'static str,
    pub window: Window,
    pub effect: fn(&mut Stage),
}

/// Evaluated top to bottom every frame. Windows overlap on purpose, so
/// several rules may fire in the same frame.
pub const RULES: &[Rule] = &[
    Rule {
        name: "progress_0",
        window: Window::below(11.9),
        effect: |s| s.progress.set(0, s.anim_num / 11.9),
    },
    Rule {
        name: "progress_1+fog_light",
        window: Window::open(11.9, 13.3),
        effect: |s| {
            s.progress.set(1, (s.anim_num - 11.9) * 0.75);
            s.fog.color = srgb_hex_to_linear(FOG_LIGHT_COLOR);
            s.fog.far = FOG_LIGHT_FAR;
        },
    },
    Rule {
        name: "progress_2+fog_dark",
        window: Window::open(13.4, 18.0),
        effect: |s| {
            s.progress.set(2, (s.anim_num - 13.5) / 4.0);
            s.fog.color = srgb_hex_to_linear(FOG_DARK_COLOR);
            s.fog.far = FOG_DARK_FAR;
        },
    },
    Rule {
        name: "progress_3",
        window: Window::open(16.9, 20.3),
        effect: |s| s.progress.set(3, (s.anim_num - 17.0) / 1.3),
    },
    Rule {
        name: "progress_4",
        window: Window::open(24.3, 28.0),
        effect: |s| s.progress.set(4, (s.anim_num - 24.3) / 3.33),
    },
    Rule {
        name: "progress_5",
        window: Window::open(28.1, 31.0),
        effect: |s| s.progress.set(5, (s.anim_num - 28.1) / 2.5),
    },
    Rule {
        name: "progress_6",
        window: Window::after(31.5),
        effect: |s| s.progress.set(6, (s.anim_num - 31.5) / 2.5),
    },
    Rule {
        name: "progress_7",
        window: Window::from(FINALE_START),
        effect: |s| s.progress.set(7, (s.anim_num - FINALE_START) / 4.0),
    },
    Rule {
        name: "light_sweep",
        window: Window::open(16.5, 25.0),
        effect: |s| {
            s.light.position = Vec3::new(
                s.anim_num - LIGHT3_SWEEP_OFFSET,
                LIGHT3_POSITION[1],
                LIGHT3_POSITION[2],
            );
        },
    },
    Rule {
        name: "light_finale",
        window: Window::from(FINALE_START),
        effect: light_finale,
    },
    Rule {
        name: "light_steady",
        window: Window::below(FINALE_START),
        effect: |s| s.light.intensity = LIGHT3_INTENSITY,
    },
];

fn light_finale(s: &mut Stage) {
    let t = ((s.anim_num - FINALE_START) / FINALE_RAMP_SECS).clamp(0.0, 1.0);
    s.light.position.z = FINALE_Z_FROM + (FINALE_Z_TO - FINALE_Z_FROM) * t;
    // Blends from whatever the light currently is, so the shift compounds
    // frame over frame until t reaches 1.
    s.light.color = s
        .light
        .color
        .lerp(srgb_hex_to_linear(FINALE_ACCENT_COLOR), t);
    s.light.intensity = pulse_intensity(s.elapsed_sec);
}

/// Sinusoidal intensity pulse on the wall clock, `PULSE_HZ` cycles per
/// second between `PULSE_MIN_INTENSITY` and `PULSE_MAX_INTENSITY`.
pub fn pulse_intensity(elapsed_sec: f32) -> f32 {
    let phase = elapsed_sec * std::f32::consts::TAU * PULSE_HZ;
    let pulse = (phase.sin() + 1.0) / 2.0;
    PULSE_MIN_INTENSITY + (PULSE_MAX_INTENSITY - PULSE_MIN_INTENSITY) * pulse
}

/// Owns the fog and dynamic light state and applies `RULES` to them.
#[derive(Clone, Debug, Default)]
pub struct Choreography {
    pub fog: FogState,
    pub light: DynamicLight,
}

impl Choreography {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply every rule whose window contains `anim_num` and return the
    /// progress values to publish this frame.
    pub fn evaluate(&mut self, anim_num: f32, elapsed_sec: f32) -> ProgressSignals {
        let mut progress = ProgressSignals::default();
        let mut stage = Stage {
            anim_num,
            elapsed_sec,
            fog: &mut self.fog,
            light: &mut self.light,
            progress: &mut progress,
        };
        for rule in RULES {
            if rule.window.contains(anim_num) {
                (rule.effect)(&mut stage);
            }
        }
        progress
    }

    /// Names of the rules that fire at `anim_num`, for diagnostics.
    pub fn active_rules(anim_num: f32) -> impl Iterator<Item = &'static str> {
        RULES
            .iter()
            .filter(move |r| r.window.contains(anim_num))
            .map(|r| r.name)
    }
}
