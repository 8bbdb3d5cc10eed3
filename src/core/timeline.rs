use super::constants::{
    LERP_FACTOR, SCROLL_PIXELS_PER_SECOND, SNAP_EPSILON, TIMELINE_END, TIMELINE_START,
    WHEEL_LINE_PIXELS,
};

/// Who is allowed to write the timeline position this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackMode {
    /// The baked animation plays forward on the frame clock.
    AutoAnimate,
    /// Wheel input moves a target that the position eases toward.
    ManualScroll,
    /// Position frozen; the camera is driven by orbit input instead.
    DebugOrbit,
}

/// Animation clock for the street scene.
///
/// `anim_num` is the authoritative playback position in seconds and
/// `target` the position requested by scroll input. Both always lie in
/// `[TIMELINE_START, TIMELINE_END]`.
#[derive(Clone, Debug)]
pub struct Timeline {
    anim_num: f32,
    target: f32,
    debug_orbit: bool,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            anim_num: TIMELINE_START,
            target: TIMELINE_START,
            debug_orbit: false,
        }
    }

    #[inline]
    pub fn anim_num(&self) -> f32 {
        self.anim_num
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_debug_orbit(&self) -> bool {
        self.debug_orbit
    }

    /// Resolve the active mode. The local debug toggle wins; otherwise the
    /// host's `autoAnimate` flag picks between playback and scrolling.
    pub fn mode(&self, auto_animate: bool) -> PlaybackMode {
        if self.debug_orbit {
            PlaybackMode::DebugOrbit
        } else if auto_animate {
            PlaybackMode::AutoAnimate
        } else {
            PlaybackMode::ManualScroll
        }
    }

    /// Flip debug-orbit mode and return the new state.
    pub fn toggle_debug_orbit(&mut self) -> bool {
        self.debug_orbit = !self.debug_orbit;
        log::info!(
            "[timeline] debug orbit {} at {:.3}s",
            if self.debug_orbit { "on" } else { "off" },
            self.anim_num
        );
        self.debug_orbit
    }

    /// Apply a wheel delta in pixels. Ignored while scrolling is disabled by
    /// the host or while the debug orbit owns the wheel.
    /// Returns whether the target moved.
    pub fn apply_wheel(&mut self, delta_px: f32, scroll_enabled: bool) -> bool {
        if !scroll_enabled || self.debug_orbit || !delta_px.is_finite() {
            return false;
        }
        let before = self.target;
        self.target = clamp_timeline(self.target + delta_px / SCROLL_PIXELS_PER_SECOND);
        self.target != before
    }

    /// Ease `anim_num` toward the scroll target by one frame, snapping once
    /// the remaining gap is below `SNAP_EPSILON`.
    pub fn smooth_toward_target(&mut self) -> f32 {
        if self.debug_orbit {
            return self.anim_num;
        }
        let gap = self.target - self.anim_num;
        if gap.abs() > SNAP_EPSILON {
            self.anim_num += gap * LERP_FACTOR;
        } else {
            self.anim_num = self.target;
        }
        self.anim_num
    }

    /// Advance by the frame time under auto playback. Stops at the end of
    /// the timeline without wrapping; the scroll target follows along so a
    /// later switch to manual mode starts from the same spot.
    pub fn advance_auto(&mut self, dt_sec: f32) -> f32 {
        if self.debug_orbit {
            return self.anim_num;
        }
        if self.anim_num < TIMELINE_END && dt_sec > 0.0 {
            self.anim_num = clamp_timeline(self.anim_num + dt_sec);
        }
        self.target = self.anim_num;
        self.anim_num
    }

    /// Run one frame step for the given mode and return the new position.
    pub fn step(&mut self, mode: PlaybackMode, dt_sec: f32) -> f32 {
        match mode {
            PlaybackMode::AutoAnimate => self.advance_auto(dt_sec),
            PlaybackMode::ManualScroll => self.smooth_toward_target(),
            PlaybackMode::DebugOrbit => self.anim_num,
        }
    }
}

#[inline]
pub fn clamp_timeline(t: f32) -> f32 {
    t.clamp(TIMELINE_START, TIMELINE_END)
}

/// Convert a wheel delta to pixels. `delta_mode` follows `WheelEvent`:
/// 0 pixels, 1 lines, 2 pages of `page_px`.
pub fn wheel_delta_pixels(delta: f64, delta_mode: u32, page_px: f32) -> f32 {
    let delta = delta as f32;
    match delta_mode {
        1 => delta * WHEEL_LINE_PIXELS,
        2 => delta * page_px,
        _ => delta,
    }
}
