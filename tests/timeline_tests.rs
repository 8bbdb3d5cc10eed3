// Host-side tests for the animation clock.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
mod constants {
    include!("../src/core/constants.rs");
}
mod timeline {
    include!("../src/core/timeline.rs");
}

use constants::*;
use timeline::*;

fn frames_to_converge(t: &mut Timeline, max_frames: usize) -> Option<usize> {
    for i in 0..max_frames {
        if t.anim_num() == t.target() {
            return Some(i);
        }
        t.step(PlaybackMode::ManualScroll, 1.0 / 60.0);
    }
    None
}

#[test]
fn starts_at_timeline_start() {
    let t = Timeline::new();
    assert_eq!(t.anim_num(), TIMELINE_START);
    assert_eq!(t.target(), TIMELINE_START);
    assert!(!t.is_debug_orbit());
}

#[test]
fn wheel_maps_pixels_to_seconds() {
    let mut t = Timeline::new();
    assert!(t.apply_wheel(1300.0, true));
    assert!((t.target() - 1.0).abs() < 1e-6);
    t.apply_wheel(-650.0, true);
    assert!((t.target() - 0.5).abs() < 1e-6);
}

#[test]
fn wheel_target_stays_in_bounds() {
    let mut t = Timeline::new();
    let deltas = [
        -5000.0, 120.0, 1e6, -3.0, 99999.0, -1e7, 40.0, 1300.0 * 38.3, 1.0, -0.5,
    ];
    for d in deltas {
        t.apply_wheel(d, true);
        assert!(t.target() >= TIMELINE_START && t.target() <= TIMELINE_END);
    }
    t.apply_wheel(1e9, true);
    assert_eq!(t.target(), TIMELINE_END);
    t.apply_wheel(-1e9, true);
    assert_eq!(t.target(), TIMELINE_START);
}

#[test]
fn wheel_ignored_when_scroll_disabled_or_not_finite() {
    let mut t = Timeline::new();
    assert!(!t.apply_wheel(500.0, false));
    assert_eq!(t.target(), 0.0);
    assert!(!t.apply_wheel(f32::NAN, true));
    assert!(!t.apply_wheel(f32::INFINITY, true));
    assert_eq!(t.target(), 0.0);
}

#[test]
fn smoothing_moves_four_percent_per_frame() {
    let mut t = Timeline::new();
    t.apply_wheel(1300.0 * 10.0, true);
    let v = t.smooth_toward_target();
    assert!((v - 0.4).abs() < 1e-5);
    let v = t.smooth_toward_target();
    assert!((v - (0.4 + 9.6 * 0.04)).abs() < 1e-4);
}

#[test]
fn converges_exactly_within_bounded_frames() {
    let mut t = Timeline::new();
    t.apply_wheel(1e9, true);
    // ln(0.00025 / 38.3) / ln(0.96) is about 292 frames.
    let frames = frames_to_converge(&mut t, 400).expect("did not converge");
    assert!(frames < 400);
    assert_eq!(t.anim_num(), TIMELINE_END);

    t.apply_wheel(-13.0, true);
    assert!(frames_to_converge(&mut t, 400).is_some());
    assert_eq!(t.anim_num(), t.target());
}

#[test]
fn snaps_once_gap_below_epsilon() {
    let mut t = Timeline::new();
    t.apply_wheel(SNAP_EPSILON * 0.5 * SCROLL_PIXELS_PER_SECOND, true);
    t.smooth_toward_target();
    assert_eq!(t.anim_num(), t.target());
}

#[test]
fn debug_orbit_freezes_and_resumes() {
    let mut t = Timeline::new();
    t.apply_wheel(1300.0 * 5.0, true);
    for _ in 0..20 {
        t.step(PlaybackMode::ManualScroll, 1.0 / 60.0);
    }
    let frozen = t.anim_num();
    let target = t.target();

    assert!(t.toggle_debug_orbit());
    assert_eq!(t.mode(false), PlaybackMode::DebugOrbit);
    assert_eq!(t.mode(true), PlaybackMode::DebugOrbit);
    assert!(!t.apply_wheel(5000.0, true));
    for _ in 0..50 {
        let mode = t.mode(false);
        t.step(mode, 1.0 / 60.0);
        t.smooth_toward_target();
        t.advance_auto(0.5);
    }
    assert_eq!(t.anim_num(), frozen);
    assert_eq!(t.target(), target);

    assert!(!t.toggle_debug_orbit());
    assert_eq!(t.mode(false), PlaybackMode::ManualScroll);
    let next = t.step(PlaybackMode::ManualScroll, 1.0 / 60.0);
    assert!((next - (frozen + (target - frozen) * LERP_FACTOR)).abs() < 1e-6);
}

#[test]
fn host_flag_selects_auto_or_manual() {
    let t = Timeline::new();
    assert_eq!(t.mode(true), PlaybackMode::AutoAnimate);
    assert_eq!(t.mode(false), PlaybackMode::ManualScroll);
}

#[test]
fn auto_advances_and_stops_at_end() {
    let mut t = Timeline::new();
    t.advance_auto(0.5);
    assert!((t.anim_num() - 0.5).abs() < 1e-6);
    assert_eq!(t.target(), t.anim_num());
    for _ in 0..100 {
        t.advance_auto(1.0);
    }
    assert_eq!(t.anim_num(), TIMELINE_END);
    t.advance_auto(1.0);
    assert_eq!(t.anim_num(), TIMELINE_END);
}

#[test]
fn auto_ignores_non_positive_dt() {
    let mut t = Timeline::new();
    t.advance_auto(1.0);
    t.advance_auto(-3.0);
    t.advance_auto(0.0);
    assert!((t.anim_num() - 1.0).abs() < 1e-6);
}

#[test]
fn switching_auto_to_manual_keeps_position() {
    let mut t = Timeline::new();
    for _ in 0..3 {
        t.step(PlaybackMode::AutoAnimate, 1.0);
    }
    let v = t.step(PlaybackMode::ManualScroll, 1.0 / 60.0);
    assert!((v - 3.0).abs() < 1e-6);
}

#[test]
fn wheel_delta_modes_convert_to_pixels() {
    assert_eq!(wheel_delta_pixels(120.0, 0, 800.0), 120.0);
    assert_eq!(wheel_delta_pixels(3.0, 1, 800.0), 48.0);
    assert_eq!(wheel_delta_pixels(-1.0, 2, 800.0), -800.0);
}

#[test]
fn clamp_helper_bounds() {
    assert_eq!(clamp_timeline(-1.0), TIMELINE_START);
    assert_eq!(clamp_timeline(100.0), TIMELINE_END);
    assert_eq!(clamp_timeline(12.5), 12.5);
}
