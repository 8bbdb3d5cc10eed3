// Picking, debug orbit, camera and URL option tests.

#![allow(dead_code)]
mod constants {
    include!("../src/core/constants.rs");
}
mod scene {
    include!("../src/core/scene.rs");
}
mod camera {
    include!("../src/core/camera.rs");
}
mod picking {
    include!("../src/core/picking.rs");
}
mod orbit {
    include!("../src/core/orbit.rs");
}
mod config {
    include!("../src/core/config.rs");
}

use camera::Camera;
use config::AppConfig;
use constants::*;
use glam::{Mat4, Quat, Vec2, Vec3};
use orbit::OrbitControls;
use picking::*;
use scene::{CameraProjection, Node, SceneGraph, Transform};

fn unit_box_at(center: Vec3) -> Aabb {
    Aabb::new(center - Vec3::splat(0.5), center + Vec3::splat(0.5))
}

#[test]
fn ray_hits_box_entry_face() {
    let b = unit_box_at(Vec3::ZERO);
    let t = ray_aabb(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, &b).unwrap();
    assert!((t - 4.5).abs() < 1e-6);
    assert!(ray_aabb(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, &b).is_none());
    assert!(ray_aabb(Vec3::new(2.0, 0.0, 5.0), Vec3::NEG_Z, &b).is_none());
    // From inside, the exit distance is reported.
    let t = ray_aabb(Vec3::ZERO, Vec3::NEG_Z, &b).unwrap();
    assert!((t - 0.5).abs() < 1e-6);
    assert!(ray_aabb(Vec3::ZERO, Vec3::X, &Aabb::EMPTY).is_none());
}

#[test]
fn nearest_hit_prefers_closest() {
    let boxes = [
        (4, unit_box_at(Vec3::new(0.0, 0.0, -6.0))),
        (1, unit_box_at(Vec3::new(0.0, 0.0, -2.0))),
        (2, unit_box_at(Vec3::new(3.0, 0.0, -1.0))),
    ];
    let hit = nearest_hit(Vec3::ZERO, Vec3::NEG_Z, boxes.iter().map(|(i, b)| (*i, b)));
    assert_eq!(hit.map(|(i, _)| i), Some(1));
    let miss = nearest_hit(Vec3::ZERO, Vec3::Y, boxes.iter().map(|(i, b)| (*i, b)));
    assert!(miss.is_none());
}

#[test]
fn transformed_box_covers_rotated_corners() {
    let b = Aabb::new(Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0));
    let m = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
    let t = b.transformed(&m);
    assert!((t.min - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5);
    assert!((t.max - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
    assert!(Aabb::EMPTY.transformed(&m).is_empty());
}

#[test]
fn center_pixel_ray_points_down_view_axis() {
    let mut cam = Camera::default();
    cam.aspect = 16.0 / 9.0;
    let (origin, dir) =
        screen_to_world_ray(cam.view_projection(), 1600.0, 900.0, Vec2::new(800.0, 450.0));
    assert!((dir - Vec3::NEG_Z).length() < 1e-4);
    assert!((origin.x).abs() < 1e-4 && (origin.y).abs() < 1e-4);
    assert!((origin.z - (20.0 - DEFAULT_ZNEAR)).abs() < 1e-3);

    // Top-left pixel leans up and left.
    let (_, corner) = screen_to_world_ray(cam.view_projection(), 1600.0, 900.0, Vec2::ZERO);
    assert!(corner.x < 0.0 && corner.y > 0.0);
}

#[test]
fn default_camera_matches_constants() {
    let cam = Camera::default();
    assert_eq!(cam.eye, Vec3::new(0.0, 0.0, 20.0));
    assert_eq!(cam.target, Vec3::ZERO);
    assert!((cam.fovy_radians - DEFAULT_FOV_DEGREES.to_radians()).abs() < 1e-6);
    assert!(cam.world.is_none());
}

#[test]
fn camera_from_authored_node() {
    let mut g = SceneGraph::new();
    let mut rig = Node::new("rig");
    rig.local = Transform::from_translation(Vec3::new(0.0, 2.0, 0.0));
    let parent = g.add(rig, None);
    let mut cam_node = Node::new("cam");
    cam_node.local = Transform {
        translation: Vec3::new(0.0, 0.0, 10.0),
        rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        scale: Vec3::ONE,
    };
    let idx = g.add(cam_node, Some(parent));
    g.update_world();

    let projection = CameraProjection {
        yfov_radians: 0.7,
        znear: 0.5,
        zfar: 80.0,
    };
    let cam = Camera::from_node(g.get(idx).unwrap().world, &projection, 2.0);
    assert!((cam.eye - Vec3::new(0.0, 2.0, 10.0)).length() < 1e-5);
    assert!((cam.target - cam.eye - Vec3::NEG_X).length() < 1e-5);
    assert_eq!(cam.fovy_radians, 0.7);
    assert_eq!(cam.zfar, 80.0);
    // The view matrix inverts the node transform.
    let p = cam.view_matrix().transform_point3(cam.eye);
    assert!(p.length() < 1e-4);
}

#[test]
fn scene_graph_world_and_lookup() {
    let mut g = SceneGraph::new();
    let mut a = Node::new("a");
    a.local = Transform::from_translation(Vec3::X);
    let a = g.add(a, None);
    let mut b = Node::new("b");
    b.local.scale = Vec3::splat(2.0);
    let b = g.add(b, Some(a));
    let mut c = Node::new("c");
    c.local = Transform::from_translation(Vec3::Y);
    let c = g.add(c, Some(b));
    let dup = g.add(Node::new("a"), None);
    g.update_world();

    assert_eq!(g.find("a"), Some(a));
    assert_ne!(g.find("a"), Some(dup));
    assert!(g.find("missing").is_none());
    assert!((g.get(c).unwrap().world_position() - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    assert_eq!(g.descendants(a), vec![a, b, c]);
    assert_eq!(g.traverse(), vec![a, b, c, dup]);
    assert_eq!(g.get(c).unwrap().parent, Some(b));
}

#[test]
fn orbit_starts_from_current_eye() {
    let eye = Vec3::new(3.0, 4.0, 12.0);
    let orbit = OrbitControls::from_eye(eye, Vec3::ZERO);
    assert!((orbit.radius - 13.0).abs() < 1e-4);
    assert!((orbit.eye() - eye).length() < 1e-4);
}

#[test]
fn orbit_zoom_is_clamped() {
    let mut orbit = OrbitControls::from_eye(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO);
    orbit.zoom(-1e6);
    assert_eq!(orbit.radius, ORBIT_MIN_DISTANCE);
    orbit.zoom(1e6);
    assert_eq!(orbit.radius, ORBIT_MAX_DISTANCE);
    let before = orbit.radius;
    orbit.zoom(f32::NAN);
    orbit.zoom(0.0);
    assert_eq!(orbit.radius, before);
}

#[test]
fn orbit_zoom_direction() {
    let mut orbit = OrbitControls::from_eye(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO);
    orbit.zoom(100.0);
    assert!(orbit.radius > 20.0);
    orbit.zoom(-200.0);
    assert!(orbit.radius < 20.0);
}

#[test]
fn orbit_polar_angle_is_limited() {
    let mut orbit = OrbitControls::from_eye(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO);
    // Drag far downward, then let the damping settle.
    orbit.rotate_pixels(0.0, -5000.0, 600.0);
    for _ in 0..600 {
        orbit.update(1.0 / 60.0);
    }
    assert!(orbit.phi <= ORBIT_MAX_POLAR + 1e-6);
    assert!((orbit.phi - ORBIT_MAX_POLAR).abs() < 1e-4);
    let eye = orbit.eye();
    assert!((eye.length() - 20.0).abs() < 1e-3);
}

#[test]
fn orbit_rotation_is_damped() {
    let mut orbit = OrbitControls::from_eye(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO);
    orbit.rotate_pixels(100.0, 0.0, 600.0);
    let theta0 = orbit.theta;
    orbit.update(1.0 / 60.0);
    let step1 = (orbit.theta - theta0).abs();
    let theta1 = orbit.theta;
    orbit.update(1.0 / 60.0);
    let step2 = (orbit.theta - theta1).abs();
    assert!(step1 > 0.0);
    assert!(step2 < step1);
}

#[test]
fn config_defaults() {
    let cfg = AppConfig::from_query("");
    assert_eq!(cfg, AppConfig::default());
    assert!(!cfg.testing);
    assert_eq!(cfg.log_level, log::Level::Info);
    assert_eq!(cfg.asset_url("models/x.glb"), "./models/x.glb");
    assert_eq!(cfg.model_file, MODEL_FILE);
}

#[test]
fn config_reads_known_keys() {
    let cfg = AppConfig::from_query("?testing=1&log=debug&assets=https%3A%2F%2Fcdn.example%2Fstreet&model=alt.glb");
    assert!(cfg.testing);
    assert_eq!(cfg.log_level, log::Level::Debug);
    assert_eq!(cfg.asset_base, "https://cdn.example/street/");
    assert_eq!(cfg.model_file, "alt.glb");
    assert_eq!(
        cfg.asset_url("sounds/a.mp3"),
        "https://cdn.example/street/sounds/a.mp3"
    );
}

#[test]
fn config_ignores_unknown_and_malformed() {
    let cfg = AppConfig::from_query("foo=bar&log=loud&testing=maybe&assets=&model=");
    assert_eq!(cfg, AppConfig::default());
    let cfg = AppConfig::from_query("testing");
    assert!(cfg.testing);
    let cfg = AppConfig::from_query("testing=off&log=WARN");
    assert!(!cfg.testing);
    assert_eq!(cfg.log_level, log::Level::Warn);
}
