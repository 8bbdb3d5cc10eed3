// Scene decoding and rigging tests. The whole pure core is compiled in so
// the loader can be driven end to end from in-memory glTF documents.

#![allow(dead_code)]
#[path = "../src/core/mod.rs"]
mod street;

use glam::{Mat4, Vec3};
use street::animation::{Channel, Clip, Interpolation, Keyframes, Track};
use street::constants::*;
use street::picking::Aabb;
use street::rig::rig_scene;
use street::scene::{Node, SceneGraph, Transform};
use street::{parse_scene, AnimationSet, SceneError};

fn base64(bytes: &[u8]) -> String {
    const ALPHABET: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::new();
    for chunk in bytes.chunks(3) {
        let b = [
            chunk[0],
            *chunk.get(1).unwrap_or(&0),
            *chunk.get(2).unwrap_or(&0),
        ];
        let n = (b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32;
        for i in 0..4 {
            if i <= chunk.len() {
                out.push(ALPHABET[(n >> (18 - 6 * i) & 63) as usize] as char);
            } else {
                out.push('=');
            }
        }
    }
    out
}

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn triangle_and_mover_gltf() -> Vec<u8> {
    let mut buffer = f32_bytes(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    buffer.extend(f32_bytes(&[0.0, 1.0]));
    buffer.extend(f32_bytes(&[0.0, 0.0, 0.0, 2.0, 0.0, 0.0]));
    let json = format!(
        r#"{{
  "asset": {{"version": "2.0"}},
  "scene": 0,
  "scenes": [{{"nodes": [0, 1]}}],
  "nodes": [
    {{"name": "tri", "mesh": 0, "translation": [0, 0, -2]}},
    {{"name": "mover"}}
  ],
  "meshes": [{{"name": "triangle", "primitives": [{{"attributes": {{"POSITION": 0}}}}]}}],
  "animations": [{{
    "name": "move",
    "channels": [{{"sampler": 0, "target": {{"node": 1, "path": "translation"}}}}],
    "samplers": [{{"input": 1, "output": 2, "interpolation": "LINEAR"}}]
  }}],
  "buffers": [{{"byteLength": {len}, "uri": "data:application/octet-stream;base64,{data}"}}],
  "bufferViews": [
    {{"buffer": 0, "byteOffset": 0, "byteLength": 36}},
    {{"buffer": 0, "byteOffset": 36, "byteLength": 8}},
    {{"buffer": 0, "byteOffset": 44, "byteLength": 24}}
  ],
  "accessors": [
    {{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0]}},
    {{"bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0], "max": [1]}},
    {{"bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3"}}
  ]
}}"#,
        len = buffer.len(),
        data = base64(&buffer)
    );
    json.into_bytes()
}

/// Nodes-only document with the full named-node contract.
fn street_nodes_gltf(skip: Option<&str>) -> Vec<u8> {
    let mut names: Vec<&str> = Vec::new();
    names.extend(SHADOW_CASTERS);
    names.extend(STRING_NODES);
    names.extend(ADVERT_MARKERS.iter().map(|(n, _)| *n));
    let nodes: Vec<String> = names
        .iter()
        .filter(|n| Some(**n) != skip)
        .map(|n| format!(r#"{{"name": "{n}", "translation": [1, 2, 3]}}"#))
        .collect();
    let mut all = nodes;
    all.push(r#"{"name": "cam", "camera": 0, "translation": [0, 1, 10]}"#.to_string());
    let roots: Vec<String> = (0..all.len()).map(|i| i.to_string()).collect();
    format!(
        r#"{{
  "asset": {{"version": "2.0"}},
  "scenes": [{{"nodes": [{roots}]}}],
  "nodes": [{nodes}],
  "cameras": [{{"type": "perspective", "perspective": {{"yfov": 0.6, "znear": 0.1, "zfar": 50}}}}]
}}"#,
        roots = roots.join(","),
        nodes = all.join(",")
    )
    .into_bytes()
}

/// Graph with every required node; the guitar and both strings carry meshes.
fn street_graph() -> SceneGraph {
    let mut g = SceneGraph::new();
    for name in SHADOW_CASTERS {
        let mut node = Node::new(name);
        node.mesh = Some(0);
        let idx = g.add(node, None);
        let mut child = Node::new(format!("{name}_part"));
        child.mesh = Some(0);
        g.add(child, Some(idx));
    }
    for (i, name) in STRING_NODES.iter().enumerate() {
        let mut node = Node::new(*name);
        node.mesh = Some(0);
        node.local = Transform::from_translation(Vec3::new(i as f32 * 2.0, 0.0, 0.0));
        g.add(node, None);
    }
    for (name, _) in ADVERT_MARKERS {
        let mut marker = Node::new(name);
        marker.local = Transform::from_translation(Vec3::new(0.0, 3.0, 0.0));
        g.add(marker, None);
    }
    let mut prop = Node::new("lamp");
    prop.mesh = Some(0);
    g.add(prop, None);
    g.update_world();
    g
}

#[test]
fn decodes_mesh_with_generated_normals_and_indices() {
    let asset = parse_scene(&triangle_and_mover_gltf()).expect("parse");
    assert_eq!(asset.meshes.len(), 1);
    let mesh = &asset.meshes[0];
    assert_eq!(mesh.name, "triangle");
    let prim = &mesh.primitives[0];
    assert_eq!(prim.indices, vec![0, 1, 2]);
    for v in &prim.vertices {
        assert_eq!(v.normal, [0.0, 0.0, 1.0]);
    }
    // No material in the document: the appended default is used.
    assert_eq!(prim.material, asset.materials.len() - 1);
    assert_eq!(prim.bounds.min, Vec3::ZERO);
    assert_eq!(prim.bounds.max, Vec3::new(1.0, 1.0, 0.0));

    let tri = asset.graph.find("tri").unwrap();
    assert_eq!(
        asset.graph.get(tri).unwrap().world_position(),
        Vec3::new(0.0, 0.0, -2.0)
    );
}

#[test]
fn animation_clip_drives_node_via_scrub() {
    let mut asset = parse_scene(&triangle_and_mover_gltf()).expect("parse");
    assert_eq!(asset.clips.len(), 1);
    assert_eq!(asset.clips[0].name, "move");
    assert!((asset.clips[0].duration() - 1.0).abs() < 1e-6);

    let mut set = AnimationSet::from_clips(&asset.clips);
    assert_eq!(set.len(), 1);
    set.scrub(0.5);
    set.apply(&mut asset.graph);
    asset.graph.update_world();
    let mover = asset.graph.find("mover").unwrap();
    let p = asset.graph.get(mover).unwrap().world_position();
    assert!((p - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);

    // Past the last key the final pose holds.
    set.scrub(30.0);
    set.apply(&mut asset.graph);
    asset.graph.update_world();
    let p = asset.graph.get(mover).unwrap().world_position();
    assert!((p - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
}

#[test]
fn rigs_decoded_street_nodes() {
    let mut asset = parse_scene(&street_nodes_gltf(None)).expect("parse");
    let rig = rig_scene(&mut asset.graph).expect("rig");
    let cam = rig.camera_node.expect("camera");
    let node = asset.graph.get(cam).unwrap();
    assert_eq!(node.name, "cam");
    assert!((node.camera.unwrap().yfov_radians - 0.6).abs() < 1e-6);
    assert_eq!(rig.strings.len(), 6);
    assert_eq!(rig.spots.len(), 2);
}

#[test]
fn missing_required_node_is_fatal() {
    for missing in ["ballMain", "string-B", "advert2"] {
        let mut asset = parse_scene(&street_nodes_gltf(Some(missing))).expect("parse");
        match rig_scene(&mut asset.graph) {
            Err(SceneError::MissingNode(name)) => assert_eq!(name, missing),
            other => panic!("expected MissingNode({missing}), got {:?}", other.map(|_| ())),
        }
    }
}

#[test]
fn missing_marker_skips_spotlight() {
    let mut asset = parse_scene(&street_nodes_gltf(Some("advertLight2"))).expect("parse");
    let rig = rig_scene(&mut asset.graph).expect("rig");
    assert_eq!(rig.spots.len(), 1);
    assert_eq!(asset.graph.get(rig.spots[0].marker).unwrap().name, "advertLight1");
}

#[test]
fn shadow_flags_follow_allow_list() {
    let mut g = street_graph();
    rig_scene(&mut g).expect("rig");
    let flags = |name: &str| {
        let n = g.get(g.find(name).unwrap()).unwrap();
        (n.cast_shadow, n.receive_shadow, n.visible)
    };
    for name in SHADOW_CASTERS {
        assert!(flags(name).0, "{name} should cast");
    }
    // Descendants cast only under the group roots.
    assert!(flags("guitarMain_part").0);
    assert!(flags("advert1_part").0);
    assert!(!flags("amyMain_part").0);
    assert!(!flags("ballMain_part").0);
    assert_eq!(flags("lamp"), (false, true, true));
}

#[test]
fn strings_are_hidden_but_pickable() {
    let mut g = street_graph();
    let rig = rig_scene(&mut g).expect("rig");
    for (i, s) in rig.strings.iter().enumerate() {
        assert_eq!(s.sound_index, i);
        let n = g.get(s.node).unwrap();
        assert_eq!(n.name, STRING_NODES[i]);
        assert!(!n.visible && !n.cast_shadow && !n.receive_shadow);
    }

    use street::gltf_scene::{MeshData, PrimitiveData};
    let unit = MeshData {
        name: "unit".into(),
        primitives: vec![PrimitiveData {
            vertices: Vec::new(),
            indices: Vec::new(),
            material: 0,
            bounds: Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)),
        }],
    };
    let bounds = rig.string_bounds(&g, std::slice::from_ref(&unit));
    assert_eq!(bounds.len(), 6);
    assert!((bounds[3].1.min - Vec3::new(5.5, -0.5, -0.5)).length() < 1e-5);

    // A ray down -Z through x=6 hits string index 3 only.
    let hit = street::picking::nearest_hit(
        Vec3::new(6.0, 0.0, 10.0),
        Vec3::NEG_Z,
        bounds.iter().map(|(i, b)| (*i, b)),
    );
    assert_eq!(hit.map(|(i, _)| i), Some(3));
}

#[test]
fn spotlight_aims_along_marker_forward() {
    let mut g = street_graph();
    let marker = g.find("advertLight1").unwrap();
    g.get_mut(marker).unwrap().local.rotation =
        glam::Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
    g.update_world();
    let rig = rig_scene(&mut g).expect("rig");
    let spot = rig.spots[0];
    assert_eq!(g.get(spot.aim).unwrap().parent, Some(marker));
    assert_eq!(g.get(spot.aim).unwrap().name, "advertLight1_aim");
    let (pos, dir) = spot.pose(&g).unwrap();
    assert!((pos - Vec3::new(0.0, 3.0, 0.0)).length() < 1e-5);
    // Local -Z rotated a quarter turn about +Y points along -X.
    assert!((dir - Vec3::NEG_X).length() < 1e-5);
    assert_eq!(spot.intensity, ADVERT_SPOT_INTENSITY);
    assert_eq!(spot.distance, ADVERT_SPOT_DISTANCE);
}

#[test]
fn no_authored_camera_keeps_default() {
    let mut g = street_graph();
    let rig = rig_scene(&mut g).expect("rig");
    assert!(rig.camera_node.is_none());
    let cam = street::Camera::default();
    assert_eq!(cam.eye, Vec3::new(0.0, 0.0, 20.0));
    assert!((cam.fovy_radians - 35f32.to_radians()).abs() < 1e-6);
}

#[test]
fn one_mixer_per_animated_node() {
    let keys = |to: f32| Keyframes::new(vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::splat(to)], Interpolation::Linear);
    let clip_a = Clip {
        name: "a".into(),
        tracks: vec![
            Track { node: 0, channel: Channel::Translation(keys(1.0)) },
            Track { node: 1, channel: Channel::Scale(keys(2.0)) },
        ],
    };
    let clip_b = Clip {
        name: "b".into(),
        tracks: vec![Track { node: 0, channel: Channel::Scale(keys(3.0)) }],
    };
    let set = AnimationSet::from_clips(&[clip_a, clip_b]);
    assert_eq!(set.len(), 2);
    assert_eq!(set.mixers()[0].node, 0);
    assert_eq!(set.mixers()[0].track_count(), 2);
    assert_eq!(set.mixers()[1].track_count(), 1);
}

#[test]
fn step_and_cubic_sampling() {
    let step = Keyframes::new(
        vec![0.0, 1.0],
        vec![Vec3::ZERO, Vec3::ONE],
        Interpolation::Step,
    );
    assert_eq!(step.sample(0.99), Vec3::ZERO);
    assert_eq!(step.sample(1.0), Vec3::ONE);

    // [in, value, out] per key with zero tangents: smoothstep-shaped.
    let cubic = Keyframes::new(
        vec![0.0, 1.0],
        vec![Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, Vec3::ONE, Vec3::ZERO],
        Interpolation::CubicSpline,
    );
    assert!((cubic.sample(0.5) - Vec3::splat(0.5)).length() < 1e-6);
    assert_eq!(cubic.sample(-1.0), Vec3::ZERO);
}

#[test]
fn skin_joint_matrices_are_relative_to_mesh() {
    let mut g = SceneGraph::new();
    let mut joint = Node::new("bone");
    joint.local = Transform::from_translation(Vec3::new(0.0, 2.0, 0.0));
    let j = g.add(joint, None);
    g.update_world();
    let skin = street::gltf_scene::SkinData {
        joints: vec![j],
        inverse_bind: vec![Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0))],
    };
    let mesh_world = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
    let m = skin.joint_matrices(&g, mesh_world);
    let p = m[0].transform_point3(Vec3::ZERO);
    assert!((p - Vec3::new(-5.0, 1.0, 0.0)).length() < 1e-5);
}
