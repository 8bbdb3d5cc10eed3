use super::choreography::srgb_hex_to_linear;
use super::constants::*;
use super::error::SceneError;
use super::gltf_scene::MeshData;
use super::picking::Aabb;
use super::scene::{Node, SceneGraph, Transform};
use glam::Vec3;

/// An invisible, clickable string mesh and the sound it triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InteractiveString {
    pub node: usize,
    pub sound_index: usize,
}

/// A spotlight that sits on a marker node and points along the marker's
/// local -Z through an attached aim node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotRig {
    pub marker: usize,
    pub aim: usize,
    pub color: Vec3,
    pub intensity: f32,
    pub distance: f32,
    pub angle: f32,
    pub penumbra: f32,
    pub decay: f32,
}

impl SpotRig {
    /// World position and unit direction from the current world matrices.
    pub fn pose(&self, graph: &SceneGraph) -> Option<(Vec3, Vec3)> {
        let pos = graph.get(self.marker)?.world_position();
        let aim = graph.get(self.aim)?.world_position();
        let dir = (aim - pos).normalize_or_zero();
        Some((pos, if dir == Vec3::ZERO { Vec3::NEG_Z } else { dir }))
    }
}

/// Scene roles resolved from node names once the asset is decoded.
#[derive(Clone, Debug, Default)]
pub struct SceneRig {
    pub camera_node: Option<usize>,
    pub strings: Vec<InteractiveString>,
    pub spots: Vec<SpotRig>,
}

/// Classify the decoded graph: pick the authored camera, assign shadow
/// flags, register the interactive strings and attach the advert
/// spotlights. Fails if any required node is absent.
pub fn rig_scene(graph: &mut SceneGraph) -> Result<SceneRig, SceneError> {
    let require = |graph: &SceneGraph, name: &str| {
        graph
            .find(name)
            .ok_or_else(|| SceneError::MissingNode(name.to_string()))
    };
    let casters = SHADOW_CASTERS
        .iter()
        .map(|n| require(graph, n))
        .collect::<Result<Vec<_>, _>>()?;
    let string_nodes = STRING_NODES
        .iter()
        .map(|n| require(graph, n))
        .collect::<Result<Vec<_>, _>>()?;

    let mut camera_node = None;
    for i in graph.traverse() {
        let node = &mut graph.nodes[i];
        if node.mesh.is_some() {
            node.cast_shadow = false;
            node.receive_shadow = true;
        }
        if camera_node.is_none() && node.camera.is_some() {
            camera_node = Some(i);
        }
    }

    for &i in &casters {
        graph.nodes[i].cast_shadow = true;
    }
    for name in SHADOW_CASTER_GROUPS {
        if let Some(root) = graph.find(name) {
            for i in graph.descendants(root) {
                if graph.nodes[i].mesh.is_some() {
                    graph.nodes[i].cast_shadow = true;
                }
            }
        }
    }

    let mut strings = Vec::with_capacity(string_nodes.len());
    for (sound_index, &root) in string_nodes.iter().enumerate() {
        for i in graph.descendants(root) {
            let node = &mut graph.nodes[i];
            node.cast_shadow = false;
            node.receive_shadow = false;
            node.visible = false;
        }
        strings.push(InteractiveString {
            node: root,
            sound_index,
        });
    }

    let mut spots = Vec::new();
    for (marker_name, color) in ADVERT_MARKERS {
        let Some(marker) = graph.find(marker_name) else {
            log::debug!("[loader] marker '{marker_name}' not found; spotlight skipped");
            continue;
        };
        let mut aim = Node::new(format!("{marker_name}_aim"));
        aim.local = Transform::from_translation(Vec3::NEG_Z);
        let aim = graph.add(aim, Some(marker));
        spots.push(SpotRig {
            marker,
            aim,
            color: srgb_hex_to_linear(color),
            intensity: ADVERT_SPOT_INTENSITY,
            distance: ADVERT_SPOT_DISTANCE,
            angle: ADVERT_SPOT_ANGLE,
            penumbra: ADVERT_SPOT_PENUMBRA,
            decay: ADVERT_SPOT_DECAY,
        });
    }
    graph.update_world();

    log::info!(
        "[loader] rig: camera={:?} strings={} spots={}",
        camera_node.map(|i| graph.nodes[i].name.as_str()),
        strings.len(),
        spots.len()
    );
    Ok(SceneRig {
        camera_node,
        strings,
        spots,
    })
}

impl SceneRig {
    /// World-space pick bounds for each string, keyed by sound index.
    pub fn string_bounds(&self, graph: &SceneGraph, meshes: &[MeshData]) -> Vec<(usize, Aabb)> {
        self.strings
            .iter()
            .map(|s| {
                let bounds = graph
                    .descendants(s.node)
                    .into_iter()
                    .filter_map(|i| {
                        let node = graph.get(i)?;
                        let mesh = meshes.get(node.mesh?)?;
                        Some(mesh.bounds().transformed(&node.world))
                    })
                    .fold(Aabb::EMPTY, Aabb::union);
                (s.sound_index, bounds)
            })
            .collect()
    }
}
