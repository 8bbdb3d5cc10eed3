use fnv::FnvHashMap;
use glam::{Mat4, Quat, Vec3};

/// Local TRS transform of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Perspective projection authored in the asset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraProjection {
    pub yfov_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub local: Transform,
    pub world: Mat4,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
    pub camera: Option<CameraProjection>,
    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            local: Transform::default(),
            world: Mat4::IDENTITY,
            mesh: None,
            skin: None,
            camera: None,
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    #[inline]
    pub fn world_position(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }
}

/// Flat node arena with parent/child links.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    pub nodes: Vec<Node>,
    pub roots: Vec<usize>,
    by_name: FnvHashMap<String, usize>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node under `parent` (or as a root) and return its index.
    pub fn add(&mut self, mut node: Node, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        node.parent = parent;
        if !node.name.is_empty() {
            // First node with a given name wins, matching depth-first lookup
            // over an asset whose nodes are added parent-first.
            self.by_name.entry(node.name.clone()).or_insert(index);
        }
        self.nodes.push(node);
        match parent {
            Some(p) => self.nodes[p].children.push(index),
            None => self.roots.push(index),
        }
        index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Indices of `root` and all its descendants, depth first.
    pub fn descendants(&self, root: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            out.push(i);
            if let Some(node) = self.nodes.get(i) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Depth-first order over the whole graph.
    pub fn traverse(&self) -> Vec<usize> {
        self.roots
            .iter()
            .flat_map(|&r| self.descendants(r))
            .collect()
    }

    /// Recompute every world matrix from the local transforms.
    pub fn update_world(&mut self) {
        let mut stack: Vec<(usize, Mat4)> =
            self.roots.iter().rev().map(|&r| (r, Mat4::IDENTITY)).collect();
        while let Some((i, parent_world)) = stack.pop() {
            let world = parent_world * self.nodes[i].local.matrix();
            self.nodes[i].world = world;
            for &c in self.nodes[i].children.iter().rev() {
                stack.push((c, world));
            }
        }
    }
}
