use super::animation::{Channel, Clip, Interpolation, Keyframes, Track};
use super::error::SceneError;
use super::picking::Aabb;
use super::scene::{CameraProjection, Node, SceneGraph, Transform};
use glam::{Mat4, Quat, Vec3, Vec4};

/// Interleaved vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub joints: [u16; 4],
    pub weights: [f32; 4],
}

#[derive(Clone, Debug)]
pub struct PrimitiveData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub material: usize,
    pub bounds: Aabb,
}

#[derive(Clone, Debug)]
pub struct MeshData {
    pub name: String,
    pub primitives: Vec<PrimitiveData>,
}

impl MeshData {
    pub fn bounds(&self) -> Aabb {
        self.primitives
            .iter()
            .fold(Aabb::EMPTY, |b, p| b.union(p.bounds))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialData {
    pub base_color: Vec4,
    pub base_color_texture: Option<usize>,
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: Vec3,
    pub double_sided: bool,
    pub blend: bool,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            base_color: Vec4::ONE,
            base_color_texture: None,
            metallic: 1.0,
            roughness: 1.0,
            emissive: Vec3::ZERO,
            double_sided: false,
            blend: false,
        }
    }
}

/// Decoded image, always tightly packed RGBA8.
#[derive(Clone, Debug)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba8: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct SkinData {
    pub joints: Vec<usize>,
    pub inverse_bind: Vec<Mat4>,
}

impl SkinData {
    /// Joint matrices relative to the skinned node's world transform.
    pub fn joint_matrices(&self, graph: &SceneGraph, mesh_world: Mat4) -> Vec<Mat4> {
        let inv_mesh = mesh_world.inverse();
        self.joints
            .iter()
            .zip(&self.inverse_bind)
            .map(|(&j, ibm)| {
                let joint_world = graph.get(j).map(|n| n.world).unwrap_or(Mat4::IDENTITY);
                inv_mesh * joint_world * *ibm
            })
            .collect()
    }
}

/// Everything decoded from the scene asset.
#[derive(Clone, Debug, Default)]
pub struct SceneAsset {
    pub graph: SceneGraph,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    pub images: Vec<ImageData>,
    pub skins: Vec<SkinData>,
    pub clips: Vec<Clip>,
}

/// Decode a GLB (or self-contained glTF) byte slice.
pub fn parse_scene(bytes: &[u8]) -> Result<SceneAsset, SceneError> {
    let (doc, buffers, images) = gltf::import_slice(bytes)?;

    let mut graph = SceneGraph::new();
    let mut node_map: Vec<Option<usize>> = vec![None; doc.nodes().count()];
    if let Some(scene) = doc.default_scene().or_else(|| doc.scenes().next()) {
        for root in scene.nodes() {
            add_node(&root, None, &mut graph, &mut node_map);
        }
    }
    graph.update_world();

    let mut materials: Vec<MaterialData> = doc.materials().map(|m| read_material(&m)).collect();
    let default_material = materials.len();
    materials.push(MaterialData::default());

    let meshes = doc
        .meshes()
        .map(|mesh| read_mesh(&mesh, &buffers, default_material))
        .collect::<Result<Vec<_>, _>>()?;

    let images = images
        .into_iter()
        .map(convert_image)
        .collect::<Result<Vec<_>, _>>()?;

    let skins = doc
        .skins()
        .map(|skin| {
            let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
            let joints: Vec<usize> = skin
                .joints()
                .map(|j| node_map[j.index()].unwrap_or(0))
                .collect();
            let inverse_bind = match reader.read_inverse_bind_matrices() {
                Some(iter) => iter.map(|m| Mat4::from_cols_array_2d(&m)).collect(),
                None => vec![Mat4::IDENTITY; joints.len()],
            };
            SkinData {
                joints,
                inverse_bind,
            }
        })
        .collect();

    let clips = doc
        .animations()
        .map(|anim| read_clip(&anim, &buffers, &node_map))
        .collect();

    let asset = SceneAsset {
        graph,
        meshes,
        materials,
        images,
        skins,
        clips,
    };
    log::info!(
        "[loader] decoded {} nodes, {} meshes, {} materials, {} images, {} skins, {} clips",
        asset.graph.len(),
        asset.meshes.len(),
        asset.materials.len(),
        asset.images.len(),
        asset.skins.len(),
        asset.clips.len()
    );
    Ok(asset)
}

fn add_node(
    node: &gltf::Node,
    parent: Option<usize>,
    graph: &mut SceneGraph,
    node_map: &mut [Option<usize>],
) {
    if node_map[node.index()].is_some() {
        return;
    }
    let (t, r, s) = node.transform().decomposed();
    let mut out = Node::new(node.name().unwrap_or_default());
    out.local = Transform {
        translation: Vec3::from_array(t),
        rotation: Quat::from_array(r),
        scale: Vec3::from_array(s),
    };
    out.mesh = node.mesh().map(|m| m.index());
    out.skin = node.skin().map(|s| s.index());
    out.camera = node.camera().and_then(|c| match c.projection() {
        gltf::camera::Projection::Perspective(p) => Some(CameraProjection {
            yfov_radians: p.yfov(),
            znear: p.znear(),
            zfar: p.zfar().unwrap_or(1000.0),
        }),
        gltf::camera::Projection::Orthographic(_) => {
            log::debug!("[loader] ignoring orthographic camera on node {}", node.index());
            None
        }
    });
    let index = graph.add(out, parent);
    node_map[node.index()] = Some(index);
    for child in node.children() {
        add_node(&child, Some(index), graph, node_map);
    }
}

fn read_material(m: &gltf::Material) -> MaterialData {
    let pbr = m.pbr_metallic_roughness();
    MaterialData {
        base_color: Vec4::from_array(pbr.base_color_factor()),
        base_color_texture: pbr
            .base_color_texture()
            .map(|info| info.texture().source().index()),
        metallic: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        emissive: Vec3::from_array(m.emissive_factor()),
        double_sided: m.double_sided(),
        blend: m.alpha_mode() == gltf::material::AlphaMode::Blend,
    }
}

fn read_mesh(
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    default_material: usize,
) -> Result<MeshData, SceneError> {
    let name = mesh
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
    let mut primitives = Vec::new();
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::debug!("[loader] skipping non-triangle primitive in {name}");
            continue;
        }
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| SceneError::MissingPositions(name.clone()))?
            .collect();
        let mut vertices: Vec<Vertex> = positions
            .iter()
            .map(|&p| Vertex {
                position: p,
                ..Default::default()
            })
            .collect();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(i) => i.into_u32().collect(),
            None => (0..vertices.len() as u32).collect(),
        };

        let has_normals = match reader.read_normals() {
            Some(normals) => {
                for (v, n) in vertices.iter_mut().zip(normals) {
                    v.normal = n;
                }
                true
            }
            None => false,
        };
        if !has_normals {
            compute_normals(&mut vertices, &indices);
        }
        if let Some(uvs) = reader.read_tex_coords(0) {
            for (v, uv) in vertices.iter_mut().zip(uvs.into_f32()) {
                v.uv = uv;
            }
        }
        if let Some(joints) = reader.read_joints(0) {
            for (v, j) in vertices.iter_mut().zip(joints.into_u16()) {
                v.joints = j;
            }
        }
        if let Some(weights) = reader.read_weights(0) {
            for (v, w) in vertices.iter_mut().zip(weights.into_f32()) {
                v.weights = w;
            }
        }

        let bounds = Aabb::from_points(positions.iter().map(|&p| Vec3::from_array(p)));
        primitives.push(PrimitiveData {
            vertices,
            indices,
            material: primitive.material().index().unwrap_or(default_material),
            bounds,
        });
    }
    Ok(MeshData { name, primitives })
}

/// Area-weighted vertex normals for primitives shipped without them.
pub fn compute_normals(vertices: &mut [Vertex], indices: &[u32]) {
    let mut acc = vec![Vec3::ZERO; vertices.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= vertices.len() || b >= vertices.len() || c >= vertices.len() {
            continue;
        }
        let pa = Vec3::from_array(vertices[a].position);
        let pb = Vec3::from_array(vertices[b].position);
        let pc = Vec3::from_array(vertices[c].position);
        let n = (pb - pa).cross(pc - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    for (v, n) in vertices.iter_mut().zip(acc) {
        v.normal = n.normalize_or_zero().to_array();
    }
}

fn convert_image(image: gltf::image::Data) -> Result<ImageData, SceneError> {
    use gltf::image::Format;
    let (channels, bytes_per_channel) = match image.format {
        Format::R8 => (1, 1),
        Format::R8G8 => (2, 1),
        Format::R8G8B8 => (3, 1),
        Format::R8G8B8A8 => (4, 1),
        Format::R16 => (1, 2),
        Format::R16G16 => (2, 2),
        Format::R16G16B16 => (3, 2),
        Format::R16G16B16A16 => (4, 2),
        other => return Err(SceneError::Image(format!("{other:?}"))),
    };
    let texel = channels * bytes_per_channel;
    let count = (image.width * image.height) as usize;
    let mut rgba8 = Vec::with_capacity(count * 4);
    for px in image.pixels.chunks_exact(texel).take(count) {
        // 16-bit channels are little endian; keep the high byte.
        let c = |i: usize| px[i * bytes_per_channel + bytes_per_channel - 1];
        let rgba = match channels {
            1 => [c(0), c(0), c(0), 255],
            2 => [c(0), c(1), 0, 255],
            3 => [c(0), c(1), c(2), 255],
            _ => [c(0), c(1), c(2), c(3)],
        };
        rgba8.extend_from_slice(&rgba);
    }
    if rgba8.len() != count * 4 {
        return Err(SceneError::Image(format!(
            "{}x{} image with {} bytes",
            image.width,
            image.height,
            image.pixels.len()
        )));
    }
    Ok(ImageData {
        width: image.width,
        height: image.height,
        rgba8,
    })
}

fn read_clip(
    anim: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
    node_map: &[Option<usize>],
) -> Clip {
    use gltf::animation::util::ReadOutputs;

    let name = anim
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("clip_{}", anim.index()));
    let mut tracks = Vec::new();
    for channel in anim.channels() {
        let Some(node) = node_map
            .get(channel.target().node().index())
            .copied()
            .flatten()
        else {
            continue;
        };
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(inputs) = reader.read_inputs() else {
            continue;
        };
        let times: Vec<f32> = inputs.collect();
        let interpolation = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Linear => Interpolation::Linear,
            gltf::animation::Interpolation::Step => Interpolation::Step,
            gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
        };
        let channel = match reader.read_outputs() {
            Some(ReadOutputs::Translations(iter)) => Channel::Translation(Keyframes::new(
                times,
                iter.map(Vec3::from_array).collect(),
                interpolation,
            )),
            Some(ReadOutputs::Rotations(iter)) => Channel::Rotation(Keyframes::new(
                times,
                iter.into_f32().map(Quat::from_array).collect(),
                interpolation,
            )),
            Some(ReadOutputs::Scales(iter)) => Channel::Scale(Keyframes::new(
                times,
                iter.map(Vec3::from_array).collect(),
                interpolation,
            )),
            Some(ReadOutputs::MorphTargetWeights(_)) => {
                log::debug!("[loader] {name}: morph target tracks are not played");
                continue;
            }
            None => continue,
        };
        let valid = match &channel {
            Channel::Translation(k) | Channel::Scale(k) => k.is_valid(),
            Channel::Rotation(k) => k.is_valid(),
        };
        if valid {
            tracks.push(Track { node, channel });
        }
    }
    Clip { name, tracks }
}
