use crate::core::gltf_scene::{MaterialData, SkinData};
use crate::core::scene::SceneGraph;
use crate::core::{
    Camera, SceneAsset, Vertex, GROUND_SHADOW_OPACITY, GROUND_SIZE, SCENE_WGSL, SHADOW_MAP_SIZE,
    SHADOW_WGSL,
};
use glam::{Mat4, Vec4};
use std::num::NonZeroU64;
use web_sys as web;
use wgpu::util::DeviceExt;

mod environment;
mod helpers;
mod shadow;
mod uniforms;

pub use environment::EnvFaces;
pub use uniforms::{Lighting, SpotPose};

use environment::{upload_env, EnvTexture};
use helpers::{align_up, PipelineOptions};
use uniforms::{pack_globals, Globals, MaterialUniform, ModelUniform, ShadowGlobals};

const MODEL_SIZE: u64 = std::mem::size_of::<ModelUniform>() as u64;
const MAT4_SIZE: u64 = std::mem::size_of::<Mat4>() as u64;

struct GpuPrimitive {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
    material: usize,
}

struct GpuMaterial {
    bind_group: wgpu::BindGroup,
    blend: bool,
    double_sided: bool,
}

struct Draw<'m> {
    primitive: &'m GpuPrimitive,
    slot: u32,
    cast_shadow: bool,
    depth: f32,
}

pub struct GpuState<'a> {
    surface: wgpu::Surface<'a>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    view_format: wgpu::TextureFormat,

    depth_tex: wgpu::Texture,
    depth_view: wgpu::TextureView,
    shadow_tex: wgpu::Texture,
    shadow_view: wgpu::TextureView,
    shadow_sampler: wgpu::Sampler,
    env_sampler: wgpu::Sampler,
    base_sampler: wgpu::Sampler,
    env: EnvTexture,

    globals_buf: wgpu::Buffer,
    globals_layout: wgpu::BindGroupLayout,
    globals_bg: wgpu::BindGroup,
    shadow_globals_buf: wgpu::Buffer,
    shadow_globals_bg: wgpu::BindGroup,

    model_layout: wgpu::BindGroupLayout,
    model_stride: u64,
    model_capacity: u64,
    model_buf: wgpu::Buffer,
    joint_capacity: u64,
    joint_buf: wgpu::Buffer,
    model_bg: wgpu::BindGroup,

    material_layout: wgpu::BindGroupLayout,
    white_tex: wgpu::Texture,
    white_view: wgpu::TextureView,
    scene_textures: Vec<wgpu::Texture>,

    opaque_pipeline: wgpu::RenderPipeline,
    double_sided_pipeline: wgpu::RenderPipeline,
    blend_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,

    meshes: Vec<Vec<GpuPrimitive>>,
    materials: Vec<GpuMaterial>,
    ground: GpuPrimitive,

    width: u32,
    height: u32,
}

impl<'a> GpuState<'a> {
    pub async fn new(canvas: &'a web::HtmlCanvasElement) -> anyhow::Result<Self> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No WebGPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!(format!("request_device error: {:?}", e)))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        // Canvases rarely expose an sRGB format directly; render through an sRGB view.
        let view_format = format.add_srgb_suffix();
        let alpha_mode = if caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            caps.alpha_modes[0]
        };
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: if view_format != format {
                vec![view_format]
            } else {
                vec![]
            },
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "[gpu] surface {}x{} format={:?} view={:?} alpha={:?}",
            width,
            height,
            format,
            view_format,
            alpha_mode
        );

        let (depth_tex, depth_view) = helpers::create_depth_texture(
            &device,
            "depth",
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let (shadow_tex, shadow_view) = helpers::create_depth_texture(
            &device,
            "shadow_map",
            SHADOW_MAP_SIZE,
            SHADOW_MAP_SIZE,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let env_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("env_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let base_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("base_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let env = upload_env(&device, &queue, &EnvFaces::neutral());

        // ---------------- Layouts ----------------
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[
                helpers::uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    false,
                    None,
                ),
                helpers::texture_entry(
                    1,
                    wgpu::TextureSampleType::Depth,
                    wgpu::TextureViewDimension::D2,
                ),
                helpers::sampler_entry(2, wgpu::SamplerBindingType::Comparison),
                helpers::texture_entry(
                    3,
                    wgpu::TextureSampleType::Float { filterable: true },
                    wgpu::TextureViewDimension::Cube,
                ),
                helpers::sampler_entry(4, wgpu::SamplerBindingType::Filtering),
            ],
        });
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("model_layout"),
            entries: &[
                helpers::uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    true,
                    NonZeroU64::new(MODEL_SIZE),
                ),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_layout"),
            entries: &[
                helpers::uniform_entry(0, wgpu::ShaderStages::FRAGMENT, false, None),
                helpers::texture_entry(
                    1,
                    wgpu::TextureSampleType::Float { filterable: true },
                    wgpu::TextureViewDimension::D2,
                ),
                helpers::sampler_entry(2, wgpu::SamplerBindingType::Filtering),
            ],
        });
        let shadow_globals_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("shadow_globals_layout"),
                entries: &[helpers::uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX,
                    false,
                    None,
                )],
            });

        // ---------------- Buffers ----------------
        let globals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let shadow_globals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shadow_globals"),
            size: std::mem::size_of::<ShadowGlobals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let shadow_globals_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_globals_bg"),
            layout: &shadow_globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: shadow_globals_buf.as_entire_binding(),
            }],
        });
        let globals_bg = Self::make_globals_bg(
            &device,
            &globals_layout,
            &globals_buf,
            &shadow_view,
            &shadow_sampler,
            &env.view,
            &env_sampler,
        );

        let model_stride = align_up(
            MODEL_SIZE,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let model_capacity = 64;
        let joint_capacity = 64;
        let model_buf = Self::make_model_buffer(&device, model_stride * model_capacity);
        let joint_buf = Self::make_joint_buffer(&device, MAT4_SIZE * joint_capacity);
        let model_bg = Self::make_model_bg(&device, &model_layout, &model_buf, &joint_buf);

        let (white_tex, white_view) = helpers::create_rgba_texture(
            &device,
            &queue,
            "white",
            1,
            1,
            &[255, 255, 255, 255],
            wgpu::TextureFormat::Rgba8UnormSrgb,
        );

        // ---------------- Pipelines ----------------
        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_wgsl"),
            source: wgpu::ShaderSource::Wgsl(SCENE_WGSL.into()),
        });
        let shadow_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow_wgsl"),
            source: wgpu::ShaderSource::Wgsl(SHADOW_WGSL.into()),
        });
        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &model_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let shadow_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow_pipeline_layout"),
            bind_group_layouts: &[&shadow_globals_layout, &model_layout],
            push_constant_ranges: &[],
        });
        let opaque_pipeline = helpers::make_scene_pipeline(
            &device,
            &scene_layout,
            &scene_shader,
            view_format,
            PipelineOptions {
                label: "opaque_pipeline",
                blend: Some(wgpu::BlendState::REPLACE),
                cull_mode: Some(wgpu::Face::Back),
                depth_write: true,
            },
        );
        let double_sided_pipeline = helpers::make_scene_pipeline(
            &device,
            &scene_layout,
            &scene_shader,
            view_format,
            PipelineOptions {
                label: "double_sided_pipeline",
                blend: Some(wgpu::BlendState::REPLACE),
                cull_mode: None,
                depth_write: true,
            },
        );
        let blend_pipeline = helpers::make_scene_pipeline(
            &device,
            &scene_layout,
            &scene_shader,
            view_format,
            PipelineOptions {
                label: "blend_pipeline",
                blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                cull_mode: None,
                depth_write: false,
            },
        );
        let shadow_pipeline = helpers::make_shadow_pipeline(&device, &shadow_layout, &shadow_shader);

        let ground = Self::make_ground(&device);
        let mut state = Self {
            surface,
            device,
            queue,
            config,
            view_format,
            depth_tex,
            depth_view,
            shadow_tex,
            shadow_view,
            shadow_sampler,
            env_sampler,
            base_sampler,
            env,
            globals_buf,
            globals_layout,
            globals_bg,
            shadow_globals_buf,
            shadow_globals_bg,
            model_layout,
            model_stride,
            model_capacity,
            model_buf,
            joint_capacity,
            joint_buf,
            model_bg,
            material_layout,
            white_tex,
            white_view,
            scene_textures: Vec::new(),
            opaque_pipeline,
            double_sided_pipeline,
            blend_pipeline,
            shadow_pipeline,
            meshes: Vec::new(),
            materials: Vec::new(),
            ground,
            width,
            height,
        };
        // Ground catcher material sits at index 0 until a scene is uploaded.
        state.materials = vec![state.ground_material()];
        Ok(state)
    }

    fn make_globals_bg(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        globals: &wgpu::Buffer,
        shadow_view: &wgpu::TextureView,
        shadow_sampler: &wgpu::Sampler,
        env_view: &wgpu::TextureView,
        env_sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bg"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(shadow_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(shadow_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(env_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(env_sampler),
                },
            ],
        })
    }

    fn make_model_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("models"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn make_joint_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("joints"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn make_model_bg(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        models: &wgpu::Buffer,
        joints: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("model_bg"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: models,
                        offset: 0,
                        size: NonZeroU64::new(MODEL_SIZE),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: joints.as_entire_binding(),
                },
            ],
        })
    }

    fn make_ground(device: &wgpu::Device) -> GpuPrimitive {
        let h = GROUND_SIZE * 0.5;
        let corner = |x: f32, z: f32, u: f32, v: f32| Vertex {
            position: [x, 0.0, z],
            normal: [0.0, 1.0, 0.0],
            uv: [u, v],
            joints: [0; 4],
            weights: [0.0; 4],
        };
        let vertices = [
            corner(-h, h, 0.0, 0.0),
            corner(h, h, 1.0, 0.0),
            corner(h, -h, 1.0, 1.0),
            corner(-h, -h, 0.0, 1.0),
        ];
        let indices: [u32; 6] = [0, 1, 2, 0, 2, 3];
        Self::upload_primitive(device, "ground", &vertices, &indices, 0)
    }

    fn upload_primitive(
        device: &wgpu::Device,
        label: &str,
        vertices: &[Vertex],
        indices: &[u32],
        material: usize,
    ) -> GpuPrimitive {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        GpuPrimitive {
            vertices,
            indices: indices_buf,
            index_count: indices.len() as u32,
            material,
        }
    }

    fn make_material(&self, label: &str, data: &MaterialData, texture: Option<&wgpu::TextureView>) -> GpuMaterial {
        let uniform = MaterialUniform {
            base_color: data.base_color.to_array(),
            emissive: data.emissive.extend(0.0).to_array(),
            pbr: [data.metallic, data.roughness, 0.0, 0.0],
        };
        let buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&uniform),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(
                        texture.unwrap_or(&self.white_view),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.base_sampler),
                },
            ],
        });
        GpuMaterial {
            bind_group,
            blend: data.blend,
            double_sided: data.double_sided,
        }
    }

    fn ground_material(&self) -> GpuMaterial {
        let data = MaterialData {
            base_color: Vec4::new(0.0, 0.0, 0.0, GROUND_SHADOW_OPACITY),
            blend: true,
            ..MaterialData::default()
        };
        self.make_material("ground_material", &data, None)
    }

    /// Create GPU buffers, textures and material bind groups for a decoded
    /// scene. Replaces anything uploaded before.
    pub fn upload_scene(&mut self, asset: &SceneAsset) {
        let (scene_textures, textures): (Vec<wgpu::Texture>, Vec<wgpu::TextureView>) = asset
            .images
            .iter()
            .enumerate()
            .map(|(i, img)| {
                helpers::create_rgba_texture(
                    &self.device,
                    &self.queue,
                    &format!("image_{i}"),
                    img.width,
                    img.height,
                    &img.rgba8,
                    wgpu::TextureFormat::Rgba8UnormSrgb,
                )
            })
            .unzip();

        let mut materials = vec![self.ground_material()];
        for (i, data) in asset.materials.iter().enumerate() {
            let tex = data.base_color_texture.and_then(|t| textures.get(t));
            materials.push(self.make_material(&format!("material_{i}"), data, tex));
        }
        // Scene material indices are shifted by one past the ground material.
        self.meshes = asset
            .meshes
            .iter()
            .map(|mesh| {
                mesh.primitives
                    .iter()
                    .map(|p| {
                        Self::upload_primitive(
                            &self.device,
                            &mesh.name,
                            &p.vertices,
                            &p.indices,
                            p.material + 1,
                        )
                    })
                    .collect()
            })
            .collect();
        self.materials = materials;
        self.scene_textures = scene_textures;
        log::info!(
            "[gpu] uploaded meshes={} materials={} textures={}",
            self.meshes.len(),
            self.materials.len() - 1,
            textures.len()
        );
    }

    /// Swap in a decoded environment cube.
    pub fn set_environment(&mut self, faces: &EnvFaces) {
        self.env = upload_env(&self.device, &self.queue, faces);
        self.globals_bg = Self::make_globals_bg(
            &self.device,
            &self.globals_layout,
            &self.globals_buf,
            &self.shadow_view,
            &self.shadow_sampler,
            &self.env.view,
            &self.env_sampler,
        );
        log::info!("[gpu] environment {}px mips={}", faces.size, faces.mip_count());
    }

    pub fn resize_if_needed(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        let (depth_tex, depth_view) = helpers::create_depth_texture(
            &self.device,
            "depth",
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        self.depth_tex = depth_tex;
        self.depth_view = depth_view;
    }

    fn ensure_capacity(&mut self, models: u64, joints: u64) {
        let mut rebuild = false;
        if models > self.model_capacity {
            self.model_capacity = models.next_power_of_two();
            self.model_buf = Self::make_model_buffer(&self.device, self.model_stride * self.model_capacity);
            rebuild = true;
        }
        if joints > self.joint_capacity {
            self.joint_capacity = joints.next_power_of_two();
            self.joint_buf = Self::make_joint_buffer(&self.device, MAT4_SIZE * self.joint_capacity);
            rebuild = true;
        }
        if rebuild {
            self.model_bg =
                Self::make_model_bg(&self.device, &self.model_layout, &self.model_buf, &self.joint_buf);
        }
    }

    pub fn render(
        &mut self,
        camera: &Camera,
        graph: &SceneGraph,
        skins: &[SkinData],
        lighting: &Lighting,
    ) -> Result<(), wgpu::SurfaceError> {
        let light_view_proj = shadow::key_light_view_proj();
        let view = camera.view_matrix();

        // Gather per-node model uniforms and joint palettes.
        let mut models: Vec<ModelUniform> = Vec::new();
        let mut joints: Vec<Mat4> = Vec::new();
        let mut node_slots: Vec<(usize, u32, bool, f32)> = Vec::new();
        for index in graph.traverse() {
            let Some(node) = graph.get(index) else { continue };
            let Some(mesh) = node.mesh else { continue };
            if mesh >= self.meshes.len() || !is_visible(graph, index) {
                continue;
            }
            let joint_offset = node.skin.and_then(|s| skins.get(s)).map(|skin| {
                let offset = joints.len() as u32;
                joints.extend(skin.joint_matrices(graph, node.world));
                offset
            });
            let depth = view.transform_point3(node.world_position()).z;
            node_slots.push((mesh, models.len() as u32, node.cast_shadow, depth));
            models.push(ModelUniform::new(node.world, node.receive_shadow, joint_offset, false));
        }
        let ground_slot = models.len() as u32;
        models.push(ModelUniform::new(Mat4::IDENTITY, true, None, true));

        self.ensure_capacity(models.len() as u64, joints.len().max(1) as u64);
        let stride = self.model_stride as usize;
        let mut staging = vec![0u8; stride * models.len()];
        for (i, m) in models.iter().enumerate() {
            staging[i * stride..i * stride + MODEL_SIZE as usize]
                .copy_from_slice(bytemuck::bytes_of(m));
        }
        self.queue.write_buffer(&self.model_buf, 0, &staging);
        if !joints.is_empty() {
            self.queue
                .write_buffer(&self.joint_buf, 0, bytemuck::cast_slice(&joints));
        }
        let globals = pack_globals(camera, light_view_proj, lighting, self.env.max_mip);
        self.queue
            .write_buffer(&self.globals_buf, 0, bytemuck::bytes_of(&globals));
        self.queue.write_buffer(
            &self.shadow_globals_buf,
            0,
            bytemuck::bytes_of(&ShadowGlobals {
                light_view_proj: light_view_proj.to_cols_array_2d(),
            }),
        );

        let frame = self.surface.get_current_texture()?;
        let target = frame.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(self.view_format),
            ..Default::default()
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        let mut opaque: Vec<Draw> = Vec::new();
        let mut blended: Vec<Draw> = Vec::new();
        for &(mesh, slot, cast_shadow, depth) in &node_slots {
            for primitive in &self.meshes[mesh] {
                let draw = Draw {
                    primitive,
                    slot,
                    cast_shadow,
                    depth,
                };
                match self.materials.get(primitive.material) {
                    Some(m) if m.blend => blended.push(draw),
                    _ => opaque.push(draw),
                }
            }
        }
        // Farthest first; view-space z is negative in front of the camera.
        blended.sort_by(|a, b| a.depth.total_cmp(&b.depth));

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow_pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.shadow_pipeline);
            pass.set_bind_group(0, &self.shadow_globals_bg, &[]);
            for draw in opaque.iter().chain(blended.iter()).filter(|d| d.cast_shadow) {
                let offset = (draw.slot as u64 * self.model_stride) as u32;
                pass.set_bind_group(1, &self.model_bg, &[offset]);
                draw_primitive(&mut pass, draw.primitive);
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.globals_bg, &[]);

            for draw in &opaque {
                let double_sided = self
                    .materials
                    .get(draw.primitive.material)
                    .is_some_and(|m| m.double_sided);
                pass.set_pipeline(if double_sided {
                    &self.double_sided_pipeline
                } else {
                    &self.opaque_pipeline
                });
                self.draw_lit(&mut pass, draw.primitive, draw.slot);
            }

            pass.set_pipeline(&self.blend_pipeline);
            self.draw_lit(&mut pass, &self.ground, ground_slot);
            for draw in &blended {
                self.draw_lit(&mut pass, draw.primitive, draw.slot);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn draw_lit(&self, pass: &mut wgpu::RenderPass<'_>, primitive: &GpuPrimitive, slot: u32) {
        let Some(material) = self.materials.get(primitive.material) else {
            return;
        };
        let offset = (slot as u64 * self.model_stride) as u32;
        pass.set_bind_group(1, &self.model_bg, &[offset]);
        pass.set_bind_group(2, &material.bind_group, &[]);
        draw_primitive(pass, primitive);
    }
}

fn draw_primitive(pass: &mut wgpu::RenderPass<'_>, primitive: &GpuPrimitive) {
    pass.set_vertex_buffer(0, primitive.vertices.slice(..));
    pass.set_index_buffer(primitive.indices.slice(..), wgpu::IndexFormat::Uint32);
    pass.draw_indexed(0..primitive.index_count, 0, 0..1);
}

/// A node renders only if it and every ancestor are visible.
fn is_visible(graph: &SceneGraph, mut index: usize) -> bool {
    loop {
        let Some(node) = graph.get(index) else {
            return false;
        };
        if !node.visible {
            return false;
        }
        match node.parent {
            Some(parent) => index = parent,
            None => return true,
        }
    }
}
