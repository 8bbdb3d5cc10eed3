use image::{imageops::FilterType, RgbaImage};

/// Six decoded cube faces in +X, -X, +Y, -Y, +Z, -Z order.
pub struct EnvFaces {
    pub size: u32,
    pub faces: Vec<RgbaImage>,
}

impl EnvFaces {
    /// Decode face images. All faces are resized to the first face's width so
    /// the cube stays square.
    pub fn decode(encoded: &[Vec<u8>]) -> anyhow::Result<Self> {
        if encoded.len() != 6 {
            anyhow::bail!("expected 6 cube faces, got {}", encoded.len());
        }
        let mut faces = Vec::with_capacity(6);
        for bytes in encoded {
            faces.push(image::load_from_memory(bytes)?.to_rgba8());
        }
        let size = faces[0].width().max(1);
        for face in faces.iter_mut() {
            if face.width() != size || face.height() != size {
                *face = image::imageops::resize(face, size, size, FilterType::Triangle);
            }
        }
        Ok(Self { size, faces })
    }

    /// Flat mid-grey cube used until the real faces arrive.
    pub fn neutral() -> Self {
        let face = RgbaImage::from_pixel(1, 1, image::Rgba([128, 128, 128, 255]));
        Self {
            size: 1,
            faces: vec![face; 6],
        }
    }

    pub fn mip_count(&self) -> u32 {
        32 - self.size.leading_zeros()
    }
}

/// Box-filtered mip chain for one face, level 0 first.
pub fn mip_chain(face: &RgbaImage, levels: u32) -> Vec<RgbaImage> {
    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(face.clone());
    for level in 1..levels {
        let size = (face.width() >> level).max(1);
        let prev = &chain[level as usize - 1];
        chain.push(image::imageops::resize(prev, size, size, FilterType::Triangle));
    }
    chain
}

pub struct EnvTexture {
    pub view: wgpu::TextureView,
    pub max_mip: f32,
    _texture: wgpu::Texture,
}

pub fn upload_env(device: &wgpu::Device, queue: &wgpu::Queue, env: &EnvFaces) -> EnvTexture {
    let levels = env.mip_count();
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("env_cube"),
        size: wgpu::Extent3d {
            width: env.size,
            height: env.size,
            depth_or_array_layers: 6,
        },
        mip_level_count: levels,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    for (layer, face) in env.faces.iter().enumerate() {
        for (level, img) in mip_chain(face, levels).iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                img.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * img.width()),
                    rows_per_image: Some(img.height()),
                },
                wgpu::Extent3d {
                    width: img.width(),
                    height: img.height(),
                    depth_or_array_layers: 1,
                },
            );
        }
    }
    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("env_cube_view"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    });
    EnvTexture {
        view,
        max_mip: (levels - 1) as f32,
        _texture: texture,
    }
}
