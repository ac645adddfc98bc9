//! GPU textures and texture creation utilities.
//!
//! [`Texture`] turns the CPU side [`TextureData`] of the texture store into
//! 2D or cube textures on the device, honouring the colour space, wrapping
//! and filtering flags of a [`TextureConfig`].

use anyhow::*;
use image::RgbaImage;

use crate::data_structures::texture_store::{ColorSpace, Filter, TextureConfig, TextureData, Wrapping};

/// Uploaded pixels plus the view and sampler a bind group needs.
///
/// Scene textures come from [`from_data`](Self::from_data), whose sampler
/// follows the entry's [`TextureConfig`]. The depth buffer has no sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl From<Wrapping> for wgpu::AddressMode {
    fn from(wrapping: Wrapping) -> Self {
        match wrapping {
            Wrapping::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            Wrapping::Repeat => wgpu::AddressMode::Repeat,
            Wrapping::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

impl From<Filter> for wgpu::FilterMode {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Nearest => wgpu::FilterMode::Nearest,
            Filter::Linear => wgpu::FilterMode::Linear,
        }
    }
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Depth attachment matching the surface. Zero sizes are bumped to 1.
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// A 1x1 white texture. Materials without a map (or whose map has not
    /// arrived yet) sample this so the shader never needs a branch.
    pub fn create_white(device: &wgpu::Device, queue: &wgpu::Queue) -> Texture {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        Self::from_image(device, queue, &img, Some("white placeholder"), &TextureConfig::default())
    }

    pub fn from_data(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &TextureData,
        label: Option<&str>,
        config: &TextureConfig,
    ) -> Result<Self> {
        let (width, height) = data.dimensions();
        if width == 0 || height == 0 {
            bail!("Texture has no pixels ({width}x{height})");
        }
        match data {
            TextureData::Image(img) => Ok(Self::from_image(device, queue, img, label, config)),
            TextureData::Cube(faces) => Self::from_cube_faces(device, queue, faces, label, config),
        }
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &RgbaImage,
        label: Option<&str>,
        config: &TextureConfig,
    ) -> Self {
        let dimensions = img.dimensions();
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format(config.color_space),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        write_layer(queue, &texture, img, 0);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_sampler(device, config));

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Six equally sized square faces in +x, -x, +y, -y, +z, -z order.
    pub fn from_cube_faces(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[RgbaImage],
        label: Option<&str>,
        config: &TextureConfig,
    ) -> Result<Self> {
        if faces.len() != 6 {
            bail!("A cube map needs 6 faces, got {}", faces.len());
        }
        let dimensions = faces[0].dimensions();
        if let Some(face) = faces.iter().find(|face| face.dimensions() != dimensions) {
            bail!(
                "Cube map faces differ in size: {:?} vs {:?}",
                dimensions,
                face.dimensions()
            );
        }
        if dimensions.0 != dimensions.1 {
            bail!("Cube map faces must be square, got {}x{}", dimensions.0, dimensions.1);
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width: dimensions.0,
                height: dimensions.1,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format(config.color_space),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (layer, face) in faces.iter().enumerate() {
            write_layer(queue, &texture, face, layer as u32);
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label,
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = Some(create_sampler(device, config));

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

fn texture_format(color_space: ColorSpace) -> wgpu::TextureFormat {
    match color_space {
        ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
    }
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, img: &RgbaImage, layer: u32) {
    let (width, height) = img.dimensions();
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
        },
        img.as_raw(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

pub fn create_sampler(device: &wgpu::Device, config: &TextureConfig) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: config.wrap_s.into(),
        address_mode_v: config.wrap_t.into(),
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: config.mag_filter.into(),
        min_filter: config.min_filter.into(),
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}
