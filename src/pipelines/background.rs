//! Pipelines for the background slot of a scene.
//!
//! Both draw a single full-screen triangle before any mesh, so they need no
//! vertex buffers. The skybox reconstructs a view ray per fragment from the
//! camera's `sky_inv` matrix and samples a cube map with it. The backdrop
//! stretches a flat image over the viewport.

use crate::{
    data_structures::texture::Texture,
    pipelines::basic::{DepthConfig, mk_render_pipeline},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundKind {
    Skybox,
    Backdrop,
}

impl BackgroundKind {
    fn view_dimension(self) -> wgpu::TextureViewDimension {
        match self {
            BackgroundKind::Skybox => wgpu::TextureViewDimension::Cube,
            BackgroundKind::Backdrop => wgpu::TextureViewDimension::D2,
        }
    }

    fn shader(self) -> wgpu::ShaderModuleDescriptor<'static> {
        match self {
            BackgroundKind::Skybox => wgpu::ShaderModuleDescriptor {
                label: Some("Skybox Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("skybox.wgsl").into()),
            },
            BackgroundKind::Backdrop => wgpu::ShaderModuleDescriptor {
                label: Some("Backdrop Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("backdrop.wgsl").into()),
            },
        }
    }
}

/// A background pipeline with the texture layout it binds at group 1.
#[derive(Debug)]
pub struct BackgroundPipeline {
    pub kind: BackgroundKind,
    pub pipeline: wgpu::RenderPipeline,
    pub texture_layout: wgpu::BindGroupLayout,
}

impl BackgroundPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        kind: BackgroundKind,
    ) -> Self {
        let texture_layout = mk_bind_group_layout(device, kind);
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Background Pipeline Layout"),
            bind_group_layouts: &[camera_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let pipeline = mk_render_pipeline(
            device,
            &layout,
            color_format,
            Some(wgpu::BlendState::REPLACE),
            Some(DepthConfig::BACKGROUND),
            None,
            &[],
            kind.shader(),
        );
        Self {
            kind,
            pipeline,
            texture_layout,
        }
    }

    pub fn bind(&self, device: &wgpu::Device, texture: &Texture) -> wgpu::BindGroup {
        mk_bind_group(device, texture, &self.texture_layout)
    }
}

fn mk_bind_group_layout(device: &wgpu::Device, kind: BackgroundKind) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: kind.view_dimension(),
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("Background texture_bind_group_layout"),
    })
}

fn mk_bind_group(
    device: &wgpu::Device,
    texture: &Texture,
    texture_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::BindGroup {
    let sampler = texture
        .sampler
        .clone()
        .unwrap_or_else(|| device.create_sampler(&wgpu::SamplerDescriptor::default()));
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: texture_bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
        label: Some("Background bind_group"),
    })
}
