use crate::data_structures::{
    instance::InstanceRaw,
    material::Side,
    model::{ModelVertex, Vertex},
    texture::Texture,
};

/// Bind group layouts shared by every mesh pipeline, in group order.
pub struct MeshLayouts<'a> {
    pub camera: &'a wgpu::BindGroupLayout,
    pub lights: &'a wgpu::BindGroupLayout,
    pub material: &'a wgpu::BindGroupLayout,
}

/// Face culling that leaves the rendered side of a material visible.
pub fn cull_mode(side: Side) -> Option<wgpu::Face> {
    match side {
        Side::Front => Some(wgpu::Face::Back),
        Side::Back => Some(wgpu::Face::Front),
        Side::Double => None,
    }
}

/// Depth tested and depth writing pipeline for fully opaque materials.
pub fn mk_basic_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    layouts: &MeshLayouts,
    side: Side,
) -> wgpu::RenderPipeline {
    let layout = mk_mesh_layout(device, layouts);
    mk_render_pipeline(
        device,
        &layout,
        color_format,
        Some(wgpu::BlendState::REPLACE),
        Some(DepthConfig::OPAQUE),
        cull_mode(side),
        &[ModelVertex::desc(), InstanceRaw::desc()],
        mk_scene_shader(),
    )
}

pub fn mk_mesh_layout(device: &wgpu::Device, layouts: &MeshLayouts) -> wgpu::PipelineLayout {
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Mesh Pipeline Layout"),
        bind_group_layouts: &[layouts.camera, layouts.lights, layouts.material],
        push_constant_ranges: &[],
    })
}

pub fn mk_scene_shader() -> wgpu::ShaderModuleDescriptor<'static> {
    wgpu::ShaderModuleDescriptor {
        label: Some("Scene Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthConfig {
    pub write: bool,
    pub compare: wgpu::CompareFunction,
}

impl DepthConfig {
    pub const OPAQUE: Self = Self {
        write: true,
        compare: wgpu::CompareFunction::Less,
    };
    /// Tested against opaque geometry but never occluding.
    pub const READ_ONLY: Self = Self {
        write: false,
        compare: wgpu::CompareFunction::Less,
    };
    /// Drawn first, behind everything.
    pub const BACKGROUND: Self = Self {
        write: false,
        compare: wgpu::CompareFunction::Always,
    };
}

#[allow(clippy::too_many_arguments)]
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth: Option<DepthConfig>,
    cull_mode: Option<wgpu::Face>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let label = shader.label;
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label,
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth.map(|depth| wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: depth.write,
            depth_compare: depth.compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
