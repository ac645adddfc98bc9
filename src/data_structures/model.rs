//! GPU-side meshes and materials.
//!
//! [`Mesh`] holds the vertex and index buffers of one tessellated
//! [`MeshData`], [`Material`] the uniform buffer and bind group built from a
//! scene [`material::Material`]. Both are created lazily by the renderer and
//! cached per scene node.

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::data_structures::{
    geometry::MeshData,
    material::{self, Shading},
    texture::Texture,
    texture_store::TextureConfig,
};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl ModelVertex {
    pub fn from_mesh_data(data: &MeshData) -> Vec<ModelVertex> {
        (0..data.vertex_count())
            .map(|i| ModelVertex {
                position: data.positions[i],
                tex_coords: data.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                normal: data.normals.get(i).copied().unwrap_or([0.0, 0.0, 0.0]),
            })
            .collect()
    }
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

impl Mesh {
    pub fn from_data(device: &wgpu::Device, name: &str, data: &MeshData) -> Self {
        let vertices = ModelVertex::from_mesh_data(data);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: data.indices.len() as u32,
        }
    }
}

/**
 * Per-material constants as laid out in `scene.wgsl`.
 *
 * `uv_transform` is (repeat_u, repeat_v, 0, 0). `flags.x` is 1 for Phong
 * shading, 0 for unlit.
 */
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    pub specular: [f32; 4],
    pub uv_transform: [f32; 4],
    pub flags: [u32; 4],
}

impl MaterialUniform {
    pub fn new(material: &material::Material, map_config: Option<&TextureConfig>) -> Self {
        let [r, g, b] = material.color.to_array();
        let [sr, sg, sb] = material.specular.to_array();
        let repeat = map_config.map_or([1.0, 1.0], |config| config.repeat);
        let lit = match material.shading {
            Shading::Basic => 0,
            Shading::Phong => 1,
        };
        Self {
            color: [r, g, b, material.effective_opacity()],
            specular: [sr, sg, sb, material.shininess],
            uv_transform: [repeat[0], repeat[1], 0.0, 0.0],
            flags: [lit, 0, 0, 0],
        }
    }
}

pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("Material bind group layout"),
    })
}

/// A material uploaded to the GPU together with the texture it samples.
#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub uniform: MaterialUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    /// Version of the texture entry the bind group was built from, `None` when
    /// the white placeholder is bound.
    pub map_version: Option<u32>,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        uniform: MaterialUniform,
        texture: &Texture,
        map_version: Option<u32>,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Material Buffer")),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = Self::bind(device, name, &buffer, texture, layout);
        Self {
            name: name.to_string(),
            uniform,
            buffer,
            bind_group,
            map_version,
        }
    }

    /// Re-points the bind group at a freshly uploaded texture.
    pub fn rebind(
        &mut self,
        device: &wgpu::Device,
        texture: &Texture,
        map_version: Option<u32>,
        layout: &wgpu::BindGroupLayout,
    ) {
        self.bind_group = Self::bind(device, &self.name, &self.buffer, texture, layout);
        self.map_version = map_version;
    }

    pub fn write_uniform(&mut self, queue: &wgpu::Queue, uniform: MaterialUniform) {
        if self.uniform != uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
        }
    }

    fn bind(
        device: &wgpu::Device,
        name: &str,
        buffer: &wgpu::Buffer,
        texture: &Texture,
        layout: &wgpu::BindGroupLayout,
    ) -> wgpu::BindGroup {
        let sampler = texture
            .sampler
            .clone()
            .unwrap_or_else(|| device.create_sampler(&wgpu::SamplerDescriptor::default()));
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some(name),
        })
    }
}

pub trait DrawModel {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &Mesh,
        material: &Material,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    );
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &Mesh,
        material: &Material,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, camera_bind_group, &[]);
        self.set_bind_group(1, light_bind_group, &[]);
        self.set_bind_group(2, &material.bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }
}
