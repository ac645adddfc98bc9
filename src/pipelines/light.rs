use cgmath::{InnerSpace, Vector3, Vector4};
use wgpu::util::DeviceExt;

use crate::data_structures::{
    light::Light,
    scene_graph::{NodeKind, Scene},
};

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
pub const MAX_POINT_LIGHTS: usize = 8;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightRaw {
    /// Direction the light travels in, towards its target.
    pub direction: [f32; 4],
    /// Colour premultiplied with intensity.
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightRaw {
    /// `w` is the cut-off distance, 0 for none.
    pub position: [f32; 4],
    /// Colour premultiplied with intensity, `w` is the decay exponent.
    pub color: [f32; 4],
}

/**
 * Every light of a scene packed into one uniform block.
 *
 * Ambient lights add up into `ambient`, hemisphere lights into `sky` and
 * `ground`. Directional and point lights beyond the fixed array sizes are
 * dropped. `counts` holds (directional, point, 0, 0).
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    pub ambient: [f32; 4],
    pub sky: [f32; 4],
    pub ground: [f32; 4],
    pub counts: [u32; 4],
    pub directional: [DirectionalLightRaw; MAX_DIRECTIONAL_LIGHTS],
    pub point: [PointLightRaw; MAX_POINT_LIGHTS],
}

impl Default for LightsUniform {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

impl LightsUniform {
    /// Reads light nodes with their last computed world transforms.
    pub fn from_scene(scene: &Scene) -> Self {
        let mut uniform = Self::default();
        let mut dropped = 0;
        scene.visit(|_, node| {
            let NodeKind::Light(light) = &node.kind else {
                return;
            };
            let world = node.get_world_transform();
            let position = world.w.truncate();
            match light {
                Light::Ambient { color, intensity } => {
                    add(&mut uniform.ambient, color.scaled(*intensity).to_array());
                }
                Light::Hemisphere {
                    sky,
                    ground,
                    intensity,
                } => {
                    add(&mut uniform.sky, sky.scaled(*intensity).to_array());
                    add(&mut uniform.ground, ground.scaled(*intensity).to_array());
                }
                Light::Directional {
                    color,
                    intensity,
                    target,
                } => {
                    let idx = uniform.counts[0] as usize;
                    if idx >= MAX_DIRECTIONAL_LIGHTS {
                        dropped += 1;
                        return;
                    }
                    let towards = target - position;
                    let direction = if towards.magnitude2() > 0.0 {
                        towards.normalize()
                    } else {
                        -Vector3::unit_y()
                    };
                    let [r, g, b] = color.scaled(*intensity).to_array();
                    uniform.directional[idx] = DirectionalLightRaw {
                        direction: direction.extend(0.0).into(),
                        color: [r, g, b, 1.0],
                    };
                    uniform.counts[0] += 1;
                }
                Light::Point {
                    color,
                    intensity,
                    distance,
                    decay,
                } => {
                    let idx = uniform.counts[1] as usize;
                    if idx >= MAX_POINT_LIGHTS {
                        dropped += 1;
                        return;
                    }
                    let [r, g, b] = color.scaled(*intensity).to_array();
                    uniform.point[idx] = PointLightRaw {
                        position: Vector4::new(position.x, position.y, position.z, *distance).into(),
                        color: [r, g, b, *decay],
                    };
                    uniform.counts[1] += 1;
                }
            }
        });
        if dropped > 0 {
            log::warn!("{dropped} lights exceed the shader limits and are ignored");
        }
        uniform
    }
}

fn add(acc: &mut [f32; 4], rgb: [f32; 3]) {
    acc[0] += rgb[0];
    acc[1] += rgb[1];
    acc[2] += rgb[2];
    acc[3] = 1.0;
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightsUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = LightsUniform::default();
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Uploads the scene's lights when they differ from the last upload.
    pub fn write(&mut self, queue: &wgpu::Queue, scene: &Scene) {
        let uniform = LightsUniform::from_scene(scene);
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, lights_uniform: LightsUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Lights Buffer"),
        contents: bytemuck::cast_slice(&[lights_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("lights_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("lights_bind_group"),
    })
}
