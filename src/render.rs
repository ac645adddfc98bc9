//! Scene presentation on the GPU.
//!
//! [`Renderer`] mirrors the CPU scene into GPU resources lazily: geometry is
//! uploaded the first time a mesh node is drawn, textures whenever their
//! store entry changes version, uniforms whenever their packed bytes change.
//! Every frame is drawn in three batches:
//!
//! - the background (clear colour, flat backdrop or skybox)
//! - opaque meshes, in scene order
//! - transparent meshes, sorted back to front
//!
//! [`draw_order`] computes the batching without a device so it can be tested.

use std::collections::HashMap;

use anyhow::Context as _;
use cgmath::{EuclideanSpace, InnerSpace, Point3};
use wgpu::util::DeviceExt;

use crate::{
    animation::Presenter,
    camera::{Camera, CameraResources},
    context::Context,
    data_structures::{
        instance::InstanceRaw,
        material::{Color, Side},
        model::{self, DrawModel, MaterialUniform},
        scene_graph::{Background, NodeId, Scene},
        texture::Texture,
        texture_store::{TextureData, TextureId},
    },
    pipelines::{
        background::{BackgroundKind, BackgroundPipeline},
        basic::{MeshLayouts, mk_basic_pipeline},
        light::LightResources,
        transparent::mk_transparent_pipeline,
    },
};

/// Mesh nodes split into the two batches they are drawn in.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DrawList {
    pub opaque: Vec<NodeId>,
    /// Farthest from the camera first.
    pub transparent: Vec<NodeId>,
}

/**
 * Collects the visible mesh nodes of a scene.
 *
 * Transparent meshes are ordered by the distance between the camera and
 * their world-space origin, farthest first. Ties keep scene order.
 */
pub fn draw_order(scene: &Scene, camera_position: Point3<f32>) -> DrawList {
    let mut list = DrawList::default();
    let mut transparent = Vec::new();
    scene.visit(|id, node| {
        let Some(mesh) = node.as_mesh() else {
            return;
        };
        if mesh.material.transparent {
            let origin = node.get_world_transform().w.truncate();
            let distance = (origin - camera_position.to_vec()).magnitude2();
            transparent.push((distance, id));
        } else {
            list.opaque.push(id);
        }
    });
    transparent.sort_by(|a, b| b.0.total_cmp(&a.0));
    list.transparent = transparent.into_iter().map(|(_, id)| id).collect();
    list
}

fn side_index(side: Side) -> usize {
    match side {
        Side::Front => 0,
        Side::Back => 1,
        Side::Double => 2,
    }
}

/// One pipeline per rendered side, for each of the two mesh batches.
struct MeshPipelines {
    opaque: [wgpu::RenderPipeline; 3],
    transparent: [wgpu::RenderPipeline; 3],
}

impl MeshPipelines {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat, layouts: &MeshLayouts) -> Self {
        let sides = [Side::Front, Side::Back, Side::Double];
        Self {
            opaque: sides.map(|side| mk_basic_pipeline(device, format, layouts, side)),
            transparent: sides.map(|side| mk_transparent_pipeline(device, format, layouts, side)),
        }
    }

    fn get(&self, transparent: bool, side: Side) -> &wgpu::RenderPipeline {
        if transparent {
            &self.transparent[side_index(side)]
        } else {
            &self.opaque[side_index(side)]
        }
    }
}

struct GpuTexture {
    version: u32,
    texture: Texture,
    cube: bool,
}

struct GpuNode {
    mesh: model::Mesh,
    material: model::Material,
    instance: wgpu::Buffer,
}

struct BoundBackground {
    texture: TextureId,
    version: u32,
    kind: BackgroundKind,
    bind_group: wgpu::BindGroup,
}

pub struct Renderer {
    pub ctx: Context,
    camera: CameraResources,
    lights: LightResources,
    material_layout: wgpu::BindGroupLayout,
    pipelines: MeshPipelines,
    skybox: BackgroundPipeline,
    backdrop: BackgroundPipeline,
    white: Texture,
    textures: HashMap<TextureId, GpuTexture>,
    nodes: HashMap<NodeId, GpuNode>,
    background: Option<BoundBackground>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("ctx", &self.ctx)
            .field("textures", &self.textures.len())
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl Renderer {
    pub fn new(ctx: Context, camera: &Camera) -> Self {
        let device = &ctx.device;
        let format = ctx.config.format;
        let camera_resources = CameraResources::new(device, camera);
        let lights = LightResources::new(device);
        let material_layout = model::material_layout(device);
        let layouts = MeshLayouts {
            camera: &camera_resources.bind_group_layout,
            lights: &lights.bind_group_layout,
            material: &material_layout,
        };
        let pipelines = MeshPipelines::new(device, format, &layouts);
        let skybox = BackgroundPipeline::new(
            device,
            format,
            &camera_resources.bind_group_layout,
            BackgroundKind::Skybox,
        );
        let backdrop = BackgroundPipeline::new(
            device,
            format,
            &camera_resources.bind_group_layout,
            BackgroundKind::Backdrop,
        );
        let white = Texture::create_white(device, &ctx.queue);

        Self {
            camera: camera_resources,
            lights,
            material_layout,
            pipelines,
            skybox,
            backdrop,
            white,
            textures: HashMap::new(),
            nodes: HashMap::new(),
            background: None,
            ctx,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }

    /// Uploads every texture whose store entry changed since the last frame.
    fn sync_textures(&mut self, scene: &Scene) {
        for (id, entry) in scene.textures.iter() {
            if self.textures.get(&id).map(|gpu| gpu.version) == Some(entry.version) {
                continue;
            }
            let Some(data) = entry.data() else {
                self.textures.remove(&id);
                continue;
            };
            let label = format!("texture {}", id.index());
            match Texture::from_data(&self.ctx.device, &self.ctx.queue, data, Some(&label), &entry.config) {
                Ok(texture) => {
                    self.textures.insert(
                        id,
                        GpuTexture {
                            version: entry.version,
                            texture,
                            cube: matches!(data, TextureData::Cube(_)),
                        },
                    );
                }
                Err(e) => {
                    log::error!("Cannot upload {:?}: {e:#}", entry.source);
                    self.textures.remove(&id);
                }
            }
        }
    }

    fn sync_node(&mut self, scene: &Scene, id: NodeId) {
        let Some(node) = scene.get(id) else {
            return;
        };
        let Some(mesh) = node.as_mesh() else {
            return;
        };
        let map_config = mesh
            .material
            .map
            .and_then(|map| scene.textures.get(map))
            .map(|entry| entry.config);
        let uniform = MaterialUniform::new(&mesh.material, map_config.as_ref());
        let raw = InstanceRaw::from_world(node.get_world_transform());
        // Cube maps cannot be sampled by the mesh shader.
        let map = mesh
            .material
            .map
            .and_then(|map| self.textures.get(&map))
            .filter(|gpu| !gpu.cube);
        let (texture, map_version) = match map {
            Some(gpu) => (&gpu.texture, Some(gpu.version)),
            None => (&self.white, None),
        };
        let device = &self.ctx.device;
        let queue = &self.ctx.queue;

        match self.nodes.get_mut(&id) {
            Some(gpu) => {
                gpu.material.write_uniform(queue, uniform);
                if gpu.material.map_version != map_version {
                    gpu.material.rebind(device, texture, map_version, &self.material_layout);
                }
                queue.write_buffer(&gpu.instance, 0, bytemuck::cast_slice(&[raw]));
            }
            None => {
                let data = mesh.geometry.tessellate();
                let gpu = GpuNode {
                    mesh: model::Mesh::from_data(device, &node.name, &data),
                    material: model::Material::new(
                        device,
                        &node.name,
                        uniform,
                        texture,
                        map_version,
                        &self.material_layout,
                    ),
                    instance: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{} Instance Buffer", node.name)),
                        contents: bytemuck::cast_slice(&[raw]),
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    }),
                };
                self.nodes.insert(id, gpu);
            }
        }
    }

    /// Binds the background texture once it is ready. Falls back to the
    /// clear colour while it loads or when it has the wrong dimension.
    fn sync_background(&mut self, background: &Background) {
        let (id, kind) = match background {
            Background::Texture(id) => (*id, BackgroundKind::Backdrop),
            Background::CubeMap(id) => (*id, BackgroundKind::Skybox),
            Background::None | Background::Color(_) => {
                self.background = None;
                return;
            }
        };
        let Some(gpu) = self.textures.get(&id) else {
            self.background = None;
            return;
        };
        if gpu.cube != (kind == BackgroundKind::Skybox) {
            self.background = None;
            return;
        }
        if let Some(bound) = &self.background {
            if bound.texture == id && bound.version == gpu.version && bound.kind == kind {
                return;
            }
        }
        let pipeline = match kind {
            BackgroundKind::Skybox => &self.skybox,
            BackgroundKind::Backdrop => &self.backdrop,
        };
        self.background = Some(BoundBackground {
            texture: id,
            version: gpu.version,
            kind,
            bind_group: pipeline.bind(&self.ctx.device, &gpu.texture),
        });
    }

    fn clear_colour(background: &Background) -> wgpu::Color {
        match background {
            Background::Color(color) => (*color).into(),
            _ => Color::BLACK.into(),
        }
    }

    /// Drops GPU state of nodes that are gone from the scene.
    fn retain_nodes(&mut self, list: &DrawList) {
        if self.nodes.len() > list.opaque.len() + list.transparent.len() {
            self.nodes
                .retain(|id, _| list.opaque.contains(id) || list.transparent.contains(id));
        }
    }
}

impl Presenter for Renderer {
    fn render(&mut self, scene: &Scene, camera: &Camera) -> anyhow::Result<()> {
        let output = match self.ctx.surface.get_current_texture() {
            Ok(output) => output,
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.ctx.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timed out, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e).context("Unable to acquire the next frame"),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.camera.write(&self.ctx.queue, camera);
        self.lights.write(&self.ctx.queue, scene);
        self.sync_textures(scene);
        self.sync_background(&scene.background);

        let list = draw_order(scene, camera.position);
        self.retain_nodes(&list);
        for id in list.opaque.iter().chain(list.transparent.iter()) {
            self.sync_node(scene, *id);
        }

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(Self::clear_colour(&scene.background)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(background) = &self.background {
                let pipeline = match background.kind {
                    BackgroundKind::Skybox => &self.skybox,
                    BackgroundKind::Backdrop => &self.backdrop,
                };
                render_pass.set_pipeline(&pipeline.pipeline);
                render_pass.set_bind_group(0, &self.camera.bind_group, &[]);
                render_pass.set_bind_group(1, &background.bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }

            for (transparent, ids) in [(false, &list.opaque), (true, &list.transparent)] {
                for id in ids {
                    let (Some(gpu), Some(mesh)) =
                        (self.nodes.get(id), scene.get(*id).and_then(|node| node.as_mesh()))
                    else {
                        continue;
                    };
                    render_pass.set_pipeline(self.pipelines.get(transparent, mesh.material.side));
                    render_pass.set_vertex_buffer(1, gpu.instance.slice(..));
                    render_pass.draw_mesh_instanced(
                        &gpu.mesh,
                        &gpu.material,
                        0..1,
                        &self.camera.bind_group,
                        &self.lights.bind_group,
                    );
                }
            }
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        self.ctx.window.pre_present_notify();
        output.present();
        Ok(())
    }
}
