use crate::{
    data_structures::{
        instance::InstanceRaw,
        material::Side,
        model::{ModelVertex, Vertex},
    },
    pipelines::basic::{
        DepthConfig, MeshLayouts, cull_mode, mk_mesh_layout, mk_render_pipeline, mk_scene_shader,
    },
};

/**
 * Alpha blended variant of the mesh pipeline.
 *
 * Shares the shader and bind groups with the opaque pipeline; material
 * opacity arrives as the alpha of the material colour. Depth is tested but
 * not written, so meshes must be submitted back to front.
 */
pub fn mk_transparent_pipeline(
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
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(DepthConfig::READ_ONLY),
        cull_mode(side),
        &[ModelVertex::desc(), InstanceRaw::desc()],
        mk_scene_shader(),
    )
}
