//! Post-processing chain: base scene pass, bloom, tonemap.
//!
//! The chain is planned as data first ([`plan_passes`]) and realized on the
//! device second ([`EffectComposer`]). Pass order is significant: each pass
//! consumes the prior pass's output, and the plan for a given
//! [`RenderParams`] never varies between runs. When a composer exists the
//! host renders frames through it exclusively; the raw surface is only ever
//! written by the final tonemap pass.

pub mod bloom;
pub mod tonemap;

use crate::{
    context::Context,
    data_structures::{scene_graph::SceneNode, texture::Texture},
    pipelines::scene::mk_scene_pipeline,
    stage::RenderParams,
};

use bloom::BloomPass;
use tonemap::TonemapPass;

/// One planned pass. The plan is pure data so ordering can be asserted
/// without a GPU.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PassDesc {
    /// Renders the scene graph into the HDR target. Always first.
    Scene,
    Bloom {
        threshold: f32,
        strength: f32,
        radius: f32,
    },
    /// Reinhard tonemapping with exposure, writing the surface. Always last.
    Tonemap { exposure: f32 },
}

impl PassDesc {
    pub fn label(&self) -> &'static str {
        match self {
            PassDesc::Scene => "scene",
            PassDesc::Bloom { .. } => "bloom",
            PassDesc::Tonemap { .. } => "tonemap",
        }
    }
}

/// Derive the ordered pass list from the render parameters.
pub fn plan_passes(params: &RenderParams) -> Vec<PassDesc> {
    vec![
        PassDesc::Scene,
        PassDesc::Bloom {
            threshold: params.bloom_threshold,
            strength: params.bloom_strength,
            radius: params.bloom_radius,
        },
        PassDesc::Tonemap {
            exposure: params.exposure,
        },
    ]
}

/// The realized chain. Owns the HDR scene target, the scene pipeline and
/// the GPU side of every planned pass.
pub struct EffectComposer {
    plan: Vec<PassDesc>,
    scene_pipeline: wgpu::RenderPipeline,
    scene_target: Texture,
    bloom: BloomPass,
    tonemap: TonemapPass,
}

impl EffectComposer {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
        params: &RenderParams,
    ) -> Self {
        let plan = plan_passes(params);
        let scene_pipeline =
            mk_scene_pipeline(device, camera_bind_group_layout, light_bind_group_layout);
        let scene_target =
            Texture::create_render_target(device, [config.width, config.height], "scene target");
        let bloom = BloomPass::new(
            device,
            [config.width, config.height],
            &scene_target.view,
            params,
        );
        let tonemap = TonemapPass::new(
            device,
            config.format,
            &scene_target.view,
            bloom.output_view(),
            params,
        );

        Self {
            plan,
            scene_pipeline,
            scene_target,
            bloom,
            tonemap,
        }
    }

    /// The planned pass labels, in execution order.
    pub fn pass_labels(&self) -> Vec<&'static str> {
        self.plan.iter().map(PassDesc::label).collect()
    }

    /// Recreate the offscreen targets and downstream bind groups for a new
    /// surface size.
    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) {
        self.scene_target =
            Texture::create_render_target(device, [width, height], "scene target");
        self.bloom
            .resize(device, queue, [width, height], &self.scene_target.view);
        self.tonemap
            .resize(device, &self.scene_target.view, self.bloom.output_view());
    }

    /// Execute the chain in plan order into `output`.
    pub fn render(
        &self,
        ctx: &Context,
        root: &SceneNode,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
    ) {
        for desc in &self.plan {
            match desc {
                PassDesc::Scene => self.render_scene(ctx, root, encoder),
                PassDesc::Bloom { .. } => self.bloom.encode(encoder),
                PassDesc::Tonemap { .. } => self.tonemap.encode(encoder, output),
            }
        }
    }

    fn render_scene(&self, ctx: &Context, root: &SceneNode, encoder: &mut wgpu::CommandEncoder) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.scene_target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ctx.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &ctx.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.scene_pipeline);
        root.draw(
            &ctx.camera.bind_group,
            &ctx.light.bind_group,
            &mut render_pass,
        );
    }
}

/// Bind group layout shared by the fullscreen passes: an input texture, a
/// sampler and a small uniform.
pub(crate) fn fullscreen_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
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
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("fullscreen_pass_bind_group_layout"),
    })
}

/// Pipeline for a fullscreen pass: a screen-covering triangle and no
/// vertex buffers, depth or culling.
pub(crate) fn mk_fullscreen_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    shader: wgpu::ShaderModuleDescriptor,
    label: &str,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
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
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
