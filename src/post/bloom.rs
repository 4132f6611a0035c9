//! Bloom: threshold extract, separable gaussian blur, output consumed by
//! the tonemap pass.

use wgpu::util::DeviceExt;

use crate::{data_structures::texture::Texture, stage::RenderParams};

use super::{fullscreen_layout, mk_fullscreen_pipeline};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ExtractUniform {
    threshold: f32,
    _padding: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct BlurUniform {
    direction: [f32; 2],
    texel: [f32; 2],
    radius: f32,
    _padding: [f32; 3],
}

/// Bright areas are extracted above `threshold`, blurred horizontally into
/// a ping target and vertically into a pong target; the pong target is the
/// pass output. Strength is applied where the bloom is combined, in the
/// tonemap pass.
pub struct BloomPass {
    extract_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    extract_buffer: wgpu::Buffer,
    blur_h_buffer: wgpu::Buffer,
    blur_v_buffer: wgpu::Buffer,
    radius: f32,
    bright_target: Texture,
    ping_target: Texture,
    pong_target: Texture,
    extract_bind_group: wgpu::BindGroup,
    blur_h_bind_group: wgpu::BindGroup,
    blur_v_bind_group: wgpu::BindGroup,
}

impl BloomPass {
    pub fn new(
        device: &wgpu::Device,
        size: [u32; 2],
        scene_view: &wgpu::TextureView,
        params: &RenderParams,
    ) -> Self {
        let layout = fullscreen_layout(device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let extract_pipeline = mk_fullscreen_pipeline(
            device,
            &pipeline_layout,
            Texture::HDR_FORMAT,
            None,
            wgpu::ShaderModuleDescriptor {
                label: Some("Bloom Extract Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("bloom_extract.wgsl").into()),
            },
            "Bloom Extract Pipeline",
        );
        let blur_pipeline = mk_fullscreen_pipeline(
            device,
            &pipeline_layout,
            Texture::HDR_FORMAT,
            None,
            wgpu::ShaderModuleDescriptor {
                label: Some("Bloom Blur Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("bloom_blur.wgsl").into()),
            },
            "Bloom Blur Pipeline",
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let extract_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bloom Extract Uniform"),
            contents: bytemuck::cast_slice(&[ExtractUniform {
                threshold: params.bloom_threshold,
                _padding: [0.0; 3],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let texel = [1.0 / size[0].max(1) as f32, 1.0 / size[1].max(1) as f32];
        let blur_h_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bloom Blur H Uniform"),
            contents: bytemuck::cast_slice(&[BlurUniform {
                direction: [1.0, 0.0],
                texel,
                radius: params.bloom_radius,
                _padding: [0.0; 3],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let blur_v_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bloom Blur V Uniform"),
            contents: bytemuck::cast_slice(&[BlurUniform {
                direction: [0.0, 1.0],
                texel,
                radius: params.bloom_radius,
                _padding: [0.0; 3],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bright_target = Texture::create_render_target(device, size, "bloom bright");
        let ping_target = Texture::create_render_target(device, size, "bloom ping");
        let pong_target = Texture::create_render_target(device, size, "bloom pong");

        let extract_bind_group = mk_bind_group(
            device,
            &layout,
            scene_view,
            &sampler,
            &extract_buffer,
            "bloom extract",
        );
        let blur_h_bind_group = mk_bind_group(
            device,
            &layout,
            &bright_target.view,
            &sampler,
            &blur_h_buffer,
            "bloom blur h",
        );
        let blur_v_bind_group = mk_bind_group(
            device,
            &layout,
            &ping_target.view,
            &sampler,
            &blur_v_buffer,
            "bloom blur v",
        );

        Self {
            extract_pipeline,
            blur_pipeline,
            layout,
            sampler,
            extract_buffer,
            blur_h_buffer,
            blur_v_buffer,
            radius: params.bloom_radius,
            bright_target,
            ping_target,
            pong_target,
            extract_bind_group,
            blur_h_bind_group,
            blur_v_bind_group,
        }
    }

    pub fn output_view(&self) -> &wgpu::TextureView {
        &self.pong_target.view
    }

    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: [u32; 2],
        scene_view: &wgpu::TextureView,
    ) {
        self.bright_target = Texture::create_render_target(device, size, "bloom bright");
        self.ping_target = Texture::create_render_target(device, size, "bloom ping");
        self.pong_target = Texture::create_render_target(device, size, "bloom pong");

        let texel = [1.0 / size[0].max(1) as f32, 1.0 / size[1].max(1) as f32];
        queue.write_buffer(
            &self.blur_h_buffer,
            0,
            bytemuck::cast_slice(&[BlurUniform {
                direction: [1.0, 0.0],
                texel,
                radius: self.radius,
                _padding: [0.0; 3],
            }]),
        );
        queue.write_buffer(
            &self.blur_v_buffer,
            0,
            bytemuck::cast_slice(&[BlurUniform {
                direction: [0.0, 1.0],
                texel,
                radius: self.radius,
                _padding: [0.0; 3],
            }]),
        );

        self.extract_bind_group = mk_bind_group(
            device,
            &self.layout,
            scene_view,
            &self.sampler,
            &self.extract_buffer,
            "bloom extract",
        );
        self.blur_h_bind_group = mk_bind_group(
            device,
            &self.layout,
            &self.bright_target.view,
            &self.sampler,
            &self.blur_h_buffer,
            "bloom blur h",
        );
        self.blur_v_bind_group = mk_bind_group(
            device,
            &self.layout,
            &self.ping_target.view,
            &self.sampler,
            &self.blur_v_buffer,
            "bloom blur v",
        );
    }

    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder) {
        run_fullscreen_pass(
            encoder,
            "Bloom Extract Pass",
            &self.extract_pipeline,
            &self.extract_bind_group,
            &self.bright_target.view,
        );
        run_fullscreen_pass(
            encoder,
            "Bloom Blur H Pass",
            &self.blur_pipeline,
            &self.blur_h_bind_group,
            &self.ping_target.view,
        );
        run_fullscreen_pass(
            encoder,
            "Bloom Blur V Pass",
            &self.blur_pipeline,
            &self.blur_v_bind_group,
            &self.pong_target.view,
        );
    }
}

fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    input: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    uniform: &wgpu::Buffer,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(input),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform.as_entire_binding(),
            },
        ],
        label: Some(label),
    })
}

pub(crate) fn run_fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
    output: &wgpu::TextureView,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: output,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}
