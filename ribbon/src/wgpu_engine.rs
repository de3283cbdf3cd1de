// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::borrow::Cow;
use std::collections::HashMap;
use std::num::NonZeroU64;

use ribbon_encoding::IndexFormat;
use wgpu::{
    BindGroupLayout, Buffer, BufferUsages, CommandEncoderDescriptor, Device,
    PipelineCompilationOptions, Queue, RenderPipeline, TextureFormat, TextureView,
};

use crate::draw::{DrawCommand, PipelineDescriptor};
use crate::low_level::{BufferProxy, BufferUsage, Command, Recording, ResourceId};
use crate::{Error, Result};

/// Options which are set at engine creation time, used in [`WgpuEngine::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WgpuEngineOptions {
    /// Format of the color targets drawn into.
    pub target_format: TextureFormat,
    /// Format of the depth targets. Pipelines with depth testing need one.
    pub depth_format: Option<TextureFormat>,
}

impl Default for WgpuEngineOptions {
    fn default() -> Self {
        Self {
            target_format: TextureFormat::Rgba8Unorm,
            depth_format: Some(TextureFormat::Depth24Plus),
        }
    }
}

struct WgpuPipeline {
    pipeline: RenderPipeline,
    bind_group_layout: BindGroupLayout,
    uses_depth: bool,
}

/// Executes [`Recording`]s with wgpu.
///
/// The engine owns the GPU objects behind the proxies of the recordings it ran.
pub struct WgpuEngine {
    options: WgpuEngineOptions,
    buffers: HashMap<ResourceId, Buffer>,
    pipelines: HashMap<ResourceId, WgpuPipeline>,
}

impl BufferUsage {
    pub fn to_wgpu(self) -> BufferUsages {
        let usage = match self {
            Self::Vertex => BufferUsages::VERTEX,
            Self::Index => BufferUsages::INDEX,
            Self::Uniform => BufferUsages::UNIFORM,
        };
        usage | BufferUsages::COPY_DST
    }
}

fn index_format_to_wgpu(format: IndexFormat) -> wgpu::IndexFormat {
    match format {
        IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
        IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
    }
}

impl WgpuEngine {
    pub fn new(options: WgpuEngineOptions) -> Self {
        Self {
            options,
            buffers: HashMap::default(),
            pipelines: HashMap::default(),
        }
    }

    /// Runs the commands of `recording` in order.
    ///
    /// Draws load and store `target`, and `depth` when the pipeline tests depth. Each
    /// draw is submitted on its own, so uploads recorded between draws apply to the
    /// draws that follow them.
    pub fn run_recording(
        &mut self,
        device: &Device,
        queue: &Queue,
        recording: &Recording,
        target: &TextureView,
        depth: Option<&TextureView>,
    ) -> Result<()> {
        for command in &recording.commands {
            match command {
                Command::CreateBuffer(proxy) => {
                    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(proxy.name),
                        size: proxy.size,
                        usage: proxy.usage.to_wgpu(),
                        mapped_at_creation: false,
                    });
                    if let Some(old) = self.buffers.insert(proxy.id, buffer) {
                        old.destroy();
                    }
                }
                Command::Upload(proxy, bytes) => {
                    let buffer = self.get_buf(proxy, "upload")?;
                    queue.write_buffer(buffer, 0, bytes);
                }
                Command::FreeBuffer(proxy) => {
                    if let Some(buffer) = self.buffers.remove(&proxy.id) {
                        buffer.destroy();
                    }
                }
                Command::CreatePipeline(proxy, descriptor) => {
                    let pipeline = self.create_pipeline(device, proxy.label, descriptor)?;
                    self.pipelines.insert(proxy.id, pipeline);
                }
                Command::FreePipeline(proxy) => {
                    self.pipelines.remove(&proxy.id);
                }
                Command::Draw(draw) => self.draw(device, queue, draw, target, depth)?,
            }
        }
        Ok(())
    }

    fn get_buf(&self, proxy: &BufferProxy, usage: &'static str) -> Result<&Buffer> {
        self.buffers
            .get(&proxy.id)
            .ok_or(Error::UnavailableBufferUsed(proxy.name, usage))
    }

    fn create_pipeline(
        &self,
        device: &Device,
        label: &'static str,
        descriptor: &PipelineDescriptor,
    ) -> Result<WgpuPipeline> {
        let vert = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&descriptor.vert)),
        });
        let frag = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&descriptor.frag)),
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(ribbon_shaders::UNIFORMS_SIZE),
                },
                count: None,
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // Every attribute gets its own buffer slot, so that attributes sharing a buffer
        // can start at offsets larger than their stride.
        let attributes: Vec<[wgpu::VertexAttribute; 1]> = descriptor
            .vertex_buffers
            .iter()
            .map(|binding| {
                [wgpu::VertexAttribute {
                    format: binding.attribute.format.to_wgpu(),
                    offset: 0,
                    shader_location: binding.location,
                }]
            })
            .collect();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout<'_>> = descriptor
            .vertex_buffers
            .iter()
            .zip(&attributes)
            .map(|(binding, attributes)| wgpu::VertexBufferLayout {
                array_stride: binding.attribute.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect();

        let depth_stencil = if descriptor.depth.enable {
            let format = self.options.depth_format.ok_or(Error::MissingDepthTarget)?;
            Some(wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            })
        } else {
            None
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vert,
                entry_point: Some(descriptor.vertex_entry),
                buffers: &vertex_buffers,
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &frag,
                entry_point: Some(descriptor.fragment_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.options.target_format,
                    blend: descriptor.blend.to_wgpu(),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: descriptor.cull.to_wgpu(),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        Ok(WgpuPipeline {
            pipeline,
            bind_group_layout,
            uses_depth: descriptor.depth.enable,
        })
    }

    fn draw(
        &self,
        device: &Device,
        queue: &Queue,
        draw: &DrawCommand,
        target: &TextureView,
        depth: Option<&TextureView>,
    ) -> Result<()> {
        let pipeline = self
            .pipelines
            .get(&draw.pipeline.id)
            .ok_or(Error::UnavailablePipelineUsed(draw.pipeline.label))?;
        let depth = match (pipeline.uses_depth, depth) {
            (true, None) => return Err(Error::MissingDepthTarget),
            (true, depth) => depth,
            (false, _) => None,
        };
        let uniforms = self.get_buf(&draw.uniforms, "uniforms")?;
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ribbon uniforms"),
            layout: &pipeline.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });
        let index_buffer = self.get_buf(&draw.index_buffer, "draw")?;
        let vertex_buffers = draw
            .vertex_buffers
            .iter()
            .map(|(proxy, offset)| {
                let buffer = self.get_buf(proxy, "draw")?;
                if *offset >= buffer.size() {
                    return Err(Error::UnavailableBufferUsed(proxy.name, "draw"));
                }
                Ok(buffer.slice(*offset..))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("ribbon draw"),
        });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ribbon draw"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: depth.map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            rpass.set_pipeline(&pipeline.pipeline);
            rpass.set_bind_group(0, &bind_group, &[]);
            for (slot, slice) in vertex_buffers.into_iter().enumerate() {
                rpass.set_vertex_buffer(slot as u32, slice);
            }
            rpass.set_index_buffer(
                index_buffer.slice(..),
                index_format_to_wgpu(draw.index_format),
            );
            rpass.draw_indexed(0..draw.index_count, 0, 0..1);
        }
        queue.submit(Some(encoder.finish()));
        Ok(())
    }
}
