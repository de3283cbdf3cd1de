// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use ribbon_encoding::{
    Context, Cursor, Dimensions, LineEncoding, PathRecord, Planar, Resources, Space, Spatial,
    Style,
};

use crate::draw::{AttributeBuffer, DrawArgs, DrawArgsOverrides, DrawCommand, DrawParams};
use crate::low_level::{BufferProxy, BufferUsage, PipelineProxy, Recording};
use crate::Result;

/// Number of raw vertex slots allocated when no size is requested.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Smallest capacity a builder allocates. Below it the neighbor attributes would start
/// past the end of the position buffer.
const MIN_BUFFER_SIZE: usize = 4;

/// Features of the graphics device that affect buffer layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether 32-bit index buffers can be drawn. Without them capacities above
    /// 8192 slots are rejected.
    pub u32_indices: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { u32_indices: true }
    }
}

/// Options which are set at builder creation time, used in [`LineBuilder::new`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuilderOptions {
    /// Capacity in raw vertex slots. Zero selects [`DEFAULT_BUFFER_SIZE`].
    pub buffer_size: usize,
    /// Changes to the default draw arguments.
    pub draw_args: Option<DrawArgsOverrides>,
}

/// GPU side counterparts of the [`Resources`] views.
#[derive(Clone, Copy, Debug)]
struct GpuBuffers {
    position: BufferProxy,
    offset: BufferProxy,
    color: BufferProxy,
    aux: BufferProxy,
    indices: BufferProxy,
}

fn byte_len(floats: &[f32]) -> u64 {
    (floats.len() * size_of::<f32>()) as u64
}

impl GpuBuffers {
    fn create(recording: &mut Recording, resources: &Resources) -> Self {
        Self {
            position: recording.create_buffer(
                Resources::POSITION,
                byte_len(&resources.position),
                BufferUsage::Vertex,
            ),
            offset: recording.create_buffer(
                Resources::OFFSET,
                byte_len(&resources.offset),
                BufferUsage::Vertex,
            ),
            color: recording.create_buffer(
                Resources::COLOR,
                byte_len(&resources.color),
                BufferUsage::Vertex,
            ),
            aux: recording.create_buffer(
                Resources::AUX,
                byte_len(&resources.aux),
                BufferUsage::Vertex,
            ),
            indices: recording.create_buffer(
                Resources::INDICES,
                resources.indices.as_bytes().len() as u64,
                BufferUsage::Index,
            ),
        }
    }

    /// Uploads every view in full.
    fn upload(&self, recording: &mut Recording, resources: &Resources) {
        recording.upload(self.position, bytemuck::cast_slice::<f32, u8>(&resources.position));
        recording.upload(self.offset, bytemuck::cast_slice::<f32, u8>(&resources.offset));
        recording.upload(self.color, bytemuck::cast_slice::<f32, u8>(&resources.color));
        recording.upload(self.aux, bytemuck::cast_slice::<f32, u8>(&resources.aux));
        recording.upload(self.indices, resources.indices.as_bytes());
    }

    fn free(&self, recording: &mut Recording) {
        for buf in [
            self.position,
            self.offset,
            self.color,
            self.aux,
            self.indices,
        ] {
            recording.free_buffer(buf);
        }
    }

    fn attribute(&self, buffer: AttributeBuffer) -> BufferProxy {
        match buffer {
            AttributeBuffer::Position => self.position,
            AttributeBuffer::Offset => self.offset,
            AttributeBuffer::Color => self.color,
            AttributeBuffer::Aux => self.aux,
        }
    }
}

/// Incrementally builds thick polylines and records the GPU work to draw them.
///
/// Geometry is written through [`context`](Self::context). GPU resources are only
/// described: creation, uploads and draws accumulate as [`Recording`]s, which must be
/// executed in the order they were returned, for example with a
/// [`WgpuEngine`](crate::WgpuEngine).
///
/// ```
/// use ribbon::{BuilderOptions, Capabilities, DrawParams, LineBuilder};
///
/// let mut lines = LineBuilder::<ribbon::Planar>::new(
///     &Capabilities::default(),
///     BuilderOptions::default(),
/// )?;
/// let mut ctx = lines.context();
/// ctx.set_line_width(4.0);
/// ctx.begin_path();
/// ctx.move_to(0.0, 0.0)?;
/// ctx.line_to(0.5, 0.5)?;
/// ctx.stroke()?;
/// let recording = lines.draw(&DrawParams::default())?;
/// assert!(!recording.is_empty());
/// # Ok::<(), ribbon::Error>(())
/// ```
pub struct LineBuilder<S: Space = Planar> {
    encoding: LineEncoding<S>,
    draw_args: DrawArgs,
    buffers: GpuBuffers,
    uniforms: BufferProxy,
    pipeline: PipelineProxy,
    /// Vertex cursor value at the last upload.
    sync_vertex: usize,
    /// Commands not yet handed out.
    pending: Recording,
}

impl<S: Space> LineBuilder<S> {
    /// Creates a builder, recording the creation of its buffers and pipeline.
    pub fn new(capabilities: &Capabilities, options: BuilderOptions) -> Result<Self> {
        let capacity = match options.buffer_size {
            0 => DEFAULT_BUFFER_SIZE,
            size => size.max(MIN_BUFFER_SIZE),
        };
        let encoding = LineEncoding::<S>::new(capacity, capabilities.u32_indices)?;
        let mut draw_args = DrawArgs::new(S::DIMENSIONS);
        if let Some(overrides) = options.draw_args {
            draw_args.merge(overrides);
        }
        draw_args.validate()?;
        let descriptor = draw_args.pipeline_descriptor(S::DIMENSIONS)?;

        let mut pending = Recording::default();
        let buffers = GpuBuffers::create(&mut pending, encoding.resources());
        let uniforms = pending.create_buffer(
            "uniforms",
            ribbon_shaders::UNIFORMS_SIZE,
            BufferUsage::Uniform,
        );
        let pipeline = pending.create_pipeline("ribbon line", descriptor);
        log::debug!(
            "created {:?} line builder with {capacity} vertex slots",
            S::DIMENSIONS
        );
        Ok(Self {
            encoding,
            draw_args,
            buffers,
            uniforms,
            pipeline,
            sync_vertex: 0,
            pending,
        })
    }

    /// Returns the canvas-like drawing surface.
    pub fn context(&mut self) -> Context<'_, S> {
        self.encoding.context()
    }

    /// Rewinds all counters and restores the default style and transform.
    ///
    /// The buffers keep their contents and get overwritten by later commands.
    pub fn reset(&mut self) {
        self.encoding.reset();
        self.sync_vertex = 0;
    }

    /// Reallocates all buffers for `capacity` raw vertex slots, discarding their
    /// contents.
    ///
    /// The cursor is left alone, so this should only be called when idle or followed
    /// by [`reset`](Self::reset). The next draw uploads the buffers again.
    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        let capacity = capacity.max(MIN_BUFFER_SIZE);
        self.encoding.resize(capacity)?;
        self.buffers.free(&mut self.pending);
        self.buffers = GpuBuffers::create(&mut self.pending, self.encoding.resources());
        self.sync_vertex = 0;
        log::debug!("resized line builder to {capacity} vertex slots");
        Ok(())
    }

    /// Releases the builder's GPU resources.
    ///
    /// Returns the final recording, which frees everything the builder created.
    pub fn destroy(mut self) -> Recording {
        let mut recording = std::mem::take(&mut self.pending);
        self.buffers.free(&mut recording);
        recording.free_buffer(self.uniforms);
        recording.free_pipeline(self.pipeline);
        log::debug!("destroyed line builder");
        recording
    }

    /// Records the draw of everything written since the last reset.
    ///
    /// Buffers are uploaded in full first if geometry was added since the last
    /// upload. The returned recording also holds any pending resource creation.
    pub fn draw(&mut self, params: &DrawParams) -> Result<Recording> {
        let uniforms = self.draw_args.resolve_uniforms(params)?;
        let mut recording = std::mem::take(&mut self.pending);
        let cursor = *self.encoding.cursor();
        if self.sync_vertex < cursor.vertex {
            log::debug!(
                "uploading line buffers, {} of {} vertex slots used",
                cursor.vertex,
                cursor.capacity
            );
            self.buffers
                .upload(&mut recording, self.encoding.resources());
            self.sync_vertex = cursor.vertex;
        }
        recording.upload(self.uniforms, bytemuck::bytes_of(&uniforms));

        let index_count = cursor.index_count() as u32;
        log::trace!("drawing {index_count} indices");
        let vertex_buffers = self
            .draw_args
            .vertex_bindings()
            .iter()
            .map(|binding| {
                let buffer = self.buffers.attribute(binding.attribute.buffer);
                (buffer, binding.attribute.offset)
            })
            .collect();
        recording.draw(DrawCommand {
            pipeline: self.pipeline,
            uniforms: self.uniforms,
            vertex_buffers,
            index_buffer: self.buffers.indices,
            index_format: self.encoding.resources().indices.format(),
            index_count,
        });
        Ok(recording)
    }

    /// Takes the commands recorded since the last draw, such as the buffer
    /// reallocation of a [`resize`](Self::resize).
    pub fn take_recording(&mut self) -> Recording {
        std::mem::take(&mut self.pending)
    }

    pub fn encoding(&self) -> &LineEncoding<S> {
        &self.encoding
    }

    pub fn cursor(&self) -> &Cursor {
        self.encoding.cursor()
    }

    pub fn active_path(&self) -> Option<&PathRecord> {
        self.encoding.active_path()
    }

    pub fn paths(&self) -> &[PathRecord] {
        self.encoding.paths()
    }

    pub fn resources(&self) -> &Resources {
        self.encoding.resources()
    }

    pub fn style(&self) -> &Style {
        self.encoding.style()
    }

    pub fn draw_args(&self) -> &DrawArgs {
        &self.draw_args
    }

    /// Whether the next draw uploads the buffers.
    pub fn needs_upload(&self) -> bool {
        self.sync_vertex < self.encoding.cursor().vertex
    }
}

/// A [`LineBuilder`] whose dimension count is chosen at runtime.
pub enum AnyLineBuilder {
    Planar(LineBuilder<Planar>),
    Spatial(LineBuilder<Spatial>),
}

impl AnyLineBuilder {
    /// Creates a builder for `dimensions` components per position, clamped to 2 or 3.
    pub fn new(
        dimensions: u32,
        capabilities: &Capabilities,
        options: BuilderOptions,
    ) -> Result<Self> {
        Ok(match Dimensions::clamped(dimensions) {
            Dimensions::Two => Self::Planar(LineBuilder::new(capabilities, options)?),
            Dimensions::Three => Self::Spatial(LineBuilder::new(capabilities, options)?),
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        match self {
            Self::Planar(_) => Dimensions::Two,
            Self::Spatial(_) => Dimensions::Three,
        }
    }

    pub fn cursor(&self) -> &Cursor {
        match self {
            Self::Planar(builder) => builder.cursor(),
            Self::Spatial(builder) => builder.cursor(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Self::Planar(builder) => builder.reset(),
            Self::Spatial(builder) => builder.reset(),
        }
    }

    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        match self {
            Self::Planar(builder) => builder.resize(capacity),
            Self::Spatial(builder) => builder.resize(capacity),
        }
    }

    pub fn draw(&mut self, params: &DrawParams) -> Result<Recording> {
        match self {
            Self::Planar(builder) => builder.draw(params),
            Self::Spatial(builder) => builder.draw(params),
        }
    }

    pub fn take_recording(&mut self) -> Recording {
        match self {
            Self::Planar(builder) => builder.take_recording(),
            Self::Spatial(builder) => builder.take_recording(),
        }
    }

    pub fn destroy(self) -> Recording {
        match self {
            Self::Planar(builder) => builder.destroy(),
            Self::Spatial(builder) => builder.destroy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::low_level::Command;

    fn builder() -> LineBuilder {
        LineBuilder::new(&Capabilities::default(), BuilderOptions::default()).unwrap()
    }

    fn uploads(recording: &Recording) -> Vec<&'static str> {
        recording
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::Upload(buf, _) => Some(buf.name),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn creation_is_recorded_once() {
        let mut lines = builder();
        let recording = lines.take_recording();
        let created = recording
            .commands
            .iter()
            .filter(|command| matches!(command, Command::CreateBuffer(_)))
            .count();
        assert_eq!(created, 6);
        assert!(recording
            .commands
            .iter()
            .any(|command| matches!(command, Command::CreatePipeline(..))));
        assert!(lines.take_recording().is_empty());
    }

    #[test]
    fn uploads_only_after_new_geometry() {
        let mut lines = builder();
        lines.context().stroke_rect(0.0, 0.0, 1.0, 1.0).unwrap();
        assert!(lines.needs_upload());
        let first = lines.draw(&DrawParams::default()).unwrap();
        assert_eq!(
            uploads(&first),
            ["position", "offset", "color", "aux", "indices", "uniforms"]
        );

        let second = lines.draw(&DrawParams::default()).unwrap();
        assert_eq!(uploads(&second), ["uniforms"]);

        lines.context().set_line_width(3.0);
        let third = lines.draw(&DrawParams::default()).unwrap();
        assert_eq!(uploads(&third), ["uniforms"]);

        lines.context().stroke_rect(2.0, 2.0, 1.0, 1.0).unwrap();
        let fourth = lines.draw(&DrawParams::default()).unwrap();
        assert_eq!(uploads(&fourth).len(), 6);
    }

    #[test]
    fn reset_forces_upload() {
        let mut lines = builder();
        lines.context().stroke_rect(0.0, 0.0, 1.0, 1.0).unwrap();
        lines.draw(&DrawParams::default()).unwrap();
        lines.reset();
        assert!(!lines.needs_upload());
        lines.context().stroke_rect(0.0, 0.0, 1.0, 1.0).unwrap();
        assert!(lines.needs_upload());
    }

    #[test]
    fn draw_uses_cursor_index_count() {
        let mut lines = builder();
        lines.context().stroke_rect(0.0, 0.0, 1.0, 1.0).unwrap();
        let recording = lines.draw(&DrawParams::default()).unwrap();
        let Some(Command::Draw(draw)) = recording.commands.last() else {
            panic!("expected a draw");
        };
        assert_eq!(draw.index_count, 4 * 6);
        assert_eq!(draw.vertex_buffers.len(), 6);
        assert_eq!(draw.vertex_buffers[2].1, 4 * 2 * 4);
        assert_eq!(draw.vertex_buffers[0].0.id, draw.vertex_buffers[2].0.id);
    }

    #[test]
    fn resize_replaces_buffers() {
        let mut lines = builder();
        lines.take_recording();
        lines.resize(2048).unwrap();
        let recording = lines.take_recording();
        let freed = recording
            .commands
            .iter()
            .filter(|command| matches!(command, Command::FreeBuffer(_)))
            .count();
        assert_eq!(freed, 5);
        assert_eq!(lines.cursor().capacity, 2048);
        assert_eq!(lines.resources().position.len(), 2048 * 2 * 2);
    }

    #[test]
    fn destroy_frees_everything() {
        let mut lines = builder();
        lines.take_recording();
        let recording = lines.destroy();
        assert_eq!(recording.commands.len(), 7);
        assert!(matches!(
            recording.commands.last(),
            Some(Command::FreePipeline(_))
        ));
    }

    #[test]
    fn runtime_dimensions() {
        let options = BuilderOptions {
            buffer_size: 16,
            ..BuilderOptions::default()
        };
        let lines = AnyLineBuilder::new(5, &Capabilities::default(), options.clone()).unwrap();
        assert_eq!(lines.dimensions(), Dimensions::Three);
        assert_eq!(lines.cursor().dimensions, Dimensions::Three);
        let lines = AnyLineBuilder::new(1, &Capabilities::default(), options).unwrap();
        assert_eq!(lines.dimensions(), Dimensions::Two);
    }
}
