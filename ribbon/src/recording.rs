// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::draw::{DrawCommand, PipelineDescriptor};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceId(pub NonZeroU64);

impl ResourceId {
    pub fn next() -> Self {
        // Starts at 1, and wrapping would take longer than any process lives.
        static ID_COUNTER: AtomicU64 = AtomicU64::new(1);
        let id = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
    }
}

/// How an engine binds a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
    Uniform,
}

/// Proxy used as a handle to a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferProxy {
    pub size: u64,
    pub id: ResourceId,
    pub name: &'static str,
    pub usage: BufferUsage,
}

impl BufferProxy {
    pub fn new(size: u64, name: &'static str, usage: BufferUsage) -> Self {
        let id = ResourceId::next();
        debug_assert!(size > 0);
        Self {
            size,
            id,
            name,
            usage,
        }
    }
}

/// Proxy used as a handle to a render pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineProxy {
    pub id: ResourceId,
    pub label: &'static str,
}

impl PipelineProxy {
    pub fn new(label: &'static str) -> Self {
        Self {
            id: ResourceId::next(),
            label,
        }
    }
}

/// Single command inside a [`Recording`] to get executed by an engine.
#[derive(Clone, Debug)]
pub enum Command {
    /// Commands the buffer to be allocated, zero initialized.
    CreateBuffer(BufferProxy),
    /// Commands the data to be uploaded to the start of the given buffer.
    Upload(BufferProxy, Vec<u8>),
    /// Commands to free the buffer.
    FreeBuffer(BufferProxy),
    CreatePipeline(PipelineProxy, Box<PipelineDescriptor>),
    FreePipeline(PipelineProxy),
    /// Commands an indexed draw into the target.
    Draw(Box<DrawCommand>),
}

/// List of [`Command`]s for an engine to execute in order.
#[derive(Clone, Debug, Default)]
pub struct Recording {
    pub commands: Vec<Command>,
}

impl Recording {
    /// Appends a [`Command`] to the back of the [`Recording`].
    pub fn push(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands a new zero initialized buffer.
    /// Returns a [`BufferProxy`] to the buffer.
    pub fn create_buffer(
        &mut self,
        name: &'static str,
        size: u64,
        usage: BufferUsage,
    ) -> BufferProxy {
        let buf_proxy = BufferProxy::new(size, name, usage);
        self.push(Command::CreateBuffer(buf_proxy));
        buf_proxy
    }

    /// Commands the given data to be written to the start of `buf`.
    pub fn upload(&mut self, buf: BufferProxy, data: impl Into<Vec<u8>>) {
        let data = data.into();
        debug_assert!(data.len() as u64 <= buf.size);
        self.push(Command::Upload(buf, data));
    }

    /// Commands to free the given buffer.
    pub fn free_buffer(&mut self, buf: BufferProxy) {
        self.push(Command::FreeBuffer(buf));
    }

    pub fn create_pipeline(
        &mut self,
        label: &'static str,
        descriptor: PipelineDescriptor,
    ) -> PipelineProxy {
        let proxy = PipelineProxy::new(label);
        self.push(Command::CreatePipeline(proxy, Box::new(descriptor)));
        proxy
    }

    pub fn free_pipeline(&mut self, pipeline: PipelineProxy) {
        self.push(Command::FreePipeline(pipeline));
    }

    /// Issue a draw call
    pub fn draw(&mut self, draw: DrawCommand) {
        self.push(Command::Draw(Box::new(draw)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = BufferProxy::new(4, "a", BufferUsage::Vertex);
        let b = BufferProxy::new(4, "a", BufferUsage::Vertex);
        assert_ne!(a.id, b.id);
        assert_ne!(PipelineProxy::new("p").id, PipelineProxy::new("p").id);
    }

    #[test]
    fn commands_keep_their_order() {
        let mut recording = Recording::default();
        let buf = recording.create_buffer("a", 16, BufferUsage::Uniform);
        recording.upload(buf, vec![0_u8; 16]);
        recording.free_buffer(buf);
        assert!(matches!(
            recording.commands.as_slice(),
            [
                Command::CreateBuffer(created),
                Command::Upload(uploaded, _),
                Command::FreeBuffer(freed)
            ] if created.id == buf.id && uploaded.id == buf.id && freed.id == buf.id
        ));
    }
}
