// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ribbon draws thick polylines on the GPU.
//!
//! Lines are described with a canvas-like API and encoded incrementally into flat vertex
//! and index buffers. Every vertex is written twice, and the line shader pushes the two
//! copies apart to extrude a mitered ribbon of the requested width. Both 2D lines
//! ([`Planar`]) and 3D lines ([`Spatial`]) are supported.
//!
//! A [`LineBuilder`] owns the encoding and describes the GPU work it needs as
//! [`Recording`](low_level::Recording)s. With the default `wgpu` feature, a [`WgpuEngine`]
//! executes them:
//!
//! ```ignore
//! let device: wgpu::Device = ...;
//! let queue: wgpu::Queue = ...;
//! let target: wgpu::TextureView = ...;
//! let depth: wgpu::TextureView = ...;
//! let mut engine = ribbon::WgpuEngine::new(ribbon::WgpuEngineOptions {
//!     target_format: wgpu::TextureFormat::Bgra8Unorm,
//!     depth_format: Some(wgpu::TextureFormat::Depth24Plus),
//! });
//! let mut lines = ribbon::LineBuilder::<ribbon::Planar>::new(
//!     &ribbon::Capabilities::default(),
//!     ribbon::BuilderOptions::default(),
//! )?;
//!
//! let mut ctx = lines.context();
//! ctx.set_stroke_style("rebeccapurple")?;
//! ctx.begin_path();
//! ctx.arc(0.0, 0.0, 0.5, 0.0, std::f64::consts::TAU, false)?;
//! ctx.stroke()?;
//!
//! let recording = lines.draw(&ribbon::DrawParams {
//!     viewport: [width as f32, height as f32],
//!     thickness: 0.01,
//!     ..Default::default()
//! })?;
//! engine.run_recording(&device, &queue, &recording, &target, Some(&depth))?;
//! ```

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
// The following lints are part of the Linebender standard set,
// but resolving them has been deferred for now.
// Feel free to send a PR that solves one or more of these.
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]
#![allow(
    missing_debug_implementations,
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    reason = "Deferred"
)]

mod builder;
mod draw;
mod recording;

#[cfg(feature = "wgpu")]
mod wgpu_engine;

pub mod low_level {
    //! The proxies and commands a [`LineBuilder`](crate::LineBuilder) records, for
    //! executing them with something other than [`WgpuEngine`](crate::WgpuEngine).

    pub use crate::draw::{
        Attribute, AttributeBuffer, BlendEquation, BlendFactor, BlendState, CullState,
        DepthState, DrawCommand, Face, LineUniforms, PipelineDescriptor, VertexBinding,
        VertexFormat,
    };
    pub use crate::recording::{
        BufferProxy, BufferUsage, Command, PipelineProxy, Recording, ResourceId,
    };
}

pub mod names {
    //! Keys of the default uniforms and attributes in [`DrawArgs`](crate::DrawArgs).

    pub use crate::draw::{
        ADJUST_PROJECTED_THICKNESS, ASPECT, AUX, COLOR, CURR_POSITION, MITER_LIMIT, MODEL,
        NEXT_POSITION, OFFSET, PREV_POSITION, THICKNESS, TINT,
    };
}

/// Styling and composition primitives.
pub use peniko;
/// 2D geometry, with a focus on curves.
pub use peniko::kurbo;

/// Vectors and matrices for 3D transforms.
pub use glam;

#[cfg(feature = "wgpu")]
pub use wgpu;

pub use builder::{
    AnyLineBuilder, BuilderOptions, Capabilities, LineBuilder, DEFAULT_BUFFER_SIZE,
};
pub use draw::{DrawArgs, DrawArgsOverrides, DrawParam, DrawParams, Uniform};
pub use ribbon_encoding::{
    Axis, Context, Cursor, Dimensions, Error as EncodingError, IndexFormat, LineEncoding,
    PathRecord, Planar, Resources, Space, Spatial, Style,
};

#[cfg(feature = "wgpu")]
pub use wgpu_engine::{WgpuEngine, WgpuEngineOptions};

use thiserror::Error;

/// Errors that can occur in Ribbon.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Encoding geometry or allocating the buffers failed.
    #[error(transparent)]
    Encoding(#[from] ribbon_encoding::Error),
    /// Used a buffer inside a recording while it was not available.
    /// Check that the recordings of the builder are executed in order.
    #[error("Buffer '{0}' is not available but used for {1}")]
    UnavailableBufferUsed(&'static str, &'static str),
    /// Drew with a pipeline that was never created or already freed.
    #[error("Pipeline '{0}' is not available but used for a draw")]
    UnavailablePipelineUsed(&'static str),
    /// A shader stage has no source.
    #[error("Missing {0} shader source")]
    MissingShader(&'static str),
    /// A uniform's value has a different type than its slot in the uniform block.
    #[error("Uniform `{name}` has a value of the wrong type")]
    UnsupportedUniform { name: String },
    /// The pipeline tests depth, but the engine has no depth format or the draw has
    /// no depth target.
    #[error("Depth testing is enabled but no depth target is available")]
    MissingDepthTarget,
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;
