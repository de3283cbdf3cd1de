// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! WGSL source of the [Ribbon] line shaders.
//!
//! The shaders read the duplicated vertex buffers produced by `ribbon_encoding` and
//! extrude them into ribbons. They are specialized for two or three dimensional
//! positions with [`preprocess`] and the [`DIMENSIONS_3`] define.
//!
//! [Ribbon]: https://github.com/linebender/ribbon

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
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]

pub mod preprocess;

pub use preprocess::preprocess;

/// Vertex stage of the line shader. Entry point [`VERTEX_ENTRY`].
pub const LINE_VERT: &str = include_str!("../shader/line_vert.wgsl");

/// Fragment stage of the line shader. Entry point [`FRAGMENT_ENTRY`].
pub const LINE_FRAG: &str = include_str!("../shader/line_frag.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Define that switches positions to three components.
pub const DIMENSIONS_3: &str = "DIMENSIONS_3";

/// Size of the uniform block shared by both stages, in bytes.
pub const UNIFORMS_SIZE: u64 = 96;
