// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw polyline geometry encoding.
//!
//! Path commands issued through a [`Context`] are packed into five flat buffers
//! (positions, offsets, colors, aux and triangle indices). Every logical vertex is
//! written as a duplicated pair so that a vertex shader can push the two copies to
//! opposite sides of the centerline and extrude a ribbon of the current line width.

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

mod context;
mod encoding;
mod error;
pub mod math;
mod path;
mod resources;
mod style;

pub use context::Context;
pub use encoding::{Cursor, LineEncoding};
pub use error::{Error, Result};
pub use math::{Axis, Dimensions, Planar, Space, Spatial};
pub use path::PathRecord;
pub use resources::{IndexFormat, Indices, Resources};
pub use style::{Snapshot, Style, TransformState};
