// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Errors that can occur while encoding line geometry.
///
/// All of these are caller misuse rather than transient conditions. After any of them
/// the encoding should be [reset](crate::LineEncoding::reset) before further use.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The requested capacity needs 32-bit indices, which the graphics context
    /// does not support.
    #[error("buffer size {capacity} needs 32-bit indices, which are not supported by the graphics context")]
    IndexWidthUnsupported { capacity: usize },
    /// `restore` was called without a matching `save`.
    #[error("restore called with an empty save stack")]
    EmptySaveStack,
    /// A path command was issued without a preceding `begin_path`.
    #[error("path command issued without an active path, call begin_path first")]
    NoActivePath,
    /// A write would run past the end of the allocated buffers.
    #[error("{buffer} needs {required} entries but only {capacity} are allocated")]
    CapacityExceeded {
        buffer: &'static str,
        required: usize,
        capacity: usize,
    },
    /// A stroke style string could not be parsed as a CSS color.
    #[error("couldn't parse `{0}` as a color")]
    InvalidColor(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
