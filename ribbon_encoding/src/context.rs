// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{Axis, LineEncoding, Planar, Result, Space, Spatial};

/// A canvas-like drawing surface over a [`LineEncoding`].
///
/// Point and transform methods depend on the space. [`Planar`] contexts take `(x, y)`
/// points and 2x3 affine parameters. [`Spatial`] contexts take `(x, y, z)` points,
/// 4x4 matrices and rotation axes.
pub struct Context<'a, S: Space> {
    encoding: &'a mut LineEncoding<S>,
}

impl<'a, S: Space> Context<'a, S> {
    pub(crate) fn new(encoding: &'a mut LineEncoding<S>) -> Self {
        Self { encoding }
    }

    pub fn begin_path(&mut self) {
        self.encoding.begin_path();
    }

    /// See [`LineEncoding::arc`].
    pub fn arc(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) -> Result<()> {
        self.encoding
            .arc(cx, cy, radius, start_angle, end_angle, anticlockwise)
    }

    pub fn close_path(&mut self) -> Result<()> {
        self.encoding.close_path()
    }

    pub fn stroke(&mut self) -> Result<()> {
        self.encoding.stroke()
    }

    pub fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        self.encoding.stroke_rect(x, y, width, height)
    }

    pub fn save(&mut self) {
        self.encoding.save();
    }

    pub fn restore(&mut self) -> Result<()> {
        self.encoding.restore()
    }

    pub fn line_width(&self) -> f32 {
        self.encoding.style.line_width
    }

    /// Sets the width of subsequently written vertices.
    ///
    /// Zero, negative and non-finite widths are ignored.
    pub fn set_line_width(&mut self, width: f32) {
        if !(width.is_finite() && width > 0.0) {
            log::warn!("ignoring invalid line width {width}");
            return;
        }
        self.encoding.style.line_width = width;
    }

    pub fn global_alpha(&self) -> f32 {
        self.encoding.style.color[3]
    }

    /// Sets the alpha of subsequently written vertices.
    ///
    /// Values outside `0.0..=1.0` are ignored.
    pub fn set_global_alpha(&mut self, alpha: f32) {
        if !(0.0..=1.0).contains(&alpha) {
            log::warn!("ignoring out of range global alpha {alpha}");
            return;
        }
        self.encoding.style.color[3] = alpha;
    }

    pub fn stroke_style(&self) -> &str {
        &self.encoding.style.stroke_style
    }

    /// Sets the RGB color of subsequently written vertices from a CSS color string.
    ///
    /// On failure the current color is kept.
    pub fn set_stroke_style(&mut self, stroke_style: &str) -> Result<()> {
        let result = self.encoding.style.set_stroke_style(stroke_style);
        if let Err(err) = &result {
            log::warn!("{err}");
        }
        result
    }
}

impl Context<'_, Planar> {
    pub fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.encoding.move_to(x, y, 0.0)
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.encoding.line_to(x, y, 0.0)
    }

    /// Replaces the current transform. See [`TransformState::set_transform`].
    ///
    /// [`TransformState::set_transform`]: crate::TransformState::set_transform
    pub fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.encoding.transform.set_transform(a, b, c, d, e, f);
    }

    pub fn translate(&mut self, x: f64, y: f64) {
        self.encoding.transform.translate(x, y);
    }

    pub fn scale(&mut self, x: f64, y: f64) {
        self.encoding.transform.scale(x, y);
    }

    pub fn rotate(&mut self, angle: f64) {
        self.encoding.transform.rotate(angle);
    }
}

impl Context<'_, Spatial> {
    pub fn move_to(&mut self, x: f64, y: f64, z: f64) -> Result<()> {
        self.encoding.move_to(x, y, z)
    }

    pub fn line_to(&mut self, x: f64, y: f64, z: f64) -> Result<()> {
        self.encoding.line_to(x, y, z)
    }

    /// Replaces the current transform with a column-major 4x4 matrix.
    pub fn set_transform(&mut self, columns: [f64; 16]) {
        self.encoding.transform.set_transform(columns);
    }

    pub fn translate(&mut self, x: f64, y: f64, z: f64) {
        self.encoding.transform.translate(x, y, z);
    }

    pub fn scale(&mut self, x: f64, y: f64, z: f64) {
        self.encoding.transform.scale(x, y, z);
    }

    pub fn rotate(&mut self, angle: f64, axis: impl Into<Axis>) {
        self.encoding.transform.rotate(angle, axis.into());
    }
}
