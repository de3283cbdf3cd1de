// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use glam::{DMat4, DVec3};
use peniko::color::{parse_color, Srgb};
use peniko::kurbo::Affine;

use crate::{Axis, Error, Planar, Result, Space, Spatial};

/// Stroke style applied to newly written vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    /// Straight RGBA color.
    pub color: [f32; 4],
    /// Full line width. Half of it is packed into the offset buffer.
    pub line_width: f32,
    /// The last string assigned as the stroke style.
    pub stroke_style: String,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 1.0],
            line_width: 1.0,
            stroke_style: "#000000".to_owned(),
        }
    }
}

impl Style {
    /// The magnitude written to the offset buffer on either side of the centerline.
    pub fn half_width(&self) -> f32 {
        self.line_width * 0.5
    }

    /// Parses `stroke_style` as a CSS color and copies its RGB channels.
    ///
    /// The alpha channel is left untouched so that it keeps tracking the global alpha.
    pub fn set_stroke_style(&mut self, stroke_style: &str) -> Result<()> {
        let color = parse_color(stroke_style.trim())
            .map_err(|_| Error::InvalidColor(stroke_style.to_owned()))?
            .to_alpha_color::<Srgb>();
        let [r, g, b, _] = color.components;
        self.color[0] = r;
        self.color[1] = g;
        self.color[2] = b;
        self.stroke_style = stroke_style.to_owned();
        Ok(())
    }
}

/// The current transform of a [`Space`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TransformState<S: Space> {
    /// Fast path flag. This is not derived from the matrix: any call that sets the
    /// matrix clears it, even if the result happens to be the identity.
    pub is_identity: bool,
    pub matrix: S::Matrix,
}

impl<S: Space> Default for TransformState<S> {
    fn default() -> Self {
        Self {
            is_identity: true,
            matrix: S::IDENTITY,
        }
    }
}

impl<S: Space> TransformState<S> {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Transforms an input point.
    ///
    /// The matrix is skipped for the identity transform and for closed paths, whose
    /// remaining points are read back from already transformed geometry.
    pub(crate) fn apply(&self, point: [f64; 3], path_closed: bool) -> [f64; 3] {
        if self.is_identity || path_closed {
            if S::DIMENSIONS.count() < 3 {
                return [point[0], point[1], 0.0];
            }
            return point;
        }
        S::transform_point(&self.matrix, point)
    }
}

impl TransformState<Planar> {
    /// Replaces the matrix with `[a b c d e f]`, mapping `(x, y)` to
    /// `(a·x + c·y + e, b·x + d·y + f)`.
    pub fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.matrix = Affine::new([a, b, c, d, e, f]);
        self.is_identity = false;
    }

    pub fn translate(&mut self, x: f64, y: f64) {
        self.matrix = self.matrix * Affine::translate((x, y));
        self.is_identity = false;
    }

    pub fn scale(&mut self, x: f64, y: f64) {
        self.matrix = self.matrix * Affine::scale_non_uniform(x, y);
        self.is_identity = false;
    }

    pub fn rotate(&mut self, angle: f64) {
        self.matrix = self.matrix * Affine::rotate(angle);
        self.is_identity = false;
    }
}

impl TransformState<Spatial> {
    /// Replaces the matrix with 16 values in column-major order.
    pub fn set_transform(&mut self, columns: [f64; 16]) {
        self.matrix = DMat4::from_cols_array(&columns);
        self.is_identity = false;
    }

    pub fn translate(&mut self, x: f64, y: f64, z: f64) {
        self.matrix = self.matrix * DMat4::from_translation(DVec3::new(x, y, z));
        self.is_identity = false;
    }

    pub fn scale(&mut self, x: f64, y: f64, z: f64) {
        self.matrix = self.matrix * DMat4::from_scale(DVec3::new(x, y, z));
        self.is_identity = false;
    }

    /// Rotates by `angle` radians around `axis`.
    ///
    /// A zero length arbitrary axis leaves the transform unchanged.
    pub fn rotate(&mut self, angle: f64, axis: Axis) {
        let rotation = match axis {
            Axis::X => DMat4::from_rotation_x(angle),
            Axis::Y => DMat4::from_rotation_y(angle),
            Axis::Z => DMat4::from_rotation_z(angle),
            Axis::Arbitrary(axis) => {
                let Some(axis) = axis.try_normalize() else {
                    log::warn!("ignoring rotation around zero length axis {axis}");
                    return;
                };
                DMat4::from_axis_angle(axis, angle)
            }
        };
        self.matrix = self.matrix * rotation;
        self.is_identity = false;
    }
}

/// Deep copy of the style and transform, pushed by `save`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Snapshot<S: Space> {
    pub line_width: f32,
    pub color: [f32; 4],
    pub is_identity: bool,
    pub matrix: S::Matrix,
}

impl<S: Space> Snapshot<S> {
    pub(crate) fn capture(style: &Style, transform: &TransformState<S>) -> Self {
        Self {
            line_width: style.line_width,
            color: style.color,
            is_identity: transform.is_identity,
            matrix: transform.matrix,
        }
    }

    pub(crate) fn apply(self, style: &mut Style, transform: &mut TransformState<S>) {
        style.line_width = self.line_width;
        style.color = self.color;
        transform.is_identity = self.is_identity;
        transform.matrix = self.matrix;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stroke_style_keeps_alpha() {
        let mut style = Style::default();
        style.color[3] = 0.25;
        style.set_stroke_style("#ff8000").unwrap();
        assert_eq!(style.color[0], 1.0);
        assert!((style.color[1] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(style.color[2], 0.0);
        assert_eq!(style.color[3], 0.25);
        assert_eq!(style.stroke_style, "#ff8000");
    }

    #[test]
    fn invalid_stroke_style() {
        let mut style = Style::default();
        let err = style.set_stroke_style("not a color").unwrap_err();
        assert_eq!(err, Error::InvalidColor("not a color".to_owned()));
        assert_eq!(style, Style::default());
    }

    #[test]
    fn planar_ops_post_multiply() {
        let mut transform = TransformState::<Planar>::default();
        transform.translate(10.0, 0.0);
        transform.scale(2.0, 2.0);
        assert!(!transform.is_identity);
        // Scale applies first, then the translation.
        assert_eq!(transform.apply([1.0, 1.0, 0.0], false), [12.0, 2.0, 0.0]);
        assert_eq!(transform.apply([1.0, 1.0, 0.0], true), [1.0, 1.0, 0.0]);
    }

    #[test]
    fn set_transform_clears_identity() {
        let mut transform = TransformState::<Planar>::default();
        transform.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        assert!(!transform.is_identity);
        assert_eq!(transform.matrix, Affine::IDENTITY);
    }

    #[test]
    fn spatial_axis_rotations() {
        let mut canonical = TransformState::<Spatial>::default();
        canonical.rotate(0.5, Axis::Z);
        let mut general = TransformState::<Spatial>::default();
        general.rotate(0.5, Axis::Arbitrary(DVec3::new(0.0, 0.0, 3.0)));
        let a = canonical.apply([1.0, 2.0, 3.0], false);
        let b = general.apply([1.0, 2.0, 3.0], false);
        for (a, b) in a.iter().zip(b) {
            assert!((a - b).abs() < 1e-12);
        }

        let mut degenerate = TransformState::<Spatial>::default();
        degenerate.rotate(0.5, Axis::Arbitrary(DVec3::ZERO));
        assert!(degenerate.is_identity);
    }

    #[test]
    fn spatial_translate_keeps_z() {
        let mut transform = TransformState::<Spatial>::default();
        transform.translate(1.0, 2.0, 3.0);
        assert_eq!(transform.apply([1.0, 1.0, 1.0], false), [2.0, 3.0, 4.0]);
    }
}
