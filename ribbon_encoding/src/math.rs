// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate spaces and the matrices that transform them.

use std::fmt::Debug;

use glam::{DMat4, DVec3};
use peniko::kurbo::{Affine, Point};

/// Number of coordinates stored per position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dimensions {
    Two,
    Three,
}

impl Dimensions {
    /// Maps any requested dimension count into the supported range.
    ///
    /// Values below 2 become [`Dimensions::Two`], values above 3 become
    /// [`Dimensions::Three`].
    pub fn clamped(dimensions: u32) -> Self {
        if dimensions >= 3 {
            Self::Three
        } else {
            Self::Two
        }
    }

    pub fn count(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

/// A coordinate space that line geometry can be encoded in.
///
/// The space fixes the number of floats stored per position and the kind of matrix
/// applied to incoming points. The transform methods a [`Context`](crate::Context)
/// exposes depend on the space it was created for.
pub trait Space: Copy + Debug + Default + 'static {
    const DIMENSIONS: Dimensions;

    type Matrix: Copy + Debug + PartialEq;

    const IDENTITY: Self::Matrix;

    /// Applies `matrix` to `point`. Spaces with fewer than three dimensions
    /// ignore the z coordinate and return zero for it.
    fn transform_point(matrix: &Self::Matrix, point: [f64; 3]) -> [f64; 3];
}

/// Two dimensional space with a 2x3 affine matrix.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Planar;

impl Space for Planar {
    const DIMENSIONS: Dimensions = Dimensions::Two;

    type Matrix = Affine;

    const IDENTITY: Affine = Affine::IDENTITY;

    #[inline]
    fn transform_point(matrix: &Affine, point: [f64; 3]) -> [f64; 3] {
        let p = *matrix * Point::new(point[0], point[1]);
        [p.x, p.y, 0.0]
    }
}

/// Three dimensional space with a 4x4 homogeneous matrix.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Spatial;

impl Space for Spatial {
    const DIMENSIONS: Dimensions = Dimensions::Three;

    type Matrix = DMat4;

    const IDENTITY: DMat4 = DMat4::IDENTITY;

    #[inline]
    fn transform_point(matrix: &DMat4, point: [f64; 3]) -> [f64; 3] {
        matrix.project_point3(DVec3::from_array(point)).to_array()
    }
}

/// Rotation axis for three dimensional transforms.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Axis {
    X,
    Y,
    Z,
    /// Any other axis. It doesn't need to be normalized.
    Arbitrary(DVec3),
}

impl From<DVec3> for Axis {
    fn from(axis: DVec3) -> Self {
        Self::Arbitrary(axis)
    }
}

pub(crate) fn point_to_f32(point: [f64; 3]) -> [f32; 3] {
    point.map(|x| x as f32)
}

pub(crate) fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    DVec3::from_array(a).distance(DVec3::from_array(b))
}
