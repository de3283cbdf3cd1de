// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path commands and the duplicated vertex packing.
//!
//! Stroke encoding
//! ---------------
//! Every logical vertex is written to a raw slot that holds its position twice. The
//! shader reads each raw slot as two GPU vertices and uses the offset buffer's sign to
//! push them to opposite sides of the centerline.
//!
//! 1. `move_to` writes its point into two consecutive slots. The first one acts as the
//!    "previous" neighbor of the path's start, so the shader can read
//!    previous/current/next positions at fixed strides without branching.
//! 2. `line_to` writes one slot and one quad (six indices over four GPU vertices).
//! 3. `stroke` appends one more slot copying the last point, which acts as the
//!    "next" neighbor of the path's end. For closed paths the two flanking slots are
//!    patched to point at the neighbors across the seam, so the join is mitered like
//!    any other.

use std::f64::consts::PI;

use crate::math::{distance, point_to_f32};
use crate::{Error, LineEncoding, Result, Space};

/// Angle covered by one arc segment.
const ARC_SEGMENT_ANGLE: f64 = PI / 10.0;

/// Metadata for a path.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PathRecord {
    /// Anchor of this path: the previous path's `offset + count`, or zero.
    pub offset: usize,
    /// Number of logical vertices written.
    pub count: usize,
    /// Cumulative Euclidean length of the path's segments.
    pub total_length: f64,
    pub is_closed: bool,
}

impl<S: Space> LineEncoding<S> {
    /// Starts a new path.
    ///
    /// An unstroked previous path stops being tracked, but its geometry stays written.
    pub fn begin_path(&mut self) {
        let previous = self.active_path.as_ref().or(self.paths.last());
        let offset = previous.map_or(0, |path| path.offset + path.count);
        self.active_path = Some(PathRecord {
            offset,
            ..PathRecord::default()
        });
    }

    fn path(&self) -> Result<&PathRecord> {
        self.active_path.as_ref().ok_or(Error::NoActivePath)
    }

    fn path_mut(&mut self) -> Result<&mut PathRecord> {
        self.active_path.as_mut().ok_or(Error::NoActivePath)
    }

    /// Starts a subpath at `(x, y, z)`.
    pub fn move_to(&mut self, x: f64, y: f64, z: f64) -> Result<()> {
        let is_closed = self.path()?.is_closed;
        let vertex = self.cursor.vertex;
        self.resources.check_bounds(vertex + 2, 0)?;

        let point = self.transform.apply([x, y, z], is_closed);
        let position = point_to_f32(point);
        let half_width = self.style.half_width();
        let color = self.style.color;
        for slot in [vertex, vertex + 1] {
            self.resources.write_position(slot, position);
            self.resources.write_offset(slot, half_width);
            self.resources.write_aux(slot, 0.0);
            self.resources.write_color(slot, color);
        }

        self.prev_position = point;
        self.path_mut()?.count += 1;
        self.cursor.vertex += 2;
        Ok(())
    }

    /// Adds a segment from the previous point to `(x, y, z)`.
    ///
    /// Without a previous point in the path this behaves as [`move_to`](Self::move_to).
    pub fn line_to(&mut self, x: f64, y: f64, z: f64) -> Result<()> {
        let path = *self.path()?;
        if path.count == 0 {
            return self.move_to(x, y, z);
        }
        let vertex = self.cursor.vertex;
        let quad_ix = self.cursor.quad * 6;
        self.resources.check_bounds(vertex + 1, quad_ix + 6)?;

        let point = self.transform.apply([x, y, z], path.is_closed);
        let total_length = path.total_length + distance(self.prev_position, point);
        let length = total_length as f32;

        self.resources.write_position(vertex, point_to_f32(point));
        self.resources.write_offset(vertex, self.style.half_width());
        self.resources.write_color(vertex, self.style.color);
        // The segment ending here carries its arc length on its start slot.
        self.resources.write_aux(vertex - 1, length);
        self.resources.write_aux(vertex, length);

        let e = self.cursor.element as u32;
        self.resources
            .indices
            .write_quad(quad_ix, [e, e + 1, e + 2, e + 2, e + 1, e + 3]);

        self.prev_position = point;
        let path = self.path_mut()?;
        path.total_length = total_length;
        path.count += 1;
        self.cursor.quad += 1;
        self.cursor.element += 2;
        self.cursor.vertex += 1;
        Ok(())
    }

    /// Adds a circular arc around `(cx, cy)`, sampled every `π / 10` radians.
    ///
    /// The first sample starts a new subpath. A zero sweep writes nothing.
    pub fn arc(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) -> Result<()> {
        self.path()?;
        let delta = (end_angle - start_angle).abs();
        if delta == 0.0 || !delta.is_finite() {
            return Ok(());
        }
        let dir = if anticlockwise { -1.0 } else { 1.0 };
        // Two samples at minimum, so a sliver of an arc still has both of its ends.
        let count = ((delta / ARC_SEGMENT_ANGLE).ceil() as usize).max(2);
        // Huge sweeps saturate, which fails the bounds check instead of wrapping.
        let end_slot = self.cursor.vertex.saturating_add(count).saturating_add(1);
        let end_index = self
            .cursor
            .quad
            .saturating_add(count - 1)
            .saturating_mul(6);
        self.resources.check_bounds(end_slot, end_index)?;

        for i in 0..count {
            let t = i as f64 / (count - 1) as f64;
            let angle = start_angle + t * delta * dir;
            let x = cx + angle.cos() * radius;
            let y = cy + angle.sin() * radius;
            if i == 0 {
                self.move_to(x, y, 0.0)?;
            } else {
                self.line_to(x, y, 0.0)?;
            }
        }
        Ok(())
    }

    /// Closes the path with a segment back to its first point.
    pub fn close_path(&mut self) -> Result<()> {
        let path = self.path()?;
        if path.count == 0 {
            return Ok(());
        }
        // The first point sits `count` slots back: `move_to` wrote two slots and every
        // later point one.
        let first = self.cursor.vertex - path.count;
        let [x, y, z] = self.resources.read_position(first).map(f64::from);
        self.path_mut()?.is_closed = true;
        self.line_to(x, y, z)
    }

    /// Finishes the active path.
    ///
    /// Appends the end cap slot and, for closed paths, patches the slots on either
    /// side of the seam. The finished path is appended to [`paths`](Self::paths).
    pub fn stroke(&mut self) -> Result<()> {
        let path = *self.path()?;
        self.active_path = None;
        if path.count == 0 {
            self.paths.push(path);
            return Ok(());
        }
        let start = self.cursor.vertex - path.count;
        let last = self.cursor.vertex - 1;
        let cap = self.cursor.vertex;
        if let Err(err) = self.resources.check_bounds(cap + 1, 0) {
            self.active_path = Some(path);
            return Err(err);
        }

        let resources = &mut self.resources;
        resources.copy_position(cap, last);
        resources.copy_offset(cap, last);
        let length = resources.read_length(last);
        resources.write_aux(cap, length);
        resources.copy_color(cap, last);

        self.cursor.element += 6;
        self.cursor.vertex += 1;

        if path.is_closed {
            resources.copy_position(start - 1, last - 1);
            resources.copy_position(cap, start + 1);
        }
        self.paths.push(path);
        Ok(())
    }

    /// Strokes the outline of a rectangle as a closed path.
    pub fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        self.begin_path();
        self.move_to(x, y, 0.0)?;
        self.line_to(x + width, y, 0.0)?;
        self.line_to(x + width, y + height, 0.0)?;
        self.line_to(x, y + height, 0.0)?;
        self.close_path()?;
        self.stroke()
    }
}
