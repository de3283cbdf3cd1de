// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{Dimensions, Error, Result};

/// Width of the values in the triangle index buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

impl IndexFormat {
    /// Number of distinct values a 16-bit index can address.
    pub const MAX_U16_VALUES: usize = 65536;

    /// Selects the index width for a buffer of `capacity` raw vertex slots.
    ///
    /// Every slot holds two GPU vertices and the index buffer reserves four entries per
    /// slot, so 16-bit indices are used up to `capacity * 4 * 2 == 65536`.
    pub fn for_capacity(capacity: usize, supports_u32: bool) -> Result<Self> {
        let is_big = capacity.saturating_mul(4 * 2) > Self::MAX_U16_VALUES;
        match (is_big, supports_u32) {
            (false, _) => Ok(Self::Uint16),
            (true, true) => Ok(Self::Uint32),
            (true, false) => Err(Error::IndexWidthUnsupported { capacity }),
        }
    }

    pub fn size_in_bytes(self) -> usize {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }
}

/// Triangle index storage.
#[derive(Clone, Debug, PartialEq)]
pub enum Indices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Indices {
    fn zeroed(format: IndexFormat, len: usize) -> Self {
        match format {
            IndexFormat::Uint16 => Self::U16(vec![0; len]),
            IndexFormat::Uint32 => Self::U32(vec![0; len]),
        }
    }

    pub fn format(&self) -> IndexFormat {
        match self {
            Self::U16(_) => IndexFormat::Uint16,
            Self::U32(_) => IndexFormat::Uint32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U16(indices) => indices.len(),
            Self::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, ix: usize) -> Option<u32> {
        match self {
            Self::U16(indices) => indices.get(ix).map(|&i| i as u32),
            Self::U32(indices) => indices.get(ix).copied(),
        }
    }

    /// Writes six indices starting at `ix`.
    ///
    /// The caller has checked the bounds, and that the values fit the index width.
    pub(crate) fn write_quad(&mut self, ix: usize, quad: [u32; 6]) {
        match self {
            Self::U16(indices) => {
                for (dst, src) in indices[ix..ix + 6].iter_mut().zip(quad) {
                    *dst = src as u16;
                }
            }
            Self::U32(indices) => indices[ix..ix + 6].copy_from_slice(&quad),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::U16(indices) => bytemuck::cast_slice(indices),
            Self::U32(indices) => bytemuck::cast_slice(indices),
        }
    }
}

/// CPU-side views of the five vertex and index buffers.
///
/// All views are sized from the capacity in raw vertex slots. A slot holds one point
/// written twice, so the position view stores `dimensions * 2` floats per slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Resources {
    /// Duplicated positions, `capacity * dimensions * 2` floats.
    pub position: Vec<f32>,
    /// Signed half widths, `capacity * 2` floats.
    pub offset: Vec<f32>,
    /// Duplicated straight RGBA colors, `capacity * 4 * 2` floats.
    pub color: Vec<f32>,
    /// Side sign and cumulative arc length, `capacity * 2 * 3` floats.
    /// Each slot uses the first four of its share: `[1, length, -1, length]`.
    pub aux: Vec<f32>,
    /// Triangle indices, `capacity * 4` entries.
    pub indices: Indices,
    capacity: usize,
    dimensions: Dimensions,
}

impl Resources {
    pub const POSITION: &'static str = "position";
    pub const OFFSET: &'static str = "offset";
    pub const COLOR: &'static str = "color";
    pub const AUX: &'static str = "aux";
    pub const INDICES: &'static str = "indices";

    /// Allocates zeroed views for `capacity` raw vertex slots.
    pub fn new(capacity: usize, dimensions: Dimensions, supports_u32_indices: bool) -> Result<Self> {
        let format = IndexFormat::for_capacity(capacity, supports_u32_indices)?;
        let dims = dimensions.count();
        Ok(Self {
            position: vec![0.0; capacity * dims * 2],
            offset: vec![0.0; capacity * 2],
            color: vec![0.0; capacity * 4 * 2],
            aux: vec![0.0; capacity * 2 * 3],
            indices: Indices::zeroed(format, capacity * 4),
            capacity,
            dimensions,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Checks that slots `..end_slot` and indices `..end_index` can be written.
    pub(crate) fn check_bounds(&self, end_slot: usize, end_index: usize) -> Result<()> {
        if end_slot > self.capacity {
            return Err(Error::CapacityExceeded {
                buffer: Self::POSITION,
                required: end_slot,
                capacity: self.capacity,
            });
        }
        if end_index > self.indices.len() {
            return Err(Error::CapacityExceeded {
                buffer: Self::INDICES,
                required: end_index,
                capacity: self.indices.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn write_position(&mut self, slot: usize, point: [f32; 3]) {
        let dims = self.dimensions.count();
        let ix = slot * dims * 2;
        for (k, &value) in point[..dims].iter().enumerate() {
            self.position[ix + k] = value;
            self.position[ix + k + dims] = value;
        }
    }

    pub(crate) fn read_position(&self, slot: usize) -> [f32; 3] {
        let dims = self.dimensions.count();
        let ix = slot * dims * 2;
        let mut point = [0.0; 3];
        point[..dims].copy_from_slice(&self.position[ix..ix + dims]);
        point
    }

    /// Copies the position of slot `src` into slot `dst`.
    pub(crate) fn copy_position(&mut self, dst: usize, src: usize) {
        let point = self.read_position(src);
        self.write_position(dst, point);
    }

    pub(crate) fn write_offset(&mut self, slot: usize, half_width: f32) {
        self.offset[slot * 2] = half_width;
        self.offset[slot * 2 + 1] = -half_width;
    }

    pub(crate) fn copy_offset(&mut self, dst: usize, src: usize) {
        self.offset.copy_within(src * 2..src * 2 + 2, dst * 2);
    }

    pub(crate) fn write_aux(&mut self, slot: usize, length: f32) {
        self.aux[slot * 4..slot * 4 + 4].copy_from_slice(&[1.0, length, -1.0, length]);
    }

    pub(crate) fn read_length(&self, slot: usize) -> f32 {
        self.aux[slot * 4 + 1]
    }

    pub(crate) fn write_color(&mut self, slot: usize, color: [f32; 4]) {
        let ix = slot * 4 * 2;
        self.color[ix..ix + 4].copy_from_slice(&color);
        self.color[ix + 4..ix + 8].copy_from_slice(&color);
    }

    pub(crate) fn copy_color(&mut self, dst: usize, src: usize) {
        self.color.copy_within(src * 8..src * 8 + 8, dst * 8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_sizes() {
        let resources = Resources::new(1024, Dimensions::Two, false).unwrap();
        assert_eq!(resources.position.len(), 1024 * 2 * 2);
        assert_eq!(resources.offset.len(), 1024 * 2);
        assert_eq!(resources.color.len(), 1024 * 4 * 2);
        assert_eq!(resources.aux.len(), 1024 * 2 * 3);
        assert_eq!(resources.indices.len(), 1024 * 4);
        assert_eq!(resources.indices.format(), IndexFormat::Uint16);
        assert_eq!(resources.indices.as_bytes().len(), 1024 * 4 * 2);

        let resources = Resources::new(16, Dimensions::Three, false).unwrap();
        assert_eq!(resources.position.len(), 16 * 3 * 2);
    }

    #[test]
    fn index_width() {
        assert_eq!(
            IndexFormat::for_capacity(8192, false),
            Ok(IndexFormat::Uint16)
        );
        assert_eq!(
            IndexFormat::for_capacity(8193, true),
            Ok(IndexFormat::Uint32)
        );
        assert_eq!(
            IndexFormat::for_capacity(8193, false),
            Err(Error::IndexWidthUnsupported { capacity: 8193 })
        );
    }

    #[test]
    fn positions_are_duplicated() {
        let mut resources = Resources::new(4, Dimensions::Three, true).unwrap();
        resources.write_position(1, [1.0, 2.0, 3.0]);
        assert_eq!(&resources.position[6..12], &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
        resources.copy_position(3, 1);
        assert_eq!(resources.read_position(3), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn bounds() {
        let resources = Resources::new(4, Dimensions::Two, true).unwrap();
        assert!(resources.check_bounds(4, 16).is_ok());
        assert!(matches!(
            resources.check_bounds(5, 0),
            Err(Error::CapacityExceeded { required: 5, .. })
        ));
        assert!(matches!(
            resources.check_bounds(0, 17),
            Err(Error::CapacityExceeded {
                buffer: "indices",
                ..
            })
        ));
    }
}
