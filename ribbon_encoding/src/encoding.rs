// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    Context, Dimensions, Error, PathRecord, Resources, Result, Snapshot, Space, Style,
    TransformState,
};

/// Counters tracking buffer occupancy.
///
/// The counters only grow between resets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cursor {
    /// Number of raw vertex slots written.
    pub vertex: usize,
    /// Running GPU vertex reference used as the base of the next quad's indices.
    pub element: usize,
    /// Number of quads written. Each quad is six indices.
    pub quad: usize,
    pub dimensions: Dimensions,
    /// Number of raw vertex slots the buffers were allocated for.
    pub capacity: usize,
}

impl Cursor {
    fn new(dimensions: Dimensions, capacity: usize) -> Self {
        Self {
            vertex: 0,
            element: 0,
            quad: 0,
            dimensions,
            capacity,
        }
    }

    /// Number of triangle indices to draw.
    pub fn index_count(&self) -> usize {
        self.quad * 6
    }
}

/// Line geometry encoded into CPU-side buffers, with the style and transform state
/// used while encoding it.
///
/// # Invariants
///
/// * Every written slot `i` holds its position twice: at `i * dims * 2` and
///   `dims` floats later. Colors are duplicated the same way.
/// * The cursor never points past `capacity`.
pub struct LineEncoding<S: Space> {
    pub(crate) cursor: Cursor,
    pub(crate) resources: Resources,
    pub(crate) style: Style,
    pub(crate) transform: TransformState<S>,
    pub(crate) save_stack: Vec<Snapshot<S>>,
    /// The path being built, if any.
    pub(crate) active_path: Option<PathRecord>,
    /// Every stroked path since the last reset, in order.
    pub(crate) paths: Vec<PathRecord>,
    /// Last written point, used to accumulate arc length.
    pub(crate) prev_position: [f64; 3],
    supports_u32_indices: bool,
}

impl<S: Space> LineEncoding<S> {
    /// Creates an encoding with buffers for `capacity` raw vertex slots.
    pub fn new(capacity: usize, supports_u32_indices: bool) -> Result<Self> {
        let resources = Resources::new(capacity, S::DIMENSIONS, supports_u32_indices)?;
        Ok(Self {
            cursor: Cursor::new(S::DIMENSIONS, capacity),
            resources,
            style: Style::default(),
            transform: TransformState::default(),
            save_stack: Vec::new(),
            active_path: None,
            paths: Vec::new(),
            prev_position: [0.0; 3],
            supports_u32_indices,
        })
    }

    /// Returns the canvas-like drawing surface for this encoding.
    pub fn context(&mut self) -> Context<'_, S> {
        Context::new(self)
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn transform(&self) -> &TransformState<S> {
        &self.transform
    }

    /// The path currently being built.
    pub fn active_path(&self) -> Option<&PathRecord> {
        self.active_path.as_ref()
    }

    /// All paths stroked since the last reset.
    pub fn paths(&self) -> &[PathRecord] {
        &self.paths
    }

    pub fn save_depth(&self) -> usize {
        self.save_stack.len()
    }

    #[doc(alias = "clear")]
    /// Rewinds the cursor and restores the default style and transform.
    ///
    /// Buffer contents are left in place and get overwritten by later commands.
    pub fn reset(&mut self) {
        self.cursor.vertex = 0;
        self.cursor.element = 0;
        self.cursor.quad = 0;
        self.style = Style::default();
        self.transform.reset();
        self.active_path = None;
        self.paths.clear();
        self.save_stack.clear();
    }

    /// Reallocates all buffers for `capacity` raw vertex slots.
    ///
    /// Existing contents are discarded. The cursor is not rewound, so this should
    /// only be called when idle or followed by [`reset`](Self::reset).
    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        self.resources = Resources::new(capacity, S::DIMENSIONS, self.supports_u32_indices)?;
        self.cursor.capacity = capacity;
        Ok(())
    }

    /// Pushes a copy of the current line width, color and transform.
    pub fn save(&mut self) {
        self.save_stack
            .push(Snapshot::capture(&self.style, &self.transform));
    }

    /// Pops the most recent [`save`](Self::save) and makes it current.
    pub fn restore(&mut self) -> Result<()> {
        let snapshot = self.save_stack.pop().ok_or(Error::EmptySaveStack)?;
        snapshot.apply(&mut self.style, &mut self.transform);
        Ok(())
    }

    pub fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    pub fn transform_mut(&mut self) -> &mut TransformState<S> {
        &mut self.transform
    }
}
