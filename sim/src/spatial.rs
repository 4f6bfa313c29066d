//! Spatial partitioning for broad-phase collision queries.
//!
//! The index is a uniform grid (spatial hash). Each collidable entity is
//! stored under its fat-bounds rectangle in every cell the rectangle touches,
//! so a query only has to visit the cells overlapping the query rectangle.
//!
//! ## Performance
//! - Insert/remove: O(c) where c = cells covered by the rectangle
//! - Query: O(c + k) where k = entries found in those cells
//!
//! The cell size should be chosen so a typical entity's fat bounds span about
//! one cell (300 world units by default).

use bevy_ecs::prelude::*;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Axis-aligned rectangle in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rect {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Rectangle of the given width and height centred on (x, y).
    pub fn from_center(x: f32, y: f32, width: f32, height: f32) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Self::new(x - hw, y - hh, x + hw, y + hh)
    }

    /// Smallest rectangle containing the circle at (x, y) with radius `r`.
    pub fn around_circle(x: f32, y: f32, r: f32) -> Self {
        Self::new(x - r, y - r, x + r, y + r)
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Finite coordinates and non-negative extent.
    pub fn is_well_formed(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
            && self.max_x >= self.min_x
            && self.max_y >= self.min_y
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Entry in a spatial cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub rect: Rect,
}

/// Grid-based spatial hash over entity rectangles.
#[derive(Resource, Debug)]
pub struct SpatialIndex {
    /// Cell size in world units.
    pub cell_size: f32,
    /// Map from cell coordinates to the entries overlapping that cell.
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    /// Number of distinct (rect, entity) pairs stored.
    len: usize,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(300.0)
    }
}

impl SpatialIndex {
    /// Create a new index with the given cell size.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            len: 0,
        }
    }

    /// Convert world coordinates to cell coordinates.
    #[inline]
    pub fn world_to_cell(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    fn cell_span(&self, rect: &Rect) -> CellSpan {
        let (x0, y0) = self.world_to_cell(rect.min_x, rect.min_y);
        let (x1, y1) = self.world_to_cell(rect.max_x, rect.max_y);
        CellSpan { x0, y0, x1, y1 }
    }

    /// Store `entity` under `rect`. Returns `false` (and stores nothing)
    /// when the rectangle is malformed.
    pub fn insert(&mut self, rect: Rect, entity: Entity) -> bool {
        if !rect.is_well_formed() {
            debug!("spatial index: ignoring malformed rect {:?} for {:?}", rect, entity);
            return false;
        }
        let entry = SpatialEntry { entity, rect };
        for cell in self.cell_span(&rect).cells() {
            self.cells.entry(cell).or_default().push(entry);
        }
        self.len += 1;
        true
    }

    /// Remove `entity` stored under `rect`.
    ///
    /// A stale pair (already removed, or never inserted under this rect) is a
    /// benign no-op and returns `false`.
    pub fn remove(&mut self, rect: Rect, entity: Entity) -> bool {
        if !rect.is_well_formed() {
            return false;
        }
        let mut removed = false;
        for cell in self.cell_span(&rect).cells() {
            if let Some(entries) = self.cells.get_mut(&cell) {
                if let Some(i) = entries
                    .iter()
                    .position(|e| e.entity == entity && e.rect == rect)
                {
                    entries.swap_remove(i);
                    removed = true;
                }
                if entries.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
        if removed {
            self.len -= 1;
        } else {
            debug!("spatial index: stale remove of {:?}", entity);
        }
        removed
    }

    /// Entities whose stored rectangle overlaps `rect`.
    ///
    /// The result is lazy and can be iterated any number of times.
    pub fn query(&self, rect: Rect) -> SpatialQuery<'_> {
        SpatialQuery { index: self, rect }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get count of entries in a cell.
    pub fn cell_count(&self, cell: (i32, i32)) -> usize {
        self.cells.get(&cell).map(|v| v.len()).unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.len = 0;
    }
}

#[derive(Debug, Clone, Copy)]
struct CellSpan {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

impl CellSpan {
    fn cells(self) -> impl Iterator<Item = (i32, i32)> {
        (self.x0..=self.x1).flat_map(move |x| (self.y0..=self.y1).map(move |y| (x, y)))
    }
}

/// A restartable query over a [`SpatialIndex`].
#[derive(Debug, Clone, Copy)]
pub struct SpatialQuery<'a> {
    index: &'a SpatialIndex,
    rect: Rect,
}

impl<'a> SpatialQuery<'a> {
    /// Start a fresh pass over the query results.
    pub fn iter(&self) -> QueryIter<'a> {
        let span = if self.rect.is_well_formed() {
            Some(self.index.cell_span(&self.rect))
        } else {
            None
        };
        QueryIter {
            index: self.index,
            rect: self.rect,
            span,
            cx: span.map(|s| s.x0).unwrap_or(0),
            cy: span.map(|s| s.y0).unwrap_or(0),
            entry: 0,
            seen: HashSet::new(),
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }
}

impl<'a> IntoIterator for &SpatialQuery<'a> {
    type Item = Entity;
    type IntoIter = QueryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy, de-duplicated iterator produced by [`SpatialQuery::iter`].
pub struct QueryIter<'a> {
    index: &'a SpatialIndex,
    rect: Rect,
    span: Option<CellSpan>,
    cx: i32,
    cy: i32,
    entry: usize,
    seen: HashSet<Entity>,
}

impl<'a> QueryIter<'a> {
    fn advance_cell(&mut self, span: CellSpan) {
        self.entry = 0;
        if self.cy < span.y1 {
            self.cy += 1;
        } else {
            self.cy = span.y0;
            self.cx += 1;
        }
    }
}

impl<'a> Iterator for QueryIter<'a> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        let span = self.span?;
        let index = self.index;
        while self.cx <= span.x1 {
            let Some(entries) = index.cells.get(&(self.cx, self.cy)) else {
                self.advance_cell(span);
                continue;
            };
            while let Some(entry) = entries.get(self.entry) {
                self.entry += 1;
                if entry.rect.overlaps(&self.rect) && self.seen.insert(entry.entity) {
                    return Some(entry.entity);
                }
            }
            self.advance_cell(span);
        }
        None
    }
}
