//! Spatial indexing abstractions for anchor hit-testing.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors emitted by spatial index implementations.
#[derive(Debug, Error, PartialEq)]
pub enum IndexError {
    /// Indicates configuration values that cannot be used (e.g., non-positive cell size).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A point with a non-finite coordinate was handed to the index.
    #[error("point {index} has a non-finite coordinate")]
    NonFinite { index: usize },
}

/// Common behaviour exposed by point indices.
pub trait NeighborhoodIndex {
    /// Rebuild internal structures from point positions.
    fn rebuild(&mut self, positions: &[(f32, f32)]) -> Result<(), IndexError>;

    /// Visit every indexed point within the provided squared radius of `query`.
    fn neighbors_within(
        &self,
        query: (f32, f32),
        radius_sq: f32,
        visitor: &mut dyn FnMut(usize, OrderedFloat<f32>),
    );

    /// Closest indexed point within `radius` of `query`, with its squared distance.
    fn nearest_within(
        &self,
        query: (f32, f32),
        radius: f32,
    ) -> Option<(usize, OrderedFloat<f32>)> {
        let mut best: Option<(usize, OrderedFloat<f32>)> = None;
        self.neighbors_within(query, radius * radius, &mut |idx, dist_sq| {
            let closer = match best {
                Some((best_idx, best_sq)) => (dist_sq, idx) < (best_sq, best_idx),
                None => true,
            };
            if closer {
                best = Some((idx, dist_sq));
            }
        });
        best
    }
}

/// Uniform bucket grid over an unbounded plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniformGridIndex {
    /// Edge length of each grid cell used for bucketing points.
    pub cell_size: f32,
    #[serde(skip)]
    positions: Vec<(f32, f32)>,
    #[serde(skip)]
    buckets: HashMap<(i32, i32), Vec<usize>>,
}

impl UniformGridIndex {
    /// Create a new uniform grid with the provided cell size.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            positions: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true when nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    fn cell_of(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }
}

impl Default for UniformGridIndex {
    fn default() -> Self {
        Self::new(32.0)
    }
}

impl NeighborhoodIndex for UniformGridIndex {
    fn rebuild(&mut self, positions: &[(f32, f32)]) -> Result<(), IndexError> {
        if self.cell_size <= 0.0 || !self.cell_size.is_finite() {
            return Err(IndexError::InvalidConfig("cell_size must be positive"));
        }
        if let Some(index) = positions
            .iter()
            .position(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(IndexError::NonFinite { index });
        }
        self.positions.clear();
        self.positions.extend_from_slice(positions);
        self.buckets.clear();
        for (idx, &(x, y)) in positions.iter().enumerate() {
            let cell = self.cell_of(x, y);
            self.buckets.entry(cell).or_default().push(idx);
        }
        Ok(())
    }

    fn neighbors_within(
        &self,
        query: (f32, f32),
        radius_sq: f32,
        visitor: &mut dyn FnMut(usize, OrderedFloat<f32>),
    ) {
        if self.positions.is_empty()
            || radius_sq.is_nan()
            || radius_sq < 0.0
            || !query.0.is_finite()
            || !query.1.is_finite()
        {
            return;
        }
        let radius = radius_sq.sqrt();
        let (min_cx, min_cy) = self.cell_of(query.0 - radius, query.1 - radius);
        let (max_cx, max_cy) = self.cell_of(query.0 + radius, query.1 + radius);
        let mut visit_bucket = |bucket: &[usize]| {
            for &idx in bucket {
                let (x, y) = self.positions[idx];
                let dx = x - query.0;
                let dy = y - query.1;
                let dist_sq = dx * dx + dy * dy;
                if dist_sq <= radius_sq {
                    visitor(idx, OrderedFloat(dist_sq));
                }
            }
        };
        let span = (i64::from(max_cx) - i64::from(min_cx) + 1)
            * (i64::from(max_cy) - i64::from(min_cy) + 1);
        if span > self.buckets.len() as i64 {
            // Query covers more cells than are occupied; scan the occupied ones.
            let mut cells: Vec<_> = self.buckets.iter().collect();
            cells.sort_unstable_by_key(|(cell, _)| **cell);
            for (_, bucket) in cells {
                visit_bucket(bucket);
            }
            return;
        }
        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                if let Some(bucket) = self.buckets.get(&(cx, cy)) {
                    visit_bucket(bucket);
                }
            }
        }
    }
}
