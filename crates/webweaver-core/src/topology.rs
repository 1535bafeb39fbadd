//! Web topology generation: frame, radial and spiral threads from an anchor set.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::Position;
use crate::geometry::{centroid, distance, lerp, polar_angle};

/// Minimum number of anchors required to span a web.
pub const MIN_ANCHORS: usize = 3;
/// Radials (and anchor spacings) shorter than this are skipped when placing spiral points.
pub const MIN_RADIAL_LENGTH: f32 = 1.0;

/// Category of a thread inside the web.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThreadKind {
    /// Polygon edge between angularly consecutive anchors.
    #[default]
    Frame,
    /// Spoke from the centroid outward.
    Radial,
    /// Segment of a concentric capture ring.
    Spiral,
}

impl ThreadKind {
    /// All kinds in build order.
    pub const ALL: [ThreadKind; 3] = [ThreadKind::Frame, ThreadKind::Radial, ThreadKind::Spiral];

    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ThreadKind::Frame => "frame",
            ThreadKind::Radial => "radial",
            ThreadKind::Spiral => "spiral",
        }
    }
}

/// A single silk thread with frozen endpoints and monotone build progress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    from: Position,
    to: Position,
    progress: f32,
    kind: ThreadKind,
    ring: Option<u32>,
}

impl Thread {
    /// Construct an unbuilt thread.
    #[must_use]
    pub const fn new(from: Position, to: Position, kind: ThreadKind) -> Self {
        Self {
            from,
            to,
            progress: 0.0,
            kind,
            ring: None,
        }
    }

    /// Construct an unbuilt spiral segment on `ring`.
    #[must_use]
    pub const fn spiral(from: Position, to: Position, ring: u32) -> Self {
        Self {
            from,
            to,
            progress: 0.0,
            kind: ThreadKind::Spiral,
            ring: Some(ring),
        }
    }

    #[must_use]
    pub const fn from(&self) -> Position {
        self.from
    }

    #[must_use]
    pub const fn to(&self) -> Position {
        self.to
    }

    #[must_use]
    pub const fn kind(&self) -> ThreadKind {
        self.kind
    }

    /// 1-indexed ring number for spiral threads.
    #[must_use]
    pub const fn ring(&self) -> Option<u32> {
        self.ring
    }

    /// Straight-line length between the endpoints.
    #[must_use]
    pub fn length(&self) -> f32 {
        distance(self.from, self.to)
    }

    /// Build progress in `[0, 1]`.
    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.progress
    }

    /// Whether the thread is fully drawn.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    /// Adds `amount` to the progress, clamped to 1. Negative or NaN amounts are ignored.
    /// Returns true when this call completed the thread.
    pub fn advance_progress(&mut self, amount: f32) -> bool {
        if amount.is_nan() || amount <= 0.0 || self.is_complete() {
            return false;
        }
        self.progress = (self.progress + amount).min(1.0);
        self.is_complete()
    }
}

/// Immutable geometry generated from one anchor set, plus live thread progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Web {
    centroid: Position,
    anchors: Vec<Position>,
    sorted_indices: Vec<usize>,
    frame: Vec<Thread>,
    radial: Vec<Thread>,
    spiral: Vec<Thread>,
    subdivisions: usize,
    spiral_rings: usize,
    max_radius: f32,
    built: bool,
}

impl Web {
    /// Centroid of the anchors.
    #[must_use]
    pub const fn centroid(&self) -> Position {
        self.centroid
    }

    /// Anchor positions in ascending polar-angle order around the centroid.
    #[must_use]
    pub fn anchors(&self) -> &[Position] {
        &self.anchors
    }

    /// For each sorted anchor, its index in the input slice handed to [`generate_web`].
    #[must_use]
    pub fn sorted_indices(&self) -> &[usize] {
        &self.sorted_indices
    }

    #[must_use]
    pub fn frame(&self) -> &[Thread] {
        &self.frame
    }

    #[must_use]
    pub fn radial(&self) -> &[Thread] {
        &self.radial
    }

    #[must_use]
    pub fn spiral(&self) -> &[Thread] {
        &self.spiral
    }

    /// Thread sequence for `kind`.
    #[must_use]
    pub fn threads(&self, kind: ThreadKind) -> &[Thread] {
        match kind {
            ThreadKind::Frame => &self.frame,
            ThreadKind::Radial => &self.radial,
            ThreadKind::Spiral => &self.spiral,
        }
    }

    /// Mutable thread sequence for `kind`. Endpoints stay frozen; only progress can move.
    pub fn threads_mut(&mut self, kind: ThreadKind) -> &mut [Thread] {
        match kind {
            ThreadKind::Frame => &mut self.frame,
            ThreadKind::Radial => &mut self.radial,
            ThreadKind::Spiral => &mut self.spiral,
        }
    }

    /// Borrow a single thread.
    #[must_use]
    pub fn thread(&self, kind: ThreadKind, index: usize) -> Option<&Thread> {
        self.threads(kind).get(index)
    }

    /// Iterate every thread in build order (frame, radial, spiral).
    pub fn iter_threads(&self) -> impl Iterator<Item = &Thread> + '_ {
        self.frame
            .iter()
            .chain(self.radial.iter())
            .chain(self.spiral.iter())
    }

    /// Total number of threads.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.frame.len() + self.radial.len() + self.spiral.len()
    }

    /// Subdivision radials inserted between each consecutive anchor pair.
    #[must_use]
    pub const fn subdivisions(&self) -> usize {
        self.subdivisions
    }

    /// Number of concentric spiral rings requested by the density setting.
    #[must_use]
    pub const fn spiral_rings(&self) -> usize {
        self.spiral_rings
    }

    /// Distance from the centroid to the farthest anchor.
    #[must_use]
    pub const fn max_radius(&self) -> f32 {
        self.max_radius
    }

    /// Whether every thread has been fully built.
    #[must_use]
    pub const fn is_built(&self) -> bool {
        self.built
    }

    /// Mean build progress across all threads.
    #[must_use]
    pub fn build_fraction(&self) -> f32 {
        let count = self.thread_count();
        if count == 0 {
            return 1.0;
        }
        self.iter_threads().map(Thread::progress).sum::<f32>() / count as f32
    }

    /// Re-evaluates the `built` flag; once set it stays set.
    pub fn refresh_built(&mut self) -> bool {
        if !self.built && self.iter_threads().all(Thread::is_complete) {
            self.built = true;
        }
        self.built
    }

    /// First thread, in build order, that is not yet complete.
    pub fn first_incomplete_mut(&mut self) -> Option<&mut Thread> {
        self.frame
            .iter_mut()
            .chain(self.radial.iter_mut())
            .chain(self.spiral.iter_mut())
            .find(|thread| !thread.is_complete())
    }
}

/// Number of subdivision radials per anchor pair: `floor(floor(3 + density·12) / anchors)`.
#[must_use]
pub fn subdivisions_per_pair(density: f32, anchor_count: usize) -> usize {
    if anchor_count == 0 {
        return 0;
    }
    let density_count = (3.0 + sanitize_density(density) * 12.0).floor() as usize;
    density_count / anchor_count
}

/// Number of spiral rings: `floor(4 + density·18)`.
#[must_use]
pub fn spiral_ring_count(density: f32) -> usize {
    (4.0 + sanitize_density(density) * 18.0).floor() as usize
}

fn sanitize_density(density: f32) -> f32 {
    if density.is_nan() {
        0.0
    } else {
        density.clamp(0.0, 1.0)
    }
}

/// Generate the web spanned by `anchors` at the given `density` in `[0, 1]`.
///
/// Returns `None` for fewer than [`MIN_ANCHORS`] anchors. The result depends only on
/// the inputs, so regenerating from the same anchors yields identical geometry.
#[must_use]
pub fn generate_web(anchors: &[Position], density: f32) -> Option<Web> {
    if anchors.len() < MIN_ANCHORS {
        return None;
    }
    let center = centroid(anchors);
    let sorted_indices = sort_by_angle(center, anchors);
    let sorted: Vec<Position> = sorted_indices.iter().map(|&idx| anchors[idx]).collect();
    let count = sorted.len();

    let frame: Vec<Thread> = (0..count)
        .map(|i| Thread::new(sorted[i], sorted[(i + 1) % count], ThreadKind::Frame))
        .collect();

    let subdivisions = subdivisions_per_pair(density, count);
    let mut radial = Vec::with_capacity(count * (subdivisions + 1));
    for i in 0..count {
        let here = sorted[i];
        let next = sorted[(i + 1) % count];
        radial.push(Thread::new(center, here, ThreadKind::Radial));
        for j in 1..=subdivisions {
            let t = j as f32 / (subdivisions + 1) as f32;
            radial.push(Thread::new(center, lerp(here, next, t), ThreadKind::Radial));
        }
    }

    let max_radius = sorted
        .iter()
        .map(|&anchor| distance(center, anchor))
        .fold(0.0_f32, f32::max);
    let spiral_rings = spiral_ring_count(density);
    let spiral = spiral_threads(&radial, max_radius, spiral_rings);

    Some(Web {
        centroid: center,
        anchors: sorted,
        sorted_indices,
        frame,
        radial,
        spiral,
        subdivisions,
        spiral_rings,
        max_radius,
        built: false,
    })
}

fn sort_by_angle(center: Position, anchors: &[Position]) -> Vec<usize> {
    let mut keyed: Vec<(f32, f32, usize)> = anchors
        .iter()
        .enumerate()
        .map(|(idx, &anchor)| (polar_angle(center, anchor), distance(center, anchor), idx))
        .collect();
    keyed.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then_with(|| a.1.total_cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });
    keyed.into_iter().map(|(_, _, idx)| idx).collect()
}

/// Radials usable for spiral placement: long enough, and not stacked on the previous one.
fn spiral_spokes(radials: &[Thread]) -> Vec<(Position, Position, f32)> {
    let mut spokes: Vec<(Position, Position, f32)> = Vec::with_capacity(radials.len());
    for radial in radials {
        let length = radial.length();
        if length.is_nan() || length < MIN_RADIAL_LENGTH {
            continue;
        }
        if let Some(&(_, prev_to, _)) = spokes.last()
            && distance(prev_to, radial.to) < MIN_RADIAL_LENGTH
        {
            continue;
        }
        spokes.push((radial.from, radial.to, length));
    }
    if spokes.len() > 1 {
        let first = spokes[0].1;
        if let Some(&(_, last, _)) = spokes.last()
            && distance(first, last) < MIN_RADIAL_LENGTH
        {
            spokes.pop();
        }
    }
    spokes
}

fn spiral_threads(radials: &[Thread], max_radius: f32, rings: usize) -> Vec<Thread> {
    let spokes = spiral_spokes(radials);
    let mut threads = Vec::new();
    if spokes.len() < 2 {
        return threads;
    }
    let mut points = Vec::with_capacity(spokes.len());
    for ring in 1..=rings {
        let radius = max_radius * ring as f32 / (rings + 1) as f32;
        points.clear();
        points.extend(spokes.iter().map(|&(from, to, length)| {
            let t = (radius / length).min(1.0);
            lerp(from, to, t)
        }));
        let segments = match points.len().cmp(&2) {
            Ordering::Less => 0,
            Ordering::Equal => 1,
            Ordering::Greater => points.len(),
        };
        for i in 0..segments {
            let next = (i + 1) % points.len();
            threads.push(Thread::spiral(points[i], points[next], ring as u32));
        }
    }
    threads
}
