//! Core types for the WebWeaver spider-web simulation.
//!
//! [`WebState`] owns the anchor set, the single generated [`Web`], and the spiders
//! walking it. Hosts feed it anchor edits, configuration and one timestamp per
//! animation frame, and read back the web and spiders for drawing.

use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};
use webweaver_index::{IndexError, NeighborhoodIndex, UniformGridIndex};

pub mod clock;
pub mod geometry;
pub mod snapshot;
pub mod topology;
pub mod traversal;

pub use clock::{SimulationClock, Tick, Wind};
pub use snapshot::{AnchorSnapshot, SpiderSnapshot, ThreadSnapshot, WebSnapshot};
pub use topology::{Thread, ThreadKind, Web, generate_web};
pub use traversal::{Spider, Transition, TraversalParams};

new_key_type! {
    /// Stable handle for anchors backed by a generational slot map.
    pub struct AnchorId;
}

/// Axis-aligned 2D position in canvas units (+y points down).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Construct a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Position {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<Position> for (f32, f32) {
    fn from(position: Position) -> Self {
        (position.x, position.y)
    }
}

/// Anchors in placement order with generational handles.
#[derive(Debug, Default)]
pub struct AnchorSet {
    slots: SlotMap<AnchorId, usize>,
    handles: Vec<AnchorId>,
    positions: Vec<Position>,
}

impl AnchorSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of anchors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true when no anchors are placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Positions in placement order.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Handles in placement order.
    #[must_use]
    pub fn handles(&self) -> &[AnchorId] {
        &self.handles
    }

    /// Iterate `(id, position)` pairs in placement order.
    pub fn iter(&self) -> impl Iterator<Item = (AnchorId, Position)> + '_ {
        self.handles.iter().copied().zip(self.positions.iter().copied())
    }

    /// Returns the dense index for `id`, if present.
    #[must_use]
    pub fn index_of(&self, id: AnchorId) -> Option<usize> {
        self.slots.get(id).copied()
    }

    /// Returns true if `id` refers to a placed anchor.
    #[must_use]
    pub fn contains(&self, id: AnchorId) -> bool {
        self.slots.contains_key(id)
    }

    /// Position of `id`.
    #[must_use]
    pub fn get(&self, id: AnchorId) -> Option<Position> {
        self.index_of(id).map(|index| self.positions[index])
    }

    /// Append an anchor and return its handle.
    pub fn insert(&mut self, position: Position) -> AnchorId {
        let index = self.positions.len();
        self.positions.push(position);
        let id = self.slots.insert(index);
        self.handles.push(id);
        id
    }

    /// Remove `id`, preserving the order of the remaining anchors.
    pub fn remove(&mut self, id: AnchorId) -> Option<Position> {
        let index = self.slots.remove(id)?;
        let removed = self.positions.remove(index);
        let removed_handle = self.handles.remove(index);
        debug_assert_eq!(removed_handle, id);
        for (offset, handle) in self.handles[index..].iter().enumerate() {
            if let Some(slot) = self.slots.get_mut(*handle) {
                *slot = index + offset;
            }
        }
        Some(removed)
    }

    /// Remove every anchor.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.handles.clear();
        self.positions.clear();
    }
}

/// Errors raised at the configuration and input boundary.
#[derive(Debug, Error, PartialEq)]
pub enum WebStateError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// An anchor with a NaN or infinite coordinate was placed.
    #[error("anchor position ({x}, {y}) is not finite")]
    NonFiniteAnchor { x: f32, y: f32 },
    /// The anchor hit-test index rejected its input.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Controls for web generation and animation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeaveConfig {
    /// Thread density in `[0, 1]`; applied when the web is next regenerated.
    pub density: f32,
    /// Thread tension in `[0, 1]`; higher values sag less.
    pub tension: f32,
    /// Global spider speed control in `[0, 1]`.
    pub spider_speed: f32,
    /// Optional RNG seed for reproducible spider behaviour.
    pub rng_seed: Option<u64>,
    /// Upper bound on the spider population.
    pub max_spiders: usize,
    /// Trailing positions remembered per spider.
    pub trail_capacity: usize,
    /// Maximum number of recent frame summaries retained in-memory.
    pub history_capacity: usize,
    /// Radius used when removing anchors by position.
    pub hit_radius: f32,
    /// Progress per nominal frame woven into the first unfinished thread.
    pub ambient_build_rate: f32,
}

impl Default for WeaveConfig {
    fn default() -> Self {
        Self {
            density: 0.5,
            tension: 0.5,
            spider_speed: 0.5,
            rng_seed: None,
            max_spiders: 6,
            trail_capacity: traversal::DEFAULT_TRAIL_CAPACITY,
            history_capacity: 120,
            hit_radius: 12.0,
            ambient_build_rate: 0.02,
        }
    }
}

impl WeaveConfig {
    /// Checks every control against its documented range.
    pub fn validate(&self) -> Result<(), WebStateError> {
        let unit = |value: f32| (0.0..=1.0).contains(&value);
        if !unit(self.density) {
            return Err(WebStateError::InvalidConfig("density must be within [0, 1]"));
        }
        if !unit(self.tension) {
            return Err(WebStateError::InvalidConfig("tension must be within [0, 1]"));
        }
        if !unit(self.spider_speed) {
            return Err(WebStateError::InvalidConfig(
                "spider_speed must be within [0, 1]",
            ));
        }
        if self.trail_capacity == 0 || self.history_capacity == 0 {
            return Err(WebStateError::InvalidConfig(
                "trail and history capacities must be non-zero",
            ));
        }
        if !(self.hit_radius.is_finite() && self.hit_radius > 0.0) {
            return Err(WebStateError::InvalidConfig("hit_radius must be positive"));
        }
        if !(self.ambient_build_rate.is_finite() && self.ambient_build_rate >= 0.0) {
            return Err(WebStateError::InvalidConfig(
                "ambient_build_rate must be non-negative",
            ));
        }
        Ok(())
    }

    /// Returns the configured RNG seed, generating one from entropy if absent.
    fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }

    fn traversal_params(&self) -> TraversalParams {
        TraversalParams {
            spider_speed: self.spider_speed,
            tension: self.tension,
        }
    }
}

/// Events emitted after processing one frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct FrameEvents {
    pub tick: Tick,
    /// Delta applied this frame, in nominal frames.
    pub delta: f32,
    /// Threads finished by spiders this frame.
    pub threads_walked: usize,
    /// Spiders that switched thread category this frame.
    pub kind_changes: usize,
    /// Whether the web became fully built during this frame.
    pub web_completed: bool,
}

/// Summary retained in the frame history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameSummary {
    pub tick: Tick,
    pub elapsed: f64,
    pub anchor_count: usize,
    pub spider_count: usize,
    pub thread_count: usize,
    pub build_fraction: f32,
    pub built: bool,
}

/// Simulation context: anchors, the current web and its spiders.
pub struct WebState {
    config: WeaveConfig,
    rng: SmallRng,
    anchors: AnchorSet,
    index: UniformGridIndex,
    web: Option<Web>,
    spiders: Vec<Spider>,
    clock: SimulationClock,
    wind: Wind,
    generation: u64,
    history: VecDeque<FrameSummary>,
}

impl fmt::Debug for WebState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebState")
            .field("config", &self.config)
            .field("tick", &self.clock.tick())
            .field("anchor_count", &self.anchors.len())
            .field("thread_count", &self.web.as_ref().map_or(0, Web::thread_count))
            .field("spider_count", &self.spiders.len())
            .finish()
    }
}

impl WebState {
    /// Instantiate an empty simulation using the supplied configuration.
    pub fn new(config: WeaveConfig) -> Result<Self, WebStateError> {
        config.validate()?;
        let rng = config.seeded_rng();
        let index = UniformGridIndex::new(config.hit_radius * 2.0);
        let history = VecDeque::with_capacity(config.history_capacity);
        Ok(Self {
            config,
            rng,
            anchors: AnchorSet::new(),
            index,
            web: None,
            spiders: Vec::new(),
            clock: SimulationClock::new(),
            wind: Wind::default(),
            generation: 0,
            history,
        })
    }

    /// Build a state and place `anchors` in order.
    pub fn with_anchors(
        config: WeaveConfig,
        anchors: impl IntoIterator<Item = Position>,
    ) -> Result<Self, WebStateError> {
        let mut state = Self::new(config)?;
        for position in anchors {
            if !position.is_finite() {
                return Err(WebStateError::NonFiniteAnchor {
                    x: position.x,
                    y: position.y,
                });
            }
            state.anchors.insert(position);
        }
        state.regenerate();
        Ok(state)
    }

    /// Returns an immutable reference to configuration.
    #[must_use]
    pub fn config(&self) -> &WeaveConfig {
        &self.config
    }

    /// Replace the configuration. Tension and speed apply on the next tick, density
    /// on the next regeneration. A different `rng_seed` reseeds the RNG and
    /// regenerates so the run continues reproducibly from here.
    pub fn set_config(&mut self, config: WeaveConfig) -> Result<(), WebStateError> {
        config.validate()?;
        let reseed = config.rng_seed != self.config.rng_seed;
        if config.hit_radius != self.config.hit_radius {
            self.index = UniformGridIndex::new(config.hit_radius * 2.0);
            self.config = config;
            self.rebuild_index();
        } else {
            self.config = config;
        }
        while self.history.len() > self.config.history_capacity {
            self.history.pop_front();
        }
        if reseed {
            self.rng = self.config.seeded_rng();
            self.regenerate();
        }
        Ok(())
    }

    /// Place an anchor and regenerate the web.
    pub fn add_anchor(&mut self, position: Position) -> Result<AnchorId, WebStateError> {
        if !position.is_finite() {
            return Err(WebStateError::NonFiniteAnchor {
                x: position.x,
                y: position.y,
            });
        }
        let id = self.anchors.insert(position);
        self.regenerate();
        Ok(id)
    }

    /// Remove an anchor by handle, regenerating the web if it existed.
    pub fn remove_anchor(&mut self, id: AnchorId) -> Option<Position> {
        let removed = self.anchors.remove(id)?;
        self.regenerate();
        Some(removed)
    }

    /// Remove the anchor closest to `position` within `radius`.
    pub fn remove_anchor_near(&mut self, position: Position, radius: f32) -> Option<AnchorId> {
        let id = self.anchor_near(position, radius)?;
        self.remove_anchor(id)?;
        Some(id)
    }

    /// Closest anchor to `position` within `radius`, if any.
    #[must_use]
    pub fn anchor_near(&self, position: Position, radius: f32) -> Option<AnchorId> {
        let (index, _) = self.index.nearest_within(position.into(), radius)?;
        self.anchors.handles().get(index).copied()
    }

    /// Remove every anchor, leaving an empty web.
    pub fn clear_anchors(&mut self) {
        self.anchors.clear();
        self.regenerate();
    }

    /// Throw away the web and spiders and rebuild both from the current anchors.
    ///
    /// Thread progress and spider state never survive this call.
    pub fn regenerate(&mut self) {
        self.rebuild_index();
        self.generation += 1;
        self.web = generate_web(self.anchors.positions(), self.config.density);
        self.spiders = match &self.web {
            Some(web) => {
                let count = traversal::population_for(self.anchors.len(), self.config.max_spiders);
                traversal::spawn_spiders(web, count, self.config.trail_capacity, &mut self.rng)
            }
            None => Vec::new(),
        };
        debug!(
            generation = self.generation,
            anchors = self.anchors.len(),
            threads = self.web.as_ref().map_or(0, Web::thread_count),
            spiders = self.spiders.len(),
            "regenerated web"
        );
    }

    fn rebuild_index(&mut self) {
        let points: Vec<(f32, f32)> = self.anchors.positions().iter().map(|&p| p.into()).collect();
        if let Err(err) = self.index.rebuild(&points) {
            warn!(%err, "anchor index rebuild failed; hit-testing disabled");
        }
    }

    /// Reseed the RNG and regenerate, keeping anchors and configuration.
    pub fn reset(&mut self, seed: Option<u64>) {
        self.config.rng_seed = seed;
        self.rng = self.config.seeded_rng();
        self.clock.reset();
        self.wind = Wind::default();
        self.history.clear();
        self.regenerate();
    }

    /// Advance one animation frame given the host's timestamp in milliseconds.
    pub fn tick(&mut self, timestamp_ms: f64) -> FrameEvents {
        let delta = self.clock.delta_for(timestamp_ms);
        self.step(delta)
    }

    /// Forget the previous timestamp, e.g. while the host stops scheduling frames.
    pub fn suspend(&mut self) {
        self.clock.suspend();
    }

    /// Execute one frame pipeline with an explicit delta in nominal frames.
    pub fn step(&mut self, delta: f32) -> FrameEvents {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        let tick = self.clock.advance(delta);
        self.wind.advance(delta);

        let mut events = FrameEvents {
            tick,
            delta,
            ..FrameEvents::default()
        };
        if let Some(web) = self.web.as_mut() {
            let was_built = web.is_built();
            stage_ambient_build(web, self.config.ambient_build_rate * delta);
            let params = self.config.traversal_params();
            for spider in &mut self.spiders {
                if let Some(transition) =
                    traversal::advance_spider(spider, web, params, delta, &mut self.rng)
                {
                    events.threads_walked += 1;
                    if transition.changed_kind() {
                        events.kind_changes += 1;
                    }
                }
            }
            events.web_completed = !was_built && web.refresh_built();
        }
        self.record_history(tick);
        events
    }

    fn record_history(&mut self, tick: Tick) {
        let summary = FrameSummary {
            tick,
            elapsed: self.clock.elapsed(),
            anchor_count: self.anchors.len(),
            spider_count: self.spiders.len(),
            thread_count: self.web.as_ref().map_or(0, Web::thread_count),
            build_fraction: self.web.as_ref().map_or(0.0, Web::build_fraction),
            built: self.web.as_ref().is_some_and(Web::is_built),
        };
        while self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(summary);
    }

    /// The current web, or `None` while fewer than three anchors are placed.
    #[must_use]
    pub fn web(&self) -> Option<&Web> {
        self.web.as_ref()
    }

    /// True when there is no web to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.web.is_none()
    }

    /// Spiders on the current web.
    #[must_use]
    pub fn spiders(&self) -> &[Spider] {
        &self.spiders
    }

    /// Placed anchors.
    #[must_use]
    pub fn anchors(&self) -> &AnchorSet {
        &self.anchors
    }

    /// Render-only wind oscillator.
    #[must_use]
    pub const fn wind(&self) -> Wind {
        self.wind
    }

    /// Current simulation tick.
    #[must_use]
    pub const fn tick_count(&self) -> Tick {
        self.clock.tick()
    }

    /// Simulated time in nominal frames.
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    /// Number of regenerations performed so far.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Iterate over retained frame summaries.
    pub fn history(&self) -> impl Iterator<Item = &FrameSummary> {
        self.history.iter()
    }

    /// Serializable view of the current frame.
    #[must_use]
    pub fn snapshot(&self) -> WebSnapshot {
        WebSnapshot::from_state(self)
    }

    /// Sag depth of `thread` under the current tension.
    #[must_use]
    pub fn sag_of(&self, thread: &Thread) -> f32 {
        geometry::sag_magnitude(thread.length(), self.config.tension)
    }
}

/// Weaves `amount` into the first unfinished thread, frame first, then radial, then spiral.
fn stage_ambient_build(web: &mut Web, amount: f32) {
    if let Some(thread) = web.first_incomplete_mut() {
        thread.advance_progress(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> WeaveConfig {
        WeaveConfig {
            rng_seed: Some(42),
            ..WeaveConfig::default()
        }
    }

    fn triangle() -> [Position; 3] {
        [
            Position::new(0.0, 0.0),
            Position::new(100.0, 0.0),
            Position::new(50.0, 100.0),
        ]
    }

    #[test]
    fn anchor_set_preserves_order_across_removal() {
        let mut set = AnchorSet::new();
        let a = set.insert(Position::new(0.0, 0.0));
        let b = set.insert(Position::new(1.0, 0.0));
        let c = set.insert(Position::new(2.0, 0.0));
        assert_eq!(set.remove(b), Some(Position::new(1.0, 0.0)));
        assert_eq!(set.handles(), &[a, c]);
        assert_eq!(set.index_of(c), Some(1));
        assert_eq!(set.get(c), Some(Position::new(2.0, 0.0)));
        assert!(set.remove(b).is_none());
        let d = set.insert(Position::new(3.0, 0.0));
        assert_ne!(b, d, "generational handles should not be reused immediately");
    }

    #[test]
    fn config_validation_rejects_out_of_range_controls() {
        let bad = WeaveConfig {
            density: 1.5,
            ..WeaveConfig::default()
        };
        assert_eq!(
            bad.validate(),
            Err(WebStateError::InvalidConfig("density must be within [0, 1]"))
        );
        let nan = WeaveConfig {
            tension: f32::NAN,
            ..WeaveConfig::default()
        };
        assert!(nan.validate().is_err());
        assert!(WebState::new(nan).is_err());
        assert!(WeaveConfig::default().validate().is_ok());
    }

    #[test]
    fn web_appears_with_third_anchor_and_vanishes_below_it() {
        let mut state = WebState::new(seeded()).expect("state");
        let [a, b, c] = triangle();
        state.add_anchor(a).expect("anchor");
        let second = state.add_anchor(b).expect("anchor");
        assert!(state.is_empty());
        assert!(state.spiders().is_empty());
        state.add_anchor(c).expect("anchor");
        assert!(!state.is_empty());
        assert_eq!(state.spiders().len(), 2);
        state.remove_anchor(second).expect("removed");
        assert!(state.web().is_none());
        assert!(state.spiders().is_empty());
    }

    #[test]
    fn non_finite_anchor_is_rejected() {
        let mut state = WebState::new(seeded()).expect("state");
        let err = state
            .add_anchor(Position::new(f32::INFINITY, 0.0))
            .expect_err("rejected");
        assert!(matches!(err, WebStateError::NonFiniteAnchor { .. }));
        assert!(state.anchors().is_empty());
    }

    #[test]
    fn regeneration_discards_progress() {
        let mut state = WebState::with_anchors(seeded(), triangle()).expect("state");
        for _ in 0..50 {
            state.step(1.0);
        }
        let web = state.web().expect("web");
        assert!(web.build_fraction() > 0.0);
        let before = web.clone();
        state.add_anchor(Position::new(120.0, 90.0)).expect("anchor");
        let after = state.web().expect("web");
        assert!(after.iter_threads().all(|thread| thread.progress() == 0.0));
        assert_ne!(before.frame().len(), after.frame().len());
        assert_eq!(state.generation(), 2);
    }

    #[test]
    fn remove_anchor_near_picks_closest() {
        let mut state = WebState::with_anchors(seeded(), triangle()).expect("state");
        let target = state.anchors().handles()[1];
        let removed = state.remove_anchor_near(Position::new(97.0, 2.0), 12.0);
        assert_eq!(removed, Some(target));
        assert_eq!(state.anchors().len(), 2);
        assert!(state.remove_anchor_near(Position::new(500.0, 500.0), 12.0).is_none());
    }

    #[test]
    fn ambient_build_runs_in_frame_order() {
        let config = WeaveConfig {
            max_spiders: 0,
            ambient_build_rate: 0.5,
            ..seeded()
        };
        let mut state = WebState::with_anchors(config, triangle()).expect("state");
        assert!(state.spiders().is_empty());
        state.step(1.0);
        let web = state.web().expect("web");
        assert_eq!(web.frame()[0].progress(), 0.5);
        assert_eq!(web.frame()[1].progress(), 0.0);
        state.step(2.0);
        let web = state.web().expect("web");
        assert!(web.frame()[0].is_complete());
        assert_eq!(web.frame()[1].progress(), 0.0);
    }

    #[test]
    fn web_eventually_completes() {
        let config = WeaveConfig {
            density: 0.0,
            ambient_build_rate: 1.0,
            ..seeded()
        };
        let mut state = WebState::with_anchors(config, triangle()).expect("state");
        let mut completed = 0;
        for _ in 0..10_000 {
            if state.step(1.0).web_completed {
                completed += 1;
            }
        }
        assert_eq!(completed, 1);
        assert!(state.web().expect("web").is_built());
        assert!(state.history().last().expect("summary").built);
    }

    #[test]
    fn history_is_bounded() {
        let config = WeaveConfig {
            history_capacity: 4,
            ..seeded()
        };
        let mut state = WebState::with_anchors(config, triangle()).expect("state");
        for _ in 0..10 {
            state.step(1.0);
        }
        let ticks: Vec<u64> = state.history().map(|summary| summary.tick.0).collect();
        assert_eq!(ticks, vec![7, 8, 9, 10]);
    }

    #[test]
    fn tick_clamps_host_timestamps() {
        let mut state = WebState::with_anchors(seeded(), triangle()).expect("state");
        assert_eq!(state.tick(1_000.0).delta, 1.0);
        assert_eq!(state.tick(90_000.0).delta, clock::MAX_FRAME_DELTA);
        assert_eq!(state.tick_count(), Tick(2));
        assert!((state.elapsed() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn changing_seed_reseeds_and_regenerates() {
        let entropy = WeaveConfig::default();
        let mut a = WebState::with_anchors(entropy.clone(), triangle()).expect("a");
        let mut b = WebState::with_anchors(entropy, triangle()).expect("b");
        for state in [&mut a, &mut b] {
            let config = WeaveConfig {
                rng_seed: Some(7),
                ..state.config().clone()
            };
            state.set_config(config).expect("config");
            assert_eq!(state.generation(), 2);
            for _ in 0..1_500 {
                state.step(1.0);
            }
        }
        assert_eq!(a.spiders(), b.spiders());

        let same = a.config().clone();
        a.set_config(same).expect("config");
        assert_eq!(a.generation(), 2);
    }

    #[test]
    fn reset_keeps_anchors_and_replays_identically() {
        let mut state = WebState::with_anchors(seeded(), triangle()).expect("state");
        for _ in 0..300 {
            state.step(1.0);
        }
        let first: Vec<Spider> = state.spiders().to_vec();
        state.reset(Some(42));
        for _ in 0..300 {
            state.step(1.0);
        }
        assert_eq!(state.anchors().len(), 3);
        assert_eq!(state.tick_count(), Tick(300));
        assert_eq!(state.spiders(), first.as_slice());
    }
}
