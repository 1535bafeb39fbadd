//! Spider traversal: per-spider state machine walking the web's threads.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::trace;

use crate::Position;
use crate::geometry::{sag_magnitude, sag_point};
use crate::topology::{ThreadKind, Web};

/// Fraction of a thread covered per nominal frame at unit speed.
pub const THREAD_STEP: f32 = 0.03;
/// Share of a spider's advance that is woven into the thread it walks.
pub const PROGRESS_COUPLING: f32 = 0.35;
/// Chance that a finished spiral pass wanders back onto the radials.
pub const WANDER_RADIAL_CHANCE: f64 = 0.3;
/// Default number of trailing positions kept per spider.
pub const DEFAULT_TRAIL_CAPACITY: usize = 12;
/// Range of the per-spider speed multiplier sampled at spawn.
pub const SPIDER_SPEED_RANGE: std::ops::Range<f32> = 0.7..1.3;

/// Maps the global `spider_speed` control in `[0, 1]` onto a movement multiplier.
#[must_use]
pub fn speed_multiplier(spider_speed: f32) -> f32 {
    let speed = if spider_speed.is_nan() {
        0.0
    } else {
        spider_speed.clamp(0.0, 1.0)
    };
    0.25 + speed * 1.5
}

/// Number of spiders living on a web spanned by `anchor_count` anchors.
#[must_use]
pub fn population_for(anchor_count: usize, max_spiders: usize) -> usize {
    if anchor_count < crate::topology::MIN_ANCHORS {
        return 0;
    }
    (1 + anchor_count / 3).min(max_spiders)
}

/// Controls read by the traversal engine each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraversalParams {
    pub spider_speed: f32,
    pub tension: f32,
}

/// A kind change or index step applied when a spider finishes a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ThreadKind,
    pub to: ThreadKind,
    pub index: usize,
}

impl Transition {
    /// Whether the spider moved to another thread category.
    #[must_use]
    pub fn changed_kind(&self) -> bool {
        self.from != self.to
    }
}

/// Runtime state of one spider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Spider {
    position: Position,
    kind: ThreadKind,
    index: usize,
    thread_t: f32,
    speed: f32,
    walked: usize,
    wandering: bool,
    trail: VecDeque<Position>,
    trail_capacity: usize,
}

impl Spider {
    /// Place a spider at the start of frame thread `index`.
    #[must_use]
    pub fn new(web: &Web, index: usize, speed: f32, trail_capacity: usize) -> Self {
        let frame = web.frame();
        let index = if frame.is_empty() { 0 } else { index % frame.len() };
        let position = frame
            .get(index)
            .map_or_else(|| web.centroid(), |thread| thread.from());
        Self {
            position,
            kind: ThreadKind::Frame,
            index,
            thread_t: 0.0,
            speed,
            walked: 0,
            wandering: false,
            trail: VecDeque::with_capacity(trail_capacity),
            trail_capacity: trail_capacity.max(1),
        }
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Category of the thread currently walked.
    #[must_use]
    pub const fn kind(&self) -> ThreadKind {
        self.kind
    }

    /// Index into the current category's thread sequence.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Parametric position along the current thread, before sag.
    #[must_use]
    pub const fn thread_t(&self) -> f32 {
        self.thread_t
    }

    /// Per-spider speed multiplier.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// True once the spider has finished its first spiral pass.
    #[must_use]
    pub const fn is_wandering(&self) -> bool {
        self.wandering
    }

    /// Recent positions, oldest first.
    pub fn trail(&self) -> impl ExactSizeIterator<Item = &Position> + '_ {
        self.trail.iter()
    }

    fn push_trail(&mut self, position: Position) {
        while self.trail.len() >= self.trail_capacity.max(1) {
            self.trail.pop_front();
        }
        self.trail.push_back(position);
    }

    /// Applies the category state machine after the current thread is finished.
    fn complete_thread(&mut self, web: &Web, rng: &mut dyn RngCore) -> Transition {
        let from = self.kind;
        let len = web.threads(from).len();
        self.walked += 1;
        if self.walked < len {
            self.index = (self.index + 1) % len;
            return Transition {
                from,
                to: from,
                index: self.index,
            };
        }

        self.walked = 0;
        let (to, index) = match from {
            ThreadKind::Frame => (ThreadKind::Radial, 0),
            ThreadKind::Radial => (ThreadKind::Spiral, 0),
            ThreadKind::Spiral => {
                self.wandering = true;
                let to = if rng.random_bool(WANDER_RADIAL_CHANCE) {
                    ThreadKind::Radial
                } else {
                    ThreadKind::Spiral
                };
                let available = web.threads(to).len();
                let index = if available > 0 {
                    rng.random_range(0..available)
                } else {
                    0
                };
                (to, index)
            }
        };
        self.kind = to;
        self.index = index;
        trace!(from = from.as_str(), to = to.as_str(), index, "spider changed thread kind");
        Transition { from, to, index }
    }
}

/// Spawns the spider population for a freshly generated web.
///
/// Spiders are spread evenly over the frame threads and each draws its own speed
/// multiplier from `rng`.
pub fn spawn_spiders(
    web: &Web,
    count: usize,
    trail_capacity: usize,
    rng: &mut dyn RngCore,
) -> Vec<Spider> {
    let frames = web.frame().len().max(1);
    (0..count)
        .map(|k| {
            let start = k * frames / count.max(1);
            let speed = rng.random_range(SPIDER_SPEED_RANGE);
            Spider::new(web, start, speed, trail_capacity)
        })
        .collect()
}

/// Advances one spider by `delta` nominal frames.
///
/// Side effect: the thread under the spider gains `PROGRESS_COUPLING` of the
/// distance walked as build progress, which is why the web is borrowed mutably.
/// A spider whose current category is empty holds its position.
pub fn advance_spider(
    spider: &mut Spider,
    web: &mut Web,
    params: TraversalParams,
    delta: f32,
    rng: &mut dyn RngCore,
) -> Option<Transition> {
    let len = web.threads(spider.kind).len();
    if len == 0 {
        return None;
    }
    if spider.index >= len {
        spider.index %= len;
    }

    let mut advance = spider.speed * speed_multiplier(params.spider_speed) * delta * THREAD_STEP;
    if !advance.is_finite() || advance < 0.0 {
        advance = 0.0;
    }
    spider.thread_t += advance;

    let thread = &mut web.threads_mut(spider.kind)[spider.index];
    thread.advance_progress(advance * PROGRESS_COUPLING);
    let t = spider.thread_t.clamp(0.0, 1.0);
    let sag = sag_magnitude(thread.length(), params.tension);
    spider.position = sag_point(thread.from(), thread.to(), t, sag);
    spider.push_trail(spider.position);

    if spider.thread_t >= 1.0 {
        let transition = spider.complete_thread(web, rng);
        spider.thread_t = 0.0;
        return Some(transition);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::generate_web;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    const PARAMS: TraversalParams = TraversalParams {
        spider_speed: 0.5,
        tension: 0.5,
    };

    fn web() -> Web {
        generate_web(
            &[
                Position::new(0.0, 0.0),
                Position::new(100.0, 0.0),
                Position::new(50.0, 100.0),
            ],
            0.5,
        )
        .expect("web")
    }

    #[test]
    fn population_scales_with_anchors() {
        assert_eq!(population_for(2, 6), 0);
        assert_eq!(population_for(3, 6), 2);
        assert_eq!(population_for(9, 6), 4);
        assert_eq!(population_for(40, 6), 6);
    }

    #[test]
    fn spawn_spreads_spiders_over_frame() {
        let web = web();
        let mut rng = SmallRng::seed_from_u64(1);
        let spiders = spawn_spiders(&web, 3, 8, &mut rng);
        let starts: Vec<usize> = spiders.iter().map(Spider::index).collect();
        assert_eq!(starts, vec![0, 1, 2]);
        for spider in &spiders {
            assert_eq!(spider.kind(), ThreadKind::Frame);
            assert!(SPIDER_SPEED_RANGE.contains(&spider.speed()));
            assert_eq!(spider.position(), web.frame()[spider.index()].from());
        }
    }

    #[test]
    fn spider_position_lies_on_sagging_thread() {
        let mut web = web();
        let mut rng = SmallRng::seed_from_u64(2);
        let mut spider = Spider::new(&web, 0, 1.0, 4);
        advance_spider(&mut spider, &mut web, PARAMS, 5.0, &mut rng);
        let thread = web.frame()[0];
        let expected = sag_point(
            thread.from(),
            thread.to(),
            spider.thread_t(),
            sag_magnitude(thread.length(), PARAMS.tension),
        );
        assert_eq!(spider.position(), expected);
        assert!(thread.progress() > 0.0);
        assert!(thread.progress() < spider.thread_t());
    }

    #[test]
    fn frame_pass_hands_over_to_radials_then_spirals() {
        let mut web = web();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut spider = Spider::new(&web, 1, 1.0, 4);
        let mut kinds = Vec::new();
        for _ in 0..10_000 {
            if let Some(transition) = advance_spider(&mut spider, &mut web, PARAMS, 1.0, &mut rng)
                && transition.changed_kind()
            {
                kinds.push((transition.to, transition.index));
                if kinds.len() == 2 {
                    break;
                }
            }
        }
        assert_eq!(kinds, vec![(ThreadKind::Radial, 0), (ThreadKind::Spiral, 0)]);
        assert!(!spider.is_wandering());
    }

    #[test]
    fn wandering_never_returns_to_frame() {
        let mut web = web();
        let mut rng = SmallRng::seed_from_u64(4);
        let mut spider = Spider::new(&web, 0, 1.3, 4);
        for _ in 0..200_000 {
            advance_spider(&mut spider, &mut web, PARAMS, 3.0, &mut rng);
            if spider.is_wandering() {
                assert_ne!(spider.kind(), ThreadKind::Frame);
            }
        }
        assert!(spider.is_wandering());
    }

    #[test]
    fn trail_is_bounded() {
        let mut web = web();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut spider = Spider::new(&web, 0, 1.0, 3);
        for _ in 0..10 {
            advance_spider(&mut spider, &mut web, PARAMS, 1.0, &mut rng);
        }
        assert_eq!(spider.trail().len(), 3);
        assert_eq!(spider.trail().last().copied(), Some(spider.position()));
    }

    #[test]
    fn empty_category_holds_position() {
        let point = Position::new(40.0, 40.0);
        let mut web = generate_web(&[point; 4], 0.5).expect("web");
        assert!(web.spiral().is_empty());
        let mut rng = SmallRng::seed_from_u64(7);
        let mut spider = Spider::new(&web, 0, 1.0, 4);
        for _ in 0..20_000 {
            if spider.kind() == ThreadKind::Spiral {
                break;
            }
            advance_spider(&mut spider, &mut web, PARAMS, 3.0, &mut rng);
        }
        assert_eq!(spider.kind(), ThreadKind::Spiral);

        let (position, t, index) = (spider.position(), spider.thread_t(), spider.index());
        for _ in 0..100 {
            assert_eq!(advance_spider(&mut spider, &mut web, PARAMS, 1.0, &mut rng), None);
        }
        assert_eq!(spider.position(), position);
        assert_eq!(spider.thread_t(), t);
        assert_eq!(spider.index(), index);
        assert_eq!(spider.kind(), ThreadKind::Spiral);
    }

    #[test]
    fn zero_trail_capacity_keeps_latest_position() {
        let mut web = web();
        let mut rng = SmallRng::seed_from_u64(8);
        let spider = Spider::new(&web, 0, 1.0, 3);
        let mut value = serde_json::to_value(&spider).expect("json");
        value["trail_capacity"] = serde_json::Value::from(0);
        let mut spider: Spider = serde_json::from_value(value).expect("spider");
        for _ in 0..5 {
            advance_spider(&mut spider, &mut web, PARAMS, 1.0, &mut rng);
        }
        assert_eq!(spider.trail().len(), 1);
        assert_eq!(spider.trail().last().copied(), Some(spider.position()));
    }

    #[test]
    fn negative_delta_does_not_move_spider_backwards() {
        let mut web = web();
        let mut rng = SmallRng::seed_from_u64(6);
        let mut spider = Spider::new(&web, 0, 1.0, 3);
        advance_spider(&mut spider, &mut web, PARAMS, 2.0, &mut rng);
        let before = spider.thread_t();
        advance_spider(&mut spider, &mut web, PARAMS, -5.0, &mut rng);
        advance_spider(&mut spider, &mut web, PARAMS, f32::NAN, &mut rng);
        assert_eq!(spider.thread_t(), before);
    }
}
