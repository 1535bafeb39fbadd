//! Offline frame driver used by the `webweaver` binary and tests.

use anyhow::{Context, Result, ensure};
use rand::Rng;
use serde::Serialize;
use webweaver_core::clock::FRAME_INTERVAL_MS;
use webweaver_core::{Position, Tick, WebState};

/// Parse an anchor written as `x,y`.
pub fn parse_anchor(text: &str) -> Result<Position> {
    let (x, y) = text
        .split_once(',')
        .with_context(|| format!("anchor '{text}' must be written as x,y"))?;
    let x: f32 = x
        .trim()
        .parse()
        .with_context(|| format!("invalid x coordinate in '{text}'"))?;
    let y: f32 = y
        .trim()
        .parse()
        .with_context(|| format!("invalid y coordinate in '{text}'"))?;
    let position = Position::new(x, y);
    ensure!(position.is_finite(), "anchor '{text}' is not finite");
    Ok(position)
}

/// Scatter `count` anchors around a jittered ring inside a `width` x `height` canvas.
pub fn ring_anchors(count: usize, width: f32, height: f32, rng: &mut impl Rng) -> Vec<Position> {
    let center = Position::new(width * 0.5, height * 0.5);
    let base = width.min(height) * 0.4;
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU
                + rng.random_range(-0.2..0.2);
            let radius = base * rng.random_range(0.75..1.0);
            Position::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect()
}

/// Aggregate counters from a headless run.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RunReport {
    pub frames: u64,
    pub threads_walked: usize,
    pub kind_changes: usize,
    /// First tick at which every thread reached full progress.
    pub completed_at: Option<Tick>,
}

/// Drive `frames` frames with synthetic 60 Hz timestamps.
pub fn run_frames(state: &mut WebState, frames: u64) -> RunReport {
    let mut report = RunReport {
        frames,
        ..RunReport::default()
    };
    let start = state.elapsed() * FRAME_INTERVAL_MS;
    for frame in 0..frames {
        let events = state.tick(start + frame as f64 * FRAME_INTERVAL_MS);
        report.threads_walked += events.threads_walked;
        report.kind_changes += events.kind_changes;
        if events.web_completed && report.completed_at.is_none() {
            report.completed_at = Some(events.tick);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use webweaver_core::WeaveConfig;

    #[test]
    fn parses_anchor_pairs() {
        assert_eq!(parse_anchor("10,20.5").expect("anchor"), Position::new(10.0, 20.5));
        assert_eq!(parse_anchor(" -3 , 4 ").expect("anchor"), Position::new(-3.0, 4.0));
        assert!(parse_anchor("10").is_err());
        assert!(parse_anchor("a,b").is_err());
        assert!(parse_anchor("inf,0").is_err());
    }

    #[test]
    fn ring_anchors_stay_on_canvas() {
        let mut rng = SmallRng::seed_from_u64(3);
        let anchors = ring_anchors(12, 800.0, 600.0, &mut rng);
        assert_eq!(anchors.len(), 12);
        for anchor in anchors {
            assert!((0.0..=800.0).contains(&anchor.x));
            assert!((0.0..=600.0).contains(&anchor.y));
        }
    }

    #[test]
    fn run_frames_counts_every_tick() {
        let config = WeaveConfig {
            rng_seed: Some(5),
            ..WeaveConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(5);
        let anchors = ring_anchors(6, 800.0, 600.0, &mut rng);
        let mut state = WebState::with_anchors(config, anchors).expect("state");

        let report = run_frames(&mut state, 300);
        assert_eq!(report.frames, 300);
        assert_eq!(state.tick_count(), Tick(300));
        assert!(report.threads_walked > 0);

        let more = run_frames(&mut state, 10);
        assert_eq!(more.frames, 10);
        assert_eq!(state.tick_count(), Tick(310));
    }
}
