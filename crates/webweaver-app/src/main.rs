use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use rand::{SeedableRng, rngs::SmallRng};
use tracing::{info, warn};
use webweaver_app::{ControlHandle, KnobUpdate, parse_anchor, ring_anchors, run_frames};
use webweaver_core::{WeaveConfig, WebState};

#[derive(Parser, Debug)]
#[command(
    name = "webweaver",
    version,
    about = "Weave a spider web headlessly and report how it evolves"
)]
struct Cli {
    /// Number of anchors scattered on a ring when no --anchor is given.
    #[arg(long, default_value_t = 6)]
    anchors: usize,
    /// Explicit anchor as `x,y`; repeat to place several.
    #[arg(long = "anchor", value_name = "X,Y")]
    anchor_points: Vec<String>,
    /// Frames to simulate at 60 Hz.
    #[arg(long, default_value_t = 600)]
    frames: u64,
    #[arg(long, env = "WEBWEAVER_DENSITY")]
    density: Option<f32>,
    #[arg(long, env = "WEBWEAVER_TENSION")]
    tension: Option<f32>,
    #[arg(long, env = "WEBWEAVER_SPEED")]
    speed: Option<f32>,
    /// RNG seed; entropy is used when omitted.
    #[arg(long, env = "WEBWEAVER_SEED")]
    seed: Option<u64>,
    /// Extra configuration knobs as `path=value`, applied after the flags.
    #[arg(long = "set", value_name = "PATH=VALUE")]
    knobs: Vec<String>,
    /// Print the final snapshot as JSON on stdout.
    #[arg(long)]
    json: bool,
    /// Print every configuration knob and exit.
    #[arg(long)]
    list_knobs: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = WeaveConfig {
        rng_seed: cli.seed,
        ..WeaveConfig::default()
    };
    if let Some(density) = cli.density {
        config.density = density;
    }
    if let Some(tension) = cli.tension {
        config.tension = tension;
    }
    if let Some(speed) = cli.speed {
        config.spider_speed = speed;
    }

    let anchors = if cli.anchor_points.is_empty() {
        let mut rng = SmallRng::seed_from_u64(cli.seed.unwrap_or(0x5EB0_7EA5_u64));
        ring_anchors(cli.anchors, 800.0, 600.0, &mut rng)
    } else {
        cli.anchor_points
            .iter()
            .map(String::as_str)
            .map(parse_anchor)
            .collect::<Result<Vec<_>>>()?
    };

    let state = WebState::with_anchors(config, anchors).context("failed to build web state")?;
    let control = ControlHandle::new(Arc::new(Mutex::new(state)));

    if !cli.knobs.is_empty() {
        let updates = cli
            .knobs
            .iter()
            .map(String::as_str)
            .map(KnobUpdate::parse)
            .collect::<Result<Vec<_>, _>>()?;
        control
            .apply_updates(&updates)
            .context("failed to apply configuration knobs")?;
    }

    if cli.list_knobs {
        for knob in control.list_knobs()? {
            println!("{} = {}", knob.path, knob.value);
        }
        return Ok(());
    }

    let mut state = control.lock_web()?;
    if state.is_empty() {
        warn!(
            anchors = state.anchors().len(),
            "fewer than three anchors; nothing will be woven"
        );
    }

    let report = run_frames(&mut state, cli.frames);
    if let Some(summary) = state.history().last() {
        info!(
            tick = summary.tick.0,
            anchors = summary.anchor_count,
            spiders = summary.spider_count,
            threads = summary.thread_count,
            build_fraction = summary.build_fraction,
            threads_walked = report.threads_walked,
            kind_changes = report.kind_changes,
            completed_at = report.completed_at.map(|tick| tick.0),
            "Finished weaving run",
        );
    } else {
        warn!("Run completed without frame summaries");
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&state.snapshot())
            .context("failed to serialize snapshot")?;
        println!("{json}");
    }

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
