#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result, ensure};
use js_sys::Uint8Array;
use postcard::to_allocvec;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use slotmap::{Key, KeyData};
use wasm_bindgen::prelude::*;
use webweaver_core::{AnchorId, Position, WeaveConfig, WebSnapshot, WebState};

#[wasm_bindgen]
pub struct SimHandle {
    inner: Rc<RefCell<Simulation>>,
}

struct Simulation {
    state: WebState,
    snapshot_format: SnapshotFormat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
enum SnapshotFormat {
    #[default]
    Json,
    Binary,
}

impl Simulation {
    fn new(options: InitOptions) -> Result<Self> {
        let snapshot_format = options.snapshot_format.unwrap_or_default();
        let anchors = options
            .anchors
            .iter()
            .map(|&[x, y]| Position::new(x, y))
            .collect::<Vec<_>>();
        let state = WebState::with_anchors(options.config(), anchors)
            .context("failed to initialize WebWeaver state")?;
        Ok(Self {
            state,
            snapshot_format,
        })
    }

    fn tick(&mut self, timestamp_ms: f64) -> WebSnapshot {
        self.state.tick(timestamp_ms);
        WebSnapshot::from_state(&self.state)
    }

    fn step(&mut self, frames: u32, delta: f32) -> WebSnapshot {
        for _ in 0..frames {
            self.state.step(delta);
        }
        WebSnapshot::from_state(&self.state)
    }

    fn snapshot(&self) -> WebSnapshot {
        WebSnapshot::from_state(&self.state)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
struct InitOptions {
    seed: Option<u64>,
    anchors: Vec<[f32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<WeaveConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot_format: Option<SnapshotFormat>,
}

impl InitOptions {
    fn config(&self) -> WeaveConfig {
        let mut config = self.config.clone().unwrap_or_default();
        if self.seed.is_some() {
            config.rng_seed = self.seed;
        }
        config
    }
}

/// Partial control update sent by slider callbacks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ControlPatch {
    density: Option<f32>,
    tension: Option<f32>,
    spider_speed: Option<f32>,
}

impl ControlPatch {
    fn apply(&self, mut config: WeaveConfig) -> WeaveConfig {
        if let Some(density) = self.density {
            config.density = density;
        }
        if let Some(tension) = self.tension {
            config.tension = tension;
        }
        if let Some(speed) = self.spider_speed {
            config.spider_speed = speed;
        }
        config
    }
}

#[wasm_bindgen]
impl SimHandle {
    /// Advance one animation frame using the `requestAnimationFrame` timestamp.
    #[wasm_bindgen(js_name = tick)]
    pub fn tick_js(&self, timestamp_ms: f64) -> Result<JsValue, JsValue> {
        let mut simulation = self.inner.borrow_mut();
        let snapshot = simulation.tick(timestamp_ms);
        encode_snapshot(&snapshot, simulation.snapshot_format)
    }

    /// Advance `frames` frames with a fixed delta, ignoring wall-clock time.
    #[wasm_bindgen(js_name = step)]
    pub fn step_js(&self, frames: u32, delta: f32) -> Result<JsValue, JsValue> {
        let mut simulation = self.inner.borrow_mut();
        let snapshot = simulation.step(frames, delta);
        encode_snapshot(&snapshot, simulation.snapshot_format)
    }

    #[wasm_bindgen(js_name = snapshot)]
    pub fn snapshot_js(&self) -> Result<JsValue, JsValue> {
        let simulation = self.inner.borrow();
        let snapshot = simulation.snapshot();
        encode_snapshot(&snapshot, simulation.snapshot_format)
    }

    /// Place an anchor and return its id.
    #[wasm_bindgen(js_name = addAnchor)]
    pub fn add_anchor_js(&self, x: f32, y: f32) -> Result<f64, JsValue> {
        let mut simulation = self.inner.borrow_mut();
        let id = simulation
            .state
            .add_anchor(Position::new(x, y))
            .map_err(js_error)?;
        Ok(export_id(id))
    }

    /// Remove an anchor by id; returns whether it existed.
    #[wasm_bindgen(js_name = removeAnchor)]
    pub fn remove_anchor_js(&self, id: f64) -> Result<bool, JsValue> {
        let id = import_id(id).map_err(js_error)?;
        let mut simulation = self.inner.borrow_mut();
        Ok(simulation.state.remove_anchor(id).is_some())
    }

    /// Remove the anchor under a pointer position, using the configured hit radius.
    #[wasm_bindgen(js_name = removeAnchorAt)]
    pub fn remove_anchor_at_js(&self, x: f32, y: f32) -> Option<f64> {
        let mut simulation = self.inner.borrow_mut();
        let radius = simulation.state.config().hit_radius;
        simulation
            .state
            .remove_anchor_near(Position::new(x, y), radius)
            .map(export_id)
    }

    #[wasm_bindgen(js_name = clearAnchors)]
    pub fn clear_anchors_js(&self) {
        self.inner.borrow_mut().state.clear_anchors();
    }

    /// Apply slider values; density changes rebuild the web immediately.
    #[wasm_bindgen(js_name = setControls)]
    pub fn set_controls_js(&self, patch: JsValue) -> Result<(), JsValue> {
        let patch: ControlPatch = from_value(patch).map_err(js_error)?;
        let mut simulation = self.inner.borrow_mut();
        let previous_density = simulation.state.config().density;
        let config = patch.apply(simulation.state.config().clone());
        simulation.state.set_config(config).map_err(js_error)?;
        if simulation.state.config().density != previous_density {
            simulation.state.regenerate();
        }
        Ok(())
    }

    /// Forget the last frame timestamp, e.g. when the tab becomes hidden.
    #[wasm_bindgen(js_name = suspend)]
    pub fn suspend_js(&self) {
        self.inner.borrow_mut().state.suspend();
    }

    #[wasm_bindgen(js_name = reset)]
    pub fn reset_js(&self, seed: Option<f64>) -> Result<(), JsValue> {
        let seed = normalize_seed(seed).map_err(js_error)?;
        self.inner.borrow_mut().state.reset(seed);
        Ok(())
    }
}

#[wasm_bindgen]
pub fn init_sim(config: JsValue) -> Result<SimHandle, JsValue> {
    let options = if config.is_null() || config.is_undefined() {
        InitOptions::default()
    } else {
        from_value::<InitOptions>(config).map_err(js_error)?
    };

    if options.anchors.len() > 4_096 {
        return Err(js_error("at most 4,096 anchors are supported in the browser"));
    }

    let simulation = Simulation::new(options).map_err(js_error)?;
    Ok(SimHandle {
        inner: Rc::new(RefCell::new(simulation)),
    })
}

fn export_id(id: AnchorId) -> f64 {
    id.data().as_ffi() as f64
}

fn import_id(value: f64) -> Result<AnchorId> {
    ensure!(value.is_finite() && value >= 0.0, "anchor id must be a non-negative number");
    ensure!(value.fract() == 0.0, "anchor id must be an integer");
    Ok(KeyData::from_ffi(value as u64).into())
}

fn normalize_seed(seed: Option<f64>) -> Result<Option<u64>> {
    let Some(value) = seed else {
        return Ok(None);
    };
    ensure!(value.is_finite(), "seed must be a finite number");
    ensure!(value >= 0.0, "seed must be non-negative");
    let truncated = value.floor();
    ensure!(
        truncated <= u64::MAX as f64,
        "seed must be representable as u64"
    );
    Ok(Some(truncated as u64))
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsError::new(&err.to_string()).into()
}

fn encode_snapshot(snapshot: &WebSnapshot, format: SnapshotFormat) -> Result<JsValue, JsValue> {
    match format {
        SnapshotFormat::Json => to_value(snapshot).map_err(js_error),
        SnapshotFormat::Binary => {
            let bytes = to_allocvec(snapshot).map_err(|err| js_error(err.to_string()))?;
            Ok(Uint8Array::from(bytes.as_slice()).into())
        }
    }
}

#[wasm_bindgen]
pub fn version() -> String {
    format!("webweaver-web {}", env!("CARGO_PKG_VERSION"))
}

#[wasm_bindgen]
pub fn default_init_options() -> Result<JsValue, JsValue> {
    to_value(&InitOptions::default()).map_err(js_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn options(seed: u64) -> InitOptions {
        InitOptions {
            seed: Some(seed),
            anchors: vec![[40.0, 40.0], [360.0, 60.0], [300.0, 320.0], [80.0, 280.0]],
            ..InitOptions::default()
        }
    }

    #[wasm_bindgen_test]
    fn wasm_harness_matches_native_state() {
        for (seed, frames) in [(8102_u64, 24_u32), (1337, 240), (202501, 600)] {
            let config = options(seed).config();
            let anchors = options(seed)
                .anchors
                .iter()
                .map(|&[x, y]| Position::new(x, y))
                .collect::<Vec<_>>();
            let mut native = WebState::with_anchors(config, anchors).expect("native state");
            for _ in 0..frames {
                native.step(1.0);
            }
            let native_snapshot = WebSnapshot::from_state(&native);

            let mut sim = Simulation::new(options(seed)).expect("sim");
            let wasm_snapshot = sim.step(frames, 1.0);

            assert_eq!(native_snapshot, wasm_snapshot);
        }
    }

    #[wasm_bindgen_test]
    fn anchor_ids_round_trip_through_js_numbers() {
        let handle = init_sim(JsValue::NULL).expect("handle");
        let id = handle.add_anchor_js(10.0, 10.0).expect("anchor");
        assert!(handle.remove_anchor_js(id).expect("remove"));
        assert!(!handle.remove_anchor_js(id).expect("second remove"));
        assert!(handle.remove_anchor_js(-1.0).is_err());
    }

    #[wasm_bindgen_test]
    fn control_patch_rejects_out_of_range_values() {
        let handle = init_sim(JsValue::NULL).expect("handle");
        let patch = to_value(&speed_patch(1.5)).expect("patch");
        assert!(handle.set_controls_js(patch).is_err());
        let patch = to_value(&speed_patch(0.25)).expect("patch");
        assert!(handle.set_controls_js(patch).is_ok());
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct PatchFixture {
        spider_speed: f32,
    }

    fn speed_patch(spider_speed: f32) -> PatchFixture {
        PatchFixture { spider_speed }
    }
}
