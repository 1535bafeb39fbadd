//! Shared application plumbing for the WebWeaver headless driver.

use std::sync::{Arc, Mutex};

use webweaver_core::WebState;

pub type SharedWeb = Arc<Mutex<WebState>>;

pub mod control;
pub mod headless;

pub use control::{ConfigSnapshot, ControlError, ControlHandle, KnobEntry, KnobKind, KnobUpdate};
pub use headless::{RunReport, parse_anchor, ring_anchors, run_frames};
