//! Read-only, serializable view of a [`WebState`] for presentation layers.

use serde::{Deserialize, Serialize};
use slotmap::Key;

use crate::topology::ThreadKind;
use crate::{FrameSummary, WebState};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnchorSnapshot {
    /// Stable anchor identity as exported by the slot map.
    pub id: u64,
    pub position: [f32; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSnapshot {
    pub kind: ThreadKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ring: Option<u32>,
    pub from: [f32; 2],
    pub to: [f32; 2],
    pub progress: f32,
    /// Sag depth under the tension in effect when the snapshot was taken.
    pub sag: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpiderSnapshot {
    pub position: [f32; 2],
    pub kind: ThreadKind,
    pub index: usize,
    pub thread_t: f32,
    pub trail: Vec<[f32; 2]>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebSnapshot {
    pub tick: u64,
    /// True while fewer than three anchors are placed.
    pub empty: bool,
    pub anchors: Vec<AnchorSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroid: Option<[f32; 2]>,
    pub threads: Vec<ThreadSnapshot>,
    pub spiders: Vec<SpiderSnapshot>,
    /// Peak wind displacement at thread midpoints.
    pub wind: [f32; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<FrameSummary>,
}

impl WebSnapshot {
    /// Capture the current state.
    #[must_use]
    pub fn from_state(state: &WebState) -> Self {
        let anchors = state
            .anchors()
            .iter()
            .map(|(id, position)| AnchorSnapshot {
                id: id.data().as_ffi(),
                position: [position.x, position.y],
            })
            .collect();

        let threads = state
            .web()
            .map(|web| {
                web.iter_threads()
                    .map(|thread| ThreadSnapshot {
                        kind: thread.kind(),
                        ring: thread.ring(),
                        from: [thread.from().x, thread.from().y],
                        to: [thread.to().x, thread.to().y],
                        progress: thread.progress(),
                        sag: state.sag_of(thread),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let spiders = state
            .spiders()
            .iter()
            .map(|spider| SpiderSnapshot {
                position: [spider.position().x, spider.position().y],
                kind: spider.kind(),
                index: spider.index(),
                thread_t: spider.thread_t(),
                trail: spider.trail().map(|p| [p.x, p.y]).collect(),
            })
            .collect();

        let gust = state.wind().gust();
        Self {
            tick: state.tick_count().0,
            empty: state.is_empty(),
            anchors,
            centroid: state.web().map(|web| [web.centroid().x, web.centroid().y]),
            threads,
            spiders,
            wind: [gust.x, gust.y],
            summary: state.history().last().copied(),
        }
    }
}
