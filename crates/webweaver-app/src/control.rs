use std::sync::{MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use webweaver_core::{WeaveConfig, WebState, WebStateError};

use crate::SharedWeb;

/// Snapshot of configuration state returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub tick: u64,
    pub generation: u64,
    pub config: Value,
}

impl ConfigSnapshot {
    fn from_state(state: &WebState) -> Result<Self, ControlError> {
        let config = serde_json::to_value(state.config()).map_err(ControlError::serialization)?;
        Ok(Self {
            tick: state.tick_count().0,
            generation: state.generation(),
            config,
        })
    }
}

/// Primitive type of a knob.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KnobKind {
    Number,
    Integer,
    Boolean,
    String,
    Null,
}

/// Public descriptor for a single configuration knob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnobEntry {
    pub path: String,
    pub kind: KnobKind,
    pub value: Value,
}

/// Request payload for updating a configuration knob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnobUpdate {
    pub path: String,
    pub value: Value,
}

impl KnobUpdate {
    /// Parse `path=value`, reading the value as JSON with a raw string fallback.
    pub fn parse(text: &str) -> Result<Self, ControlError> {
        let Some((path, raw)) = text.split_once('=') else {
            return Err(ControlError::InvalidPatch(format!(
                "expected path=value, got '{text}'"
            )));
        };
        let path = path.trim();
        if path.is_empty() {
            return Err(ControlError::InvalidPatch("empty knob path".into()));
        }
        let raw = raw.trim();
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
        Ok(Self {
            path: path.to_owned(),
            value,
        })
    }
}

/// Errors produced when reading or mutating configuration.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("failed to lock web state")]
    Lock,
    #[error("{0}")]
    InvalidPatch(String),
    #[error("unknown knob path: {0}")]
    UnknownPath(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("configuration rejected: {0}")]
    Rejected(#[from] WebStateError),
}

impl ControlError {
    fn serialization(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<PoisonError<MutexGuard<'_, WebState>>> for ControlError {
    fn from(_: PoisonError<MutexGuard<'_, WebState>>) -> Self {
        ControlError::Lock
    }
}

/// Shared handle for inspecting and patching a running simulation.
#[derive(Clone)]
pub struct ControlHandle {
    shared: SharedWeb,
}

impl ControlHandle {
    pub fn new(shared: SharedWeb) -> Self {
        Self { shared }
    }

    pub fn lock_web(&self) -> Result<MutexGuard<'_, WebState>, ControlError> {
        self.shared.lock().map_err(|err| err.into())
    }

    /// Retrieve the current configuration snapshot.
    pub fn snapshot(&self) -> Result<ConfigSnapshot, ControlError> {
        let state = self.lock_web()?;
        ConfigSnapshot::from_state(&state)
    }

    /// Flatten the configuration into individual knob descriptors.
    pub fn list_knobs(&self) -> Result<Vec<KnobEntry>, ControlError> {
        let value = {
            let state = self.lock_web()?;
            serde_json::to_value(state.config()).map_err(ControlError::serialization)?
        };
        let mut entries = Vec::new();
        let mut prefix = String::new();
        flatten_value(&mut prefix, &value, &mut entries);
        Ok(entries)
    }

    /// Merge a JSON object onto the configuration and apply it.
    ///
    /// A density or seed change regenerates the web so the new thread counts and
    /// spider draws show up immediately; other knobs take effect on the next frame.
    pub fn apply_patch(&self, patch: Value) -> Result<ConfigSnapshot, ControlError> {
        if !patch.is_object() {
            return Err(ControlError::InvalidPatch(
                "configuration patch must be a JSON object".into(),
            ));
        }

        let mut state = self.lock_web()?;
        let mut config_value =
            serde_json::to_value(state.config()).map_err(ControlError::serialization)?;
        let mut path = Vec::new();
        merge_value(&mut config_value, &patch, &mut path)?;
        let config: WeaveConfig = serde_json::from_value(config_value)
            .map_err(|err| ControlError::InvalidPatch(err.to_string()))?;

        let density_changed = config.density != state.config().density;
        let reseeded = config.rng_seed != state.config().rng_seed;
        state.set_config(config)?;
        // A seed change already regenerated inside `set_config`.
        if density_changed && !reseeded {
            state.regenerate();
        }
        debug!(?patch, density_changed, reseeded, "applied configuration patch");
        ConfigSnapshot::from_state(&state)
    }

    /// Apply a list of knob updates by path.
    pub fn apply_updates(&self, updates: &[KnobUpdate]) -> Result<ConfigSnapshot, ControlError> {
        let mut patch = Map::new();
        for update in updates {
            insert_path(&mut patch, &update.path, update.value.clone())?;
        }
        self.apply_patch(Value::Object(patch))
    }
}

fn insert_path(map: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), ControlError> {
    let mut segments = path.split('.').filter(|s| !s.is_empty());
    let Some(mut seg) = segments.next() else {
        return Err(ControlError::InvalidPatch("empty knob path".into()));
    };
    let mut cur = map;

    for next in segments {
        let entry = cur
            .entry(seg.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        cur = entry.as_object_mut().ok_or_else(|| {
            ControlError::InvalidPatch(format!("intermediate segment '{seg}' is not an object"))
        })?;
        seg = next;
    }

    cur.insert(seg.to_owned(), value);
    Ok(())
}

fn type_mismatch(path: &[&str]) -> ControlError {
    ControlError::InvalidPatch(format!("type mismatch at {}", path.join(".")))
}

fn merge_value<'a>(
    target: &mut Value,
    patch: &'a Value,
    path: &mut Vec<&'a str>,
) -> Result<(), ControlError> {
    match target {
        Value::Object(target_map) => {
            let Value::Object(patch_map) = patch else {
                return Err(type_mismatch(path));
            };
            for (key, patch_value) in patch_map {
                path.push(key);
                let Some(target_value) = target_map.get_mut(key) else {
                    return Err(ControlError::UnknownPath(path.join(".")));
                };
                merge_value(target_value, patch_value, path)?;
                path.pop();
            }
            Ok(())
        }
        Value::Number(_) => match patch {
            Value::Number(_) | Value::Null => {
                *target = patch.clone();
                Ok(())
            }
            Value::String(s) => {
                let s = s.trim();
                let parsed = if target.is_u64() {
                    s.parse::<u64>().ok().map(Value::from)
                } else {
                    s.parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                };
                *target = parsed.ok_or_else(|| {
                    ControlError::InvalidPatch(format!(
                        "cannot parse '{s}' as a number for {}",
                        path.join(".")
                    ))
                })?;
                Ok(())
            }
            _ => Err(type_mismatch(path)),
        },
        Value::Bool(_) => match patch {
            Value::Bool(_) => {
                *target = patch.clone();
                Ok(())
            }
            _ => Err(type_mismatch(path)),
        },
        // Optional knobs (`rng_seed`) serialize as null when unset.
        Value::Null => {
            *target = patch.clone();
            Ok(())
        }
        Value::String(_) | Value::Array(_) => match patch {
            Value::String(_) | Value::Array(_) => {
                *target = patch.clone();
                Ok(())
            }
            _ => Err(type_mismatch(path)),
        },
    }
}

fn flatten_value(prefix: &mut String, value: &Value, entries: &mut Vec<KnobEntry>) {
    match value {
        Value::Object(map) => {
            let base = prefix.len();
            for (k, v) in map {
                if base != 0 {
                    prefix.push('.');
                }
                prefix.push_str(k);
                flatten_value(prefix, v, entries);
                prefix.truncate(base);
            }
        }
        _ => entries.push(KnobEntry {
            path: prefix.clone(),
            kind: knob_kind(value),
            value: value.clone(),
        }),
    }
}

fn knob_kind(value: &Value) -> KnobKind {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => KnobKind::Integer,
        Value::Number(_) => KnobKind::Number,
        Value::Bool(_) => KnobKind::Boolean,
        Value::Null => KnobKind::Null,
        _ => KnobKind::String,
    }
}
