//! gq-config
//!
//! Layered YAML configuration.
//!
//! - Later documents override earlier ones key by key
//! - Canonical JSON (sorted keys) and its SHA-256 identify a run's config
//! - Unused-key guard per mode
//! - Typed sections with no implicit defaults

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

mod sections;
mod unused;

pub use sections::{backtest_config, walk_forward_config, RunSection};
pub use unused::{
    consumed_pointers_for_mode, report_unused_keys, ConfigMode, UnusedKeyPolicy, UnusedKeyReport,
};

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Deserialize the subtree at `pointer` (e.g. `"/sizing"`).
    pub fn section<T: DeserializeOwned>(&self, pointer: &str) -> Result<T> {
        let v = self
            .config_json
            .pointer(pointer)
            .with_context(|| format!("CONFIG_MISSING_SECTION {pointer}"))?;
        T::deserialize(v).with_context(|| format!("CONFIG_INVALID_SECTION {pointer}"))
    }
}

/// Read and merge YAML files, later paths overriding earlier ones.
pub fn load_layered_yaml<P: AsRef<Path>>(paths: &[P]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| {
            let p = p.as_ref();
            fs::read_to_string(p).with_context(|| format!("CONFIG_READ_FAILED {}", p.display()))
        })
        .collect::<Result<Vec<String>>>()?;

    let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());
    for (layer, raw) in yaml_docs.iter().enumerate() {
        let doc: serde_yaml::Value = serde_yaml::from_str(raw)
            .with_context(|| format!("CONFIG_INVALID_YAML layer {layer}"))?;
        let doc = serde_json::to_value(doc).with_context(|| {
            format!("CONFIG_INVALID_YAML layer {layer}: not representable as JSON")
        })?;
        // An empty document parses as null and must not wipe earlier layers.
        if !doc.is_null() {
            overlay(&mut merged, doc);
        }
    }

    let canonical_json = canonicalize_json(&merged)?;
    Ok(LoadedConfig {
        config_hash: sha256_hex(canonical_json.as_bytes()),
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; any other value replaces what was there.
fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base_map), Value::Object(top_map)) => {
            for (k, v) in top_map {
                match base_map.get_mut(&k) {
                    Some(slot) => overlay(slot, v),
                    None => {
                        base_map.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}

/// Compact JSON. `serde_json::Map` is key-sorted, so source key order never
/// reaches the output.
fn canonicalize_json(v: &Value) -> Result<String> {
    serde_json::to_string(v).context("canonical json serialize failed")
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_replaces_scalars_and_merges_objects() {
        let mut base = json!({"a": {"x": 1, "y": 2}, "b": [1, 2]});
        overlay(&mut base, json!({"a": {"y": 3, "z": 4}, "b": [9]}));
        assert_eq!(base, json!({"a": {"x": 1, "y": 3, "z": 4}, "b": [9]}));
    }

    #[test]
    fn null_layer_is_ignored() {
        let a =
            load_layered_yaml_from_strings(&["run:\n  symbol: X\n", "# comments only\n"]).unwrap();
        assert_eq!(a.config_json, json!({"run": {"symbol": "X"}}));
    }
}
