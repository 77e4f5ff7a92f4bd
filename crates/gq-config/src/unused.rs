//! Unused-key guard: every leaf a mode never reads is reported.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the config is being loaded for. Decides which keys count as read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    Backtest,
    WalkForward,
}

impl ConfigMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigMode::Backtest => "BACKTEST",
            ConfigMode::WalkForward => "WALK_FORWARD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub mode: String,
    /// JSON-pointer prefixes the mode reads, sorted.
    pub consumed_prefixes: Vec<String>,
    /// Leaves under none of those prefixes, sorted.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

const BACKTEST_SECTIONS: &[&str] = &[
    "/run",
    "/features",
    "/signal",
    "/gate",
    "/sizing",
    "/kill_switch",
    "/execution",
];

const WALK_FORWARD_SECTIONS: &[&str] = &[
    "/run",
    "/features",
    "/signal",
    "/gate",
    "/sizing",
    "/kill_switch",
    "/execution",
    "/walk_forward",
];

/// JSON-pointer prefixes each mode actually reads.
///
/// Keep in step with `sections.rs`: a section extracted there must be listed here.
pub fn consumed_pointers_for_mode(mode: ConfigMode) -> &'static [&'static str] {
    match mode {
        ConfigMode::Backtest => BACKTEST_SECTIONS,
        ConfigMode::WalkForward => WALK_FORWARD_SECTIONS,
    }
}

/// Unused-key report for `mode`. With `Fail`, unused keys are an error.
pub fn report_unused_keys(
    mode: ConfigMode,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let mut consumed: Vec<String> = consumed_pointers_for_mode(mode)
        .iter()
        .map(|p| format!("/{}", p.trim_matches('/')))
        .collect();
    consumed.sort();
    consumed.dedup();

    let mut unused = Vec::new();
    let mut path = Vec::new();
    walk_unread(config_json, &mut path, &consumed, &mut unused);
    unused.sort();

    let report = UnusedKeyReport {
        mode: mode.as_str().to_string(),
        consumed_prefixes: consumed,
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        let shown: Vec<&String> = report.unused_leaf_pointers.iter().take(12).collect();
        bail!(
            "CONFIG_UNUSED_KEYS (mode={}): {} unused config leaf key(s) detected. First few: {:?}",
            report.mode,
            report.unused_leaf_pointers.len(),
            shown
        );
    }

    Ok(report)
}

/// Depth-first walk that stops at any consumed subtree.
fn walk_unread(v: &Value, path: &mut Vec<String>, consumed: &[String], out: &mut Vec<String>) {
    let here = to_pointer(path);
    if consumed.iter().any(|c| c == "/" || *c == here) {
        return;
    }
    match v {
        Value::Object(map) if !map.is_empty() => {
            for (k, child) in map {
                path.push(k.replace('~', "~0").replace('/', "~1"));
                walk_unread(child, path, consumed, out);
                path.pop();
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, child) in items.iter().enumerate() {
                path.push(i.to_string());
                walk_unread(child, path, consumed, out);
                path.pop();
            }
        }
        _ => out.push(here),
    }
}

fn to_pointer(segments: &[String]) -> String {
    if segments.is_empty() {
        "/".to_string()
    } else {
        segments.iter().map(|s| format!("/{s}")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unread(v: Value, consumed: &[&str]) -> Vec<String> {
        let consumed: Vec<String> = consumed.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        walk_unread(&v, &mut Vec::new(), &consumed, &mut out);
        out
    }

    #[test]
    fn consumed_prefix_respects_segment_boundary() {
        let v = json!({"run": {"symbol": "X"}, "runner": {"x": 1}});
        assert_eq!(unread(v, &["/run"]), vec!["/runner/x".to_string()]);
    }

    #[test]
    fn pointer_tokens_are_escaped() {
        let v = json!({"a/b": {"c~d": 1}});
        assert_eq!(unread(v, &[]), vec!["/a~1b/c~0d".to_string()]);
    }

    #[test]
    fn root_prefix_consumes_everything() {
        assert!(unread(json!({"a": [1, 2]}), &["/"]).is_empty());
    }

    #[test]
    fn empty_containers_count_as_leaves() {
        assert_eq!(unread(json!({"a": {}}), &[]), vec!["/a".to_string()]);
    }
}
