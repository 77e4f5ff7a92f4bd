use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use crate::writer::AuditEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid { lines: usize },
    Broken { line: usize, reason: String },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid { .. })
    }
}

/// Compact JSON, object keys sorted at every depth.
pub(crate) fn canonical_line<T: Serialize + ?Sized>(v: &T) -> Result<String> {
    let value = serde_json::to_value(v).context("serialize audit value failed")?;
    serde_json::to_string(&sorted(value)).context("stringify audit value failed")
}

fn sorted(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

/// SHA-256 (hex) of the canonical event with `hash_self` cleared.
pub fn compute_event_hash(ev: &AuditEvent) -> Result<String> {
    let unsealed = AuditEvent {
        hash_self: None,
        ..ev.clone()
    };
    let digest = Sha256::digest(canonical_line(&unsealed)?.as_bytes());
    Ok(hex::encode(digest))
}

/// Line-by-line chain check. Feed lines in file order.
#[derive(Debug, Default)]
pub struct ChainVerifier {
    line: usize,
    events: u64,
    prev_hash: Option<String>,
    broken: Option<(usize, String)>,
}

impl ChainVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check one raw line. Blank lines are skipped. Once broken, stays broken.
    pub fn feed(&mut self, raw: &str) -> Result<()> {
        self.line += 1;
        if self.broken.is_some() || raw.trim().is_empty() {
            return Ok(());
        }
        let ev: AuditEvent = serde_json::from_str(raw.trim())
            .with_context(|| format!("parse audit event at line {}", self.line))?;

        if let Some(reason) = self.check(&ev)? {
            self.broken = Some((self.line, reason));
            return Ok(());
        }
        self.events += 1;
        self.prev_hash = ev.hash_self;
        Ok(())
    }

    fn check(&self, ev: &AuditEvent) -> Result<Option<String>> {
        if ev.seq != self.events {
            return Ok(Some(format!(
                "seq gap: expected {}, got {}",
                self.events, ev.seq
            )));
        }
        if ev.hash_prev != self.prev_hash {
            return Ok(Some(format!(
                "hash_prev mismatch: expected {:?}, got {:?}",
                self.prev_hash, ev.hash_prev
            )));
        }
        if let Some(claimed) = &ev.hash_self {
            let actual = compute_event_hash(ev)?;
            if *claimed != actual {
                return Ok(Some(format!(
                    "hash_self mismatch: claimed {}, recomputed {}",
                    claimed, actual
                )));
            }
        }
        Ok(None)
    }

    pub fn finish(self) -> VerifyResult {
        match self.broken {
            Some((line, reason)) => VerifyResult::Broken { line, reason },
            None => VerifyResult::Valid {
                lines: self.events as usize,
            },
        }
    }
}

/// Verify the hash chain of an audit log file.
pub fn verify_hash_chain(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("read audit log failed: {}", path.display()))?;
    verify_hash_chain_str(&content)
}

/// Same as [`verify_hash_chain`] over in-memory JSONL.
pub fn verify_hash_chain_str(content: &str) -> Result<VerifyResult> {
    let mut v = ChainVerifier::new();
    for line in content.lines() {
        v.feed(line)?;
    }
    Ok(v.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_line_sorts_nested_keys() {
        let line =
            canonical_line(&json!({"b": {"z": 1, "a": 2}, "a": [ {"d": 0, "c": 1} ]})).unwrap();
        assert_eq!(line, r#"{"a":[{"c":1,"d":0}],"b":{"a":2,"z":1}}"#);
    }

    #[test]
    fn empty_input_is_a_valid_empty_chain() {
        assert_eq!(verify_hash_chain_str("").unwrap(), VerifyResult::Valid { lines: 0 });
        assert_eq!(verify_hash_chain_str("\n\n").unwrap(), VerifyResult::Valid { lines: 0 });
    }

    #[test]
    fn garbage_line_is_an_error_not_a_break() {
        assert!(verify_hash_chain_str("not json\n").is_err());
    }
}
