use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::chain::{canonical_line, compute_event_hash};

/// Namespace for content-derived event ids.
const EVENT_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6771_6175_6469_7400_8000_0000_0000_0001);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Position in the file, from 0.
    pub seq: u64,
    pub event_id: Uuid,
    pub run_id: Uuid,
    /// Wall-clock time the line was written.
    pub ts_utc: DateTime<Utc>,
    /// Bar timestamp the event belongs to, if any.
    pub bar_ts: Option<i64>,
    pub event_type: String,
    pub payload: Value,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

/// Append-only audit writer. Each `append` is flushed before it returns,
/// so a crashed run still leaves a verifiable prefix.
pub struct AuditWriter {
    path: PathBuf,
    out: BufWriter<File>,
    hash_chain: bool,
    last_hash: Option<String>,
    seq: u64,
}

impl AuditWriter {
    /// Creates the file and its parent directories. An existing file is
    /// truncated: one trail per run.
    pub fn create(path: impl AsRef<Path>, hash_chain: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create audit dir failed: {}", parent.display()))?;
        }
        let file = File::create(&path)
            .with_context(|| format!("create audit log failed: {}", path.display()))?;

        Ok(Self {
            path,
            out: BufWriter::new(file),
            hash_chain,
            last_hash: None,
            seq: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_hash(&self) -> Option<&str> {
        self.last_hash.as_deref()
    }

    /// Events appended so far.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn append(
        &mut self,
        run_id: Uuid,
        event_type: &str,
        bar_ts: Option<i64>,
        payload: Value,
    ) -> Result<AuditEvent> {
        let body = canonical_line(&payload)?;
        let id_name = format!(
            "{}|{}|{}",
            self.last_hash.as_deref().unwrap_or("GENESIS"),
            self.seq,
            body
        );

        let mut ev = AuditEvent {
            seq: self.seq,
            event_id: Uuid::new_v5(&EVENT_ID_NAMESPACE, id_name.as_bytes()),
            run_id,
            ts_utc: Utc::now(),
            bar_ts,
            event_type: event_type.to_string(),
            payload,
            hash_prev: None,
            hash_self: None,
        };

        if self.hash_chain {
            ev.hash_prev = self.last_hash.take();
            let h = compute_event_hash(&ev)?;
            ev.hash_self = Some(h.clone());
            self.last_hash = Some(h);
        }

        let line = canonical_line(&ev)?;
        writeln!(self.out, "{line}")
            .and_then(|_| self.out.flush())
            .with_context(|| format!("write audit line failed: {}", self.path.display()))?;
        self.seq += 1;
        Ok(ev)
    }
}
