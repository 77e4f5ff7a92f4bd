//! Backtest CSV loader (deterministic).
//!
//! CSV format
//!
//! Required columns:
//! - `ts` (aliases: `timestamp`, `time`)
//! - `open`
//! - `high`
//! - `low`
//! - `close`
//!
//! Optional columns:
//! - `volume` (alias: `tick_volume`)
//!
//! Timestamps are epoch seconds, RFC 3339, or `YYYY-MM-DD HH:MM:SS` (UTC).
//! Rows are sorted by timestamp and then run through schema validation, so a
//! duplicated timestamp is an error rather than a silent drop.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use gq_schemas::{validate_bars, Bar, InputSchemaError};

const TS_ALIASES: &[&str] = &["ts", "timestamp", "time"];
const VOLUME_ALIASES: &[&str] = &["volume", "tick_volume"];

#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    EmptyInput,
    MissingHeader(&'static str),
    ParseNumber {
        line: u64,
        column: String,
        value: String,
    },
    ParseTimestamp { line: u64, value: String },
    BadRow { line: u64, reason: String },
    Schema(InputSchemaError),
    Io(String),
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e.to_string())
    }
}

impl From<InputSchemaError> for LoadError {
    fn from(e: InputSchemaError) -> Self {
        LoadError::Schema(e)
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::EmptyInput => write!(f, "empty input"),
            LoadError::MissingHeader(h) => write!(f, "missing header: {}", h),
            LoadError::ParseNumber {
                line,
                column,
                value,
            } => write!(
                f,
                "line {}: failed to parse number in column {}: {}",
                line, column, value
            ),
            LoadError::ParseTimestamp { line, value } => {
                write!(f, "line {}: unrecognised timestamp: {}", line, value)
            }
            LoadError::BadRow { line, reason } => write!(f, "bad row at line {}: {}", line, reason),
            LoadError::Schema(e) => write!(f, "schema: {}", e),
            LoadError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for LoadError {}

/// Load bars from a CSV file on disk.
pub fn load_csv_file(path: impl AsRef<Path>) -> Result<Vec<Bar>, LoadError> {
    let s = fs::read_to_string(path)?;
    parse_csv_bars(&s)
}

/// Parse bars from CSV content (pure, deterministic).
pub fn parse_csv_bars(content: &str) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(content.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| LoadError::BadRow {
            line: 1,
            reason: e.to_string(),
        })?
        .clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::EmptyInput);
    }

    // Case-insensitive header index; first occurrence wins.
    let mut idx: BTreeMap<String, usize> = BTreeMap::new();
    for (i, h) in headers.iter().enumerate() {
        let key = h.trim_start_matches('\u{feff}').to_ascii_lowercase();
        idx.entry(key).or_insert(i);
    }

    let col_ts = find_any(&idx, TS_ALIASES).ok_or(LoadError::MissingHeader("ts"))?;
    let col_open = find_required(&idx, "open")?;
    let col_high = find_required(&idx, "high")?;
    let col_low = find_required(&idx, "low")?;
    let col_close = find_required(&idx, "close")?;
    let col_volume = find_any(&idx, VOLUME_ALIASES);

    let mut out: Vec<Bar> = Vec::new();
    for rec in rdr.records() {
        let rec = rec.map_err(|e| LoadError::BadRow {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            reason: e.to_string(),
        })?;
        let line = rec.position().map(|p| p.line()).unwrap_or(0);
        let get = |col: usize| -> Result<&str, LoadError> {
            rec.get(col).ok_or_else(|| LoadError::BadRow {
                line,
                reason: format!("missing column index {col}"),
            })
        };

        let ts = parse_ts(get(col_ts)?, line)?;
        let mut bar = Bar::new(
            ts,
            parse_f64(get(col_open)?, "open", line)?,
            parse_f64(get(col_high)?, "high", line)?,
            parse_f64(get(col_low)?, "low", line)?,
            parse_f64(get(col_close)?, "close", line)?,
        );
        if let Some(c) = col_volume {
            let raw = get(c)?;
            if !raw.is_empty() {
                bar = bar.with_volume(parse_f64(raw, "volume", line)?);
            }
        }
        out.push(bar);
    }

    if out.is_empty() {
        return Err(LoadError::EmptyInput);
    }

    // Stable sort keeps duplicate timestamps in file order for the
    // validator to report.
    out.sort_by_key(|b| b.ts);
    validate_bars(&out)?;
    Ok(out)
}

fn find_required(idx: &BTreeMap<String, usize>, name: &'static str) -> Result<usize, LoadError> {
    idx.get(name).copied().ok_or(LoadError::MissingHeader(name))
}

fn find_any(idx: &BTreeMap<String, usize>, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| idx.get(*n).copied())
}

fn parse_f64(s: &str, col: &str, line: u64) -> Result<f64, LoadError> {
    s.parse::<f64>().map_err(|_| LoadError::ParseNumber {
        line,
        column: col.to_string(),
        value: s.to_string(),
    })
}

fn parse_ts(s: &str, line: u64) -> Result<i64, LoadError> {
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y.%m.%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc().timestamp());
        }
    }
    Err(LoadError::ParseTimestamp {
        line,
        value: s.to_string(),
    })
}
