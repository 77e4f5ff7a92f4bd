//! gq-audit
//!
//! Append-only JSON Lines audit trail with an optional SHA-256 hash chain,
//! plus a `RunEventSink` that records every backtest event into it.
//!
//! - One event per line, keys sorted at every level
//! - `hash_self` covers the whole line except itself; `hash_prev` links lines
//! - Verification reports the first broken line

mod chain;
mod sink;
mod writer;

pub use chain::{
    compute_event_hash, verify_hash_chain, verify_hash_chain_str, ChainVerifier, VerifyResult,
};
pub use sink::AuditTrailSink;
pub use writer::{AuditEvent, AuditWriter};
