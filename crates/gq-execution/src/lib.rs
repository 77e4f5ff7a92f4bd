//! gq-execution
//!
//! Order execution contract and the in-process simulator behind it.
//!
//! - `OrderGateway`: validated + sized request in, open `TradeRecord` or rejection out.
//!   A live broker adapter implements the same trait.
//! - `ExitResolver`: decides where an open trade closes, given the bars after entry.
//! - `OrderSimulator`: both traits, driven by a seeded ChaCha stream; no ambient randomness.
//!
//! Trade records are append-only: `Open` -> `Closed` by value, `Rejected` is terminal.

mod simulator;
mod types;

pub use simulator::{OrderSimulator, OutcomeModel, SimulatorConfig, SimulatorConfigError};
pub use types::*;
