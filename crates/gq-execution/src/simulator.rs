use gq_schemas::Bar;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{
    ExitFill, ExitReason, ExitResolver, GatewayReject, OrderGateway, OrderRequest, TradeRecord,
};

/// How the simulator decides where a trade closes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum OutcomeModel {
    /// Walk the bars after entry and take the first stop/target touch.
    /// A bar touching both resolves to the stop.
    ForwardScan { max_hold_bars: usize },
    /// Weighted draw among take-profit, stop-loss and flat; closes on the entry bar.
    SeededDraw {
        take_profit_weight: f64,
        stop_loss_weight: f64,
        flat_weight: f64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    pub seed: u64,
    /// Max adverse entry slippage as a fraction of price (0.0005 = 5 bps).
    pub slippage_frac: f64,
    /// Flat cost charged once per closed trade.
    pub commission_per_trade: f64,
    pub outcome: OutcomeModel,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SimulatorConfigError {
    /// Negative slippage would make fills systematically favourable.
    NegativeSlippage { value: f64 },
    NegativeCommission { value: f64 },
    NonFinite { field: &'static str },
    ZeroHoldBars,
    BadWeights,
}

impl std::fmt::Display for SimulatorConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulatorConfigError::NegativeSlippage { value } => {
                write!(f, "execution.slippage_frac must be >= 0, got {}", value)
            }
            SimulatorConfigError::NegativeCommission { value } => {
                write!(f, "execution.commission_per_trade must be >= 0, got {}", value)
            }
            SimulatorConfigError::NonFinite { field } => {
                write!(f, "execution.{} must be finite", field)
            }
            SimulatorConfigError::ZeroHoldBars => {
                write!(f, "execution.outcome.forward_scan.max_hold_bars must be > 0")
            }
            SimulatorConfigError::BadWeights => write!(
                f,
                "execution.outcome.seeded_draw weights must be finite, >= 0, and not all zero"
            ),
        }
    }
}

impl std::error::Error for SimulatorConfigError {}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), SimulatorConfigError> {
        if !self.slippage_frac.is_finite() {
            return Err(SimulatorConfigError::NonFinite {
                field: "slippage_frac",
            });
        }
        if self.slippage_frac < 0.0 {
            return Err(SimulatorConfigError::NegativeSlippage {
                value: self.slippage_frac,
            });
        }
        if !self.commission_per_trade.is_finite() {
            return Err(SimulatorConfigError::NonFinite {
                field: "commission_per_trade",
            });
        }
        if self.commission_per_trade < 0.0 {
            return Err(SimulatorConfigError::NegativeCommission {
                value: self.commission_per_trade,
            });
        }
        match self.outcome {
            OutcomeModel::ForwardScan { max_hold_bars } => {
                if max_hold_bars == 0 {
                    return Err(SimulatorConfigError::ZeroHoldBars);
                }
            }
            OutcomeModel::SeededDraw {
                take_profit_weight,
                stop_loss_weight,
                flat_weight,
            } => {
                let w = [take_profit_weight, stop_loss_weight, flat_weight];
                if w.iter().any(|x| !x.is_finite() || *x < 0.0) || w.iter().sum::<f64>() <= 0.0 {
                    return Err(SimulatorConfigError::BadWeights);
                }
            }
        }
        Ok(())
    }

    /// Same config with a different seed (per-window reseeding).
    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }
}

/// In-process order gateway and exit resolver.
///
/// Every random draw comes from one ChaCha8 stream seeded from the config,
/// so a run is reproducible bit for bit.
#[derive(Clone, Debug)]
pub struct OrderSimulator {
    cfg: SimulatorConfig,
    rng: ChaCha8Rng,
    next_id: u64,
}

impl OrderSimulator {
    pub fn new(cfg: SimulatorConfig) -> Result<Self, SimulatorConfigError> {
        cfg.validate()?;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(cfg.seed),
            cfg,
            next_id: 1,
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.cfg
    }

    fn entry_fill(&mut self, req: &OrderRequest) -> f64 {
        if self.cfg.slippage_frac == 0.0 {
            return req.entry;
        }
        let u: f64 = self.rng.gen();
        req.entry * (1.0 + req.direction.sign() * u * self.cfg.slippage_frac)
    }

    fn forward_scan(trade: &TradeRecord, path: &[Bar], max_hold: usize) -> ExitFill {
        let long = trade.direction.sign() > 0.0;
        let scanned = path.len().min(max_hold);

        for (k, bar) in path[..scanned].iter().enumerate() {
            let stop_hit = if long {
                bar.low <= trade.stop
            } else {
                bar.high >= trade.stop
            };
            let target_hit = if long {
                bar.high >= trade.target
            } else {
                bar.low <= trade.target
            };
            // Intrabar order is unknown: assume the worse outcome.
            if stop_hit {
                return ExitFill {
                    bars_held: k + 1,
                    ts: bar.ts,
                    price: trade.stop,
                    reason: ExitReason::StopLoss,
                };
            }
            if target_hit {
                return ExitFill {
                    bars_held: k + 1,
                    ts: bar.ts,
                    price: trade.target,
                    reason: ExitReason::TakeProfit,
                };
            }
        }

        match path[..scanned].last() {
            Some(last) => ExitFill {
                bars_held: scanned,
                ts: last.ts,
                price: last.close,
                reason: ExitReason::TimeExit,
            },
            None => ExitFill {
                bars_held: 0,
                ts: trade.entry_ts,
                price: trade.entry_price,
                reason: ExitReason::EndOfData,
            },
        }
    }

    fn seeded_draw(&mut self, trade: &TradeRecord, tp: f64, sl: f64, flat: f64) -> ExitFill {
        let u: f64 = self.rng.gen::<f64>() * (tp + sl + flat);
        let (price, reason) = if u < tp {
            (trade.target, ExitReason::TakeProfit)
        } else if u < tp + sl {
            (trade.stop, ExitReason::StopLoss)
        } else {
            (trade.entry_price, ExitReason::Flat)
        };
        ExitFill {
            bars_held: 0,
            ts: trade.entry_ts,
            price,
            reason,
        }
    }
}

impl OrderGateway for OrderSimulator {
    fn submit(&mut self, req: &OrderRequest) -> Result<TradeRecord, GatewayReject> {
        if req.direction.is_flat() {
            return Err(GatewayReject::InvalidRequest {
                reason: "flat direction".to_string(),
            });
        }
        if !(req.volume.is_finite() && req.volume > 0.0) {
            return Err(GatewayReject::InvalidRequest {
                reason: format!("volume {}", req.volume),
            });
        }
        if !(req.entry.is_finite() && req.entry > 0.0) {
            return Err(GatewayReject::InvalidRequest {
                reason: format!("entry {}", req.entry),
            });
        }

        let fill = self.entry_fill(req);
        let id = self.next_id;
        self.next_id += 1;
        Ok(TradeRecord::open(id, req, fill, self.cfg.commission_per_trade))
    }
}

impl ExitResolver for OrderSimulator {
    fn resolve_exit(&mut self, trade: &TradeRecord, path: &[Bar]) -> ExitFill {
        match self.cfg.outcome {
            OutcomeModel::ForwardScan { max_hold_bars } => {
                Self::forward_scan(trade, path, max_hold_bars)
            }
            OutcomeModel::SeededDraw {
                take_profit_weight,
                stop_loss_weight,
                flat_weight,
            } => self.seeded_draw(trade, take_profit_weight, stop_loss_weight, flat_weight),
        }
    }
}
