use gq_schemas::{Direction, Regime};

use crate::{GateConfig, GateDecision, GateReason, RunState};

/// Pre-trade gate. No arithmetic beyond the ceiling comparison; signal rules
/// live in the policy, this only decides whether an intent may execute.
pub fn validate_intent(
    intent: Direction,
    run: &RunState,
    regime: Regime,
    vol_pct: f64,
    cfg: &GateConfig,
) -> GateDecision {
    if intent.is_flat() {
        return GateDecision::Reject(GateReason::FlatIntent);
    }
    if !run.kill_switch_active {
        return GateDecision::Reject(GateReason::KillSwitchInactive);
    }
    if regime.is_chaos() {
        return GateDecision::Reject(GateReason::ChaosRegime);
    }
    if vol_pct > cfg.vol_pct_ceiling {
        return GateDecision::Reject(GateReason::VolatilityCeiling);
    }
    if run.open_position {
        return GateDecision::Reject(GateReason::OpenPosition);
    }
    GateDecision::Approve
}

#[cfg(test)]
mod tests {
    use super::*;
    use gq_schemas::Bias;

    const CFG: GateConfig = GateConfig {
        vol_pct_ceiling: 0.95,
    };

    fn clear() -> RunState {
        RunState {
            kill_switch_active: true,
            open_position: false,
        }
    }

    #[test]
    fn clean_state_approves() {
        assert_eq!(
            validate_intent(Direction::Buy, &clear(), Regime::Trend(Bias::Long), 0.5, &CFG),
            GateDecision::Approve
        );
    }

    #[test]
    fn reasons_follow_fixed_order() {
        let all_bad = RunState {
            kill_switch_active: false,
            open_position: true,
        };
        assert_eq!(
            validate_intent(Direction::Flat, &all_bad, Regime::Chaos, 0.99, &CFG),
            GateDecision::Reject(GateReason::FlatIntent)
        );
        assert_eq!(
            validate_intent(Direction::Sell, &all_bad, Regime::Chaos, 0.99, &CFG),
            GateDecision::Reject(GateReason::KillSwitchInactive)
        );
        let run = RunState {
            kill_switch_active: true,
            ..all_bad
        };
        assert_eq!(
            validate_intent(Direction::Sell, &run, Regime::Chaos, 0.99, &CFG),
            GateDecision::Reject(GateReason::ChaosRegime)
        );
        assert_eq!(
            validate_intent(Direction::Sell, &run, Regime::Range, 0.99, &CFG),
            GateDecision::Reject(GateReason::VolatilityCeiling)
        );
        assert_eq!(
            validate_intent(Direction::Sell, &run, Regime::Range, 0.95, &CFG),
            GateDecision::Reject(GateReason::OpenPosition)
        );
    }
}
