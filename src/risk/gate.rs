//! Ordered risk-gate predicate chain: each check returns as soon as it
//! fails, carrying a named reason.

use crate::allocation::StrategyAllocation;
use crate::config::RiskLimits;
use crate::risk::state::PortfolioState;
use crate::strategy::StrategyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateReason {
    Allowed,
    DrawdownExceedsLimit,
    DailyLossExceedsLimit,
    MaxConcurrentPositions,
    CashBelowReserve,
    LeverageExceedsLimit,
    StrategyNotAllocated,
}

impl GateReason {
    pub fn description(&self) -> &'static str {
        match self {
            GateReason::Allowed => "allowed",
            GateReason::DrawdownExceedsLimit => "drawdown exceeds limit",
            GateReason::DailyLossExceedsLimit => "daily loss exceeds limit",
            GateReason::MaxConcurrentPositions => "max concurrent positions",
            GateReason::CashBelowReserve => "cash below reserve",
            GateReason::LeverageExceedsLimit => "leverage exceeds limit",
            GateReason::StrategyNotAllocated => "strategy not allocated",
        }
    }
}

/// Evaluates the fixed-order predicate chain and returns the first
/// failing predicate's reason, or `GateReason::Allowed`.
pub fn can_trade(
    state: &PortfolioState,
    limits: &RiskLimits,
    sid: &StrategyId,
    allocations: &[StrategyAllocation],
) -> (bool, GateReason) {
    if state.current_drawdown_pct() > limits.max_portfolio_drawdown_pct {
        return (false, GateReason::DrawdownExceedsLimit);
    }

    if limits.max_daily_loss > 0.0 && state.daily_pnl() < -limits.max_daily_loss {
        return (false, GateReason::DailyLossExceedsLimit);
    }

    if state.open_positions() >= limits.max_concurrent_positions {
        return (false, GateReason::MaxConcurrentPositions);
    }

    if state.cash < limits.min_cash_reserve {
        return (false, GateReason::CashBelowReserve);
    }

    if state.leverage > limits.max_leverage {
        return (false, GateReason::LeverageExceedsLimit);
    }

    let allocated = allocations
        .iter()
        .any(|a| &a.strategy_id == sid && a.active && a.allocation > 0.0);
    if !allocated {
        return (false, GateReason::StrategyNotAllocated);
    }

    (true, GateReason::Allowed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningLevel {
    Green,
    Yellow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskWarning {
    pub predicate: &'static str,
    pub level: WarningLevel,
}

/// Warning band for drawdown, daily loss, and concurrent positions:
/// yellow once the observed value crosses 80% of its limit.
pub fn warning_band(state: &PortfolioState, limits: &RiskLimits) -> Vec<RiskWarning> {
    const BAND: f64 = 0.80;
    let mut warnings = Vec::new();

    if limits.max_portfolio_drawdown_pct > 0.0 {
        let ratio = state.current_drawdown_pct() / limits.max_portfolio_drawdown_pct;
        warnings.push(RiskWarning {
            predicate: "drawdown",
            level: if ratio > BAND {
                WarningLevel::Yellow
            } else {
                WarningLevel::Green
            },
        });
    }

    if limits.max_daily_loss > 0.0 {
        let loss = (-state.daily_pnl()).max(0.0);
        let ratio = loss / limits.max_daily_loss;
        warnings.push(RiskWarning {
            predicate: "daily_loss",
            level: if ratio > BAND {
                WarningLevel::Yellow
            } else {
                WarningLevel::Green
            },
        });
    }

    if limits.max_concurrent_positions > 0 {
        let ratio = state.open_positions() as f64 / limits.max_concurrent_positions as f64;
        warnings.push(RiskWarning {
            predicate: "concurrent_positions",
            level: if ratio > BAND {
                WarningLevel::Yellow
            } else {
                WarningLevel::Green
            },
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap()
    }

    fn allocated(sid: &str) -> Vec<StrategyAllocation> {
        vec![StrategyAllocation {
            strategy_id: StrategyId::new(sid),
            allocation: 0.5,
            active: true,
        }]
    }

    #[test]
    fn drawdown_gate_denies() {
        let mut state = PortfolioState::new(100_000.0, ts());
        state.update_equity(110_000.0, ts()).unwrap();
        state.update_equity(90_000.0, ts()).unwrap();
        let limits = RiskLimits {
            max_portfolio_drawdown_pct: 15.0,
            ..RiskLimits::default()
        };
        let sid = StrategyId::new("s1");
        let (allowed, reason) = can_trade(&state, &limits, &sid, &allocated("s1"));
        assert!(!allowed);
        assert_eq!(reason, GateReason::DrawdownExceedsLimit);
    }

    #[test]
    fn daily_loss_gate_denies() {
        let mut state = PortfolioState::new(100_000.0, ts());
        state.reset_daily();
        state.update_equity(96_500.0, ts()).unwrap();
        let limits = RiskLimits {
            max_daily_loss: 3_000.0,
            ..RiskLimits::default()
        };
        let sid = StrategyId::new("s1");
        let (allowed, reason) = can_trade(&state, &limits, &sid, &allocated("s1"));
        assert!(!allowed);
        assert_eq!(reason, GateReason::DailyLossExceedsLimit);
    }

    #[test]
    fn unallocated_strategy_is_denied_last() {
        let state = PortfolioState::new(100_000.0, ts());
        let limits = RiskLimits::default();
        let sid = StrategyId::new("unknown");
        let (allowed, reason) = can_trade(&state, &limits, &sid, &allocated("other"));
        assert!(!allowed);
        assert_eq!(reason, GateReason::StrategyNotAllocated);
    }

    #[test]
    fn gate_order_drawdown_beats_everything_else() {
        // Construct a state that fails both drawdown and daily loss; the
        // ordering contract requires drawdown to win.
        let mut state = PortfolioState::new(100_000.0, ts());
        state.reset_daily();
        state.update_equity(70_000.0, ts()).unwrap();
        let limits = RiskLimits {
            max_portfolio_drawdown_pct: 10.0,
            max_daily_loss: 1_000.0,
            ..RiskLimits::default()
        };
        let sid = StrategyId::new("s1");
        let (allowed, reason) = can_trade(&state, &limits, &sid, &allocated("s1"));
        assert!(!allowed);
        assert_eq!(reason, GateReason::DrawdownExceedsLimit);
    }

    #[test]
    fn fully_passing_state_is_allowed() {
        let state = PortfolioState::new(100_000.0, ts());
        let limits = RiskLimits::default();
        let sid = StrategyId::new("s1");
        let (allowed, reason) = can_trade(&state, &limits, &sid, &allocated("s1"));
        assert!(allowed);
        assert_eq!(reason, GateReason::Allowed);
    }
}
