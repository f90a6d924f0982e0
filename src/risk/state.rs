//! Aggregate portfolio state: equity, cash, positions, and the derived
//! peak/drawdown and exposure/leverage figures.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::PrmError;
use crate::strategy::StrategyId;

#[derive(Debug, Clone)]
pub struct PortfolioState {
    pub total_equity: f64,
    pub cash: f64,
    pub position_value: f64,
    pub peak_equity: f64,
    pub daily_start_equity: f64,
    pub inception_equity: Option<f64>,
    pub total_exposure: f64,
    pub leverage: f64,
    positions_by_strategy: HashMap<StrategyId, u32>,
    pub last_update: DateTime<Utc>,
}

impl PortfolioState {
    pub fn new(initial_equity: f64, now: DateTime<Utc>) -> Self {
        PortfolioState {
            total_equity: initial_equity,
            cash: initial_equity,
            position_value: 0.0,
            peak_equity: initial_equity,
            daily_start_equity: initial_equity,
            inception_equity: Some(initial_equity),
            total_exposure: 0.0,
            leverage: 0.0,
            positions_by_strategy: HashMap::new(),
            last_update: now,
        }
    }

    pub fn current_drawdown(&self) -> f64 {
        (self.peak_equity - self.total_equity).max(0.0)
    }

    pub fn current_drawdown_pct(&self) -> f64 {
        if self.peak_equity > 0.0 {
            100.0 * self.current_drawdown() / self.peak_equity
        } else {
            0.0
        }
    }

    pub fn daily_pnl(&self) -> f64 {
        self.total_equity - self.daily_start_equity
    }

    pub fn open_positions(&self) -> u32 {
        self.positions_by_strategy.values().sum()
    }

    pub fn positions_for(&self, sid: &StrategyId) -> u32 {
        self.positions_by_strategy.get(sid).copied().unwrap_or(0)
    }

    /// Sets total equity and updates the high-water mark; drawdown and
    /// daily P&L are derived on demand, not stored separately. Records
    /// `inception_equity` on first call.
    pub fn update_equity(&mut self, new_equity: f64, now: DateTime<Utc>) -> Result<(), PrmError> {
        if !new_equity.is_finite() || new_equity < 0.0 {
            return Err(PrmError::invalid("update_equity: equity must be >= 0"));
        }
        self.total_equity = new_equity;
        if self.inception_equity.is_none() {
            self.inception_equity = Some(new_equity);
        }
        if new_equity > self.peak_equity {
            self.peak_equity = new_equity;
        }
        self.last_update = now;
        Ok(())
    }

    pub fn update_positions(&mut self, sid: &StrategyId, count: u32) {
        self.positions_by_strategy.insert(sid.clone(), count);
    }

    pub fn update_exposure(&mut self, total_exposure: f64) -> Result<(), PrmError> {
        if !total_exposure.is_finite() || total_exposure < 0.0 {
            return Err(PrmError::invalid(
                "update_exposure: exposure must be >= 0",
            ));
        }
        self.total_exposure = total_exposure;
        self.leverage = if self.total_equity > 0.0 {
            total_exposure / self.total_equity
        } else {
            0.0
        };
        Ok(())
    }

    pub fn update_cash(&mut self, cash: f64) -> Result<(), PrmError> {
        if !cash.is_finite() || cash < 0.0 {
            return Err(PrmError::invalid("update_cash: cash must be >= 0"));
        }
        self.cash = cash;
        Ok(())
    }

    pub fn update_position_value(&mut self, position_value: f64) -> Result<(), PrmError> {
        if !position_value.is_finite() || position_value < 0.0 {
            return Err(PrmError::invalid(
                "update_position_value: position_value must be >= 0",
            ));
        }
        self.position_value = position_value;
        Ok(())
    }

    /// Snapshots `daily_start_equity` to the current equity and zeroes the
    /// daily P&L. Driven externally by a day-boundary event.
    pub fn reset_daily(&mut self) {
        self.daily_start_equity = self.total_equity;
    }

    /// Total return since inception, using `inception_equity` rather than
    /// `daily_start_equity`, so it isn't reset by `reset_daily`.
    pub fn total_return(&self) -> Option<f64> {
        self.inception_equity.and_then(|inception| {
            if inception > 0.0 {
                Some((self.total_equity - inception) / inception)
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap()
    }

    #[test]
    fn peak_equity_is_non_decreasing() {
        let mut state = PortfolioState::new(100_000.0, ts());
        state.update_equity(110_000.0, ts()).unwrap();
        assert_eq!(state.peak_equity, 110_000.0);
        state.update_equity(90_000.0, ts()).unwrap();
        assert_eq!(state.peak_equity, 110_000.0);
    }

    #[test]
    fn drawdown_pct_reflects_drop_from_peak() {
        // 100k -> 110k -> 90k, drawdown ~18.18% of the 110k peak.
        let mut state = PortfolioState::new(100_000.0, ts());
        state.update_equity(110_000.0, ts()).unwrap();
        state.update_equity(90_000.0, ts()).unwrap();
        assert!((state.current_drawdown_pct() - 18.1818).abs() < 1e-3);
    }

    #[test]
    fn daily_pnl_reflects_drop_since_reset() {
        let mut state = PortfolioState::new(100_000.0, ts());
        state.reset_daily();
        state.update_equity(96_500.0, ts()).unwrap();
        assert!((state.daily_pnl() - (-3_500.0)).abs() < 1e-9);
    }

    #[test]
    fn reset_daily_zeroes_pnl() {
        let mut state = PortfolioState::new(100_000.0, ts());
        state.update_equity(105_000.0, ts()).unwrap();
        state.reset_daily();
        assert_eq!(state.daily_pnl(), 0.0);
    }

    #[test]
    fn update_equity_rejects_negative() {
        let mut state = PortfolioState::new(100_000.0, ts());
        assert!(state.update_equity(-1.0, ts()).is_err());
    }

    #[test]
    fn open_positions_sums_per_strategy_counts() {
        let mut state = PortfolioState::new(100_000.0, ts());
        let a = StrategyId::new("a");
        let b = StrategyId::new("b");
        state.update_positions(&a, 3);
        state.update_positions(&b, 2);
        assert_eq!(state.open_positions(), 5);
    }
}
