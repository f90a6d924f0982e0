//! Derived per-strategy metrics and ranking over a tagged `Metric` enum,
//! rather than string-keyed lookups.

use chrono::{DateTime, Utc};

use crate::ledger::ReturnLedger;
use crate::numerics;
use crate::strategy::StrategyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Sharpe,
    Return,
    WinRate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyMetrics {
    pub strategy_id: StrategyId,
    pub total_return: f64,
    pub sharpe: Option<f64>,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub trade_count: usize,
    pub last_update: DateTime<Utc>,
    pub active: bool,
}

/// Recomputes metrics for `sid` from its full return history on demand.
pub fn compute(
    sid: &StrategyId,
    ledger: &ReturnLedger,
    active: bool,
    now: DateTime<Utc>,
) -> StrategyMetrics {
    let rs = ledger.full(sid);

    let total_return = numerics::cumulative_return(rs);
    let sharpe = numerics::sharpe_from_returns(rs).ok();
    let max_drawdown = numerics::max_drawdown_fraction(rs);
    let win_rate = numerics::win_stats(rs).map(|(wr, _)| wr).unwrap_or(0.0);

    StrategyMetrics {
        strategy_id: sid.clone(),
        total_return,
        sharpe,
        max_drawdown,
        win_rate,
        trade_count: rs.len(),
        last_update: now,
        active,
    }
}

fn metric_value(m: &StrategyMetrics, by: Metric) -> f64 {
    match by {
        Metric::Sharpe => m.sharpe.unwrap_or(f64::MIN),
        Metric::Return => m.total_return,
        Metric::WinRate => m.win_rate,
    }
}

/// Ranks strategies descending by `by`.
pub fn rank(metrics: &[StrategyMetrics], by: Metric) -> Vec<StrategyId> {
    let mut ranked: Vec<&StrategyMetrics> = metrics.iter().collect();
    ranked.sort_by(|a, b| {
        metric_value(b, by)
            .partial_cmp(&metric_value(a, by))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.into_iter().map(|m| m.strategy_id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap()
    }

    #[test]
    fn rank_by_return_orders_descending() {
        let a = StrategyId::new("a");
        let b = StrategyId::new("b");
        let mut ledger = ReturnLedger::new();
        ledger.record_return(&a, 0.10);
        ledger.record_return(&b, 0.02);
        let ma = compute(&a, &ledger, true, ts());
        let mb = compute(&b, &ledger, true, ts());
        let ranked = rank(&[mb, ma], Metric::Return);
        assert_eq!(ranked, vec![a, b]);
    }
}
