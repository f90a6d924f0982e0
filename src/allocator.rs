//! Target allocation computation: five weighting policies plus the shared
//! raw-weights-then-clamp-then-renormalize post-processing step.

use crate::config::AllocationMethod;
use crate::ledger::ReturnLedger;
use crate::numerics;
use crate::strategy::StrategyId;

/// Result of computing target weights under a policy. A fallback to
/// equal weight is kept as behavior but made observable via
/// `fallback_reason` rather than happening silently.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationOutcome {
    pub weights: Vec<(StrategyId, f64)>,
    pub fallback_reason: Option<String>,
}

fn equal_weight(active: &[StrategyId]) -> Vec<(StrategyId, f64)> {
    if active.is_empty() {
        return Vec::new();
    }
    let w = 1.0 / active.len() as f64;
    active.iter().cloned().map(|sid| (sid, w)).collect()
}

fn normalize_or_fallback(
    active: &[StrategyId],
    raw: Vec<(StrategyId, f64)>,
    fallback_reason: &'static str,
) -> AllocationOutcome {
    let sum: f64 = raw.iter().map(|(_, w)| w).sum();
    if sum <= 0.0 {
        return AllocationOutcome {
            weights: equal_weight(active),
            fallback_reason: Some(fallback_reason.to_string()),
        };
    }
    let weights = raw.into_iter().map(|(sid, w)| (sid, w / sum)).collect();
    AllocationOutcome {
        weights,
        fallback_reason: None,
    }
}

/// Computes target weights for `active` strategies (a caller-supplied
/// deterministic order, e.g. insertion order or sorted by id) under
/// `method`, using up to `lookback` most recent returns from `ledger`.
pub fn compute_target_weights(
    method: AllocationMethod,
    active: &[StrategyId],
    ledger: &ReturnLedger,
    lookback: usize,
) -> AllocationOutcome {
    if active.is_empty() {
        return AllocationOutcome {
            weights: Vec::new(),
            fallback_reason: None,
        };
    }

    match method {
        AllocationMethod::EqualWeight => AllocationOutcome {
            weights: equal_weight(active),
            fallback_reason: None,
        },

        AllocationMethod::PerformanceWeighted => {
            let raw: Vec<(StrategyId, f64)> = active
                .iter()
                .filter_map(|sid| {
                    let r = numerics::cumulative_return(ledger.recent(sid, lookback));
                    if r > 0.0 {
                        Some((sid.clone(), r))
                    } else {
                        None
                    }
                })
                .collect();
            normalize_or_fallback(active, raw, "no strategy had positive cumulative return")
        }

        AllocationMethod::SharpeWeighted => {
            let raw: Vec<(StrategyId, f64)> = active
                .iter()
                .filter_map(|sid| {
                    let rs = ledger.recent(sid, lookback);
                    let sharpe = numerics::sharpe_from_returns(rs).ok()?;
                    if sharpe > 0.0 {
                        Some((sid.clone(), sharpe))
                    } else {
                        None
                    }
                })
                .collect();
            normalize_or_fallback(active, raw, "no strategy had positive Sharpe")
        }

        AllocationMethod::RiskParity => {
            let raw: Vec<(StrategyId, f64)> = active
                .iter()
                .filter_map(|sid| {
                    let rs = ledger.recent(sid, lookback);
                    let sigma = numerics::sample_stdev(rs).ok()?;
                    let annual_vol = numerics::annualize_vol(sigma);
                    if annual_vol > 0.0 {
                        Some((sid.clone(), 1.0 / annual_vol))
                    } else {
                        None
                    }
                })
                .collect();
            normalize_or_fallback(active, raw, "no strategy had positive volatility")
        }

        AllocationMethod::AdaptiveKelly => {
            const QUARTER_KELLY: f64 = 0.25;
            let raw: Vec<(StrategyId, f64)> = active
                .iter()
                .filter_map(|sid| {
                    let rs = ledger.recent(sid, lookback);
                    let (win_rate, ratio) = numerics::win_stats(rs).ok()?;
                    if ratio <= 0.0 {
                        return None;
                    }
                    let kelly = (win_rate - (1.0 - win_rate) / ratio) * QUARTER_KELLY;
                    if kelly > 0.0 {
                        Some((sid.clone(), kelly))
                    } else {
                        None
                    }
                })
                .collect();
            normalize_or_fallback(active, raw, "no strategy had positive quarter-Kelly")
        }
    }
}

/// Clamps every weight up to `w_min` and down to `w_max`, then
/// renormalizes by the new sum.
pub fn clamp_and_renormalize(weights: &mut Vec<(StrategyId, f64)>, w_min: f64, w_max: f64) {
    for (_, w) in weights.iter_mut() {
        if *w < w_min {
            *w = w_min;
        }
    }
    for (_, w) in weights.iter_mut() {
        if *w > w_max {
            *w = w_max;
        }
    }
    let sum: f64 = weights.iter().map(|(_, w)| *w).sum();
    if sum > 0.0 {
        for (_, w) in weights.iter_mut() {
            *w /= sum;
        }
    }
}
