//! Multi-strategy portfolio risk manager.
//!
//! `Prm` is the public orchestrator facade tying equity updates, return
//! recordings, trade requests, and rebalance ticks to the portfolio state,
//! risk gate, allocator, and rebalance controller: one struct owning
//! configuration and state, exposing a small set of typed entry points
//! over an open-ended, runtime-registered set of strategies.
//!
//! Concurrency model: single-logical-writer, many-readers. All mutable
//! state lives behind one `RwLock`; every public operation takes and
//! releases the lock within its own call, so no caller ever observes a
//! half-updated `PortfolioState`.

pub mod allocation;
pub mod allocator;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod numerics;
pub mod rebalance;
pub mod risk;
pub mod sizing;
pub mod strategy;

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use allocation::{active_allocation_sum, StrategyAllocation};
use config::{AllocatorConfig, PrmConfig, RiskLimits, SizerSpec};
use error::PrmError;
use ledger::ReturnLedger;
use metrics::StrategyMetrics;
use rebalance::AllocationReport;
use risk::gate::{GateReason, RiskWarning, WarningLevel};
use risk::state::PortfolioState;
use sizing::{PositionSizer, RejectReason, SizingOutcome};
use strategy::StrategyId;

/// Outcome of a trade-sizing request.
#[derive(Debug)]
pub enum Decision {
    Approved(u64),
    Denied(GateReason),
    Skipped(RejectReason),
}

/// Coarse traffic-light summary of portfolio risk.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskStatus {
    Green,
    Yellow(Vec<RiskWarning>),
    Red(&'static str),
}

/// Immutable read view returned by `Prm::snapshot`.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub total_equity: f64,
    pub cash: f64,
    pub position_value: f64,
    pub peak_equity: f64,
    pub current_drawdown: f64,
    pub current_drawdown_pct: f64,
    pub daily_pnl: f64,
    pub open_positions: u32,
    pub leverage: f64,
    pub last_update: DateTime<Utc>,
    pub allocations: Vec<StrategyAllocation>,
    pub metrics: Vec<StrategyMetrics>,
}

/// Pairwise Pearson correlation of every known strategy's full return
/// history. `ids[i]`/`ids[j]` index `matrix[i][j]`; the diagonal is
/// always exactly 1.0 regardless of that strategy's variance.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub ids: Vec<StrategyId>,
    pub matrix: Vec<Vec<f64>>,
}

struct Inner {
    state: PortfolioState,
    limits: RiskLimits,
    allocations: Vec<StrategyAllocation>,
    ledger: ReturnLedger,
    sizers: HashMap<StrategyId, Box<dyn PositionSizer>>,
    allocator_cfg: AllocatorConfig,
    current_weights: Vec<(StrategyId, f64)>,
}

pub struct Prm {
    inner: RwLock<Inner>,
}

impl Prm {
    pub fn new(initial_equity: f64, config: PrmConfig, now: DateTime<Utc>) -> Self {
        Prm {
            inner: RwLock::new(Inner {
                state: PortfolioState::new(initial_equity, now),
                limits: config.risk_limits,
                allocations: Vec::new(),
                ledger: ReturnLedger::new(),
                sizers: HashMap::new(),
                allocator_cfg: config.allocator,
                current_weights: Vec::new(),
            }),
        }
    }

    // ---- Event sink ----

    pub fn on_equity(
        &self,
        equity: f64,
        position_value: f64,
        cash: f64,
        total_exposure: f64,
        now: DateTime<Utc>,
    ) -> Result<(), PrmError> {
        let mut inner = self.inner.write().expect("PRM lock poisoned");
        inner.state.update_equity(equity, now)?;
        inner.state.update_position_value(position_value)?;
        inner.state.update_cash(cash)?;
        inner.state.update_exposure(total_exposure)?;
        Ok(())
    }

    pub fn on_position_change(&self, sid: &StrategyId, new_count: u32) {
        let mut inner = self.inner.write().expect("PRM lock poisoned");
        inner.state.update_positions(sid, new_count);
    }

    pub fn on_day_close(&self, sid: &StrategyId, daily_return: f64) {
        let mut inner = self.inner.write().expect("PRM lock poisoned");
        inner.ledger.record_return(sid, daily_return);
    }

    pub fn on_day_boundary(&self) {
        let mut inner = self.inner.write().expect("PRM lock poisoned");
        inner.state.reset_daily();
        tracing::debug!("daily tracking reset");
    }

    // ---- Command surface ----

    /// Fails with `InvalidInput` if active weights would sum to more than 1.
    pub fn set_allocations(&self, list: Vec<StrategyAllocation>) -> Result<(), PrmError> {
        const EPS: f64 = 1e-9;
        let sum = active_allocation_sum(&list);
        if sum > 1.0 + EPS {
            return Err(PrmError::invalid(format!(
                "SetAllocations: active weights sum to {sum}, exceeds 1.0"
            )));
        }
        let mut inner = self.inner.write().expect("PRM lock poisoned");
        inner.current_weights = list
            .iter()
            .filter(|a| a.active)
            .map(|a| (a.strategy_id.clone(), a.allocation))
            .collect();
        inner.allocations = list;
        Ok(())
    }

    pub fn set_limits(&self, limits: RiskLimits) {
        let mut inner = self.inner.write().expect("PRM lock poisoned");
        inner.limits = limits;
    }

    pub fn set_allocator(&self, cfg: AllocatorConfig) {
        let mut inner = self.inner.write().expect("PRM lock poisoned");
        inner.allocator_cfg = cfg;
    }

    pub fn set_sizer(&self, sid: StrategyId, spec: SizerSpec) {
        let mut inner = self.inner.write().expect("PRM lock poisoned");
        inner.sizers.insert(sid, spec.to_sizer());
    }

    // ---- Decision surface ----

    pub fn can_trade(&self, sid: &StrategyId) -> (bool, GateReason) {
        let inner = self.inner.read().expect("PRM lock poisoned");
        risk::gate::can_trade(&inner.state, &inner.limits, sid, &inner.allocations)
    }

    /// Runs the gate, then (if allowed) the strategy's configured sizer.
    /// Gate denials and sizer rejections never mutate state.
    pub fn on_trade_request(&self, sid: &StrategyId, entry: f64, stop_or_atr: f64) -> Decision {
        let inner = self.inner.read().expect("PRM lock poisoned");

        let (allowed, reason) =
            risk::gate::can_trade(&inner.state, &inner.limits, sid, &inner.allocations);
        if !allowed {
            tracing::debug!(strategy = %sid, reason = reason.description(), "trade denied");
            return Decision::Denied(reason);
        }

        let Some(sizer) = inner.sizers.get(sid) else {
            tracing::debug!(strategy = %sid, "trade skipped: no sizer configured");
            return Decision::Skipped(RejectReason::InvalidInput);
        };

        match sizer.compute_shares(inner.state.total_equity, entry, stop_or_atr) {
            SizingOutcome::Sized(shares) => Decision::Approved(shares),
            SizingOutcome::Rejected(reason) => {
                tracing::debug!(strategy = %sid, reason = reason.description(), "trade skipped");
                Decision::Skipped(reason)
            }
        }
    }

    // ---- Query surface ----

    pub fn risk_status(&self) -> RiskStatus {
        let inner = self.inner.read().expect("PRM lock poisoned");
        let state = &inner.state;
        let limits = &inner.limits;

        if state.current_drawdown_pct() > limits.max_portfolio_drawdown_pct {
            return RiskStatus::Red("drawdown exceeds limit");
        }
        if limits.max_daily_loss > 0.0 && state.daily_pnl() < -limits.max_daily_loss {
            return RiskStatus::Red("daily loss exceeds limit");
        }
        if state.leverage > limits.max_leverage {
            return RiskStatus::Red("leverage exceeds limit");
        }

        let warnings = risk::gate::warning_band(state, limits);
        if warnings.iter().any(|w| w.level == WarningLevel::Yellow) {
            RiskStatus::Yellow(warnings)
        } else {
            RiskStatus::Green
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read().expect("PRM lock poisoned");
        let state = &inner.state;

        let metrics = inner
            .allocations
            .iter()
            .map(|a| metrics::compute(&a.strategy_id, &inner.ledger, a.active, state.last_update))
            .collect();

        Snapshot {
            total_equity: state.total_equity,
            cash: state.cash,
            position_value: state.position_value,
            peak_equity: state.peak_equity,
            current_drawdown: state.current_drawdown(),
            current_drawdown_pct: state.current_drawdown_pct(),
            daily_pnl: state.daily_pnl(),
            open_positions: state.open_positions(),
            leverage: state.leverage,
            last_update: state.last_update,
            allocations: inner.allocations.clone(),
            metrics,
        }
    }

    pub fn correlation_matrix(&self) -> CorrelationMatrix {
        let inner = self.inner.read().expect("PRM lock poisoned");
        let ids = inner.ledger.known_strategies().to_vec();

        let matrix = ids
            .iter()
            .map(|i| {
                ids.iter()
                    .map(|j| {
                        if i == j {
                            1.0
                        } else {
                            numerics::pearson_correlation(inner.ledger.full(i), inner.ledger.full(j))
                                .unwrap_or(0.0)
                        }
                    })
                    .collect()
            })
            .collect();

        CorrelationMatrix { ids, matrix }
    }

    // ---- Rebalance tick ----

    /// Computes the target vector, decides via hysteresis, and commits
    /// the blend when warranted. An unchanged target against an unchanged
    /// current vector never re-commits.
    pub fn on_rebalance_tick(&self, now: DateTime<Utc>) -> Option<AllocationReport> {
        let mut inner = self.inner.write().expect("PRM lock poisoned");

        let active: Vec<StrategyId> = inner
            .allocations
            .iter()
            .filter(|a| a.active)
            .map(|a| a.strategy_id.clone())
            .collect();
        if active.is_empty() {
            return None;
        }

        let cfg = inner.allocator_cfg;
        let outcome = allocator::compute_target_weights(
            cfg.method,
            &active,
            &inner.ledger,
            cfg.lookback_period,
        );
        if let Some(reason) = &outcome.fallback_reason {
            tracing::debug!(reason = %reason, "allocator fell back to equal weight");
        }

        let mut target = outcome.weights;
        allocator::clamp_and_renormalize(&mut target, cfg.min_allocation, cfg.max_allocation);

        let (report, blended) = rebalance::tick(
            now,
            cfg.method,
            &inner.current_weights,
            &target,
            cfg.rebalance_threshold,
            cfg.adaptation_speed,
        );

        if report.is_some() {
            inner.current_weights = blended.clone();
            for allocation in inner.allocations.iter_mut() {
                if let Some((_, w)) = blended.iter().find(|(sid, _)| *sid == allocation.strategy_id)
                {
                    allocation.allocation = *w;
                }
            }
        }

        report
    }
}
