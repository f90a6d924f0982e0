//! Enumerated, typed configuration records, with named constructors per
//! risk profile.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationMethod {
    EqualWeight,
    PerformanceWeighted,
    SharpeWeighted,
    RiskParity,
    AdaptiveKelly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizerKind {
    FixedDollarRisk,
    PercentRisk,
    FixedFractional,
    VolatilityAdjusted,
    KellyCriterion,
}

/// Parameters for one of the five sizer kinds. Fields unused by a given
/// `kind` are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizerSpec {
    pub kind: SizerKind,
    pub risk_amount: f64,
    pub risk_pct: f64,
    pub cap_pct: f64,
    pub fraction: f64,
    pub atr_multiple: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub kelly_fraction: f64,
}

impl SizerSpec {
    pub fn to_sizer(&self) -> Box<dyn crate::sizing::PositionSizer> {
        use crate::sizing::*;
        match self.kind {
            SizerKind::FixedDollarRisk => Box::new(FixedDollarRisk {
                risk_amount: self.risk_amount,
            }),
            SizerKind::PercentRisk => Box::new(PercentRisk {
                risk_pct: self.risk_pct,
                cap_pct: self.cap_pct,
            }),
            SizerKind::FixedFractional => Box::new(FixedFractional {
                fraction: self.fraction,
            }),
            SizerKind::VolatilityAdjusted => Box::new(VolatilityAdjusted {
                risk_pct: self.risk_pct,
                atr_multiple: self.atr_multiple,
                cap_pct: self.cap_pct,
            }),
            SizerKind::KellyCriterion => Box::new(KellyCriterion {
                win_rate: self.win_rate,
                avg_win: self.avg_win,
                avg_loss: self.avg_loss,
                fraction: self.kelly_fraction,
                cap_pct: self.cap_pct,
            }),
        }
    }
}

/// Risk gate limits. Immutable after construction unless reloaded
/// wholesale via `SetLimits`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    pub max_portfolio_drawdown_pct: f64,
    pub max_daily_loss: f64,
    pub max_concurrent_positions: u32,
    pub max_correlation: f64,
    pub min_cash_reserve: f64,
    pub max_leverage: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        RiskLimits {
            max_portfolio_drawdown_pct: 15.0,
            max_daily_loss: 0.0,
            max_concurrent_positions: 10,
            max_correlation: 0.8,
            min_cash_reserve: 0.0,
            max_leverage: 1.5,
        }
    }
}

/// Allocator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocatorConfig {
    pub method: AllocationMethod,
    pub lookback_period: usize,
    pub min_allocation: f64,
    pub max_allocation: f64,
    pub rebalance_threshold: f64,
    pub adaptation_speed: f64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        AllocatorConfig {
            method: AllocationMethod::EqualWeight,
            lookback_period: 63,
            min_allocation: 0.0,
            max_allocation: 1.0,
            rebalance_threshold: 0.02,
            adaptation_speed: 0.5,
        }
    }
}

/// Top-level PRM configuration: risk limits + allocator config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrmConfig {
    pub risk_limits: RiskLimits,
    pub allocator: AllocatorConfig,
}

impl PrmConfig {
    /// Conservative starter profile: tighter drawdown/leverage limits,
    /// fewer concurrent positions, equal-weight allocation.
    pub fn conservative() -> Self {
        PrmConfig {
            risk_limits: RiskLimits {
                max_portfolio_drawdown_pct: 10.0,
                max_daily_loss: 0.0,
                max_concurrent_positions: 8,
                max_correlation: 0.7,
                min_cash_reserve: 0.0,
                max_leverage: 1.2,
            },
            allocator: AllocatorConfig {
                method: AllocationMethod::EqualWeight,
                lookback_period: 63,
                min_allocation: 0.0,
                max_allocation: 0.4,
                rebalance_threshold: 0.02,
                adaptation_speed: 0.3,
            },
        }
    }

    /// Aggressive profile: looser drawdown/leverage limits, more
    /// concurrent positions, Sharpe-weighted allocation.
    pub fn aggressive() -> Self {
        PrmConfig {
            risk_limits: RiskLimits {
                max_portfolio_drawdown_pct: 20.0,
                max_daily_loss: 0.0,
                max_concurrent_positions: 20,
                max_correlation: 0.9,
                min_cash_reserve: 0.0,
                max_leverage: 2.0,
            },
            allocator: AllocatorConfig {
                method: AllocationMethod::SharpeWeighted,
                lookback_period: 126,
                min_allocation: 0.0,
                max_allocation: 0.6,
                rebalance_threshold: 0.03,
                adaptation_speed: 0.6,
            },
        }
    }
}

impl Default for PrmConfig {
    fn default() -> Self {
        PrmConfig {
            risk_limits: RiskLimits::default(),
            allocator: AllocatorConfig::default(),
        }
    }
}
