//! `StrategyAllocation`: the PRM's registered per-strategy weight.

use crate::strategy::StrategyId;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyAllocation {
    pub strategy_id: StrategyId,
    pub allocation: f64,
    pub active: bool,
}

/// `Σ allocation over active` for a list of allocations.
pub fn active_allocation_sum(allocations: &[StrategyAllocation]) -> f64 {
    allocations
        .iter()
        .filter(|a| a.active)
        .map(|a| a.allocation)
        .sum()
}
