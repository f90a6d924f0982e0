//! Per-strategy append-only daily-return series.
//!
//! Registration order is tracked separately from the map so that every
//! consumer (allocator, correlation matrix) iterates deterministically
//! regardless of `HashMap` order.

use std::collections::HashMap;

use crate::strategy::StrategyId;

#[derive(Debug, Default)]
pub struct ReturnLedger {
    series: HashMap<StrategyId, Vec<f64>>,
    order: Vec<StrategyId>,
}

impl ReturnLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a daily fractional return for `sid`. Registers `sid` in
    /// iteration order on first use.
    pub fn record_return(&mut self, sid: &StrategyId, r: f64) {
        if !self.series.contains_key(sid) {
            self.order.push(sid.clone());
        }
        self.series.entry(sid.clone()).or_default().push(r);
    }

    /// Last `min(lookback, len)` returns for `sid`, oldest first.
    pub fn recent(&self, sid: &StrategyId, lookback: usize) -> &[f64] {
        match self.series.get(sid) {
            Some(all) => {
                let start = all.len().saturating_sub(lookback);
                &all[start..]
            }
            None => &[],
        }
    }

    /// Full series for `sid` (used by the correlation matrix).
    pub fn full(&self, sid: &StrategyId) -> &[f64] {
        self.series.get(sid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Strategies that have at least one recorded return, in the order they
    /// were first recorded.
    pub fn known_strategies(&self) -> &[StrategyId] {
        &self.order
    }

    pub fn len(&self, sid: &StrategyId) -> usize {
        self.series.get(sid).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
