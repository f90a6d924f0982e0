//! `StrategyId`: opaque stable identifier for a trading strategy.
//!
//! Strategies are registered at runtime via `SetAllocations` rather than
//! drawn from a closed set, so this is a string-backed newtype instead of
//! an enum.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct StrategyId(String);

impl StrategyId {
    pub fn new(id: impl Into<String>) -> Self {
        StrategyId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StrategyId {
    fn from(s: &str) -> Self {
        StrategyId::new(s)
    }
}

impl From<String> for StrategyId {
    fn from(s: String) -> Self {
        StrategyId::new(s)
    }
}
