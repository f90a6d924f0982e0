pub mod gate;
pub mod state;

pub use gate::{can_trade, warning_band, GateReason, RiskWarning, WarningLevel};
pub use state::PortfolioState;
