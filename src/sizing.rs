//! Position sizers.
//!
//! A degenerate sizing result is reported as a `SizingOutcome::Rejected`
//! value rather than by throwing or panicking, so callers can match on it
//! directly.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidInput,
    NoPosition,
    PositionTooSmall,
}

impl RejectReason {
    pub fn description(&self) -> &'static str {
        match self {
            RejectReason::InvalidInput => "invalid input",
            RejectReason::NoPosition => "no position",
            RejectReason::PositionTooSmall => "position too small",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingOutcome {
    Sized(u64),
    Rejected(RejectReason),
}

/// Common capability set shared by every sizing policy.
pub trait PositionSizer: std::fmt::Debug + Send + Sync {
    /// `stop_or_atr` is the stop price for dollar/percent-risk sizers, or
    /// the ATR value for the volatility-adjusted sizer. Sizers that don't
    /// need it (Kelly, fixed-fractional) ignore it.
    fn compute_shares(&self, equity: f64, entry: f64, stop_or_atr: f64) -> SizingOutcome;

    fn describe(&self) -> &'static str;
}

fn universal_preconditions_ok(equity: f64, entry: f64) -> bool {
    equity.is_finite() && equity > 0.0 && entry.is_finite() && entry > 0.0
}

fn from_shares(shares: f64) -> SizingOutcome {
    if !shares.is_finite() || shares < 1.0 {
        SizingOutcome::Rejected(RejectReason::PositionTooSmall)
    } else {
        SizingOutcome::Sized(shares.floor() as u64)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedDollarRisk {
    pub risk_amount: f64,
}

impl PositionSizer for FixedDollarRisk {
    fn compute_shares(&self, equity: f64, entry: f64, stop: f64) -> SizingOutcome {
        if !universal_preconditions_ok(equity, entry) {
            return SizingOutcome::Rejected(RejectReason::InvalidInput);
        }
        let denom = (entry - stop).abs();
        if denom <= 0.0 {
            return SizingOutcome::Rejected(RejectReason::InvalidInput);
        }
        from_shares((self.risk_amount / denom).floor())
    }

    fn describe(&self) -> &'static str {
        "fixed_dollar_risk"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PercentRisk {
    pub risk_pct: f64,
    pub cap_pct: f64,
}

impl PositionSizer for PercentRisk {
    fn compute_shares(&self, equity: f64, entry: f64, stop: f64) -> SizingOutcome {
        if !universal_preconditions_ok(equity, entry) {
            return SizingOutcome::Rejected(RejectReason::InvalidInput);
        }
        let denom = (entry - stop).abs();
        if denom <= 0.0 {
            return SizingOutcome::Rejected(RejectReason::InvalidInput);
        }
        let risk = equity * self.risk_pct;
        let raw_shares = (risk / denom).floor();
        let cap_shares = (equity * self.cap_pct / entry).floor();
        from_shares(raw_shares.min(cap_shares))
    }

    fn describe(&self) -> &'static str {
        "percent_risk"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedFractional {
    pub fraction: f64,
}

impl PositionSizer for FixedFractional {
    fn compute_shares(&self, equity: f64, entry: f64, _stop_or_atr: f64) -> SizingOutcome {
        if !universal_preconditions_ok(equity, entry) {
            return SizingOutcome::Rejected(RejectReason::InvalidInput);
        }
        from_shares((equity * self.fraction / entry).floor())
    }

    fn describe(&self) -> &'static str {
        "fixed_fractional"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VolatilityAdjusted {
    pub risk_pct: f64,
    pub atr_multiple: f64,
    pub cap_pct: f64,
}

impl PositionSizer for VolatilityAdjusted {
    fn compute_shares(&self, equity: f64, entry: f64, atr: f64) -> SizingOutcome {
        if !universal_preconditions_ok(equity, entry) {
            return SizingOutcome::Rejected(RejectReason::InvalidInput);
        }
        let stop_distance = self.atr_multiple * atr;
        if !stop_distance.is_finite() || stop_distance <= 0.0 {
            return SizingOutcome::Rejected(RejectReason::InvalidInput);
        }
        let risk = equity * self.risk_pct;
        let raw_shares = (risk / stop_distance).floor();
        let cap_shares = (equity * self.cap_pct / entry).floor();
        from_shares(raw_shares.min(cap_shares))
    }

    fn describe(&self) -> &'static str {
        "volatility_adjusted"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KellyCriterion {
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub fraction: f64,
    pub cap_pct: f64,
}

impl PositionSizer for KellyCriterion {
    fn compute_shares(&self, equity: f64, entry: f64, _stop_or_atr: f64) -> SizingOutcome {
        if !universal_preconditions_ok(equity, entry) {
            return SizingOutcome::Rejected(RejectReason::InvalidInput);
        }
        if self.avg_loss <= 0.0 || self.avg_win.is_nan() {
            return SizingOutcome::Rejected(RejectReason::InvalidInput);
        }

        let b = self.avg_win / self.avg_loss;
        let raw_kelly = self.win_rate - (1.0 - self.win_rate) / b;
        let kelly = raw_kelly * self.fraction;

        if kelly <= 0.0 {
            return SizingOutcome::Rejected(RejectReason::NoPosition);
        }

        let clamped_kelly = kelly.min(self.cap_pct);
        from_shares((equity * clamped_kelly / entry).floor())
    }

    fn describe(&self) -> &'static str {
        "kelly_criterion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_risk_clamps_to_cap() {
        let sizer = PercentRisk {
            risk_pct: 0.01,
            cap_pct: 0.20,
        };
        let outcome = sizer.compute_shares(50_000.0, 50.0, 48.0);
        assert_eq!(outcome, SizingOutcome::Sized(200));
    }

    #[test]
    fn kelly_clamps_to_cap() {
        let sizer = KellyCriterion {
            win_rate: 0.55,
            avg_win: 2.0,
            avg_loss: 1.0,
            fraction: 0.5,
            cap_pct: 0.10,
        };
        let outcome = sizer.compute_shares(100_000.0, 50.0, 0.0);
        assert_eq!(outcome, SizingOutcome::Sized(200));
    }

    #[test]
    fn kelly_non_positive_is_no_position() {
        let sizer = KellyCriterion {
            win_rate: 0.3,
            avg_win: 1.0,
            avg_loss: 2.0,
            fraction: 1.0,
            cap_pct: 0.5,
        };
        let outcome = sizer.compute_shares(10_000.0, 10.0, 0.0);
        assert_eq!(outcome, SizingOutcome::Rejected(RejectReason::NoPosition));
    }

    #[test]
    fn fixed_fractional_rejects_sub_share_positions() {
        let sizer = FixedFractional { fraction: 0.0001 };
        let outcome = sizer.compute_shares(100.0, 500.0, 0.0);
        assert_eq!(
            outcome,
            SizingOutcome::Rejected(RejectReason::PositionTooSmall)
        );
    }

    #[test]
    fn fixed_dollar_risk_requires_positive_denominator() {
        let sizer = FixedDollarRisk { risk_amount: 500.0 };
        let outcome = sizer.compute_shares(10_000.0, 50.0, 50.0);
        assert_eq!(outcome, SizingOutcome::Rejected(RejectReason::InvalidInput));
    }

    #[test]
    fn volatility_adjusted_basic() {
        let sizer = VolatilityAdjusted {
            risk_pct: 0.02,
            atr_multiple: 2.0,
            cap_pct: 0.5,
        };
        // risk = 1000*0.02 = 20, stop_distance = 2*1.0 = 2 -> 10 shares
        let outcome = sizer.compute_shares(1_000.0, 20.0, 1.0);
        assert_eq!(outcome, SizingOutcome::Sized(10));
    }
}
