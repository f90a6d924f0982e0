//! Pure numerical functions over finite return/price sequences.
//!
//! Every function here is stateless and infallible to call, but several have
//! a minimum-length precondition; those return `Err(PrmError::InsufficientData)`
//! instead of panicking or silently defaulting, so callers can treat it as
//! "skip".

use crate::error::PrmError;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

pub fn mean(xs: &[f64]) -> Result<f64, PrmError> {
    if xs.is_empty() {
        return Err(PrmError::insufficient("mean: empty sequence"));
    }
    Ok(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Sample standard deviation (n-1 denominator). Requires `xs.len() >= 2`.
pub fn sample_stdev(xs: &[f64]) -> Result<f64, PrmError> {
    if xs.len() < 2 {
        return Err(PrmError::insufficient(
            "sample_stdev: need at least 2 observations",
        ));
    }
    let m = mean(xs)?;
    let sum_sq: f64 = xs.iter().map(|x| (x - m).powi(2)).sum();
    let variance = sum_sq / (xs.len() as f64 - 1.0);
    if variance <= 0.0 {
        return Ok(0.0);
    }
    Ok(variance.sqrt())
}

pub fn annualize_vol(sigma_daily: f64) -> f64 {
    sigma_daily * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Annualized Sharpe ratio. Undefined (insufficient data) when `sigma == 0`.
pub fn annualize_sharpe(mean_return: f64, sigma: f64) -> Result<f64, PrmError> {
    if sigma == 0.0 {
        return Err(PrmError::insufficient(
            "annualize_sharpe: zero standard deviation",
        ));
    }
    Ok((mean_return / sigma) * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Convenience: compute annualized Sharpe directly from a daily return series.
pub fn sharpe_from_returns(rs: &[f64]) -> Result<f64, PrmError> {
    let m = mean(rs)?;
    let sd = sample_stdev(rs)?;
    annualize_sharpe(m, sd)
}

/// Pearson correlation coefficient. Requires equal-length sequences of at
/// least 2 observations; returns 0 if either series has zero variance.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> Result<f64, PrmError> {
    if xs.len() != ys.len() {
        return Err(PrmError::invalid(
            "pearson_correlation: sequences must have equal length",
        ));
    }
    if xs.len() < 2 {
        return Err(PrmError::insufficient(
            "pearson_correlation: need at least 2 observations",
        ));
    }

    let mx = mean(xs)?;
    let my = mean(ys)?;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return Ok(0.0);
    }

    let rho = cov / (var_x.sqrt() * var_y.sqrt());
    Ok(rho.clamp(-1.0, 1.0))
}

/// Compound cumulative return over a sequence of fractional daily returns.
pub fn cumulative_return(rs: &[f64]) -> f64 {
    rs.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Returns `(win_rate, win_loss_ratio)`.
pub fn win_stats(rs: &[f64]) -> Result<(f64, f64), PrmError> {
    if rs.is_empty() {
        return Err(PrmError::insufficient("win_stats: empty sequence"));
    }

    let wins: Vec<f64> = rs.iter().copied().filter(|r| *r > 0.0).collect();
    let losses: Vec<f64> = rs.iter().copied().filter(|r| *r < 0.0).map(f64::abs).collect();

    let win_rate = wins.len() as f64 / rs.len() as f64;

    let avg_win = if wins.is_empty() {
        0.0
    } else {
        wins.iter().sum::<f64>() / wins.len() as f64
    };
    let avg_loss = if losses.is_empty() {
        0.0
    } else {
        losses.iter().sum::<f64>() / losses.len() as f64
    };

    let ratio = if avg_loss == 0.0 {
        0.0
    } else {
        avg_win / avg_loss
    };

    Ok((win_rate, ratio))
}

/// Max drawdown (as a positive fraction of the running peak) of the equity
/// curve implied by compounding `rs` from a base of 1.0.
pub fn max_drawdown_fraction(rs: &[f64]) -> f64 {
    let mut equity = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;

    for r in rs {
        equity *= 1.0 + r;
        if equity > peak {
            peak = equity;
        }
        if peak > 0.0 {
            let dd = (peak - equity) / peak;
            if dd > worst {
                worst = dd;
            }
        }
    }

    worst
}
