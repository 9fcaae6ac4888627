use crate::error::{FrontierError, Result};
use crate::returns::AnnualizedStats;
use crate::sampler::{WEIGHT_SUM_TOLERANCE, WeightVector};

/// One simulated allocation and its annualized risk/return.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatedPortfolio {
    pub weights: WeightVector,
    pub expected_return: f64,
    /// Always >= 0.
    pub volatility: f64,
    /// `expected_return / volatility`, no risk-free rate. Non-finite when
    /// `volatility` is zero.
    pub sharpe_ratio: f64,
    /// Set when the Sharpe ratio is not a finite number.
    pub degenerate: bool,
}

pub fn portfolio_return(weights: &[f64], means: &[f64]) -> f64 {
    weights.iter().zip(means.iter()).map(|(w, r)| w * r).sum()
}

/// `wᵀ Σ w`, clamped at zero to absorb rounding on singular matrices.
pub fn portfolio_variance(weights: &[f64], cov: &[Vec<f64>]) -> f64 {
    let n = weights.len();
    let mut var = 0.0;
    for i in 0..n {
        for j in 0..n {
            var += weights[i] * weights[j] * cov[i][j];
        }
    }
    var.max(0.0)
}

fn sharpe_ratio(expected_return: f64, volatility: f64) -> f64 {
    if volatility > 0.0 {
        expected_return / volatility
    } else if expected_return > 0.0 {
        f64::INFINITY
    } else if expected_return < 0.0 {
        f64::NEG_INFINITY
    } else {
        f64::NAN
    }
}

pub fn evaluate(weights: &WeightVector, stats: &AnnualizedStats) -> Result<SimulatedPortfolio> {
    if weights.tickers()[..] != stats.tickers[..] {
        return Err(FrontierError::TickerMismatch {
            weights: weights.tickers().to_vec(),
            stats: stats.tickers.to_vec(),
        });
    }
    debug_assert!((weights.sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE);

    let expected_return = portfolio_return(weights.as_slice(), &stats.mean_return);
    let volatility = portfolio_variance(weights.as_slice(), &stats.covariance).sqrt();
    let sharpe_ratio = sharpe_ratio(expected_return, volatility);

    Ok(SimulatedPortfolio {
        weights: weights.clone(),
        expected_return,
        volatility,
        sharpe_ratio,
        degenerate: !sharpe_ratio.is_finite(),
    })
}
