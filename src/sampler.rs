//! Random long-only weight vectors.
//!
//! Each weight is drawn uniformly from [0, 1) and the vector is divided by its
//! sum. Every long-only allocation is reachable, but the simplex is not
//! sampled uniformly: draws cluster toward equal weights as the number of
//! assets grows.

use crate::error::{FrontierError, Result};
use rand::Rng;
use std::sync::Arc;

pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Portfolio weights tied to the ticker universe they were drawn for.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightVector {
    tickers: Arc<[String]>,
    weights: Vec<f64>,
}

impl WeightVector {
    /// Normalizes raw non-negative values into weights summing to one.
    #[allow(dead_code)]
    pub fn normalized(tickers: Arc<[String]>, raw: Vec<f64>) -> Result<Self> {
        if raw.len() != tickers.len() {
            return Err(FrontierError::invalid_config(format!(
                "{} weights for {} tickers",
                raw.len(),
                tickers.len()
            )));
        }
        if raw.iter().any(|w| !(w.is_finite() && *w >= 0.0)) {
            return Err(FrontierError::invalid_config("weights must be finite and non-negative"));
        }
        let sum: f64 = raw.iter().sum();
        if sum <= 0.0 {
            return Err(FrontierError::invalid_config("weights sum to zero"));
        }
        Ok(Self {
            tickers,
            weights: raw.into_iter().map(|w| w / sum).collect(),
        })
    }

    pub fn tickers(&self) -> &Arc<[String]> {
        &self.tickers
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .map(|i| self.weights[i])
    }

    /// (ticker, weight) pairs in universe order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.tickers
            .iter()
            .map(String::as_str)
            .zip(self.weights.iter().copied())
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }
}

/// Draws one weight vector. An empty universe has no allocation to draw.
pub fn sample_weights<R: Rng>(tickers: &Arc<[String]>, rng: &mut R) -> Result<WeightVector> {
    let n = tickers.len();
    if n == 0 {
        return Err(FrontierError::insufficient_data("ticker universe", 1, 0));
    }
    loop {
        let raw: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..1.0)).collect();
        let sum: f64 = raw.iter().sum();
        if sum > 0.0 {
            return Ok(WeightVector {
                tickers: tickers.clone(),
                weights: raw.into_iter().map(|w| w / sum).collect(),
            });
        }
    }
}
