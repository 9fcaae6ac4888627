//! Aggregation of simulated portfolios and selection of the max-Sharpe and
//! min-volatility picks.

use crate::error::{FrontierError, Result};
use crate::evaluator::SimulatedPortfolio;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::warn;

/// All portfolios of one run, in trial order.
#[derive(Clone, Debug, Default)]
pub struct PortfolioTable {
    pub tickers: Arc<[String]>,
    pub portfolios: Vec<SimulatedPortfolio>,
    /// Seed the run was generated from.
    pub seed: u64,
}

impl PortfolioTable {
    pub fn len(&self) -> usize {
        self.portfolios.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.portfolios.is_empty()
    }

    pub fn select_frontier(&self) -> Result<FrontierPick> {
        select_frontier(&self.portfolios)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrontierPick {
    pub best_sharpe: SimulatedPortfolio,
    pub min_volatility: SimulatedPortfolio,
    pub degenerate_count: usize,
}

/// Sharpe ordering used for selection: any non-degenerate portfolio beats any
/// degenerate one, and NaN ranks below every number.
pub fn compare_sharpe(a: &SimulatedPortfolio, b: &SimulatedPortfolio) -> Ordering {
    fn key(p: &SimulatedPortfolio) -> (bool, f64) {
        let s = if p.sharpe_ratio.is_nan() {
            f64::NEG_INFINITY
        } else {
            p.sharpe_ratio
        };
        (!p.degenerate, s)
    }
    let (a_valid, a_sharpe) = key(a);
    let (b_valid, b_sharpe) = key(b);
    a_valid
        .cmp(&b_valid)
        .then_with(|| a_sharpe.total_cmp(&b_sharpe))
        .then_with(|| b.sharpe_ratio.is_nan().cmp(&a.sharpe_ratio.is_nan()))
}

pub fn select_frontier(portfolios: &[SimulatedPortfolio]) -> Result<FrontierPick> {
    let (first, rest) = portfolios
        .split_first()
        .ok_or(FrontierError::EmptyPortfolioSet)?;

    let mut best_sharpe = first;
    let mut min_volatility = first;
    let mut degenerate_count = usize::from(first.degenerate);

    // Strict comparisons keep the earliest entry on ties.
    for p in rest {
        if compare_sharpe(p, best_sharpe) == Ordering::Greater {
            best_sharpe = p;
        }
        if p.volatility.total_cmp(&min_volatility.volatility) == Ordering::Less {
            min_volatility = p;
        }
        if p.degenerate {
            degenerate_count += 1;
        }
    }

    if degenerate_count > 0 {
        warn!(
            "{} of {} portfolios have zero volatility and an undefined Sharpe ratio; they are ranked last for max-Sharpe selection",
            degenerate_count,
            portfolios.len()
        );
    }

    Ok(FrontierPick {
        best_sharpe: best_sharpe.clone(),
        min_volatility: min_volatility.clone(),
        degenerate_count,
    })
}
