//! Risk/return scatter data shared by the terminal and desktop views.

use crate::evaluator::SimulatedPortfolio;

/// Points as (volatility, expected return), grouped into equal-width Sharpe
/// bins from lowest to highest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScatterBins {
    pub bins: Vec<Vec<(f64, f64)>>,
    /// Zero-volatility portfolios, kept apart from the Sharpe colouring.
    pub degenerate: Vec<(f64, f64)>,
    pub sharpe_range: (f64, f64),
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

fn padded(min: f64, max: f64) -> [f64; 2] {
    if !(min.is_finite() && max.is_finite()) {
        return [0.0, 1.0];
    }
    let span = max - min;
    let pad = if span > 0.0 { span * 0.05 } else { min.abs().max(1e-3) * 0.05 };
    [min - pad, max + pad]
}

pub fn bin_by_sharpe(portfolios: &[SimulatedPortfolio], num_bins: usize) -> ScatterBins {
    let num_bins = num_bins.max(1);
    let mut out = ScatterBins {
        bins: vec![Vec::new(); num_bins],
        ..ScatterBins::default()
    };

    let (lo, hi) = portfolios
        .iter()
        .filter(|p| !p.degenerate)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.sharpe_ratio), hi.max(p.sharpe_ratio))
        });
    out.sharpe_range = (lo, hi);
    let width = (hi - lo) / num_bins as f64;

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);

    for p in portfolios {
        let point = (p.volatility, p.expected_return);
        x_min = x_min.min(point.0);
        x_max = x_max.max(point.0);
        y_min = y_min.min(point.1);
        y_max = y_max.max(point.1);

        if p.degenerate {
            out.degenerate.push(point);
            continue;
        }
        let idx = if width > 0.0 {
            (((p.sharpe_ratio - lo) / width) as usize).min(num_bins - 1)
        } else {
            num_bins - 1
        };
        out.bins[idx].push(point);
    }

    out.x_bounds = padded(x_min, x_max);
    out.y_bounds = padded(y_min, y_max);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::WeightVector;
    use std::sync::Arc;

    fn portfolio(ret: f64, vol: f64) -> SimulatedPortfolio {
        let tickers: Arc<[String]> = vec!["A".to_string()].into();
        let sharpe = if vol > 0.0 { ret / vol } else { f64::INFINITY };
        SimulatedPortfolio {
            weights: WeightVector::normalized(tickers, vec![1.0]).unwrap(),
            expected_return: ret,
            volatility: vol,
            sharpe_ratio: sharpe,
            degenerate: vol == 0.0,
        }
    }

    #[test]
    fn test_bins_cover_every_point() {
        let table = vec![
            portfolio(0.10, 0.20),
            portfolio(0.20, 0.20),
            portfolio(0.30, 0.20),
            portfolio(0.05, 0.0),
        ];
        let scatter = bin_by_sharpe(&table, 3);

        assert_eq!(scatter.bins.len(), 3);
        assert_eq!(scatter.bins[0], vec![(0.20, 0.10)]);
        assert_eq!(scatter.bins[2], vec![(0.20, 0.30)]);
        assert_eq!(scatter.degenerate, vec![(0.0, 0.05)]);
        let total: usize = scatter.bins.iter().map(Vec::len).sum();
        assert_eq!(total + scatter.degenerate.len(), table.len());

        assert!(scatter.x_bounds[0] < 0.0 && scatter.x_bounds[1] > 0.20);
        assert!(scatter.y_bounds[0] < 0.05 && scatter.y_bounds[1] > 0.30);
    }

    #[test]
    fn test_equal_sharpe_lands_in_top_bin() {
        let table = vec![portfolio(0.10, 0.10), portfolio(0.20, 0.20)];
        let scatter = bin_by_sharpe(&table, 4);
        assert_eq!(scatter.bins[3].len(), 2);
    }

    #[test]
    fn test_empty_input_has_default_bounds() {
        let scatter = bin_by_sharpe(&[], 3);
        assert_eq!(scatter.x_bounds, [0.0, 1.0]);
        assert!(scatter.bins.iter().all(Vec::is_empty));
    }
}
