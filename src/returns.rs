//! Daily simple returns and their annualized mean/covariance.

use crate::error::{FrontierError, Result};
use crate::matrix::PriceMatrix;
use std::sync::Arc;

/// Period-over-period simple returns; one row fewer than the price matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnSeries {
    pub tickers: Arc<[String]>,
    pub rows: Vec<Vec<f64>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnnualizedStats {
    pub tickers: Arc<[String]>,
    pub periods_per_year: f64,
    pub daily_mean: Vec<f64>,
    pub daily_covariance: Vec<Vec<f64>>,
    /// Mean daily return scaled by `periods_per_year`.
    pub mean_return: Vec<f64>,
    /// Sample covariance of daily returns scaled by `periods_per_year`.
    pub covariance: Vec<Vec<f64>>,
}

impl AnnualizedStats {
    /// Builds stats directly from annualized inputs.
    #[allow(dead_code)]
    pub fn from_annual(
        tickers: Vec<String>,
        mean_return: Vec<f64>,
        covariance: Vec<Vec<f64>>,
        periods_per_year: f64,
    ) -> Result<Self> {
        let n = tickers.len();
        if mean_return.len() != n || covariance.len() != n || covariance.iter().any(|r| r.len() != n) {
            return Err(FrontierError::invalid_config(format!(
                "statistics for {} tickers must be a {}-vector and a {}x{} matrix",
                n, n, n, n
            )));
        }
        let daily_mean = mean_return.iter().map(|m| m / periods_per_year).collect();
        let daily_covariance = covariance
            .iter()
            .map(|row| row.iter().map(|c| c / periods_per_year).collect())
            .collect();
        Ok(Self {
            tickers: tickers.into(),
            periods_per_year,
            daily_mean,
            daily_covariance,
            mean_return,
            covariance,
        })
    }

    pub fn num_assets(&self) -> usize {
        self.tickers.len()
    }

    /// Annualized volatility of a single ticker.
    pub fn asset_volatility(&self, index: usize) -> f64 {
        self.covariance[index][index].max(0.0).sqrt()
    }
}

pub fn daily_returns(prices: &PriceMatrix) -> Result<ReturnSeries> {
    if prices.num_rows() < 2 {
        return Err(FrontierError::insufficient_data("price matrix", 2, prices.num_rows()));
    }

    let rows = prices
        .rows()
        .windows(2)
        .map(|w| {
            w[0].iter()
                .zip(w[1].iter())
                .map(|(prev, curr)| (curr - prev) / prev)
                .collect()
        })
        .collect();

    Ok(ReturnSeries {
        tickers: prices.tickers().clone(),
        rows,
    })
}

fn column_means(rows: &[Vec<f64>], n: usize) -> Vec<f64> {
    let count = rows.len() as f64;
    let mut means = vec![0.0; n];
    for row in rows {
        for (m, r) in means.iter_mut().zip(row.iter()) {
            *m += r;
        }
    }
    means.iter_mut().for_each(|m| *m /= count);
    means
}

/// Sample covariance (denominator n - 1). A single observation has no
/// spread to measure and yields a zero matrix.
fn sample_covariance(rows: &[Vec<f64>], means: &[f64]) -> Vec<Vec<f64>> {
    let n = means.len();
    let mut cov = vec![vec![0.0; n]; n];
    if rows.len() < 2 {
        return cov;
    }
    let denom = rows.len() as f64 - 1.0;

    for i in 0..n {
        for j in i..n {
            let sum: f64 = rows
                .iter()
                .map(|row| (row[i] - means[i]) * (row[j] - means[j]))
                .sum();
            let c = sum / denom;
            cov[i][j] = c;
            cov[j][i] = c;
        }
    }
    cov
}

pub fn compute_annualized_stats(prices: &PriceMatrix, periods_per_year: f64) -> Result<AnnualizedStats> {
    if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
        return Err(FrontierError::invalid_config(format!(
            "periods per year must be positive, got {}",
            periods_per_year
        )));
    }

    let returns = daily_returns(prices)?;
    let n = returns.tickers.len();
    let daily_mean = column_means(&returns.rows, n);
    let daily_covariance = sample_covariance(&returns.rows, &daily_mean);

    let mean_return = daily_mean.iter().map(|m| m * periods_per_year).collect();
    let covariance = daily_covariance
        .iter()
        .map(|row| row.iter().map(|c| c * periods_per_year).collect())
        .collect();

    Ok(AnnualizedStats {
        tickers: returns.tickers,
        periods_per_year,
        daily_mean,
        daily_covariance,
        mean_return,
        covariance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn matrix(tickers: &[&str], rows: Vec<Vec<f64>>) -> PriceMatrix {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..rows.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        PriceMatrix::new(dates, tickers.iter().map(|s| s.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn test_daily_returns_drop_first_row() {
        let m = matrix(&["AAA"], vec![vec![100.0], vec![110.0], vec![99.0]]);
        let r = daily_returns(&m).unwrap();
        assert_eq!(r.rows.len(), 2);
        assert!((r.rows[0][0] - 0.10).abs() < 1e-12);
        assert!((r.rows[1][0] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_rows() {
        let m = matrix(&["AAA", "BBB"], vec![vec![100.0, 50.0]]);
        let err = compute_annualized_stats(&m, 250.0).unwrap_err();
        assert!(matches!(
            err,
            FrontierError::InsufficientData { required: 2, available: 1, .. }
        ));
    }

    #[test]
    fn test_annualized_mean_and_sample_covariance() {
        // Returns: A = [0.1, -0.1], B = [0.0, 0.2]
        let m = matrix(
            &["A", "B"],
            vec![vec![100.0, 50.0], vec![110.0, 50.0], vec![99.0, 60.0]],
        );
        let stats = compute_annualized_stats(&m, 250.0).unwrap();

        assert!((stats.daily_mean[0] - 0.0).abs() < 1e-12);
        assert!((stats.daily_mean[1] - 0.1).abs() < 1e-12);
        assert!((stats.mean_return[1] - 25.0).abs() < 1e-9);

        // var(A) = (0.01 + 0.01) / 1 = 0.02, cov(A,B) = (0.1*-0.1 + -0.1*0.1) / 1 = -0.02
        assert!((stats.daily_covariance[0][0] - 0.02).abs() < 1e-12);
        assert!((stats.daily_covariance[0][1] + 0.02).abs() < 1e-12);
        assert!((stats.covariance[0][0] - 5.0).abs() < 1e-9);
        assert!((stats.covariance[1][1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_covariance_matrix_symmetry() {
        let m = matrix(
            &["A", "B", "C"],
            vec![
                vec![10.0, 20.0, 30.0],
                vec![10.5, 19.0, 30.3],
                vec![10.2, 19.8, 29.1],
                vec![11.0, 20.4, 29.9],
                vec![10.7, 21.0, 31.2],
            ],
        );
        let stats = compute_annualized_stats(&m, 250.0).unwrap();
        for i in 0..3 {
            assert!(stats.covariance[i][i] > 0.0, "Variance should be positive");
            for j in 0..3 {
                assert!(
                    (stats.covariance[i][j] - stats.covariance[j][i]).abs() < 1e-12,
                    "Covariance matrix should be symmetric"
                );
            }
        }
    }

    #[test]
    fn test_constant_series_has_zero_variance() {
        let m = matrix(&["FLAT"], vec![vec![5.0], vec![5.0], vec![5.0]]);
        let stats = compute_annualized_stats(&m, 250.0).unwrap();
        assert_eq!(stats.covariance, vec![vec![0.0]]);
        assert_eq!(stats.mean_return, vec![0.0]);
    }

    #[test]
    fn test_single_return_row_gives_zero_covariance() {
        let m = matrix(&["A", "B"], vec![vec![10.0, 20.0], vec![11.0, 19.0]]);
        let stats = compute_annualized_stats(&m, 250.0).unwrap();
        assert!(stats.covariance.iter().flatten().all(|&c| c == 0.0));
    }

    #[test]
    fn test_rejects_non_positive_periods() {
        let m = matrix(&["A"], vec![vec![10.0], vec![11.0]]);
        assert!(matches!(
            compute_annualized_stats(&m, 0.0),
            Err(FrontierError::InvalidConfig(_))
        ));
    }
}
