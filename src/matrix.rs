//! Date-aligned price matrix: rows are trading dates, columns are tickers.

use crate::data::StockData;
use crate::error::{FrontierError, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq)]
pub struct PriceMatrix {
    dates: Vec<NaiveDate>,
    tickers: Arc<[String]>,
    /// Row-major adjusted closes, `prices[row][column]`.
    prices: Vec<Vec<f64>>,
}

impl PriceMatrix {
    /// Builds a matrix from explicit rows. Rows are reordered by date; every
    /// price must be positive and finite and no date may repeat.
    pub fn new(dates: Vec<NaiveDate>, tickers: Vec<String>, prices: Vec<Vec<f64>>) -> Result<Self> {
        if tickers.is_empty() {
            return Err(FrontierError::insufficient_data("ticker universe", 1, 0));
        }
        if dates.len() != prices.len() {
            return Err(FrontierError::invalid_config(format!(
                "{} dates for {} price rows",
                dates.len(),
                prices.len()
            )));
        }

        let mut rows: Vec<(NaiveDate, Vec<f64>)> = dates.into_iter().zip(prices).collect();
        rows.sort_by_key(|(date, _)| *date);

        for (i, (date, row)) in rows.iter().enumerate() {
            if row.len() != tickers.len() {
                return Err(FrontierError::RaggedRow {
                    row: i,
                    expected: tickers.len(),
                    actual: row.len(),
                });
            }
            if i > 0 && rows[i - 1].0 == *date {
                return Err(FrontierError::DuplicateObservation {
                    ticker: tickers.join(","),
                    date: *date,
                });
            }
            for (ticker, &price) in tickers.iter().zip(row.iter()) {
                if !(price.is_finite() && price > 0.0) {
                    return Err(FrontierError::InvalidPrice {
                        ticker: ticker.clone(),
                        date: *date,
                        price,
                    });
                }
            }
        }

        let (dates, prices) = rows.into_iter().unzip();
        Ok(Self {
            dates,
            tickers: tickers.into(),
            prices,
        })
    }

    /// Compiles per-ticker histories into one matrix, keeping only the dates
    /// every ticker has a price for.
    pub fn from_series(tickers: &[String], series: &HashMap<String, StockData>) -> Result<Self> {
        let mut by_ticker: Vec<BTreeMap<NaiveDate, f64>> = Vec::with_capacity(tickers.len());

        for ticker in tickers {
            let data = series
                .get(ticker)
                .ok_or_else(|| FrontierError::UnknownTicker(ticker.clone()))?;
            if data.history.len() < 2 {
                return Err(FrontierError::insufficient_data(
                    ticker.as_str(),
                    2,
                    data.history.len(),
                ));
            }

            let mut points = BTreeMap::new();
            for point in &data.history {
                if points.insert(point.date, point.adj_close).is_some() {
                    return Err(FrontierError::DuplicateObservation {
                        ticker: ticker.clone(),
                        date: point.date,
                    });
                }
            }
            by_ticker.push(points);
        }

        let Some((first, rest)) = by_ticker.split_first() else {
            return Err(FrontierError::insufficient_data("ticker universe", 1, 0));
        };

        let union_len = {
            let mut all: Vec<&NaiveDate> = by_ticker.iter().flat_map(|m| m.keys()).collect();
            all.sort();
            all.dedup();
            all.len()
        };

        let mut dates = Vec::with_capacity(first.len());
        let mut prices = Vec::with_capacity(first.len());
        for (date, &price) in first {
            let mut row = Vec::with_capacity(tickers.len());
            row.push(price);
            for other in rest {
                match other.get(date) {
                    Some(&p) => row.push(p),
                    None => break,
                }
            }
            if row.len() == tickers.len() {
                dates.push(*date);
                prices.push(row);
            }
        }

        let dropped = union_len - dates.len();
        if dropped > 0 {
            warn!(
                "Dropped {} dates not covered by every ticker ({} aligned rows remain)",
                dropped,
                dates.len()
            );
        }
        if dates.len() < 2 {
            return Err(FrontierError::insufficient_data("aligned price matrix", 2, dates.len()));
        }

        info!(
            "Compiled price matrix: {} dates x {} tickers ({} .. {})",
            dates.len(),
            tickers.len(),
            dates[0],
            dates[dates.len() - 1]
        );

        Self::new(dates, tickers.to_vec(), prices)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &Arc<[String]> {
        &self.tickers
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.prices
    }

    pub fn num_rows(&self) -> usize {
        self.prices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PricePoint, StockData};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn series(symbol: &str, points: &[(u32, f64)]) -> StockData {
        StockData {
            symbol: symbol.to_string(),
            history: points
                .iter()
                .map(|&(d, p)| PricePoint {
                    date: day(d),
                    close: p,
                    adj_close: p,
                })
                .collect(),
        }
    }

    #[test]
    fn test_new_sorts_rows_by_date() {
        let m = PriceMatrix::new(
            vec![day(3), day(2)],
            vec!["AAA".to_string()],
            vec![vec![11.0], vec![10.0]],
        )
        .unwrap();
        assert_eq!(m.dates(), &[day(2), day(3)]);
        assert_eq!(m.rows(), &[vec![10.0], vec![11.0]]);
    }

    #[test]
    fn test_new_rejects_invalid_input() {
        let ragged = PriceMatrix::new(
            vec![day(2), day(3)],
            vec!["AAA".to_string(), "BBB".to_string()],
            vec![vec![1.0, 2.0], vec![1.0]],
        );
        assert!(matches!(ragged, Err(FrontierError::RaggedRow { row: 1, .. })));

        let negative = PriceMatrix::new(
            vec![day(2), day(3)],
            vec!["AAA".to_string()],
            vec![vec![1.0], vec![-1.0]],
        );
        assert!(matches!(negative, Err(FrontierError::InvalidPrice { .. })));

        let duplicate = PriceMatrix::new(
            vec![day(2), day(2)],
            vec!["AAA".to_string()],
            vec![vec![1.0], vec![1.1]],
        );
        assert!(matches!(duplicate, Err(FrontierError::DuplicateObservation { .. })));
    }

    #[test]
    fn test_from_series_inner_joins_dates() {
        let mut map = HashMap::new();
        map.insert("AAA".to_string(), series("AAA", &[(2, 10.0), (3, 11.0), (4, 12.0), (5, 13.0)]));
        map.insert("BBB".to_string(), series("BBB", &[(2, 20.0), (4, 22.0), (5, 23.0), (8, 24.0)]));

        let tickers = vec!["BBB".to_string(), "AAA".to_string()];
        let m = PriceMatrix::from_series(&tickers, &map).unwrap();

        assert_eq!(m.dates(), &[day(2), day(4), day(5)]);
        assert_eq!(&m.tickers()[..], &["BBB".to_string(), "AAA".to_string()]);
        assert_eq!(m.rows()[1], vec![22.0, 12.0]);
    }

    #[test]
    fn test_from_series_rejects_short_or_missing_series() {
        let mut map = HashMap::new();
        map.insert("AAA".to_string(), series("AAA", &[(2, 10.0), (3, 11.0)]));
        map.insert("BBB".to_string(), series("BBB", &[(2, 20.0)]));

        let missing = PriceMatrix::from_series(&["ZZZ".to_string()], &map);
        assert_eq!(missing, Err(FrontierError::UnknownTicker("ZZZ".to_string())));

        let short = PriceMatrix::from_series(&["AAA".to_string(), "BBB".to_string()], &map);
        assert!(matches!(
            short,
            Err(FrontierError::InsufficientData { required: 2, available: 1, .. })
        ));
    }

    #[test]
    fn test_from_series_rejects_disjoint_histories() {
        let mut map = HashMap::new();
        map.insert("AAA".to_string(), series("AAA", &[(2, 10.0), (3, 11.0)]));
        map.insert("BBB".to_string(), series("BBB", &[(4, 20.0), (5, 21.0)]));

        let result = PriceMatrix::from_series(&["AAA".to_string(), "BBB".to_string()], &map);
        assert!(matches!(
            result,
            Err(FrontierError::InsufficientData { available: 0, .. })
        ));
    }
}
