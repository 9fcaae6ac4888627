use crate::config::{CachePolicy, DataConfig, FETCH_MAX_ATTEMPTS, FETCH_RETRY_DELAY};
use anyhow::Result;
use chrono::{DateTime, NaiveDate};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// One daily observation.
#[derive(Clone, Debug, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
    /// Close adjusted for splits and dividends.
    pub adj_close: f64,
}

/// Holds historical daily prices for a specific symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct StockData {
    pub symbol: String,
    pub history: Vec<PricePoint>,
}

#[derive(Deserialize, Serialize, Debug)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Deserialize, Serialize, Debug)]
struct YahooChart {
    #[serde(default)]
    result: Option<Vec<YahooResult>>,
    #[serde(default)]
    error: Option<YahooError>,
}

#[derive(Deserialize, Serialize, Debug)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Deserialize, Serialize, Debug)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
    #[serde(default)]
    adjclose: Option<Vec<YahooAdjClose>>,
}

#[derive(Deserialize, Serialize, Debug)]
struct YahooQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Deserialize, Serialize, Debug)]
struct YahooAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

pub fn cache_file_path(cache_dir: &Path, symbol: &str, range: &str) -> PathBuf {
    cache_dir.join(format!("{}_{}.json", symbol, range))
}

/// True when the file exists and was modified less than `max_age` ago.
pub fn cache_is_fresh(path: &Path, max_age: Duration) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    match SystemTime::now().duration_since(modified) {
        Ok(age) => age < max_age,
        Err(_) => false,
    }
}

fn read_cache(path: &Path) -> Result<YahooChartResponse> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

fn write_cache(path: &Path, response: &YahooChartResponse) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer(writer, response)?;
    Ok(())
}

/// Fetches daily history for `symbol`, going through the on-disk cache.
///
/// # Arguments
/// * `symbol` - The stock ticker symbol (e.g., "AAPL").
/// * `config` - Range, cache directory and cache policy.
pub async fn fetch_range(symbol: &str, config: &DataConfig) -> Result<StockData> {
    let symbol = symbol.trim().to_uppercase();
    let cache_dir = config.cache_dir.as_path();
    if !cache_dir.exists() {
        std::fs::create_dir_all(cache_dir)?;
    }

    let cache_file = cache_file_path(cache_dir, &symbol, &config.range);

    let response = match config.cache_policy {
        CachePolicy::MaxAge(max_age) if cache_is_fresh(&cache_file, max_age) => {
            info!("Loading {} from cache...", symbol);
            read_cache(&cache_file)?
        }
        policy => {
            if cache_file.exists() {
                match policy {
                    CachePolicy::Refresh => info!("Refreshing cached data for {}...", symbol),
                    CachePolicy::MaxAge(_) => info!("Cache expired for {}, fetching...", symbol),
                }
                match fetch_from_api(&symbol, &config.range, &cache_file).await {
                    Ok(resp) => resp,
                    Err(e) => {
                        warn!(
                            "Refresh failed for {} ({}), using stale cache",
                            symbol, e
                        );
                        read_cache(&cache_file)?
                    }
                }
            } else {
                info!("Cache miss for {}, fetching...", symbol);
                fetch_from_api(&symbol, &config.range, &cache_file).await?
            }
        }
    };

    parse_chart(&symbol, &response)
}

/// Fetches every symbol in order, skipping repeats. Fails on the first
/// symbol that cannot be loaded.
pub async fn fetch_universe(
    symbols: &[String],
    config: &DataConfig,
) -> Result<HashMap<String, StockData>> {
    let mut out: HashMap<String, StockData> = HashMap::new();

    for (idx, raw_symbol) in symbols.iter().enumerate() {
        let symbol = raw_symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(anyhow::anyhow!(
                "historical fetch failed: symbol=<empty>, range={}, reason=empty symbol",
                config.range
            ));
        }
        if out.contains_key(&symbol) {
            continue;
        }

        info!("[{}/{}] Downloading {}", idx + 1, symbols.len(), symbol);
        let data = fetch_range(&symbol, config).await.map_err(|e| {
            anyhow::anyhow!(
                "historical fetch failed: symbol={}, range={}, reason={}",
                symbol,
                config.range,
                e
            )
        })?;
        info!("{}: {} daily observations", data.symbol, data.history.len());
        out.insert(symbol, data);
    }

    Ok(out)
}

async fn fetch_from_api(symbol: &str, range: &str, cache_path: &Path) -> Result<YahooChartResponse> {
    let url = format!(
        "https://query1.finance.yahoo.com/v8/finance/chart/{}?range={}&interval=1d&events=div%2Csplit",
        symbol, range
    );

    let client = reqwest::Client::new();
    let mut attempts = 0;

    loop {
        attempts += 1;
        let fetched = match client
            .get(&url)
            .header("User-Agent", "Mozilla/5.0")
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
        {
            Ok(resp) => resp.json::<YahooChartResponse>().await,
            Err(e) => Err(e),
        };

        match fetched {
            Ok(resp_json) => {
                store_response(symbol, cache_path, &resp_json)?;
                return Ok(resp_json);
            }
            Err(e) => {
                if attempts >= FETCH_MAX_ATTEMPTS {
                    return Err(e.into());
                }
                warn!(
                    "Failed to fetch data for {} (attempt {}/{}): {}",
                    symbol, attempts, FETCH_MAX_ATTEMPTS, e
                );
            }
        }

        tokio::time::sleep(FETCH_RETRY_DELAY).await;
    }
}

/// Rejects chart responses that carry an API error or no result.
fn check_chart<'a>(symbol: &str, response: &'a YahooChartResponse) -> Result<&'a YahooResult> {
    if let Some(err) = &response.chart.error {
        return Err(anyhow::anyhow!(
            "Yahoo returned an error for {}: {} ({})",
            symbol,
            err.description.as_deref().unwrap_or("no description"),
            err.code.as_deref().unwrap_or("no code")
        ));
    }

    response
        .chart
        .result
        .as_ref()
        .and_then(|r| r.first())
        .ok_or(anyhow::anyhow!("No data found for {}", symbol))
}

/// Writes a response to the cache only if it carries a usable chart.
fn store_response(symbol: &str, cache_path: &Path, response: &YahooChartResponse) -> Result<()> {
    check_chart(symbol, response)?;
    write_cache(cache_path, response)
}

fn parse_chart(symbol: &str, response: &YahooChartResponse) -> Result<StockData> {
    let result = check_chart(symbol, response)?;
    let quotes = result
        .indicators
        .quote
        .first()
        .ok_or(anyhow::anyhow!("No quotes found for {}", symbol))?;
    let adjusted = result
        .indicators
        .adjclose
        .as_ref()
        .and_then(|a| a.first())
        .map(|a| a.adjclose.as_slice());
    if adjusted.is_none() {
        warn!("{}: no adjusted closes in response, using raw closes", symbol);
    }

    let mut history = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;

    for (i, &timestamp) in result.timestamp.iter().enumerate() {
        let close = quotes.close.get(i).copied().flatten();
        let adj_close = match adjusted {
            Some(adj) => adj.get(i).copied().flatten(),
            None => close,
        };
        let date = DateTime::from_timestamp(timestamp, 0).map(|d| d.date_naive());

        match (date, close, adj_close) {
            (Some(date), Some(close), Some(adj_close))
                if close.is_finite() && adj_close.is_finite() && close > 0.0 && adj_close > 0.0 =>
            {
                history.push(PricePoint {
                    date,
                    close,
                    adj_close,
                });
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("{}: skipped {} incomplete observations", symbol, skipped);
    }

    Ok(StockData {
        symbol: symbol.to_uppercase(),
        history,
    })
}

impl StockData {
    /// Random-walk history, one observation per calendar day.
    #[allow(dead_code)]
    pub fn new_mock(symbol: &str, days: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut history = Vec::with_capacity(days);
        let mut current_price: f64 = 100.0;
        let mut current_date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();

        for _ in 0..days {
            let volatility = 0.02; // 2% daily volatility
            let change_pct: f64 = rng.gen_range(-volatility..volatility);
            current_price *= 1.0 + change_pct;

            history.push(PricePoint {
                date: current_date,
                close: current_price,
                adj_close: current_price,
            });

            current_date = current_date.succ_opt().unwrap_or(current_date);
        }

        Self {
            symbol: symbol.to_string(),
            history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1704205800, 1704292200, 1704378600, 1704465000],
                "indicators": {
                    "quote": [{ "close": [100.0, null, 102.0, 103.0] }],
                    "adjclose": [{ "adjclose": [99.0, 100.5, 101.0, 102.0] }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_prefers_adjusted_close_and_skips_nulls() {
        let response: YahooChartResponse = serde_json::from_str(SAMPLE).unwrap();
        let data = parse_chart("tsla", &response).unwrap();

        assert_eq!(data.symbol, "TSLA");
        assert_eq!(data.history.len(), 3);
        assert_eq!(data.history[0].adj_close, 99.0);
        assert_eq!(data.history[0].close, 100.0);
        assert_eq!(
            data.history[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert_eq!(data.history[2].adj_close, 102.0);
    }

    #[test]
    fn test_parse_chart_falls_back_to_close() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704205800,1704292200],
            "indicators":{"quote":[{"close":[10.0,11.0]}]}}]}}"#;
        let response: YahooChartResponse = serde_json::from_str(json).unwrap();
        let data = parse_chart("F", &response).unwrap();
        let prices: Vec<f64> = data.history.iter().map(|p| p.adj_close).collect();
        assert_eq!(prices, vec![10.0, 11.0]);
    }

    #[test]
    fn test_parse_chart_reports_api_error() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let response: YahooChartResponse = serde_json::from_str(json).unwrap();
        let err = parse_chart("NOPE", &response).unwrap_err();
        assert!(err.to_string().contains("delisted"));
    }

    #[test]
    fn test_error_response_never_replaces_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_file_path(dir.path(), "GE", "5y");
        let good: YahooChartResponse = serde_json::from_str(SAMPLE).unwrap();
        store_response("GE", &path, &good).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let not_found = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let bad: YahooChartResponse = serde_json::from_str(not_found).unwrap();
        assert!(store_response("GE", &path, &bad).is_err());

        let empty: YahooChartResponse =
            serde_json::from_str(r#"{"chart":{"result":[],"error":null}}"#).unwrap();
        assert!(store_response("GE", &path, &empty).is_err());

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

        let missing = cache_file_path(dir.path(), "NOPE", "5y");
        assert!(store_response("NOPE", &missing, &bad).is_err());
        assert!(!missing.exists());
    }

    #[tokio::test]
    async fn test_failed_refresh_falls_back_to_stale_cache() {
        let dir = tempfile::tempdir().unwrap();
        // Not a listed symbol: the download fails whether or not the network is up.
        let symbol = "ZZZZ-NOT-LISTED";
        let path = cache_file_path(dir.path(), symbol, "5y");
        let good: YahooChartResponse = serde_json::from_str(SAMPLE).unwrap();
        write_cache(&path, &good).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let config = DataConfig {
            range: "5y".to_string(),
            cache_dir: dir.path().to_path_buf(),
            cache_policy: CachePolicy::Refresh,
        };
        let data = fetch_range(symbol, &config).await.unwrap();
        assert_eq!(data.history.len(), 3);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_cache_round_trip_and_freshness() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_file_path(dir.path(), "GE", "5y");
        assert!(!cache_is_fresh(&path, Duration::from_secs(3600)));

        let response: YahooChartResponse = serde_json::from_str(SAMPLE).unwrap();
        write_cache(&path, &response).unwrap();
        assert!(cache_is_fresh(&path, Duration::from_secs(3600)));
        assert!(!cache_is_fresh(&path, Duration::ZERO));

        let reloaded = read_cache(&path).unwrap();
        let data = parse_chart("GE", &reloaded).unwrap();
        assert_eq!(data.history.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_range_uses_fresh_cache() {
        let dir = tempfile::tempdir().unwrap();
        let response: YahooChartResponse = serde_json::from_str(SAMPLE).unwrap();
        write_cache(&cache_file_path(dir.path(), "BAC", "5y"), &response).unwrap();

        let config = DataConfig {
            range: "5y".to_string(),
            cache_dir: dir.path().to_path_buf(),
            cache_policy: CachePolicy::MaxAge(Duration::from_secs(3600)),
        };
        let data = fetch_range("bac", &config).await.unwrap();
        assert_eq!(data.symbol, "BAC");
        assert_eq!(data.history.len(), 3);

        let universe = fetch_universe(&["BAC".to_string(), "bac".to_string()], &config)
            .await
            .unwrap();
        assert_eq!(universe.len(), 1);
    }

    #[test]
    fn test_new_mock_is_seeded() {
        let a = StockData::new_mock("MOCK", 30, 9);
        let b = StockData::new_mock("MOCK", 30, 9);
        assert_eq!(a, b);
        assert_eq!(a.history.len(), 30);
        assert!(a.history.iter().all(|p| p.adj_close > 0.0));
        assert!(a.history.windows(2).all(|w| w[0].date < w[1].date));
    }
}
