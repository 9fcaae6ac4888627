use crate::error::{FrontierError, Result};
use rayon::ThreadPoolBuilder;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

static RAYON_INIT: OnceLock<()> = OnceLock::new();

pub fn init_cpu_parallelism() {
    RAYON_INIT.get_or_init(|| {
        let num_threads = num_cpus::get().max(1);
        match ThreadPoolBuilder::new().num_threads(num_threads).build_global() {
            Ok(_) => info!(
                "Initialized Rayon thread pool with {} threads (all logical CPU cores)",
                num_threads
            ),
            Err(e) => warn!(
                "Rayon thread pool already initialized or unavailable ({}). Using existing configuration.",
                e
            ),
        }
    });
}

/// Default ticker universe.
pub const DEFAULT_TICKERS: &[&str] = &["TSLA", "F", "BAC", "GE", "GOOGL"];
/// Trading periods per year used to annualize daily statistics.
pub const TRADING_PERIODS_PER_YEAR: f64 = 250.0;
/// Number of random portfolios simulated per run.
pub const NUM_PORTFOLIOS: usize = 50_000;
/// Range of daily history to fetch (Yahoo range syntax).
pub const DATA_RANGE: &str = "5y";
/// Trials per RNG stream in the parallel simulation.
pub const SIMULATION_CHUNK_SIZE: usize = 1_024;

pub const DEFAULT_CACHE_DIR: &str = ".cache";
pub const DEFAULT_CACHE_TTL_HOURS: u64 = 24;
pub const FETCH_MAX_ATTEMPTS: usize = 3;
pub const FETCH_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Parameters of one Monte Carlo run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub tickers: Vec<String>,
    pub periods_per_year: f64,
    pub num_portfolios: usize,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect(),
            periods_per_year: TRADING_PERIODS_PER_YEAR,
            num_portfolios: NUM_PORTFOLIOS,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tickers.is_empty() {
            return Err(FrontierError::invalid_config("ticker universe is empty"));
        }
        if !(self.periods_per_year.is_finite() && self.periods_per_year > 0.0) {
            return Err(FrontierError::invalid_config(format!(
                "periods per year must be positive, got {}",
                self.periods_per_year
            )));
        }
        Ok(())
    }
}

/// Normalizes a comma-separated symbol list: trims, upper-cases, drops empties
/// and duplicates while keeping first-seen order.
pub fn parse_tickers(raw: &str) -> Vec<String> {
    normalize_tickers(raw.split(','))
}

pub fn normalize_tickers<S: AsRef<str>>(symbols: impl IntoIterator<Item = S>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for symbol in symbols.into_iter().map(|s| s.as_ref().trim().to_uppercase()) {
        if !symbol.is_empty() && !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CachePolicy {
    /// Always download and overwrite the cache file.
    Refresh,
    /// Reuse a cache file younger than the given age.
    MaxAge(Duration),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataConfig {
    pub range: String,
    pub cache_dir: PathBuf,
    pub cache_policy: CachePolicy,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            range: DATA_RANGE.to_string(),
            cache_dir: configured_cache_dir(),
            cache_policy: CachePolicy::MaxAge(configured_cache_ttl()),
        }
    }
}

pub fn configured_cache_dir() -> PathBuf {
    std::env::var("FRONTIER_CACHE_DIR")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR))
}

pub fn configured_cache_ttl() -> Duration {
    let hours = match std::env::var("FRONTIER_CACHE_TTL_HOURS") {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(v) => v,
            Err(_) => {
                warn!(
                    "Invalid FRONTIER_CACHE_TTL_HOURS={} ; defaulting to {}h",
                    raw, DEFAULT_CACHE_TTL_HOURS
                );
                DEFAULT_CACHE_TTL_HOURS
            }
        },
        Err(_) => DEFAULT_CACHE_TTL_HOURS,
    };
    Duration::from_secs(hours * 3600)
}
