//! End-to-end run: prices -> annualized stats -> simulated table -> picks.

use crate::config::{DataConfig, SimulationConfig, normalize_tickers};
use crate::data;
use crate::error::Result;
use crate::frontier::{FrontierPick, PortfolioTable};
use crate::matrix::PriceMatrix;
use crate::returns::{AnnualizedStats, compute_annualized_stats};
use crate::simulation::run_simulation;
use tracing::info;

pub struct FrontierRun {
    pub config: SimulationConfig,
    pub prices: PriceMatrix,
    pub stats: AnnualizedStats,
    pub table: PortfolioTable,
    pub pick: FrontierPick,
}

impl FrontierRun {
    /// Runs the simulation and selection over an already compiled matrix.
    pub fn analyze(prices: PriceMatrix, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let stats = compute_annualized_stats(&prices, config.periods_per_year)?;
        for (i, ticker) in stats.tickers.iter().enumerate() {
            info!(
                "  {}: E[r]={:.4}, σ={:.4}",
                ticker,
                stats.mean_return[i],
                stats.asset_volatility(i)
            );
        }

        let table = run_simulation(&stats, &config)?;
        let pick = table.select_frontier()?;
        info!(
            "Max Sharpe: ret={:.4} vol={:.4} sharpe={:.4} | Min vol: ret={:.4} vol={:.4} sharpe={:.4}",
            pick.best_sharpe.expected_return,
            pick.best_sharpe.volatility,
            pick.best_sharpe.sharpe_ratio,
            pick.min_volatility.expected_return,
            pick.min_volatility.volatility,
            pick.min_volatility.sharpe_ratio
        );

        Ok(Self {
            config,
            prices,
            stats,
            table,
            pick,
        })
    }

    /// Re-draws the portfolio table with a new seed, keeping the statistics.
    pub fn resimulate(&mut self, seed: u64) -> Result<()> {
        let config = SimulationConfig {
            seed: Some(seed),
            ..self.config.clone()
        };
        let table = run_simulation(&self.stats, &config)?;
        self.pick = table.select_frontier()?;
        self.table = table;
        Ok(())
    }
}

/// Full pipeline: fetch data -> compile matrix -> simulate -> select.
pub async fn run_frontier(
    mut config: SimulationConfig,
    data_config: &DataConfig,
) -> anyhow::Result<FrontierRun> {
    // Histories come back keyed by upper-cased symbol.
    config.tickers = normalize_tickers(&config.tickers);
    config.validate()?;
    info!(
        "=== Efficient Frontier ===\n  Tickers: {:?}\n  Range: {}\n  Portfolios: {}\n  Periods/year: {}",
        config.tickers, data_config.range, config.num_portfolios, config.periods_per_year
    );

    let series = data::fetch_universe(&config.tickers, data_config).await?;
    let prices = PriceMatrix::from_series(&config.tickers, &series)?;
    Ok(FrontierRun::analyze(prices, config)?)
}
