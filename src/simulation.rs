//! Monte Carlo driver: draws and evaluates the configured number of random
//! portfolios on the rayon pool.
//!
//! Trials are cut into fixed chunks of [`SIMULATION_CHUNK_SIZE`], each with
//! its own `StdRng` seeded from the run seed and the chunk index. Chunks are
//! concatenated in index order, so the table (and therefore first-occurrence
//! tie-breaking) is identical for a given seed whatever the thread count.

use crate::config::{SIMULATION_CHUNK_SIZE, SimulationConfig};
use crate::error::{FrontierError, Result};
use crate::evaluator::{SimulatedPortfolio, evaluate};
use crate::frontier::PortfolioTable;
use crate::returns::AnnualizedStats;
use crate::sampler::sample_weights;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::time::Instant;
use tracing::info;

/// SplitMix64 finalizer; decorrelates per-chunk seeds derived from one run seed.
fn chunk_seed(seed: u64, chunk: u64) -> u64 {
    let mut z = seed.wrapping_add(chunk.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn simulate_chunk(
    stats: &AnnualizedStats,
    seed: u64,
    chunk: usize,
    trials: usize,
) -> Result<Vec<SimulatedPortfolio>> {
    let mut rng = StdRng::seed_from_u64(chunk_seed(seed, chunk as u64));
    (0..trials)
        .map(|_| {
            let weights = sample_weights(&stats.tickers, &mut rng)?;
            evaluate(&weights, stats)
        })
        .collect()
}

pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| rand::thread_rng().gen_range(0..u64::MAX))
}

pub fn run_simulation(stats: &AnnualizedStats, config: &SimulationConfig) -> Result<PortfolioTable> {
    if stats.num_assets() == 0 {
        return Err(FrontierError::insufficient_data("ticker universe", 1, 0));
    }

    let seed = resolve_seed(config.seed);
    let total = config.num_portfolios;
    let num_chunks = total.div_ceil(SIMULATION_CHUNK_SIZE);

    info!(
        "Simulating {} portfolios over {} assets (seed={}, {} chunks)",
        total,
        stats.num_assets(),
        seed,
        num_chunks
    );
    let started = Instant::now();

    let chunks: Vec<Vec<SimulatedPortfolio>> = (0..num_chunks)
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * SIMULATION_CHUNK_SIZE;
            let trials = SIMULATION_CHUNK_SIZE.min(total - start);
            simulate_chunk(stats, seed, chunk, trials)
        })
        .collect::<Result<_>>()?;

    let mut portfolios = Vec::with_capacity(total);
    for chunk in chunks {
        portfolios.extend(chunk);
    }

    info!(
        "Simulation finished in {:.2?} ({} portfolios)",
        started.elapsed(),
        portfolios.len()
    );

    Ok(PortfolioTable {
        tickers: stats.tickers.clone(),
        portfolios,
        seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::WEIGHT_SUM_TOLERANCE;

    fn stats() -> AnnualizedStats {
        AnnualizedStats::from_annual(
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec![0.10, 0.20, 0.05],
            vec![
                vec![0.04, 0.01, 0.0],
                vec![0.01, 0.09, 0.02],
                vec![0.0, 0.02, 0.01],
            ],
            250.0,
        )
        .unwrap()
    }

    fn config(num_portfolios: usize, seed: u64) -> SimulationConfig {
        SimulationConfig {
            tickers: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            num_portfolios,
            seed: Some(seed),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_simulation_produces_requested_count() {
        let table = run_simulation(&stats(), &config(2_500, 11)).unwrap();
        assert_eq!(table.len(), 2_500);
        assert_eq!(table.seed, 11);
        for p in &table.portfolios {
            assert!((p.weights.sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
            assert!(p.volatility >= 0.0);
        }
    }

    #[test]
    fn test_empty_simulation_fails_selection() {
        let table = run_simulation(&stats(), &config(0, 1)).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.select_frontier(), Err(FrontierError::EmptyPortfolioSet));
    }

    #[test]
    fn test_seeded_runs_are_bit_identical() {
        let a = run_simulation(&stats(), &config(3_000, 2024)).unwrap();
        let b = run_simulation(&stats(), &config(3_000, 2024)).unwrap();
        assert_eq!(a.portfolios, b.portfolios);

        let c = run_simulation(&stats(), &config(3_000, 2025)).unwrap();
        assert_ne!(a.portfolios, c.portfolios);
    }

    #[test]
    fn test_result_independent_of_thread_count() {
        let single = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap()
            .install(|| run_simulation(&stats(), &config(5_000, 77)).unwrap());
        let many = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap()
            .install(|| run_simulation(&stats(), &config(5_000, 77)).unwrap());
        assert_eq!(single.portfolios, many.portfolios);
        assert_eq!(
            single.select_frontier().unwrap(),
            many.select_frontier().unwrap()
        );
    }

    #[test]
    fn test_selected_portfolios_bound_the_table() {
        let table = run_simulation(&stats(), &config(4_000, 5)).unwrap();
        let pick = table.select_frontier().unwrap();
        for p in &table.portfolios {
            assert!(pick.best_sharpe.sharpe_ratio >= p.sharpe_ratio);
            assert!(pick.min_volatility.volatility <= p.volatility);
        }
    }

    #[test]
    fn test_chunk_seeds_differ() {
        assert_ne!(chunk_seed(0, 0), chunk_seed(0, 1));
        assert_ne!(chunk_seed(1, 0), chunk_seed(0, 0));
    }
}
