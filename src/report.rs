use crate::evaluator::SimulatedPortfolio;
use crate::pipeline::FrontierRun;

const RULE: &str = "════════════════════════════════════════════════════════════";

fn row(text: &str) {
    println!("║{:<60}║", text);
}

fn print_portfolio(title: &str, p: &SimulatedPortfolio) {
    row(&format!("  {}", title));
    row(&format!(
        "    Return {:>+8.2}%   Volatility {:>7.2}%   Sharpe {:>7.3}",
        p.expected_return * 100.0,
        p.volatility * 100.0,
        p.sharpe_ratio
    ));
    for (ticker, weight) in p.weights.iter() {
        let bar_len = (weight * 30.0).round() as usize;
        row(&format!(
            "    {:<7} {:>6.2}%  {}",
            ticker,
            weight * 100.0,
            "█".repeat(bar_len)
        ));
    }
}

/// Pretty-prints the run summary and both frontier picks to stdout.
pub fn print_frontier(run: &FrontierRun) {
    let pick = &run.pick;
    let stats = &run.stats;
    let dates = run.prices.dates();

    println!("\n╔{}╗", RULE);
    row("               Efficient Frontier (Monte Carlo)");
    println!("╠{}╣", RULE);
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        row(&format!("  History     : {} .. {} ({} days)", first, last, dates.len()));
    }
    row(&format!("  Portfolios  : {:>10}   Seed: {}", run.table.len(), run.table.seed));
    row(&format!(
        "  Annualized  : x{:<6}      Degenerate: {}",
        stats.periods_per_year, pick.degenerate_count
    ));
    println!("╠{}╣", RULE);
    row("  Symbol   Daily μ  Daily σ  Ann.Ret  Ann.Vol  MaxSR  MinVol");
    for (i, ticker) in stats.tickers.iter().enumerate() {
        let max_sharpe_w = pick.best_sharpe.weights.get(ticker).unwrap_or(0.0);
        let min_vol_w = pick.min_volatility.weights.get(ticker).unwrap_or(0.0);
        row(&format!(
            "  {:<7} {:>7.3}% {:>7.3}% {:>7.2}% {:>7.2}% {:>5.1}% {:>5.1}%",
            ticker,
            stats.daily_mean[i] * 100.0,
            stats.daily_covariance[i][i].max(0.0).sqrt() * 100.0,
            stats.mean_return[i] * 100.0,
            stats.asset_volatility(i) * 100.0,
            max_sharpe_w * 100.0,
            min_vol_w * 100.0
        ));
    }
    println!("╠{}╣", RULE);
    print_portfolio("Maximum Sharpe Ratio Portfolio", &pick.best_sharpe);
    println!("╠{}╣", RULE);
    print_portfolio("Minimum Volatility Portfolio", &pick.min_volatility);
    println!("╚{}╝", RULE);
    println!();
    println!("⚠  Educational use only. Not financial advice.");
}
