mod app;
mod config;
mod data;
mod error;
mod evaluator;
mod frontier;
mod gui;
mod matrix;
mod pipeline;
mod report;
mod returns;
mod sampler;
mod scatter;
mod simulation;
mod tui;
mod ui;

use app::App;
use clap::Parser;
use config::{CachePolicy, DataConfig, SimulationConfig};
use std::io;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Frontier-TUI: Monte Carlo efficient frontier for a basket of equities",
    after_help = "EXAMPLES:
    # Default basket, interactive dashboard
    cargo run --release

    # Custom basket, printed report, reproducible run
    cargo run --release -- --tickers AAPL,MSFT,NVDA --seed 42 --report

    # Force a fresh download and open the desktop scatterplot
    cargo run --release -- --refresh --gui"
)]
struct Args {
    /// Comma-separated ticker universe
    #[arg(long, default_value = "TSLA,F,BAC,GE,GOOGL")]
    tickers: String,

    /// History range to download (Yahoo syntax: 1y, 5y, 10y, max)
    #[arg(long, default_value = config::DATA_RANGE)]
    range: String,

    /// Number of random portfolios to simulate
    #[arg(long, default_value_t = config::NUM_PORTFOLIOS)]
    portfolios: usize,

    /// Trading periods per year used for annualization
    #[arg(long, default_value_t = config::TRADING_PERIODS_PER_YEAR)]
    periods_per_year: f64,

    /// Random seed; a random one is chosen and logged when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Re-download every ticker even if a fresh cache file exists
    #[arg(long)]
    refresh: bool,

    /// Cache directory (default: $FRONTIER_CACHE_DIR or .cache)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Print the report to stdout and exit
    #[arg(long)]
    report: bool,

    /// Launch the desktop scatterplot instead of the terminal dashboard
    #[arg(long)]
    gui: bool,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    config::init_cpu_parallelism();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("frontier_tui=info,wgpu_core=error,wgpu_hal=error")
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .init();
    let args = Args::parse();

    let tickers = config::parse_tickers(&args.tickers);
    if tickers.is_empty() {
        error!("No tickers given. Example: --tickers TSLA,F,BAC,GE,GOOGL");
        return Ok(());
    }
    if tickers.len() == 1 {
        info!("Single ticker universe: every portfolio is 100% {}", tickers[0]);
    }

    let sim_config = SimulationConfig {
        tickers,
        periods_per_year: args.periods_per_year,
        num_portfolios: args.portfolios,
        seed: args.seed,
    };
    let mut data_config = DataConfig {
        range: args.range.clone(),
        ..DataConfig::default()
    };
    if let Some(dir) = args.cache_dir {
        data_config.cache_dir = dir;
    }
    if args.refresh {
        data_config.cache_policy = CachePolicy::Refresh;
    }

    let run = match pipeline::run_frontier(sim_config, &data_config).await {
        Ok(run) => run,
        Err(e) => {
            error!("Frontier simulation failed: {:#}", e);
            return Ok(());
        }
    };

    if args.report {
        report::print_frontier(&run);
        return Ok(());
    }

    if args.gui {
        info!("Launching GUI");
        eframe::run_native(
            "Efficient Frontier",
            eframe::NativeOptions::default(),
            Box::new(|_cc| Ok(Box::new(gui::GuiApp::new(run)))),
        ).map_err(|e| io::Error::other(e.to_string()))?;
        return Ok(());
    }

    let mut terminal = tui::init()?;
    let mut app = App::new(run);
    let res = app.run(&mut terminal);

    tui::restore()?;

    if let Err(e) = res {
        error!("Error: {:?}", e);
    }

    report::print_frontier(&app.run);

    Ok(())
}
