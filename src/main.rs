use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use prettytable::{Cell, Row, Table};
use rust_decimal::Decimal;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trailstop::metrics::write_trace_csv;
use trailstop::prelude::*;

#[derive(Parser)]
#[command(name = "trailstop")]
#[command(about = "Trailing-stop trend-following backtester for daily bars", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

//flags shared by every subcommand, each one overrides the config file
#[derive(Args)]
struct CommonArgs {
    /// Path to csv data file (Date,Open,High,Low,Close)
    #[arg(long)]
    data: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Named window preset (eg FNGU, NRGU)
    #[arg(long)]
    preset: Option<String>,

    #[arg(long)]
    initial_budget: Option<Decimal>,

    /// First traded date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last traded date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Trailing stop as a fraction of the close
    #[arg(long)]
    stop_factor: Option<Decimal>,

    /// Multiplier applied to stop fills
    #[arg(long)]
    slippage_factor: Option<Decimal>,

    /// Never buy on the bar that just sold
    #[arg(long)]
    no_reentry: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single backtest
    Run {
        #[command(flatten)]
        common: CommonArgs,

        #[arg(long)]
        short_window: Option<usize>,

        #[arg(long)]
        long_window: Option<usize>,

        /// Year cursor for the annual report
        #[arg(long)]
        min_year: Option<i32>,

        /// Output path for the date,budget trace
        #[arg(long)]
        output_trace_csv: Option<PathBuf>,
    },

    /// Sweep every (short, long) window pair
    Optimize {
        #[command(flatten)]
        common: CommonArgs,

        /// Exclusive upper bound of the long window
        #[arg(long)]
        max_window: Option<usize>,

        /// Number of best pairs to print
        #[arg(long, default_value = "10")]
        top: usize,

        /// Evaluate cells on one thread
        #[arg(long)]
        sequential: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            common,
            short_window,
            long_window,
            min_year,
            output_trace_csv,
        } => {
            let mut settings = resolve_configuration(&common)?;
            if let Some(year) = min_year {
                settings.min_year = year;
            }
            if output_trace_csv.is_some() {
                settings.output_trace_csv = output_trace_csv;
            }

            let mut config = settings.resolved_backtest()?;
            if let Some(short) = short_window {
                config.short_window = short;
            }
            if let Some(long) = long_window {
                config.long_window = long;
            }

            run_single(&settings, &config)?;
        }
        Commands::Optimize {
            common,
            max_window,
            top,
            sequential,
        } => {
            let mut settings = resolve_configuration(&common)?;
            if let Some(max) = max_window {
                settings.max_window = max;
            }

            run_optimizer(&settings, top, !sequential)?;
        }
    }

    Ok(())
}

//defaults, then the config file, then command line flags
fn resolve_configuration(common: &CommonArgs) -> Result<BacktestConfiguration> {
    let mut settings = match &common.config {
        Some(path) => BacktestConfiguration::from_json_file(path)?,
        None => BacktestConfiguration::default(),
    };

    if let Some(data) = &common.data {
        settings.data_path = data.clone();
    }
    if let Some(preset) = &common.preset {
        settings.preset = Some(preset.clone());
    }

    let backtest = &mut settings.backtest;
    if let Some(budget) = common.initial_budget {
        backtest.initial_budget = budget;
    }
    if let Some(start) = common.start_date {
        backtest.start_date = start;
    }
    if let Some(end) = common.end_date {
        backtest.end_date = end;
    }
    if let Some(factor) = common.stop_factor {
        backtest.stop_factor = factor;
    }
    if let Some(factor) = common.slippage_factor {
        backtest.slippage_factor = factor;
    }
    if common.no_reentry {
        backtest.same_bar_reentry = false;
    }

    Ok(settings)
}

fn load_series(path: &Path) -> Result<BarSeries> {
    let series = load_csv(path).with_context(|| format!("Failed to load data from {:?}", path))?;

    let Some((first, last)) = series.date_range() else {
        bail!("No bars found in {:?}", path);
    };

    info!(bars = series.len(), first = %first, last = %last, "Loaded data");
    Ok(series)
}

fn run_single(settings: &BacktestConfiguration, config: &BacktestConfig) -> Result<()> {
    let series = load_series(&settings.data_path)?;

    info!(
        short_window = config.short_window,
        long_window = config.long_window,
        start = %config.start_date,
        end = %config.end_date,
        "Running backtest"
    );
    let result = run_backtest(&series, config)?;

    if result.trace.is_empty() {
        warn!("No bars inside the trading window");
    }

    for row in summarize_annual_returns(&result.trace, settings.min_year) {
        info!("{}", row);
    }

    println!("\nBacktest Results");
    println!("================\n");
    SummaryMetrics::from_backtest(&result).pretty_print_table();

    if let Some(path) = &settings.output_trace_csv {
        save_trace_csv(&result.trace, path)?;
        info!(path = ?path, "Budget trace saved");
    }

    Ok(())
}

fn run_optimizer(settings: &BacktestConfiguration, top: usize, parallel: bool) -> Result<()> {
    let series = load_series(&settings.data_path)?;
    let base = settings.resolved_backtest()?;
    let grid = WindowGrid {
        max_window: settings.max_window,
    };

    info!(cells = grid.size(), parallel, "Sweeping window sizes");
    let results = WindowOptimizer::new(&series, base)?
        .with_grid(grid)
        .with_parallelism(parallel)
        .optimize()?;

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Rank"),
        Cell::new("Short"),
        Cell::new("Long"),
        Cell::new("Final Budget"),
    ]));

    //results are ascending, best last
    for (rank, cell) in results.iter().rev().take(top).enumerate() {
        table.add_row(Row::new(vec![
            Cell::new(&(rank + 1).to_string()),
            Cell::new(&cell.short_window.to_string()),
            Cell::new(&cell.long_window.to_string()),
            Cell::new(&format!("${:.2}", cell.final_budget)),
        ]));
    }

    println!("\nWindow Sweep Results");
    println!("====================\n");
    table.printstd();

    Ok(())
}

fn save_trace_csv(trace: &BudgetTrace, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_trace_csv(trace, file)?;
    Ok(())
}
