//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::BacktestResult;
use crate::domain::config_validation::{
    self, check_lookback_days, parse_symbols, resolve_strategy_config, validate_backtest_config,
    validate_strategy_config,
};
use crate::domain::error::ConftraderError;
use crate::domain::features::WARMUP_BARS;
use crate::domain::ohlcv::{PriceField, PriceSeries};
use crate::domain::strategy::{run_many, Preset, RiskManagedStrategy, StrategyConfig};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "conftrader",
    about = "Confidence-scored, risk-managed strategy backtester"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory for per-bar and summary CSV files
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Backtest a single symbol instead of [backtest] symbols
        #[arg(long)]
        symbol: Option<String>,
        /// Parameter preset: default or hi_target
        #[arg(long)]
        preset: Option<String>,
        /// Price column: open, high, low or close
        #[arg(long)]
        price_col: Option<String>,
        /// Only backtest the trailing N days of each history
        #[arg(long)]
        lookback_days: Option<u32>,
        #[arg(long)]
        dry_run: bool,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Everything a backtest run needs, resolved from config and CLI overrides.
#[derive(Debug)]
pub struct BacktestPlan {
    pub symbols: Vec<String>,
    pub price: PriceField,
    pub preset: Preset,
    pub lookback_days: Option<u32>,
    pub strategy: RiskManagedStrategy,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            symbol,
            preset,
            price_col,
            lookback_days,
            dry_run,
        } => {
            let overrides = Overrides {
                symbol: symbol.as_deref(),
                preset: preset.as_deref(),
                price_col: price_col.as_deref(),
                lookback_days,
            };
            if dry_run {
                run_dry_run(&config, &overrides)
            } else {
                run_backtest(&config, output.as_deref(), &overrides)
            }
        }
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Validate { config } => run_validate(&config),
        Command::Info { symbol, config } => run_info(symbol.as_deref(), &config),
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides<'a> {
    pub symbol: Option<&'a str>,
    pub preset: Option<&'a str>,
    pub price_col: Option<&'a str>,
    pub lookback_days: Option<u32>,
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

pub fn plan_backtest(
    config: &dyn ConfigPort,
    overrides: &Overrides<'_>,
) -> Result<BacktestPlan, ConftraderError> {
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;

    let symbols = match overrides.symbol {
        Some(s) if !s.trim().is_empty() => vec![s.trim().to_uppercase()],
        _ => parse_symbols(config)?,
    };
    let price = match overrides.price_col {
        Some(p) => p.parse()?,
        None => config_validation::price_field(config)?,
    };
    let preset = match overrides.preset {
        Some(p) => p.parse()?,
        None => config_validation::preset(config)?,
    };
    let lookback_days = match overrides.lookback_days {
        Some(d) => Some(check_lookback_days(d)?),
        None => config_validation::lookback_days(config)?,
    };
    let strategy = RiskManagedStrategy::new(resolve_strategy_config(config, preset)?)?;

    Ok(BacktestPlan {
        symbols,
        price,
        preset,
        lookback_days,
        strategy,
    })
}

fn data_adapter(config: &dyn ConfigPort) -> Result<CsvAdapter, ConftraderError> {
    let dir = config
        .get_string("data", "dir")
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ConftraderError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(dir.trim())))
}

fn run_backtest(config_path: &Path, output: Option<&Path>, overrides: &Overrides<'_>) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate and resolve parameters
    let plan = match plan_backtest(&adapter, overrides) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    print_parameters(&plan);

    let data_port = match data_adapter(&adapter) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Resolve report destination
    let output_dir = output.map(Path::to_path_buf).or_else(|| {
        adapter
            .get_string("report", "output_dir")
            .filter(|d| !d.trim().is_empty())
            .map(|d| PathBuf::from(d.trim()))
    });
    let write_bars = adapter.get_bool("report", "write_bars", true);

    run_backtest_pipeline(&data_port, &plan, output_dir.as_deref(), write_bars)
}

/// Loads every symbol's history, skipping (with a warning) those that fail.
///
/// With `lookback_days`, each history is trimmed to its trailing window.
pub fn load_histories(
    data_port: &dyn DataPort,
    symbols: &[String],
    price: PriceField,
    lookback_days: Option<u32>,
) -> Vec<(String, PriceSeries)> {
    let mut loaded = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let series = data_port
            .fetch_ohlcv(symbol, price)
            .and_then(PriceSeries::new);
        match series {
            Ok(s) => {
                let s = match lookback_days {
                    Some(days) => {
                        let trimmed = s.last_days(days);
                        tracing::debug!(
                            symbol = %symbol,
                            days,
                            kept = trimmed.len(),
                            dropped = s.len() - trimmed.len(),
                            "applied lookback window"
                        );
                        trimmed
                    }
                    None => s,
                };
                loaded.push((symbol.clone(), s));
            }
            Err(e) => {
                eprintln!("warning: skipping {} ({})", symbol, e);
                tracing::debug!(symbol = %symbol, error = ?e, "symbol failed to load");
            }
        }
    }
    loaded
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    plan: &BacktestPlan,
    output_dir: Option<&Path>,
    write_bars: bool,
) -> ExitCode {
    // Stage 4: Fetch price histories
    let histories = load_histories(data_port, &plan.symbols, plan.price, plan.lookback_days);
    if histories.is_empty() {
        eprintln!("error: no valid symbols with data to backtest");
        return ExitCode::from(5);
    }

    // Stage 5: Run backtests
    eprintln!(
        "Running backtest: {} symbols, price column {}",
        histories.len(),
        plan.price
    );
    let results = run_many(&plan.strategy, &histories, plan.price);

    // Stage 6: Print summary
    print_summary(&results);

    // Stage 7: Write reports
    if let Some(dir) = output_dir {
        if let Err(e) = write_reports(&results, dir, write_bars) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("\nReports written to: {}", dir.display());
    }

    ExitCode::SUCCESS
}

fn write_reports(
    results: &[(String, BacktestResult)],
    dir: &Path,
    write_bars: bool,
) -> Result<(), ConftraderError> {
    let reporter = CsvReportAdapter::new();
    let dir_str = dir.to_string_lossy();
    if write_bars {
        reporter.write_many(results, &dir_str)?;
    }
    reporter.write_summary(results, &dir.join("summary.csv").to_string_lossy())
}

fn print_parameters(plan: &BacktestPlan) {
    let c: &StrategyConfig = plan.strategy.config();
    eprintln!("Strategy parameters (preset {}):", plan.preset);
    eprintln!("  vol_target_daily: {}", c.vol_target_daily);
    eprintln!("  max_leverage:     {}", c.max_leverage);
    eprintln!("  stop_loss_pct:    {}", c.stop_loss_pct);
    eprintln!("  take_profit_pct:  {}", c.take_profit_pct);
    eprintln!("  kelly_cap:        {}", c.kelly_cap);
}

fn print_summary(results: &[(String, BacktestResult)]) {
    eprintln!("\n=== Summary ===");
    eprintln!(
        "symbol\tbars\tfinal_equity\tweekly_mean\tweekly_median\tweekly_p05\tweekly_p95\tsharpe_daily\thit_rate"
    );
    for (symbol, result) in results {
        let s = &result.summary;
        if result.is_empty() {
            eprintln!(
                "warning: {} has fewer than {} usable bars; summary is zero",
                symbol,
                WARMUP_BARS + 1
            );
        }
        println!(
            "{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.4}\t{:.4}",
            symbol,
            s.bars,
            s.final_equity,
            s.weekly_mean,
            s.weekly_median,
            s.weekly_p05,
            s.weekly_p95,
            s.sharpe_daily,
            s.hit_rate,
        );
    }
}

pub fn run_dry_run(config_path: &Path, overrides: &Overrides<'_>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let plan = match plan_backtest(&adapter, overrides) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Config validated successfully\n");
    print_parameters(&plan);

    eprintln!("\nUniverse:");
    eprintln!("  symbols: {}", plan.symbols.join(", "));
    eprintln!("  price column: {}", plan.price);
    if let Some(days) = plan.lookback_days {
        eprintln!("  lookback: last {} days", days);
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbols = match data_adapter(&config).and_then(|a| a.list_symbols()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match plan_backtest(&adapter, &Overrides::default()) {
        Ok(plan) => {
            print_parameters(&plan);
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_info(symbol: Option<&str>, config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbols = match symbol {
        Some(s) => vec![s.trim().to_uppercase()],
        None => match parse_symbols(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
    };

    let adapter = match data_adapter(&config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for s in &symbols {
        match adapter.get_data_range(s) {
            Ok(Some((first, last, count))) => {
                println!("{}: {} bars, {} to {}", s, count, first, last);
            }
            Ok(None) => {
                eprintln!("{}: no data found", s);
            }
            Err(e) => {
                eprintln!("error querying {}: {}", s, e);
            }
        }
    }
    ExitCode::SUCCESS
}
