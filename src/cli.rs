//! CLI definition and dispatch.
//!
//! Thin orchestration over the domain: load config and price data, run the
//! configured strategy, report. Errors map to process exit codes through
//! [`StratlabError`].

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest, sorted_bars, AnnotatedSeries, BacktestConfig};
use crate::domain::config_validation::{
    build_backtest_config, optimize_ranges, strategy_settings, validate_config,
};
use crate::domain::error::StratlabError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::ohlcv::Bar;
use crate::domain::optimizer::{self, GridSearchResult};
use crate::domain::strategy::{build_strategy, strategy_names, SignalProvider, StrategyParams};
use crate::domain::trade_log::{extract_trades, TradeEvent};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const TRADES_SHOWN: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "stratlab", about = "Trading strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the configured strategy over a price file
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        /// Directory for backtest.csv and trades.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Grid-search the moving-average windows
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        /// Directory for grid.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run every registered strategy with default parameters
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            data,
            output,
        } => run_backtest_command(&config, &data, output.as_deref()),
        Command::Optimize {
            config,
            data,
            output,
        } => run_optimize_command(&config, &data, output.as_deref()),
        Command::Compare { config, data } => run_compare_command(&config, &data),
        Command::Validate { config } => run_validate_command(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StratlabError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_config(&adapter)?;
    Ok(adapter)
}

/// Bars for `symbol`, rejecting an empty series.
pub fn load_symbol(port: &dyn DataPort, symbol: &str) -> Result<Vec<Bar>, StratlabError> {
    let bars = port.fetch_bars(symbol)?;
    if bars.is_empty() {
        return Err(StratlabError::Data {
            reason: format!("{symbol} has no usable bars"),
        });
    }
    info!(symbol, bars = bars.len(), "loaded price data");
    Ok(bars)
}

/// `--data` names a `<symbol>.csv` file; its directory becomes the data source.
fn load_data(path: &Path) -> Result<Vec<Bar>, StratlabError> {
    let symbol = path
        .file_stem()
        .filter(|_| path.extension().is_some_and(|ext| ext == "csv"))
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| StratlabError::Data {
            reason: format!("{} is not a .csv file", path.display()),
        })?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    load_symbol(&CsvAdapter::new(dir.to_path_buf()), &symbol)
}

/// Everything a single backtest run produces.
pub struct BacktestReport {
    pub strategy: String,
    pub series: AnnotatedSeries,
    pub events: Vec<TradeEvent>,
    pub summary: PerformanceSummary,
}

/// Run one strategy through the engine, trade log and metrics.
pub fn evaluate(
    strategy: &dyn SignalProvider,
    bars: &[Bar],
    config: &BacktestConfig,
) -> Result<BacktestReport, StratlabError> {
    let bars = sorted_bars(bars)?;
    let signal = strategy.generate(&bars)?;
    let series = run_backtest(&bars, &signal, config)?;
    let events = extract_trades(&series);
    let summary = PerformanceSummary::compute(&series, &events, config.risk_frequency);
    Ok(BacktestReport {
        strategy: strategy.name().to_string(),
        series,
        events,
        summary,
    })
}

/// Backtest the strategy named in `[strategy]`.
pub fn backtest_from_config(
    config: &dyn ConfigPort,
    bars: &[Bar],
) -> Result<BacktestReport, StratlabError> {
    let bt_config = build_backtest_config(config)?;
    let (name, params) = strategy_settings(config);
    let strategy = build_strategy(&name, &params)?;
    info!(strategy = strategy.name(), "running backtest");
    evaluate(strategy.as_ref(), bars, &bt_config)
}

/// Grid search over the `[optimize]` ranges.
pub fn optimize_from_config(
    config: &dyn ConfigPort,
    bars: &[Bar],
) -> Result<GridSearchResult, StratlabError> {
    let bt_config = build_backtest_config(config)?;
    let (short, long) = optimize_ranges(config)?;
    optimizer::search(bars, &short, &long, &bt_config)
}

/// Every registered strategy with default parameters, best Sharpe first.
pub fn compare_strategies(
    bars: &[Bar],
    config: &BacktestConfig,
) -> Result<Vec<BacktestReport>, StratlabError> {
    let defaults = StrategyParams::new();
    let mut reports = Vec::new();
    for name in strategy_names() {
        let strategy = build_strategy(name, &defaults)?;
        reports.push(evaluate(strategy.as_ref(), bars, config)?);
    }
    reports.sort_by(|a, b| b.summary.sharpe_ratio.total_cmp(&a.summary.sharpe_ratio));
    Ok(reports)
}

fn run_backtest_command(
    config_path: &Path,
    data_path: &Path,
    output: Option<&Path>,
) -> Result<(), StratlabError> {
    let config = load_config(config_path)?;
    let bars = load_data(data_path)?;
    let report = backtest_from_config(&config, &bars)?;

    println!("=== {} ===", report.strategy);
    print!("{}", format_summary(&report.summary));
    if !report.events.is_empty() {
        println!("\n=== Trades (first {}) ===", TRADES_SHOWN.min(report.events.len()));
        for e in report.events.iter().take(TRADES_SHOWN) {
            println!(
                "  {}  {:<13} {:>10.4}  pos {:>2}  pnl {:>+10.4}",
                e.timestamp, e.action, e.price, e.position, e.pnl
            );
        }
    }

    if let Some(dir) = output {
        let reporter = CsvReportAdapter::new(dir.to_path_buf())?;
        reporter.write_backtest(&report.series)?;
        reporter.write_trades(&report.events)?;
        info!(dir = %dir.display(), "wrote backtest.csv and trades.csv");
    }
    Ok(())
}

fn run_optimize_command(
    config_path: &Path,
    data_path: &Path,
    output: Option<&Path>,
) -> Result<(), StratlabError> {
    let config = load_config(config_path)?;
    let bars = load_data(data_path)?;
    let result = optimize_from_config(&config, &bars)?;

    println!("=== Grid search ({} pairs) ===", result.table.len());
    for p in &result.table {
        println!("  short {:>4}  long {:>4}  sharpe {:>8.4}", p.short, p.long, p.sharpe);
    }
    println!(
        "\nBest: short={} long={} sharpe={:.4}",
        result.best.short, result.best.long, result.best.sharpe
    );

    if let Some(dir) = output {
        let reporter = CsvReportAdapter::new(dir.to_path_buf())?;
        reporter.write_grid(&result.table)?;
        info!(dir = %dir.display(), "wrote grid.csv");
    }
    Ok(())
}

fn run_compare_command(config_path: &Path, data_path: &Path) -> Result<(), StratlabError> {
    let config = load_config(config_path)?;
    let bt_config = build_backtest_config(&config)?;
    let bars = load_data(data_path)?;
    let reports = compare_strategies(&bars, &bt_config)?;

    println!(
        "{:<14} {:>10} {:>8} {:>9} {:>8} {:>7}",
        "strategy", "return", "sharpe", "max_dd", "vol", "trades"
    );
    for r in &reports {
        let s = &r.summary;
        println!(
            "{:<14} {:>9.2}% {:>8.3} {:>8.2}% {:>7.2}% {:>7}",
            r.strategy,
            s.total_return * 100.0,
            s.sharpe_ratio,
            s.max_drawdown * 100.0,
            s.volatility * 100.0,
            s.trade_stats.total_trades
        );
    }
    Ok(())
}

fn run_validate_command(config_path: &Path) -> Result<(), StratlabError> {
    let config = load_config(config_path)?;
    let (name, _) = strategy_settings(&config);
    if config.section_entries("backtest").is_empty() {
        warn!("no [backtest] section, using defaults");
    }
    println!("Config OK: strategy '{name}'");
    Ok(())
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v * 100.0))
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

/// Human-readable metrics block.
pub fn format_summary(s: &PerformanceSummary) -> String {
    let t = &s.trade_stats;
    let mut out = String::new();
    out.push_str(&format!("Final Equity:     {:.2}\n", s.final_equity));
    out.push_str(&format!("Total Return:     {:.2}%\n", s.total_return * 100.0));
    out.push_str(&format!("Annualized:       {:.2}%\n", s.annualized_return * 100.0));
    out.push_str(&format!("Sharpe Ratio:     {:.2}\n", s.sharpe_ratio));
    out.push_str(&format!("Sortino Ratio:    {:.2}\n", s.sortino_ratio));
    out.push_str(&format!(
        "Max Drawdown:     {:.1}% ({} bars)\n",
        s.max_drawdown * 100.0,
        s.max_drawdown_duration
    ));
    out.push_str(&format!("Volatility:       {:.2}%\n", s.volatility * 100.0));
    out.push_str(&format!(
        "Costs:            {:.4} over {} trades\n",
        s.costs.total_cost, s.costs.trades
    ));
    out.push_str(&format!("Closed Trades:    {}\n", t.total_trades));
    out.push_str(&format!("Win Rate:         {}\n", percent(t.win_rate)));
    out.push_str(&format!("Profit Factor:    {}\n", number(t.profit_factor)));
    out.push_str(&format!(
        "Long / Short:     {} ({}) / {} ({})\n",
        t.long_trades,
        percent(t.long_win_rate),
        t.short_trades,
        percent(t.short_win_rate)
    ));
    out
}
