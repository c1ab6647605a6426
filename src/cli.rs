//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::engine_config::{
    load_portfolio, load_prices, load_targets, validate_engine_config, EngineConfig,
};
use crate::domain::error::EngineError;
use crate::domain::indicator::IndicatorResult;
use crate::domain::normalizer::Normalizer;
use crate::domain::portfolio::Portfolio;
use crate::domain::rebalance::rebalance;
use crate::domain::strategy::{evaluate, Algorithm, Evaluation, EvaluationData, Risk, Term};
use crate::logging;
use crate::ports::config_port::ConfigPort;
use crate::ports::swap_port::SwapSource;

#[derive(Parser, Debug)]
#[command(
    name = "signalfolio",
    about = "Trading indicators, investment decisions and portfolio rebalancing"
)]
pub struct Cli {
    /// Diagnostic log level (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute a trading decision from swap history
    Signal {
        /// Directory holding `{pair}.csv` swap files
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        pair: String,
        /// Asset symbol whose price is extracted from the swaps
        #[arg(long)]
        asset: String,
        #[arg(
            long,
            conflicts_with_all = ["term", "risk"],
            required_unless_present_all = ["term", "risk"]
        )]
        algorithm: Option<Algorithm>,
        #[arg(long, requires = "risk")]
        term: Option<Term>,
        #[arg(long, requires = "term")]
        risk: Option<Risk>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Invest a quote amount into an asset at a given price
    Invest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        asset: String,
        #[arg(long)]
        price: f64,
        /// Quote amount; defaults to `[dca] amount`
        #[arg(long)]
        amount: Option<f64>,
    },
    /// Rebalance the configured portfolio toward its targets
    Rebalance {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List the swap pairs available in a data directory
    Pairs {
        #[arg(long)]
        data_dir: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    logging::init(&cli.log_level);

    match cli.command {
        Command::Signal {
            data_dir,
            pair,
            asset,
            algorithm,
            term,
            risk,
            config,
        } => {
            let algorithm = match (algorithm, term, risk) {
                (Some(a), _, _) => a,
                (None, Some(t), Some(r)) => Algorithm::for_profile(t, r),
                _ => {
                    eprintln!("error: either --algorithm or both --term and --risk are required");
                    return ExitCode::from(2);
                }
            };
            run_signal(&data_dir, &pair, &asset, algorithm, config.as_ref())
        }
        Command::Invest {
            config,
            asset,
            price,
            amount,
        } => run_invest(&config, &asset, price, amount),
        Command::Rebalance { config } => run_rebalance(&config),
        Command::Validate { config } => run_validate(&config),
        Command::Pairs { data_dir } => run_pairs(&data_dir),
    }
}

fn report(err: EngineError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        report(EngineError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}

fn engine_config(adapter: &dyn ConfigPort) -> Result<EngineConfig, ExitCode> {
    EngineConfig::from_config(adapter).map_err(report)
}

fn run_signal(
    data_dir: &PathBuf,
    pair: &str,
    asset: &str,
    algorithm: Algorithm,
    config_path: Option<&PathBuf>,
) -> ExitCode {
    let config = match config_path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            let adapter = match load_config(path) {
                Ok(a) => a,
                Err(code) => return code,
            };
            match engine_config(&adapter) {
                Ok(c) => c,
                Err(code) => return code,
            }
        }
        None => EngineConfig::default(),
    };

    let source = CsvAdapter::new(data_dir.clone());
    let swaps = match source.fetch_swaps(pair) {
        Ok(s) => s,
        Err(e) => return report(e),
    };
    eprintln!("Loaded {} swaps for {}", swaps.len(), pair);

    let series = Normalizer::new(asset.to_ascii_uppercase()).normalize(&swaps);
    let evaluation = evaluate(&series, algorithm, &config);

    println!("pair: {pair}");
    println!("asset: {}", series.asset());
    print_evaluation(&evaluation, &config);
    ExitCode::SUCCESS
}

fn print_evaluation(evaluation: &Evaluation, config: &EngineConfig) {
    let label = match evaluation.algorithm.indicator_kind() {
        Some(kind) => config.indicator_params(kind).to_string(),
        None => format!(
            "DCA({},{})",
            config.accumulation.interval(),
            config.accumulation.amount()
        ),
    };
    println!("algorithm: {label}");
    println!("data_points: {}", evaluation.data_points);
    if let Some(summary) = &evaluation.price_summary {
        println!("latest_price: {:.6}", summary.latest);
        println!("price_range: {:.6} - {:.6}", summary.min, summary.max);
    }

    let decision = &evaluation.decision;
    println!("signal: {}", decision.signal);
    if let Some(confidence) = decision.confidence {
        println!("confidence: {confidence}");
    }
    if let Some(reason) = decision.reason {
        println!("reason: {reason}");
    }

    match &evaluation.data {
        EvaluationData::Indicator(IndicatorResult::Rsi(r)) => {
            println!("rsi: {:.4}", r.value);
        }
        EvaluationData::Indicator(IndicatorResult::Macd(m)) => {
            println!("macd_line: {:.6}", m.macd_line);
            println!("signal_line: {:.6}", m.signal_line);
            println!("histogram: {:.6}", m.histogram());
            if m.periods != config.macd {
                println!("periods: {},{},{}", m.periods.short, m.periods.long, m.periods.signal);
            }
        }
        EvaluationData::Indicator(IndicatorResult::MaCrossover(ma)) => {
            println!("short_ma: {:.6}", ma.short_ma);
            println!("long_ma: {:.6}", ma.long_ma);
            println!("relative_difference: {:.6}", ma.relative_difference);
        }
        EvaluationData::Accumulation(plan) => {
            println!("purchases: {}", plan.purchases.len());
            println!("total_invested: {:.2}", plan.total_invested);
            println!("total_units: {:.8}", plan.total_units);
            println!("average_price: {:.6}", plan.average_price);
        }
        EvaluationData::Shortfall(shortfall) => {
            println!("detail: {shortfall}");
        }
    }
}

fn print_balances(portfolio: &Portfolio) {
    for (asset, balance) in portfolio.balances() {
        println!("  {asset}: {balance:.8}");
    }
}

fn run_invest(config_path: &PathBuf, asset: &str, price: f64, amount: Option<f64>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let config = match engine_config(&adapter) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let mut portfolio = match load_portfolio(&adapter, &config.quote) {
        Ok(p) => p,
        Err(e) => return report(e),
    };

    let amount = amount.unwrap_or(config.accumulation.amount());
    let asset = asset.to_ascii_uppercase();
    let record = match portfolio.invest(amount, &asset, price) {
        Ok(r) => r,
        Err(e) => return report(e),
    };

    println!("asset: {}", record.asset);
    println!("invested_amount: {:.2}", record.invested_amount);
    println!("units_bought: {:.8}", record.units_bought);
    println!("price_at_execution: {:.6}", record.price_at_execution);
    if record.external_funding > 0.0 {
        println!("external_funding: {:.2}", record.external_funding);
    }
    println!("balances:");
    print_balances(&portfolio);
    ExitCode::SUCCESS
}

fn run_rebalance(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let config = match engine_config(&adapter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let loaded = load_portfolio(&adapter, &config.quote).and_then(|portfolio| {
        let targets = load_targets(&adapter)?;
        let prices = load_prices(&adapter)?;
        Ok((portfolio, targets, prices))
    });
    let (mut portfolio, targets, prices) = match loaded {
        Ok(l) => l,
        Err(e) => return report(e),
    };
    if targets.assets().next().is_none() {
        return report(EngineError::ConfigMissing {
            section: "target".into(),
            key: "<asset>".into(),
        });
    }

    let outcome = rebalance(&mut portfolio, &targets, &prices, config.tolerance);

    println!("{}", outcome.message());
    println!("total_value: {:.2}", outcome.total_value);
    for trade in &outcome.trades {
        println!(
            "{} {:.8} {} ({:.2} {})",
            trade.action, trade.units, trade.asset, trade.value_in_quote, config.quote
        );
    }
    println!("balances:");
    print_balances(&portfolio);
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match validate_engine_config(&adapter) {
        Ok(config) => {
            eprintln!("  quote:     {}", config.quote);
            eprintln!(
                "  RSI:       period {} (oversold {}, overbought {})",
                config.rsi_period, config.policy.rsi_oversold, config.policy.rsi_overbought
            );
            eprintln!(
                "  MACD:      {},{},{}",
                config.macd.short, config.macd.long, config.macd.signal
            );
            eprintln!(
                "  MA:        {}/{} threshold {}",
                config.ma_short_window, config.ma_long_window, config.ma_threshold
            );
            eprintln!(
                "  DCA:       every {} prices, {} per purchase",
                config.accumulation.interval(),
                config.accumulation.amount()
            );
            eprintln!("  tolerance: {}", config.tolerance);
            eprintln!("\nConfig is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => report(e),
    }
}

fn run_pairs(data_dir: &PathBuf) -> ExitCode {
    let source = CsvAdapter::new(data_dir.clone());
    match source.list_pairs() {
        Ok(pairs) => {
            for pair in &pairs {
                println!("{pair}");
            }
            eprintln!("{} pairs in {}", pairs.len(), data_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => report(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn signal_accepts_profile() {
        let cli = Cli::try_parse_from([
            "signalfolio",
            "signal",
            "--data-dir",
            "d",
            "--pair",
            "weth_usdc",
            "--asset",
            "WETH",
            "--term",
            "long",
            "--risk",
            "low",
        ])
        .unwrap();
        match cli.command {
            Command::Signal {
                term,
                risk,
                algorithm,
                ..
            } => {
                assert_eq!(term, Some(Term::Long));
                assert_eq!(risk, Some(Risk::Low));
                assert_eq!(algorithm, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn signal_rejects_algorithm_with_profile() {
        let result = Cli::try_parse_from([
            "signalfolio",
            "signal",
            "--data-dir",
            "d",
            "--pair",
            "p",
            "--asset",
            "A",
            "--algorithm",
            "rsi",
            "--term",
            "short",
            "--risk",
            "high",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn signal_requires_a_selection() {
        let result = Cli::try_parse_from([
            "signalfolio",
            "signal",
            "--data-dir",
            "d",
            "--pair",
            "p",
            "--asset",
            "A",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn pairs_requires_data_dir() {
        assert!(Cli::try_parse_from(["signalfolio", "pairs"]).is_err());
        let cli = Cli::try_parse_from(["signalfolio", "pairs", "--data-dir", "d"]).unwrap();
        match cli.command {
            Command::Pairs { data_dir } => assert_eq!(data_dir, PathBuf::from("d")),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
