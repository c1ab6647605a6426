//! Engine settings read from configuration.
//!
//! Every value has a documented fallback; a key that is present but malformed
//! or out of range is an error rather than a silent default.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::domain::accumulation::{self, AccumulationSchedule};
use crate::domain::error::EngineError;
use crate::domain::indicator::{rsi, sma, IndicatorKind, IndicatorParams, MacdPeriods};
use crate::domain::portfolio::{Portfolio, DEFAULT_QUOTE};
use crate::domain::rebalance::{TargetAllocation, DEFAULT_TOLERANCE};
use crate::domain::signal::{ConfidenceBands, DecisionPolicy};
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub quote: String,
    pub rsi_period: usize,
    pub macd: MacdPeriods,
    pub ma_short_window: usize,
    pub ma_long_window: usize,
    pub ma_threshold: f64,
    pub accumulation: AccumulationSchedule,
    pub tolerance: f64,
    pub policy: DecisionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            quote: DEFAULT_QUOTE.to_string(),
            rsi_period: rsi::DEFAULT_PERIOD,
            macd: MacdPeriods::default(),
            ma_short_window: sma::DEFAULT_SHORT_WINDOW,
            ma_long_window: sma::DEFAULT_LONG_WINDOW,
            ma_threshold: sma::DEFAULT_THRESHOLD,
            accumulation: AccumulationSchedule::default(),
            tolerance: DEFAULT_TOLERANCE,
            policy: DecisionPolicy::default(),
        }
    }
}

fn read<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, EngineError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| EngineError::invalid(section, key, format!("cannot parse '{raw}'"))),
    }
}

fn positive(section: &str, key: &str, value: usize) -> Result<usize, EngineError> {
    if value == 0 {
        return Err(EngineError::invalid(section, key, format!("{key} must be positive")));
    }
    Ok(value)
}

fn fraction(section: &str, key: &str, value: f64) -> Result<f64, EngineError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(EngineError::invalid(section, key, format!("{key} must be between 0 and 1")));
    }
    Ok(value)
}

fn rsi_level(section: &str, key: &str, value: f64) -> Result<f64, EngineError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(EngineError::invalid(section, key, format!("{key} must be between 0 and 100")));
    }
    Ok(value)
}

fn non_negative(section: &str, key: &str, value: f64) -> Result<f64, EngineError> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(EngineError::invalid(section, key, format!("{key} must be non-negative")));
    }
    Ok(value)
}

impl EngineConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let d = EngineConfig::default();

        let quote = config
            .get_string("engine", "quote")
            .map(|q| q.trim().to_ascii_uppercase())
            .unwrap_or(d.quote);
        if quote.is_empty() {
            return Err(EngineError::invalid("engine", "quote", "quote symbol must not be empty"));
        }

        let rsi_period = positive("rsi", "period", read(config, "rsi", "period", d.rsi_period)?)?;

        let macd = MacdPeriods {
            short: positive("macd", "short", read(config, "macd", "short", d.macd.short)?)?,
            long: positive("macd", "long", read(config, "macd", "long", d.macd.long)?)?,
            signal: positive("macd", "signal", read(config, "macd", "signal", d.macd.signal)?)?,
        };
        if macd.short >= macd.long {
            return Err(EngineError::invalid("macd", "short", "short must be below long"));
        }

        let ma_short_window = positive(
            "ma",
            "short_window",
            read(config, "ma", "short_window", d.ma_short_window)?,
        )?;
        let ma_long_window = positive(
            "ma",
            "long_window",
            read(config, "ma", "long_window", d.ma_long_window)?,
        )?;
        if ma_short_window >= ma_long_window {
            return Err(EngineError::invalid(
                "ma",
                "short_window",
                "short_window must be below long_window",
            ));
        }
        let ma_threshold =
            non_negative("ma", "threshold", read(config, "ma", "threshold", d.ma_threshold)?)?;

        let accumulation = AccumulationSchedule::new(
            read(config, "dca", "interval", accumulation::DEFAULT_INTERVAL)?,
            read(config, "dca", "amount", accumulation::DEFAULT_AMOUNT)?,
        )
        .map_err(|e| match e {
            EngineError::InvalidAmount { reason, .. } => {
                EngineError::invalid("dca", "amount", reason)
            }
            other => other,
        })?;

        let tolerance = fraction(
            "rebalance",
            "tolerance",
            read(config, "rebalance", "tolerance", d.tolerance)?,
        )?;

        let policy = read_policy(config, &d.policy)?;

        Ok(EngineConfig {
            quote,
            rsi_period,
            macd,
            ma_short_window,
            ma_long_window,
            ma_threshold,
            accumulation,
            tolerance,
            policy,
        })
    }

    pub fn indicator_params(&self, kind: IndicatorKind) -> IndicatorParams {
        match kind {
            IndicatorKind::Rsi => IndicatorParams::Rsi {
                period: self.rsi_period,
            },
            IndicatorKind::Macd => IndicatorParams::Macd(self.macd),
            IndicatorKind::MaCrossover => IndicatorParams::MaCrossover {
                short_window: self.ma_short_window,
                long_window: self.ma_long_window,
                threshold: self.ma_threshold,
            },
        }
    }
}

fn read_policy(
    config: &dyn ConfigPort,
    d: &DecisionPolicy,
) -> Result<DecisionPolicy, EngineError> {
    let rsi_oversold =
        rsi_level("rsi", "oversold", read(config, "rsi", "oversold", d.rsi_oversold)?)?;
    let rsi_overbought =
        rsi_level("rsi", "overbought", read(config, "rsi", "overbought", d.rsi_overbought)?)?;
    if rsi_oversold >= rsi_overbought {
        return Err(EngineError::invalid("rsi", "oversold", "oversold must be below overbought"));
    }

    let b = &d.bands;
    let section = "confidence";
    let level = |key: &str, default: f64| -> Result<f64, EngineError> {
        rsi_level(section, key, read(config, section, key, default)?)
    };
    let gap = |key: &str, default: f64| -> Result<f64, EngineError> {
        non_negative(section, key, read(config, section, key, default)?)
    };
    let bands = ConfidenceBands {
        rsi_high: level("rsi_high", b.rsi_high)?,
        rsi_medium: level("rsi_medium", b.rsi_medium)?,
        macd_high: gap("macd_high", b.macd_high)?,
        macd_medium: gap("macd_medium", b.macd_medium)?,
        ma_high: gap("ma_high", b.ma_high)?,
        ma_medium: gap("ma_medium", b.ma_medium)?,
    };
    if bands.rsi_high > bands.rsi_medium
        || bands.macd_high < bands.macd_medium
        || bands.ma_high < bands.ma_medium
    {
        return Err(EngineError::invalid(
            section,
            "bands",
            "HIGH band must be stricter than MEDIUM",
        ));
    }

    Ok(DecisionPolicy {
        rsi_oversold,
        rsi_overbought,
        bands,
    })
}

fn asset_amounts(
    config: &dyn ConfigPort,
    section: &str,
) -> Result<BTreeMap<String, f64>, EngineError> {
    config
        .section_entries(section)
        .into_iter()
        .map(|(key, raw)| {
            let value: f64 = raw
                .trim()
                .parse()
                .map_err(|_| EngineError::invalid(section, &key, format!("cannot parse '{raw}'")))?;
            Ok((key.trim().to_ascii_uppercase(), value))
        })
        .collect()
}

/// `[portfolio]` section: asset = balance.
pub fn load_portfolio(config: &dyn ConfigPort, quote: &str) -> Result<Portfolio, EngineError> {
    Portfolio::with_balances(quote, asset_amounts(config, "portfolio")?)
}

/// `[target]` section: asset = fraction.
pub fn load_targets(config: &dyn ConfigPort) -> Result<TargetAllocation, EngineError> {
    TargetAllocation::new(asset_amounts(config, "target")?)
}

/// `[prices]` section: asset = price in quote currency.
pub fn load_prices(config: &dyn ConfigPort) -> Result<BTreeMap<String, f64>, EngineError> {
    let prices = asset_amounts(config, "prices")?;
    if let Some((asset, &value)) = prices.iter().find(|(_, p)| !(p.is_finite() && **p > 0.0)) {
        return Err(EngineError::InvalidPrice {
            asset: asset.clone(),
            value,
        });
    }
    Ok(prices)
}

/// Check every engine setting and any asset sections present, reporting the
/// first problem with its section and key.
pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, EngineError> {
    let engine = EngineConfig::from_config(config)?;
    load_portfolio(config, &engine.quote)?;
    load_targets(config)?;
    load_prices(config)?;
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<(String, String), String>);

    impl MapConfig {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            MapConfig(
                entries
                    .iter()
                    .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                    .collect(),
            )
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.0.get(&(section.to_string(), key.to_string())).cloned()
        }

        fn section_entries(&self, section: &str) -> Vec<(String, String)> {
            let mut entries: Vec<(String, String)> = self
                .0
                .iter()
                .filter(|((s, _), _)| s == section)
                .map(|((_, k), v)| (k.clone(), v.clone()))
                .collect();
            entries.sort();
            entries
        }
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = EngineConfig::from_config(&MapConfig::new(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = EngineConfig::from_config(&MapConfig::new(&[
            ("engine", "quote", "dai"),
            ("rsi", "period", "14"),
            ("macd", "short", "6"),
            ("macd", "long", "13"),
            ("ma", "threshold", "0.01"),
            ("dca", "interval", "3"),
            ("dca", "amount", "50"),
            ("rebalance", "tolerance", "0.05"),
            ("confidence", "macd_high", "0.5"),
        ]))
        .unwrap();

        assert_eq!(config.quote, "DAI");
        assert_eq!(config.rsi_period, 14);
        assert_eq!(config.macd, MacdPeriods { short: 6, long: 13, signal: 9 });
        assert_eq!(config.ma_threshold, 0.01);
        assert_eq!(config.accumulation.interval(), 3);
        assert_eq!(config.accumulation.amount(), 50.0);
        assert_eq!(config.tolerance, 0.05);
        assert_eq!(config.policy.bands.macd_high, 0.5);
    }

    #[test]
    fn malformed_value_is_an_error() {
        let err =
            EngineConfig::from_config(&MapConfig::new(&[("rsi", "period", "abc")])).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { ref section, ref key, .. }
            if section == "rsi" && key == "period"));
    }

    #[test]
    fn zero_period_rejected() {
        assert!(EngineConfig::from_config(&MapConfig::new(&[("macd", "signal", "0")])).is_err());
        assert!(EngineConfig::from_config(&MapConfig::new(&[("dca", "interval", "0")])).is_err());
    }

    #[test]
    fn window_order_enforced() {
        let err = EngineConfig::from_config(&MapConfig::new(&[("ma", "short_window", "5")]))
            .unwrap_err();
        assert!(err.to_string().contains("short_window must be below long_window"));
    }

    #[test]
    fn tolerance_range_enforced() {
        let config = MapConfig::new(&[("rebalance", "tolerance", "1.5")]);
        assert!(EngineConfig::from_config(&config).is_err());
    }

    #[test]
    fn dca_amount_error_has_context() {
        let err =
            EngineConfig::from_config(&MapConfig::new(&[("dca", "amount", "-5")])).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { ref key, .. } if key == "amount"));
    }

    #[test]
    fn loads_asset_sections() {
        let config = MapConfig::new(&[
            ("portfolio", "usdc", "1000"),
            ("portfolio", "weth", "0.5"),
            ("target", "weth", "0.6"),
            ("target", "usdc", "0.4"),
            ("prices", "weth", "2000"),
        ]);
        let portfolio = load_portfolio(&config, "USDC").unwrap();
        assert_eq!(portfolio.quote_balance(), 1000.0);
        assert_eq!(portfolio.balance("WETH"), 0.5);

        let targets = load_targets(&config).unwrap();
        assert_eq!(targets.target("WETH"), 0.6);

        let prices = load_prices(&config).unwrap();
        assert_eq!(prices["WETH"], 2000.0);
    }

    #[test]
    fn rejects_bad_price_entries() {
        let config = MapConfig::new(&[("prices", "weth", "0")]);
        assert!(matches!(load_prices(&config), Err(EngineError::InvalidPrice { .. })));
        let config = MapConfig::new(&[("prices", "weth", "lots")]);
        assert!(matches!(load_prices(&config), Err(EngineError::ConfigInvalid { .. })));
    }

    #[test]
    fn validate_checks_asset_sections() {
        let ok = MapConfig::new(&[("portfolio", "usdc", "10"), ("target", "weth", "0.5")]);
        assert!(validate_engine_config(&ok).is_ok());

        let bad = MapConfig::new(&[("target", "weth", "1.5")]);
        assert!(matches!(
            validate_engine_config(&bad),
            Err(EngineError::InvalidAllocation { .. })
        ));
    }
}
