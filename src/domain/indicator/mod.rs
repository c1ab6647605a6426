//! Technical indicator implementations.
//!
//! This module provides:
//! - `IndicatorParams`: indicator identity plus parameters
//! - `IndicatorResult`: tagged union of per-indicator outputs, each carrying the
//!   latest value(s) and a history aligned with the input series
//! - `compute_indicator`: single entry point dispatching on the params

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdPeriods};
pub use rsi::calculate_rsi;
pub use sma::calculate_ma_crossover;

use std::fmt;

use tracing::debug;

use crate::domain::error::Shortfall;
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum IndicatorKind {
    Rsi,
    Macd,
    MaCrossover,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum IndicatorParams {
    Rsi {
        period: usize,
    },
    Macd(MacdPeriods),
    MaCrossover {
        short_window: usize,
        long_window: usize,
        threshold: f64,
    },
}

impl IndicatorParams {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorParams::Rsi { .. } => IndicatorKind::Rsi,
            IndicatorParams::Macd(_) => IndicatorKind::Macd,
            IndicatorParams::MaCrossover { .. } => IndicatorKind::MaCrossover,
        }
    }

    /// Documented fallback parameters for each indicator.
    pub fn default_for(kind: IndicatorKind) -> Self {
        match kind {
            IndicatorKind::Rsi => IndicatorParams::Rsi {
                period: rsi::DEFAULT_PERIOD,
            },
            IndicatorKind::Macd => IndicatorParams::Macd(MacdPeriods::default()),
            IndicatorKind::MaCrossover => IndicatorParams::MaCrossover {
                short_window: sma::DEFAULT_SHORT_WINDOW,
                long_window: sma::DEFAULT_LONG_WINDOW,
                threshold: sma::DEFAULT_THRESHOLD,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RsiResult {
    pub value: f64,
    pub period: usize,
    pub history: Vec<Option<f64>>,
    pub latest_price: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MacdResult {
    pub macd_line: f64,
    pub signal_line: f64,
    pub crossover: Signal,
    /// Periods actually used, after adaptive capping.
    pub periods: MacdPeriods,
    pub macd_history: Vec<Option<f64>>,
    pub signal_history: Vec<Option<f64>>,
    pub latest_price: f64,
}

impl MacdResult {
    pub fn histogram(&self) -> f64 {
        self.macd_line - self.signal_line
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MaResult {
    pub short_ma: f64,
    pub long_ma: f64,
    pub relative_difference: f64,
    pub threshold: f64,
    pub short_window: usize,
    pub long_window: usize,
    pub short_history: Vec<Option<f64>>,
    pub long_history: Vec<Option<f64>>,
    pub latest_price: f64,
}

impl MaResult {
    /// BUY above +threshold, SELL below -threshold, HOLD on or inside the band.
    pub fn signal(&self) -> Signal {
        if self.relative_difference > self.threshold {
            Signal::Buy
        } else if self.relative_difference < -self.threshold {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum IndicatorResult {
    Rsi(RsiResult),
    Macd(MacdResult),
    MaCrossover(MaResult),
}

impl IndicatorResult {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorResult::Rsi(_) => IndicatorKind::Rsi,
            IndicatorResult::Macd(_) => IndicatorKind::Macd,
            IndicatorResult::MaCrossover(_) => IndicatorKind::MaCrossover,
        }
    }

    pub fn latest_price(&self) -> f64 {
        match self {
            IndicatorResult::Rsi(r) => r.latest_price,
            IndicatorResult::Macd(r) => r.latest_price,
            IndicatorResult::MaCrossover(r) => r.latest_price,
        }
    }
}

pub fn compute_indicator(
    series: &PriceSeries,
    params: &IndicatorParams,
) -> Result<IndicatorResult, Shortfall> {
    let outcome = match *params {
        IndicatorParams::Rsi { period } => calculate_rsi(series, period).map(IndicatorResult::Rsi),
        IndicatorParams::Macd(periods) => {
            calculate_macd(series, periods).map(IndicatorResult::Macd)
        }
        IndicatorParams::MaCrossover {
            short_window,
            long_window,
            threshold,
        } => calculate_ma_crossover(series, short_window, long_window, threshold)
            .map(IndicatorResult::MaCrossover),
    };
    if let Err(shortfall) = &outcome {
        debug!(
            asset = series.asset(),
            indicator = %params.kind(),
            %shortfall,
            "indicator not computed"
        );
    }
    outcome
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Rsi => write!(f, "RSI"),
            IndicatorKind::Macd => write!(f, "MACD"),
            IndicatorKind::MaCrossover => write!(f, "MA"),
        }
    }
}

impl fmt::Display for IndicatorParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorParams::Rsi { period } => write!(f, "RSI({})", period),
            IndicatorParams::Macd(p) => write!(f, "MACD({},{},{})", p.short, p.long, p.signal),
            IndicatorParams::MaCrossover {
                short_window,
                long_window,
                threshold,
            } => write!(f, "MA({},{},{})", short_window, long_window, threshold),
        }
    }
}
