//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(short) - EMA(long), where both are defined
//! Signal Line = EMA(signal) over the defined MACD values only, left-padded
//! with `None` so it lines up with the MACD line.
//!
//! Default parameters: short=12, long=26, signal=9. Series shorter than the
//! long period but at least [`ADAPTIVE_MIN_PRICES`] long are evaluated with
//! the periods capped to [`ADAPTIVE_PERIODS`].

use tracing::debug;

use crate::domain::error::Shortfall;
use crate::domain::indicator::{calculate_ema, MacdResult};
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::Signal;

pub const DEFAULT_SHORT: usize = 12;
pub const DEFAULT_LONG: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub const ADAPTIVE_MIN_PRICES: usize = 14;
pub const ADAPTIVE_PERIODS: MacdPeriods = MacdPeriods {
    short: 5,
    long: 10,
    signal: 3,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MacdPeriods {
    pub short: usize,
    pub long: usize,
    pub signal: usize,
}

impl Default for MacdPeriods {
    fn default() -> Self {
        MacdPeriods {
            short: DEFAULT_SHORT,
            long: DEFAULT_LONG,
            signal: DEFAULT_SIGNAL,
        }
    }
}

impl MacdPeriods {
    /// Cap each period to the adaptive fallback.
    pub fn capped(self) -> Self {
        MacdPeriods {
            short: self.short.min(ADAPTIVE_PERIODS.short),
            long: self.long.min(ADAPTIVE_PERIODS.long),
            signal: self.signal.min(ADAPTIVE_PERIODS.signal),
        }
    }

    /// Prices needed for two defined (MACD, signal) pairs.
    pub fn min_prices(&self) -> usize {
        self.short.max(self.long).saturating_add(self.signal)
    }
}

/// Raw MACD and signal lines, aligned with `prices`.
pub fn macd_lines(prices: &[f64], periods: MacdPeriods) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let short_ema = calculate_ema(prices, periods.short);
    let long_ema = calculate_ema(prices, periods.long);

    let macd_line: Vec<Option<f64>> = short_ema
        .iter()
        .zip(&long_ema)
        .map(|(s, l)| Some((*s)? - (*l)?))
        .collect();

    let defined: Vec<f64> = macd_line.iter().flatten().copied().collect();
    let signal_values = calculate_ema(&defined, periods.signal);
    let mut signal_line = vec![None; macd_line.len() - defined.len()];
    signal_line.extend(signal_values);

    (macd_line, signal_line)
}

/// Crossover of the last two defined (MACD, signal) pairs.
fn crossover(prev: (f64, f64), cur: (f64, f64)) -> Signal {
    let (prev_macd, prev_signal) = prev;
    let (cur_macd, cur_signal) = cur;
    if prev_macd <= prev_signal && cur_macd > cur_signal {
        Signal::Buy
    } else if prev_macd >= prev_signal && cur_macd < cur_signal {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

pub fn calculate_macd(series: &PriceSeries, periods: MacdPeriods) -> Result<MacdResult, Shortfall> {
    if periods.short == 0 || periods.long == 0 || periods.signal == 0 {
        return Err(Shortfall::InvalidParameters {
            reason: format!(
                "MACD periods must be positive, got {}/{}/{}",
                periods.short, periods.long, periods.signal
            ),
        });
    }
    let prices = series.as_slice();
    let latest_price = series.latest().ok_or(Shortfall::NoData)?;

    let periods = if prices.len() >= periods.long {
        periods
    } else if prices.len() >= ADAPTIVE_MIN_PRICES {
        let capped = periods.capped();
        debug!(
            asset = series.asset(),
            prices = prices.len(),
            short = capped.short,
            long = capped.long,
            signal = capped.signal,
            "short series, using adaptive MACD periods"
        );
        capped
    } else {
        return Err(Shortfall::InsufficientData {
            have: prices.len(),
            need: periods.long.min(ADAPTIVE_MIN_PRICES),
        });
    };

    let (macd_history, signal_history) = macd_lines(prices, periods);

    let mut pairs = macd_history
        .iter()
        .zip(&signal_history)
        .rev()
        .filter_map(|(m, s)| Some(((*m)?, (*s)?)));
    let (Some(cur), Some(prev)) = (pairs.next(), pairs.next()) else {
        return Err(Shortfall::InsufficientData {
            have: prices.len(),
            need: periods.min_prices(),
        });
    };

    Ok(MacdResult {
        macd_line: cur.0,
        signal_line: cur.1,
        crossover: crossover(prev, cur),
        periods,
        macd_history,
        signal_history,
        latest_price,
    })
}
