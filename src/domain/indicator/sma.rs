//! Simple moving averages and the moving-average crossover.

use crate::domain::error::Shortfall;
use crate::domain::indicator::MaResult;
use crate::domain::price_series::PriceSeries;

pub const DEFAULT_SHORT_WINDOW: usize = 3;
pub const DEFAULT_LONG_WINDOW: usize = 5;
pub const DEFAULT_THRESHOLD: f64 = 0.005;

/// Mean of the last `window` prices, `None` when there are fewer.
pub fn trailing_mean(prices: &[f64], window: usize) -> Option<f64> {
    if window == 0 || prices.len() < window {
        return None;
    }
    Some(prices[prices.len() - window..].iter().sum::<f64>() / window as f64)
}

/// Rolling SMA aligned with the input; the first (window-1) entries are `None`.
/// Each entry is summed afresh so the last one equals [`trailing_mean`].
pub fn rolling_sma(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; prices.len()];
    if window == 0 || prices.len() < window {
        return values;
    }
    for (end, value) in values.iter_mut().enumerate().skip(window - 1) {
        *value = trailing_mean(&prices[..=end], window);
    }
    values
}

pub fn calculate_ma_crossover(
    series: &PriceSeries,
    short_window: usize,
    long_window: usize,
    threshold: f64,
) -> Result<MaResult, Shortfall> {
    if short_window == 0 || short_window >= long_window {
        return Err(Shortfall::InvalidParameters {
            reason: format!(
                "short window {short_window} must be positive and below long window {long_window}"
            ),
        });
    }
    if !(threshold.is_finite() && threshold >= 0.0) {
        return Err(Shortfall::InvalidParameters {
            reason: format!("threshold {threshold} must be non-negative"),
        });
    }

    let prices = series.as_slice();
    let latest_price = series.latest().ok_or(Shortfall::NoData)?;
    let (Some(short_ma), Some(long_ma)) = (
        trailing_mean(prices, short_window),
        trailing_mean(prices, long_window),
    ) else {
        return Err(Shortfall::InsufficientData {
            have: prices.len(),
            need: long_window,
        });
    };

    Ok(MaResult {
        short_ma,
        long_ma,
        relative_difference: (short_ma - long_ma) / long_ma,
        threshold,
        short_window,
        long_window,
        short_history: rolling_sma(prices, short_window),
        long_history: rolling_sma(prices, long_window),
        latest_price,
    })
}
