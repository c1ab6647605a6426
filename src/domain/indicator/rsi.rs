//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n price changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Needs n+1 prices. History entries before index n are `None`.

use crate::domain::error::Shortfall;
use crate::domain::indicator::RsiResult;
use crate::domain::price_series::PriceSeries;

pub const DEFAULT_PERIOD: usize = 5;

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

pub fn calculate_rsi(series: &PriceSeries, period: usize) -> Result<RsiResult, Shortfall> {
    if period == 0 {
        return Err(Shortfall::InvalidParameters {
            reason: "RSI period must be positive".to_string(),
        });
    }
    let prices = series.as_slice();
    let latest_price = series.latest().ok_or(Shortfall::NoData)?;
    if prices.len() <= period {
        return Err(Shortfall::InsufficientData {
            have: prices.len(),
            need: period.saturating_add(1),
        });
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = prices
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let n = period as f64;
    let mut avg_gain = gains[..period].iter().sum::<f64>() / n;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / n;

    let mut history = vec![None; prices.len()];
    history[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (n - 1.0) + gains[i]) / n;
        avg_loss = (avg_loss * (n - 1.0) + losses[i]) / n;
        history[i + 1] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    Ok(RsiResult {
        value: rsi_from_averages(avg_gain, avg_loss),
        period,
        history,
        latest_price,
    })
}
