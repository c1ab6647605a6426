//! Chronological price sequence consumed by every indicator.

use crate::domain::error::EngineError;

/// Oldest-first sequence of strictly positive, finite prices.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PriceSeries {
    asset: String,
    prices: Vec<f64>,
}

impl PriceSeries {
    /// Build a series, rejecting the first reading that is not a positive finite number.
    pub fn new(asset: impl Into<String>, prices: Vec<f64>) -> Result<Self, EngineError> {
        let asset = asset.into();
        if let Some(&bad) = prices.iter().find(|p| !is_valid_price(**p)) {
            return Err(EngineError::InvalidPrice { asset, value: bad });
        }
        Ok(PriceSeries { asset, prices })
    }

    /// Build a series keeping only valid readings.
    pub fn from_readings(
        asset: impl Into<String>,
        readings: impl IntoIterator<Item = f64>,
    ) -> Self {
        PriceSeries {
            asset: asset.into(),
            prices: readings.into_iter().filter(|p| is_valid_price(*p)).collect(),
        }
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Most recent price.
    pub fn latest(&self) -> Option<f64> {
        self.prices.last().copied()
    }

    /// Latest, lowest and highest price, or `None` for an empty series.
    pub fn summary(&self) -> Option<PriceSummary> {
        let latest = self.latest()?;
        let (min, max) = self
            .prices
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        Some(PriceSummary {
            latest,
            count: self.prices.len(),
            min,
            max,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PriceSummary {
    pub latest: f64,
    pub count: usize,
    pub min: f64,
    pub max: f64,
}

pub(crate) fn is_valid_price(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
