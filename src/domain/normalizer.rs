//! Swap records to price series.
//!
//! Extraction rule: when symbol metadata is present, take the leg whose symbol
//! matches the asset (token_in first). Only when neither leg carries a symbol
//! does the normalizer fall back to a fixed side.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::price_series::{is_valid_price, PriceSeries};

/// One side of a swap as reported by the indexer.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenLeg {
    pub symbol: Option<String>,
    /// Raw USD price reading, unparsed.
    pub price_usd: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapRecord {
    pub timestamp: DateTime<Utc>,
    pub token_in: TokenLeg,
    pub token_out: TokenLeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSide {
    In,
    Out,
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    asset: String,
    fallback_side: TokenSide,
}

impl Normalizer {
    pub fn new(asset: impl Into<String>) -> Self {
        Normalizer {
            asset: asset.into(),
            fallback_side: TokenSide::Out,
        }
    }

    pub fn with_fallback_side(mut self, side: TokenSide) -> Self {
        self.fallback_side = side;
        self
    }

    /// Pick the leg carrying the asset's price, if any.
    fn select_leg<'a>(&self, swap: &'a SwapRecord) -> Option<&'a TokenLeg> {
        let has_symbols = swap.token_in.symbol.is_some() || swap.token_out.symbol.is_some();
        if !has_symbols {
            return Some(match self.fallback_side {
                TokenSide::In => &swap.token_in,
                TokenSide::Out => &swap.token_out,
            });
        }
        [&swap.token_in, &swap.token_out].into_iter().find(|leg| {
            leg.symbol
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(&self.asset))
        })
    }

    /// Extract the asset price from one swap. `None` when the swap does not
    /// involve the asset or the reading is not a positive number.
    pub fn extract_price(&self, swap: &SwapRecord) -> Option<f64> {
        let leg = self.select_leg(swap)?;
        match leg.price_usd.trim().parse::<f64>() {
            Ok(price) if is_valid_price(price) => Some(price),
            _ => {
                debug!(
                    asset = %self.asset,
                    reading = %leg.price_usd,
                    timestamp = %swap.timestamp,
                    "dropping invalid price reading"
                );
                None
            }
        }
    }

    /// Sort swaps oldest first and extract the asset's price series.
    pub fn normalize(&self, swaps: &[SwapRecord]) -> PriceSeries {
        let mut ordered: Vec<&SwapRecord> = swaps.iter().collect();
        ordered.sort_by_key(|s| s.timestamp);
        let prices: Vec<f64> = ordered
            .into_iter()
            .filter_map(|s| self.extract_price(s))
            .collect();
        debug!(
            asset = %self.asset,
            swaps = swaps.len(),
            prices = prices.len(),
            "normalized swap records"
        );
        PriceSeries::from_readings(self.asset.clone(), prices)
    }
}
