#![allow(dead_code)]

use chrono::DateTime;
use signalfolio::domain::error::EngineError;
pub use signalfolio::domain::normalizer::{SwapRecord, TokenLeg};
use signalfolio::ports::swap_port::SwapSource;
use std::collections::HashMap;

pub const CSV_HEADER: &str =
    "timestamp,token_in_symbol,token_in_price_usd,token_out_symbol,token_out_price_usd";

pub struct MockSwapSource {
    pub data: HashMap<String, Vec<SwapRecord>>,
    pub errors: HashMap<String, String>,
}

impl MockSwapSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_swaps(mut self, pair: &str, swaps: Vec<SwapRecord>) -> Self {
        self.data.insert(pair.to_string(), swaps);
        self
    }

    pub fn with_error(mut self, pair: &str, reason: &str) -> Self {
        self.errors.insert(pair.to_string(), reason.to_string());
        self
    }
}

impl SwapSource for MockSwapSource {
    fn fetch_swaps(&self, pair: &str) -> Result<Vec<SwapRecord>, EngineError> {
        if let Some(reason) = self.errors.get(pair) {
            return Err(EngineError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(pair).cloned().unwrap_or_default())
    }

    fn list_pairs(&self) -> Result<Vec<String>, EngineError> {
        let mut pairs: Vec<String> = self.data.keys().cloned().collect();
        pairs.sort();
        Ok(pairs)
    }
}

/// A swap selling USDC for `asset` at `price`.
pub fn make_swap(ts: i64, asset: &str, price: f64) -> SwapRecord {
    SwapRecord {
        timestamp: DateTime::from_timestamp(ts, 0).unwrap(),
        token_in: TokenLeg {
            symbol: Some("USDC".to_string()),
            price_usd: "1.0".to_string(),
        },
        token_out: TokenLeg {
            symbol: Some(asset.to_string()),
            price_usd: price.to_string(),
        },
    }
}

/// One swap per price, one minute apart.
pub fn make_swaps(asset: &str, prices: &[f64]) -> Vec<SwapRecord> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| make_swap(1_700_000_000 + 60 * i as i64, asset, p))
        .collect()
}

/// CSV body in the on-disk swap format for the given prices.
pub fn swaps_csv(asset: &str, prices: &[f64]) -> String {
    let mut out = format!("{CSV_HEADER}\n");
    for (i, p) in prices.iter().enumerate() {
        out.push_str(&format!("{},USDC,1.0,{},{}\n", 1_700_000_000 + 60 * i as i64, asset, p));
    }
    out
}

pub fn ramp(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}
