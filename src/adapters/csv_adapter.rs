//! CSV swap-history adapter.
//!
//! One file per pair, `{base}/{pair}.csv`, with the header
//! `timestamp,token_in_symbol,token_in_price_usd,token_out_symbol,token_out_price_usd`.
//! Timestamps are unix seconds; an empty symbol column means the indexer did
//! not report one. Price columns are passed through unparsed.

use crate::domain::error::EngineError;
use crate::domain::normalizer::{SwapRecord, TokenLeg};
use crate::ports::swap_port::SwapSource;
use chrono::DateTime;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, pair: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", pair))
    }
}

fn leg(symbol: &str, price: &str) -> TokenLeg {
    let symbol = symbol.trim();
    TokenLeg {
        symbol: (!symbol.is_empty()).then(|| symbol.to_string()),
        price_usd: price.trim().to_string(),
    }
}

fn column<'a>(
    record: &'a csv::StringRecord,
    idx: usize,
    name: &str,
) -> Result<&'a str, EngineError> {
    record.get(idx).ok_or_else(|| EngineError::DataSource {
        reason: format!("missing {} column", name),
    })
}

impl SwapSource for CsvAdapter {
    fn fetch_swaps(&self, pair: &str) -> Result<Vec<SwapRecord>, EngineError> {
        let path = self.csv_path(pair);
        let content = fs::read_to_string(&path).map_err(|e| EngineError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut swaps = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| EngineError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let ts_str = column(&record, 0, "timestamp")?;
            let seconds: i64 = ts_str.trim().parse().map_err(|e| EngineError::DataSource {
                reason: format!("invalid timestamp '{}': {}", ts_str, e),
            })?;
            let timestamp =
                DateTime::from_timestamp(seconds, 0).ok_or_else(|| EngineError::DataSource {
                    reason: format!("timestamp out of range: {}", seconds),
                })?;

            swaps.push(SwapRecord {
                timestamp,
                token_in: leg(
                    column(&record, 1, "token_in_symbol")?,
                    column(&record, 2, "token_in_price_usd")?,
                ),
                token_out: leg(
                    column(&record, 3, "token_out_symbol")?,
                    column(&record, 4, "token_out_price_usd")?,
                ),
            });
        }

        Ok(swaps)
    }

    fn list_pairs(&self) -> Result<Vec<String>, EngineError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| EngineError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut pairs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| EngineError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            if let Some(pair) = name.to_string_lossy().strip_suffix(".csv") {
                pairs.push(pair.to_string());
            }
        }

        pairs.sort();
        Ok(pairs)
    }
}
