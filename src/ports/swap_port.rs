//! Swap data access port trait.

use crate::domain::error::EngineError;
use crate::domain::normalizer::SwapRecord;

pub trait SwapSource {
    /// Swap records for a trading pair (e.g. `weth_usdc`), in any order.
    fn fetch_swaps(&self, pair: &str) -> Result<Vec<SwapRecord>, EngineError>;

    fn list_pairs(&self) -> Result<Vec<String>, EngineError>;
}
