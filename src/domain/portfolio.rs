//! Portfolio balances, valuation and live investment.

use std::collections::{BTreeMap, HashMap};

use tracing::{info, warn};

use crate::domain::error::EngineError;
use crate::domain::price_series::is_valid_price;

pub const DEFAULT_QUOTE: &str = "USDC";

/// Current price per asset, in quote currency.
pub trait PriceLookup {
    fn price_of(&self, asset: &str) -> Option<f64>;
}

impl PriceLookup for HashMap<String, f64> {
    fn price_of(&self, asset: &str) -> Option<f64> {
        self.get(asset).copied()
    }
}

impl PriceLookup for BTreeMap<String, f64> {
    fn price_of(&self, asset: &str) -> Option<f64> {
        self.get(asset).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InvestmentRecord {
    pub asset: String,
    pub invested_amount: f64,
    pub units_bought: f64,
    pub price_at_execution: f64,
    /// Quote currency injected to cover a short balance.
    pub external_funding: f64,
}

/// Asset balances keyed by symbol, iterated in ascending symbol order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Portfolio {
    quote: String,
    balances: BTreeMap<String, f64>,
}

impl Default for Portfolio {
    fn default() -> Self {
        Portfolio::new(DEFAULT_QUOTE)
    }
}

impl Portfolio {
    pub fn new(quote: impl Into<String>) -> Self {
        let quote = quote.into();
        let mut balances = BTreeMap::new();
        balances.insert(quote.clone(), 0.0);
        Portfolio { quote, balances }
    }

    /// Build from a snapshot; negative or non-finite balances are rejected.
    pub fn with_balances<I, S>(quote: impl Into<String>, balances: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut portfolio = Portfolio::new(quote);
        for (asset, amount) in balances {
            let asset = asset.into();
            if !(amount.is_finite() && amount >= 0.0) {
                return Err(EngineError::InvalidAmount {
                    value: amount,
                    reason: format!("balance for {asset} must be non-negative"),
                });
            }
            portfolio.balances.insert(asset, amount);
        }
        Ok(portfolio)
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    pub fn balance(&self, asset: &str) -> f64 {
        self.balances.get(asset).copied().unwrap_or(0.0)
    }

    pub fn quote_balance(&self) -> f64 {
        self.balance(&self.quote)
    }

    pub fn balances(&self) -> &BTreeMap<String, f64> {
        &self.balances
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.balances.keys().map(String::as_str)
    }

    pub(crate) fn credit(&mut self, asset: &str, amount: f64) {
        *self.balances.entry(asset.to_string()).or_insert(0.0) += amount;
    }

    /// Debit never leaves a balance below zero.
    pub(crate) fn debit(&mut self, asset: &str, amount: f64) {
        let balance = self.balances.entry(asset.to_string()).or_insert(0.0);
        *balance = (*balance - amount).max(0.0);
    }

    /// Price of `asset` in quote currency; the quote itself is always 1.
    pub fn price_of(&self, asset: &str, prices: &dyn PriceLookup) -> Option<f64> {
        if asset == self.quote {
            return Some(1.0);
        }
        prices.price_of(asset).filter(|p| is_valid_price(*p))
    }

    /// Sum of balance * price. Assets without a known price contribute nothing.
    pub fn total_value(&self, prices: &dyn PriceLookup) -> f64 {
        self.balances
            .iter()
            .map(|(asset, &amount)| match self.price_of(asset, prices) {
                Some(price) => amount * price,
                None => {
                    if amount > 0.0 {
                        warn!(asset = %asset, amount, "no price for asset, valued at zero");
                    }
                    0.0
                }
            })
            .sum()
    }

    /// Fraction of total value held in each asset (0 when the portfolio is worthless).
    pub fn allocations(&self, prices: &dyn PriceLookup) -> BTreeMap<String, f64> {
        let total = self.total_value(prices);
        self.balances
            .iter()
            .map(|(asset, &amount)| {
                let fraction = match self.price_of(asset, prices) {
                    Some(price) if total > 0.0 => amount * price / total,
                    _ => 0.0,
                };
                (asset.clone(), fraction)
            })
            .collect()
    }

    /// Spend `amount` of quote currency on `asset` at `price`.
    ///
    /// A short quote balance is topped up first: the shortfall models an
    /// off-engine deposit, not a loan.
    pub fn invest(
        &mut self,
        amount: f64,
        asset: &str,
        price: f64,
    ) -> Result<InvestmentRecord, EngineError> {
        if !is_valid_price(price) {
            return Err(EngineError::InvalidPrice {
                asset: asset.to_string(),
                value: price,
            });
        }
        if !(amount.is_finite() && amount >= 0.0) {
            return Err(EngineError::InvalidAmount {
                value: amount,
                reason: "investment amount must be non-negative".to_string(),
            });
        }

        let quote = self.quote.clone();
        let available = self.quote_balance();
        let external_funding = (amount - available).max(0.0);
        if external_funding > 0.0 {
            info!(quote = %quote, external_funding, "topping up quote balance for investment");
            self.credit(&quote, external_funding);
        }

        let units_bought = amount / price;
        self.debit(&quote, amount);
        self.credit(asset, units_bought);
        info!(asset, amount, price, units_bought, "investment executed");

        Ok(InvestmentRecord {
            asset: asset.to_string(),
            invested_amount: amount,
            units_bought,
            price_at_execution: price,
            external_funding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn prices(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries.iter().map(|(a, p)| (a.to_string(), *p)).collect()
    }

    #[test]
    fn new_portfolio_has_empty_quote() {
        let portfolio = Portfolio::default();
        assert_eq!(portfolio.quote(), "USDC");
        assert_eq!(portfolio.quote_balance(), 0.0);
        assert_eq!(portfolio.assets().collect::<Vec<_>>(), vec!["USDC"]);
    }

    #[test]
    fn with_balances_rejects_negative() {
        let err = Portfolio::with_balances("USDC", [("WETH", -1.0)]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount { .. }));
    }

    #[test]
    fn assets_iterate_in_symbol_order() {
        let portfolio =
            Portfolio::with_balances("USDC", [("WETH", 1.0), ("DAI", 2.0), ("WBTC", 3.0)]).unwrap();
        assert_eq!(
            portfolio.assets().collect::<Vec<_>>(),
            vec!["DAI", "USDC", "WBTC", "WETH"]
        );
    }

    #[test]
    fn total_value_prices_quote_at_one() {
        let portfolio = Portfolio::with_balances("USDC", [("USDC", 500.0), ("WETH", 2.0)]).unwrap();
        let value = portfolio.total_value(&prices(&[("WETH", 2000.0)]));
        assert_relative_eq!(value, 4500.0);
    }

    #[test]
    fn total_value_ignores_unpriced_assets() {
        let portfolio = Portfolio::with_balances("USDC", [("USDC", 100.0), ("WBTC", 1.0)]).unwrap();
        assert_relative_eq!(portfolio.total_value(&prices(&[])), 100.0);
    }

    #[test]
    fn allocations_sum_to_one() {
        let portfolio = Portfolio::with_balances("USDC", [("USDC", 400.0), ("WETH", 0.3)]).unwrap();
        let alloc = portfolio.allocations(&prices(&[("WETH", 2000.0)]));
        assert_relative_eq!(alloc["USDC"], 0.4);
        assert_relative_eq!(alloc["WETH"], 0.6);
    }

    #[test]
    fn allocations_zero_when_worthless() {
        let portfolio = Portfolio::default();
        let alloc = portfolio.allocations(&prices(&[]));
        assert_eq!(alloc["USDC"], 0.0);
    }

    #[test]
    fn invest_spends_quote() {
        let mut portfolio = Portfolio::with_balances("USDC", [("USDC", 1000.0)]).unwrap();
        let record = portfolio.invest(100.0, "WETH", 2000.0).unwrap();

        assert_relative_eq!(record.units_bought, 0.05);
        assert_eq!(record.external_funding, 0.0);
        assert_relative_eq!(portfolio.quote_balance(), 900.0);
        assert_relative_eq!(portfolio.balance("WETH"), 0.05);
    }

    #[test]
    fn invest_tops_up_short_quote_balance() {
        let mut portfolio = Portfolio::with_balances("USDC", [("USDC", 30.0)]).unwrap();
        let record = portfolio.invest(100.0, "WETH", 2000.0).unwrap();

        assert_relative_eq!(record.external_funding, 70.0);
        assert_relative_eq!(record.invested_amount, 100.0);
        assert_eq!(portfolio.quote_balance(), 0.0);
        assert_relative_eq!(portfolio.balance("WETH"), 0.05);
    }

    #[test]
    fn invest_rejects_bad_price_and_amount() {
        let mut portfolio = Portfolio::default();
        assert!(matches!(
            portfolio.invest(100.0, "WETH", 0.0),
            Err(EngineError::InvalidPrice { .. })
        ));
        assert!(matches!(
            portfolio.invest(-1.0, "WETH", 10.0),
            Err(EngineError::InvalidAmount { .. })
        ));
        assert_eq!(portfolio, Portfolio::default());
    }

    #[test]
    fn debit_clamps_at_zero() {
        let mut portfolio = Portfolio::with_balances("USDC", [("WETH", 1.0)]).unwrap();
        portfolio.debit("WETH", 1.5);
        assert_eq!(portfolio.balance("WETH"), 0.0);
    }
}
