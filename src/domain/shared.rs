//! Single-writer access to a portfolio shared across threads.
//!
//! Trades read and then write the shared quote balance, so every mutation runs
//! under one lock.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::error::EngineError;
use crate::domain::portfolio::{InvestmentRecord, Portfolio, PriceLookup};
use crate::domain::rebalance::{rebalance, RebalanceReport, TargetAllocation};

#[derive(Debug, Clone)]
pub struct SharedPortfolio {
    inner: Arc<Mutex<Portfolio>>,
}

impl SharedPortfolio {
    pub fn new(portfolio: Portfolio) -> Self {
        SharedPortfolio {
            inner: Arc::new(Mutex::new(portfolio)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Portfolio>, EngineError> {
        self.inner.lock().map_err(|_| EngineError::PortfolioPoisoned)
    }

    pub fn snapshot(&self) -> Result<Portfolio, EngineError> {
        Ok(self.lock()?.clone())
    }

    pub fn invest(
        &self,
        amount: f64,
        asset: &str,
        price: f64,
    ) -> Result<InvestmentRecord, EngineError> {
        self.lock()?.invest(amount, asset, price)
    }

    pub fn rebalance(
        &self,
        targets: &TargetAllocation,
        prices: &dyn PriceLookup,
        tolerance: f64,
    ) -> Result<RebalanceReport, EngineError> {
        let mut portfolio = self.lock()?;
        Ok(rebalance(&mut portfolio, targets, prices, tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;
    use std::thread;

    #[test]
    fn concurrent_investments_are_serialized() {
        let shared = SharedPortfolio::new(
            Portfolio::with_balances("USDC", [("USDC", 1000.0)]).unwrap(),
        );

        thread::scope(|s| {
            for _ in 0..8 {
                let shared = shared.clone();
                s.spawn(move || {
                    for _ in 0..10 {
                        shared.invest(10.0, "WETH", 2000.0).unwrap();
                    }
                });
            }
        });

        let portfolio = shared.snapshot().unwrap();
        assert_relative_eq!(portfolio.quote_balance(), 200.0, epsilon = 1e-9);
        assert_relative_eq!(portfolio.balance("WETH"), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn concurrent_rebalances_never_go_negative() {
        let shared = SharedPortfolio::new(
            Portfolio::with_balances("USDC", [("USDC", 1000.0)]).unwrap(),
        );
        let targets = TargetAllocation::new([("ETH", 0.6), ("BTC", 0.5)]).unwrap();
        let prices: HashMap<String, f64> =
            [("ETH".to_string(), 2000.0), ("BTC".to_string(), 50_000.0)].into();

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| shared.rebalance(&targets, &prices, 0.02).unwrap());
            }
        });

        let portfolio = shared.snapshot().unwrap();
        assert!(portfolio.balances().values().all(|b| *b >= 0.0));
        let total = portfolio.total_value(&prices);
        assert_relative_eq!(total, 1000.0, max_relative = 1e-9);
    }

    #[test]
    fn poisoned_lock_is_reported() {
        let shared = SharedPortfolio::new(Portfolio::default());
        let clone = shared.clone();
        let _ = thread::spawn(move || {
            let _guard = clone.inner.lock().unwrap();
            panic!("writer failed");
        })
        .join();

        assert!(matches!(shared.snapshot(), Err(EngineError::PortfolioPoisoned)));
    }
}
