//! Scheduled accumulation (dollar-cost averaging).
//!
//! A fixed quote amount is spent every `interval` prices, regardless of price.
//! Purchases happen at every index i where (i+1) % interval == 0.

use crate::domain::error::{EngineError, Shortfall};
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::Signal;

pub const DEFAULT_INTERVAL: usize = 7;
pub const DEFAULT_AMOUNT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulationSchedule {
    interval: usize,
    amount: f64,
}

impl Default for AccumulationSchedule {
    fn default() -> Self {
        AccumulationSchedule {
            interval: DEFAULT_INTERVAL,
            amount: DEFAULT_AMOUNT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScheduledPurchase {
    pub index: usize,
    pub price: f64,
    pub amount: f64,
    pub units_bought: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AccumulationPlan {
    /// One entry per price: BUY at purchase indices, HOLD elsewhere.
    pub signals: Vec<Signal>,
    pub purchases: Vec<ScheduledPurchase>,
    pub total_invested: f64,
    pub total_units: f64,
    pub average_price: f64,
    pub latest_price: f64,
}

impl AccumulationSchedule {
    pub fn new(interval: usize, amount: f64) -> Result<Self, EngineError> {
        if interval == 0 {
            return Err(EngineError::invalid("dca", "interval", "interval must be at least 1"));
        }
        if !(amount.is_finite() && amount > 0.0) {
            return Err(EngineError::InvalidAmount {
                value: amount,
                reason: "accumulation amount must be positive".to_string(),
            });
        }
        Ok(AccumulationSchedule { interval, amount })
    }

    pub fn interval(&self) -> usize {
        self.interval
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn simulate(&self, series: &PriceSeries) -> Result<AccumulationPlan, Shortfall> {
        let prices = series.as_slice();
        let latest_price = series.latest().ok_or(Shortfall::NoData)?;
        if prices.len() < self.interval {
            return Err(Shortfall::InsufficientData {
                have: prices.len(),
                need: self.interval,
            });
        }

        let mut signals = Vec::with_capacity(prices.len());
        let mut purchases = Vec::with_capacity(prices.len() / self.interval);
        let mut total_invested = 0.0;
        let mut total_units = 0.0;

        for (index, &price) in prices.iter().enumerate() {
            if (index + 1) % self.interval != 0 {
                signals.push(Signal::Hold);
                continue;
            }
            let units_bought = self.amount / price;
            total_invested += self.amount;
            total_units += units_bought;
            purchases.push(ScheduledPurchase {
                index,
                price,
                amount: self.amount,
                units_bought,
            });
            signals.push(Signal::Buy);
        }

        let average_price = if total_units > 0.0 {
            total_invested / total_units
        } else {
            0.0
        };

        Ok(AccumulationPlan {
            signals,
            purchases,
            total_invested,
            total_units,
            average_price,
            latest_price,
        })
    }
}
