//! Target-allocation rebalancing.
//!
//! Total value and allocations are snapshotted before any trade. Assets are
//! then processed in ascending symbol order: every BUY draws on the same quote
//! balance, so earlier symbols are filled first when quote currency runs short.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{debug, info, warn};

use crate::domain::error::EngineError;
use crate::domain::portfolio::{Portfolio, PriceLookup};

pub const DEFAULT_TOLERANCE: f64 = 0.02;

/// Desired fraction of total value per asset.
///
/// Each fraction must lie in [0, 1]; the sum is deliberately not checked and
/// every asset is evaluated on its own.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TargetAllocation {
    fractions: BTreeMap<String, f64>,
}

impl TargetAllocation {
    pub fn new<I, S>(fractions: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (asset, fraction) in fractions {
            let asset = asset.into();
            if !(0.0..=1.0).contains(&fraction) {
                return Err(EngineError::InvalidAllocation { asset, fraction });
            }
            map.insert(asset, fraction);
        }
        Ok(TargetAllocation { fractions: map })
    }

    /// Target for `asset`; assets without a target are aimed at zero.
    pub fn target(&self, asset: &str) -> f64 {
        self.fractions.get(asset).copied().unwrap_or(0.0)
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.fractions.keys().map(String::as_str)
    }

    pub fn total(&self) -> f64 {
        self.fractions.values().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TradeAction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TradeInstruction {
    pub asset: String,
    pub action: TradeAction,
    pub units: f64,
    pub value_in_quote: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RebalanceStatus {
    WithinTolerance,
    Rebalanced,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RebalanceReport {
    pub status: RebalanceStatus,
    pub trades: Vec<TradeInstruction>,
    /// Portfolio value before any trade.
    pub total_value: f64,
}

impl RebalanceReport {
    pub fn message(&self) -> &'static str {
        match self.status {
            RebalanceStatus::WithinTolerance => {
                "Portfolio within tolerance. No rebalancing required."
            }
            RebalanceStatus::Rebalanced => "Portfolio rebalanced.",
        }
    }
}

/// Move `portfolio` toward `targets`, emitting one instruction per executed trade.
///
/// `tolerance` should be a finite value >= 0. A negative or NaN tolerance is
/// treated as 0, so any non-zero deviation trades.
pub fn rebalance(
    portfolio: &mut Portfolio,
    targets: &TargetAllocation,
    prices: &dyn PriceLookup,
    tolerance: f64,
) -> RebalanceReport {
    let tolerance = if tolerance.is_finite() && tolerance >= 0.0 {
        tolerance
    } else {
        warn!(tolerance, "invalid rebalance tolerance, using 0");
        0.0
    };
    let total_value = portfolio.total_value(prices);
    let current = portfolio.allocations(prices);
    let quote = portfolio.quote().to_string();

    let universe: BTreeSet<String> = portfolio
        .assets()
        .chain(targets.assets())
        .map(str::to_string)
        .collect();

    let mut status = RebalanceStatus::WithinTolerance;
    let mut trades = Vec::new();

    for asset in &universe {
        let current_alloc = current.get(asset).copied().unwrap_or(0.0);
        let deviation = current_alloc - targets.target(asset);
        if deviation.abs() < tolerance {
            continue;
        }
        status = RebalanceStatus::Rebalanced;

        if *asset == quote {
            continue;
        }
        let Some(price) = portfolio.price_of(asset, prices) else {
            warn!(asset = %asset, deviation, "cannot rebalance asset without a price");
            continue;
        };

        let trade = if deviation > 0.0 {
            plan_sell(portfolio, asset, deviation * total_value, price)
        } else {
            plan_buy(portfolio, asset, -deviation * total_value, price)
        };

        match trade {
            Some(trade) => {
                apply(portfolio, &quote, &trade);
                info!(
                    asset = %trade.asset,
                    action = ?trade.action,
                    units = trade.units,
                    value = trade.value_in_quote,
                    "rebalance trade"
                );
                trades.push(trade);
            }
            None => debug!(asset = %asset, deviation, "rebalance trade clamped to zero"),
        }
    }

    RebalanceReport {
        status,
        trades,
        total_value,
    }
}

fn plan_sell(
    portfolio: &Portfolio,
    asset: &str,
    desired_value: f64,
    price: f64,
) -> Option<TradeInstruction> {
    let units = (desired_value / price).min(portfolio.balance(asset));
    (units > 0.0).then(|| TradeInstruction {
        asset: asset.to_string(),
        action: TradeAction::Sell,
        units,
        value_in_quote: units * price,
    })
}

fn plan_buy(
    portfolio: &Portfolio,
    asset: &str,
    desired_value: f64,
    price: f64,
) -> Option<TradeInstruction> {
    let value = desired_value.min(portfolio.quote_balance());
    (value > 0.0).then(|| TradeInstruction {
        asset: asset.to_string(),
        action: TradeAction::Buy,
        units: value / price,
        value_in_quote: value,
    })
}

fn apply(portfolio: &mut Portfolio, quote: &str, trade: &TradeInstruction) {
    match trade.action {
        TradeAction::Sell => {
            portfolio.debit(&trade.asset, trade.units);
            portfolio.credit(quote, trade.value_in_quote);
        }
        TradeAction::Buy => {
            portfolio.debit(quote, trade.value_in_quote);
            portfolio.credit(&trade.asset, trade.units);
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}
