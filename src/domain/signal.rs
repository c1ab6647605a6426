//! Decision policy: indicator outcome -> signal and confidence tier.

use std::fmt;

use crate::domain::accumulation::AccumulationPlan;
use crate::domain::error::Shortfall;
use crate::domain::indicator::IndicatorResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Why a decision fell back to HOLD without evaluating an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ReasonCode {
    NoData,
    InsufficientData,
    InvalidParameters,
}

impl From<&Shortfall> for ReasonCode {
    fn from(shortfall: &Shortfall) -> Self {
        match shortfall {
            Shortfall::NoData => ReasonCode::NoData,
            Shortfall::InsufficientData { .. } => ReasonCode::InsufficientData,
            Shortfall::InvalidParameters { .. } => ReasonCode::InvalidParameters,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Decision {
    pub signal: Signal,
    pub confidence: Option<Confidence>,
    pub reason: Option<ReasonCode>,
}

impl Decision {
    pub fn new(signal: Signal, confidence: Confidence) -> Self {
        Decision {
            signal,
            confidence: Some(confidence),
            reason: None,
        }
    }

    pub fn hold_for(shortfall: &Shortfall) -> Self {
        Decision {
            signal: Signal::Hold,
            confidence: None,
            reason: Some(shortfall.into()),
        }
    }
}

/// Magnitude cut points for confidence tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBands {
    /// RSI at or beyond `rsi_high` from either edge (<= x or >= 100-x) is HIGH.
    pub rsi_high: f64,
    pub rsi_medium: f64,
    /// Absolute |macd - signal| bands.
    pub macd_high: f64,
    pub macd_medium: f64,
    /// |relative difference| bands for the MA crossover.
    pub ma_high: f64,
    pub ma_medium: f64,
}

impl Default for ConfidenceBands {
    fn default() -> Self {
        ConfidenceBands {
            rsi_high: 20.0,
            rsi_medium: 35.0,
            macd_high: 0.1,
            macd_medium: 0.05,
            ma_high: 0.02,
            ma_medium: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub bands: ConfidenceBands,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        DecisionPolicy {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            bands: ConfidenceBands::default(),
        }
    }
}

fn tier(magnitude: f64, high: f64, medium: f64) -> Confidence {
    if magnitude > high {
        Confidence::High
    } else if magnitude > medium {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

impl DecisionPolicy {
    pub fn decide(&self, outcome: &Result<IndicatorResult, Shortfall>) -> Decision {
        match outcome {
            Ok(result) => self.decide_result(result),
            Err(shortfall) => Decision::hold_for(shortfall),
        }
    }

    pub fn decide_result(&self, result: &IndicatorResult) -> Decision {
        match result {
            IndicatorResult::Rsi(r) => {
                let signal = if r.value > self.rsi_overbought {
                    Signal::Sell
                } else if r.value < self.rsi_oversold {
                    Signal::Buy
                } else {
                    Signal::Hold
                };
                Decision::new(signal, self.rsi_confidence(r.value))
            }
            IndicatorResult::Macd(r) => Decision::new(
                r.crossover,
                tier(r.histogram().abs(), self.bands.macd_high, self.bands.macd_medium),
            ),
            IndicatorResult::MaCrossover(r) => Decision::new(
                r.signal(),
                tier(
                    r.relative_difference.abs(),
                    self.bands.ma_high,
                    self.bands.ma_medium,
                ),
            ),
        }
    }

    /// Scheduled accumulation always buys, with MEDIUM confidence.
    pub fn decide_accumulation(&self, plan: &Result<AccumulationPlan, Shortfall>) -> Decision {
        match plan {
            Ok(_) => Decision::new(Signal::Buy, Confidence::Medium),
            Err(shortfall) => Decision::hold_for(shortfall),
        }
    }

    fn rsi_confidence(&self, value: f64) -> Confidence {
        let high = self.bands.rsi_high;
        let medium = self.bands.rsi_medium;
        if value <= high || value >= 100.0 - high {
            Confidence::High
        } else if value <= medium || value >= 100.0 - medium {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Decide with the default policy.
pub fn decide(outcome: &Result<IndicatorResult, Shortfall>) -> Decision {
    DecisionPolicy::default().decide(outcome)
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "LOW"),
            Confidence::Medium => write!(f, "MEDIUM"),
            Confidence::High => write!(f, "HIGH"),
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReasonCode::NoData => write!(f, "NO_DATA"),
            ReasonCode::InsufficientData => write!(f, "INSUFFICIENT_DATA"),
            ReasonCode::InvalidParameters => write!(f, "INVALID_PARAMETERS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{MaResult, MacdPeriods, MacdResult, RsiResult};

    fn rsi(value: f64) -> IndicatorResult {
        IndicatorResult::Rsi(RsiResult {
            value,
            period: 5,
            history: vec![],
            latest_price: 1.0,
        })
    }

    fn macd(line: f64, signal: f64, crossover: Signal) -> IndicatorResult {
        IndicatorResult::Macd(MacdResult {
            macd_line: line,
            signal_line: signal,
            crossover,
            periods: MacdPeriods::default(),
            macd_history: vec![],
            signal_history: vec![],
            latest_price: 1.0,
        })
    }

    fn ma(relative_difference: f64) -> IndicatorResult {
        IndicatorResult::MaCrossover(MaResult {
            short_ma: 1.0 + relative_difference,
            long_ma: 1.0,
            relative_difference,
            threshold: 0.005,
            short_window: 3,
            long_window: 5,
            short_history: vec![],
            long_history: vec![],
            latest_price: 1.0,
        })
    }

    #[test]
    fn rsi_signal_thresholds() {
        let policy = DecisionPolicy::default();
        assert_eq!(policy.decide_result(&rsi(75.0)).signal, Signal::Sell);
        assert_eq!(policy.decide_result(&rsi(25.0)).signal, Signal::Buy);
        assert_eq!(policy.decide_result(&rsi(50.0)).signal, Signal::Hold);
        assert_eq!(policy.decide_result(&rsi(70.0)).signal, Signal::Hold);
        assert_eq!(policy.decide_result(&rsi(30.0)).signal, Signal::Hold);
    }

    #[test]
    fn rsi_confidence_bands() {
        let policy = DecisionPolicy::default();
        let conf = |v| policy.decide_result(&rsi(v)).confidence;
        assert_eq!(conf(20.0), Some(Confidence::High));
        assert_eq!(conf(80.0), Some(Confidence::High));
        assert_eq!(conf(100.0), Some(Confidence::High));
        assert_eq!(conf(35.0), Some(Confidence::Medium));
        assert_eq!(conf(65.0), Some(Confidence::Medium));
        assert_eq!(conf(50.0), Some(Confidence::Low));
    }

    #[test]
    fn macd_uses_crossover_and_histogram_bands() {
        let d = decide(&Ok(macd(0.3, 0.1, Signal::Buy)));
        assert_eq!(d, Decision::new(Signal::Buy, Confidence::High));
        let d = decide(&Ok(macd(0.1, 0.03, Signal::Hold)));
        assert_eq!(d, Decision::new(Signal::Hold, Confidence::Medium));
        let d = decide(&Ok(macd(-0.01, 0.0, Signal::Sell)));
        assert_eq!(d, Decision::new(Signal::Sell, Confidence::Low));
    }

    #[test]
    fn ma_confidence_by_relative_difference() {
        assert_eq!(
            decide(&Ok(ma(0.03))),
            Decision::new(Signal::Buy, Confidence::High)
        );
        assert_eq!(
            decide(&Ok(ma(-0.015))),
            Decision::new(Signal::Sell, Confidence::Medium)
        );
        assert_eq!(
            decide(&Ok(ma(0.001))),
            Decision::new(Signal::Hold, Confidence::Low)
        );
    }

    #[test]
    fn shortfalls_hold_with_reason() {
        let d = decide(&Err(Shortfall::NoData));
        assert_eq!(d.signal, Signal::Hold);
        assert_eq!(d.confidence, None);
        assert_eq!(d.reason, Some(ReasonCode::NoData));

        let d = decide(&Err(Shortfall::InsufficientData { have: 3, need: 14 }));
        assert_eq!(d.reason, Some(ReasonCode::InsufficientData));
    }

    #[test]
    fn display_codes() {
        assert_eq!(Signal::Buy.to_string(), "BUY");
        assert_eq!(Confidence::Medium.to_string(), "MEDIUM");
        assert_eq!(ReasonCode::InsufficientData.to_string(), "INSUFFICIENT_DATA");
    }
}
