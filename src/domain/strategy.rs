//! Investor profile -> algorithm routing and one-shot evaluation.
//!
//! | term  | risk | algorithm     |
//! |-------|------|---------------|
//! | short | high | RSI           |
//! | long  | high | MACD          |
//! | short | low  | MA crossover  |
//! | long  | low  | accumulation  |

use std::fmt;
use std::str::FromStr;

use crate::domain::accumulation::AccumulationPlan;
use crate::domain::engine_config::EngineConfig;
use crate::domain::error::Shortfall;
use crate::domain::indicator::{compute_indicator, IndicatorKind, IndicatorResult};
use crate::domain::price_series::{PriceSeries, PriceSummary};
use crate::domain::signal::Decision;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Short,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Risk {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Algorithm {
    Rsi,
    Macd,
    MaCrossover,
    Accumulation,
}

impl Algorithm {
    pub fn for_profile(term: Term, risk: Risk) -> Self {
        match (term, risk) {
            (Term::Short, Risk::High) => Algorithm::Rsi,
            (Term::Long, Risk::High) => Algorithm::Macd,
            (Term::Short, Risk::Low) => Algorithm::MaCrossover,
            (Term::Long, Risk::Low) => Algorithm::Accumulation,
        }
    }

    pub fn indicator_kind(&self) -> Option<IndicatorKind> {
        match self {
            Algorithm::Rsi => Some(IndicatorKind::Rsi),
            Algorithm::Macd => Some(IndicatorKind::Macd),
            Algorithm::MaCrossover => Some(IndicatorKind::MaCrossover),
            Algorithm::Accumulation => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EvaluationData {
    Indicator(IndicatorResult),
    Accumulation(AccumulationPlan),
    Shortfall(Shortfall),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Evaluation {
    pub algorithm: Algorithm,
    pub decision: Decision,
    pub data: EvaluationData,
    pub data_points: usize,
    /// `None` when the series is empty.
    pub price_summary: Option<PriceSummary>,
}

/// Run `algorithm` over `series` and apply the configured decision policy.
pub fn evaluate(series: &PriceSeries, algorithm: Algorithm, config: &EngineConfig) -> Evaluation {
    let policy = &config.policy;
    let (decision, data) = match algorithm.indicator_kind() {
        Some(kind) => {
            let outcome = compute_indicator(series, &config.indicator_params(kind));
            let decision = policy.decide(&outcome);
            let data = match outcome {
                Ok(result) => EvaluationData::Indicator(result),
                Err(shortfall) => EvaluationData::Shortfall(shortfall),
            };
            (decision, data)
        }
        None => {
            let plan = config.accumulation.simulate(series);
            let decision = policy.decide_accumulation(&plan);
            let data = match plan {
                Ok(plan) => EvaluationData::Accumulation(plan),
                Err(shortfall) => EvaluationData::Shortfall(shortfall),
            };
            (decision, data)
        }
    };

    Evaluation {
        algorithm,
        decision,
        data,
        data_points: series.len(),
        price_summary: series.summary(),
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Rsi => write!(f, "RSI"),
            Algorithm::Macd => write!(f, "MACD"),
            Algorithm::MaCrossover => write!(f, "MA"),
            Algorithm::Accumulation => write!(f, "DCA"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rsi" => Ok(Algorithm::Rsi),
            "macd" => Ok(Algorithm::Macd),
            "ma" | "ma-crossover" => Ok(Algorithm::MaCrossover),
            "dca" | "accumulation" => Ok(Algorithm::Accumulation),
            other => Err(format!("unknown algorithm '{other}' (expected rsi, macd, ma or dca)")),
        }
    }
}

impl FromStr for Term {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(Term::Short),
            "long" => Ok(Term::Long),
            other => Err(format!("term must be 'short' or 'long', got '{other}'")),
        }
    }
}

impl FromStr for Risk {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Risk::High),
            "low" => Ok(Risk::Low),
            other => Err(format!("risk must be 'high' or 'low', got '{other}'")),
        }
    }
}
