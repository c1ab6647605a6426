//! Core domain types and logic.

pub mod error;
pub mod price_series;
pub mod normalizer;
pub mod indicator;
pub mod signal;
pub mod accumulation;
pub mod portfolio;
pub mod rebalance;
pub mod shared;
pub mod strategy;
pub mod engine_config;
