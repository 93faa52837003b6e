//! Core backtesting logic. Everything here is pure: market data comes in
//! through the broker port and results leave as plain values.

pub mod account;
pub mod analyzer;
pub mod error;
pub mod indicator;
pub mod ohlcv;
pub mod position;
pub mod simulation;
pub mod strategy;
pub mod trigger;
