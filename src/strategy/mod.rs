// Trading strategy module
pub mod confluence;
pub mod rsi;

pub use confluence::{ConfluenceConfig, ConfluenceStrategy};
pub use rsi::{RsiReading, RsiStrategy};

use crate::models::{Candle, Signal};

/// Base trait for all trading strategies
pub trait Strategy: Send + Sync {
    /// Generate a trading signal from candles in exchange order (newest first)
    fn generate_signal(&self, candles: &[Candle]) -> Signal;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum candles required for this strategy
    fn min_candles_required(&self) -> usize;
}

/// Closing prices oldest first, from candles delivered newest first
pub fn closing_prices(candles: &[Candle]) -> Vec<f64> {
    candles.iter().rev().map(|c| c.trade_price).collect()
}
