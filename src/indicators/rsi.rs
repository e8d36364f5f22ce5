/// Lookback used by the trading strategy
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Returned when there is not enough data to compute a value
pub const NEUTRAL_RSI: f64 = 50.0;

/// Calculate Relative Strength Index (RSI)
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// `prices` must be ordered oldest first. Only the first `period` price
/// changes of the series are averaged (a single simple window, no Wilder
/// smoothing), so the result depends on where the series starts.
///
/// A series shorter than `period + 1` yields [`NEUTRAL_RSI`] rather than an
/// error; callers that care must check the length themselves.
pub fn calculate_rsi(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;

    for window in prices[..=period].windows(2) {
        let change = window[1] - window[0];
        if change > 0.0 {
            gains += change;
        } else {
            losses += change.abs();
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// RSI of the most recent `period` price changes
///
/// `None` when fewer than `period + 1` prices are available.
pub fn latest_rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }
    Some(calculate_rsi(&prices[prices.len() - period - 1..], period))
}
