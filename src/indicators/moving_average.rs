/// Calculate Simple Moving Average (SMA) over the most recent `period` prices
///
/// `prices` is ordered oldest first.
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let sum: f64 = prices.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Calculate Exponential Moving Average (EMA) of the latest price
///
/// Needs at least `period` prices. See [`ema_series`] for the recurrence.
pub fn calculate_ema(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    ema_series(prices, period).last().copied()
}

/// EMA at every point of an oldest-first series
///
/// Seeded with the first price, then `ema = (price - ema) * k + ema` with
/// `k = 2 / (period + 1)`, so the output has one value per input price.
pub fn ema_series(prices: &[f64], period: usize) -> Vec<f64> {
    let multiplier = 2.0 / (period as f64 + 1.0);

    let mut series = Vec::with_capacity(prices.len());
    let mut iter = prices.iter();
    if let Some(&first) = iter.next() {
        let mut ema = first;
        series.push(ema);
        for price in iter {
            ema = (price - ema) * multiplier + ema;
            series.push(ema);
        }
    }
    series
}
