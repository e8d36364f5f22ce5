use super::moving_average::ema_series;

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// One MACD sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    /// Fast EMA minus slow EMA
    pub macd: f64,
    /// EMA of the MACD line
    pub signal: f64,
    pub histogram: f64,
}

/// MACD line, signal line and histogram at every point of an oldest-first series
pub fn macd_series(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<MacdPoint> {
    let fast_ema = ema_series(prices, fast);
    let slow_ema = ema_series(prices, slow);
    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_series(&macd, signal);

    macd.iter()
        .zip(signal_line)
        .map(|(&macd, signal)| MacdPoint {
            macd,
            signal,
            histogram: macd - signal,
        })
        .collect()
}

/// Latest MACD sample; `None` until the slow EMA has `slow` prices behind it
pub fn calculate_macd(
    prices: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Option<MacdPoint> {
    if slow == 0 || prices.len() < slow {
        return None;
    }
    macd_series(prices, fast, slow, signal).last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_prices_have_zero_macd() {
        let point = calculate_macd(&[100.0; 40], MACD_FAST, MACD_SLOW, MACD_SIGNAL).unwrap();
        assert_eq!(point.macd, 0.0);
        assert_eq!(point.signal, 0.0);
        assert_eq!(point.histogram, 0.0);
    }

    #[test]
    fn test_uptrend_has_positive_macd() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let point = calculate_macd(&prices, MACD_FAST, MACD_SLOW, MACD_SIGNAL).unwrap();

        // Fast EMA sits above the slow one, and the gap is still widening
        assert!(point.macd > 0.0);
        assert!(point.macd > point.signal);
        assert!(point.histogram > 0.0);
    }

    #[test]
    fn test_series_has_one_point_per_price() {
        let prices: Vec<f64> = (0..30).map(|i| (i as f64).sin()).collect();
        let series = macd_series(&prices, 3, 6, 4);

        assert_eq!(series.len(), prices.len());
        assert_eq!(series[0].macd, 0.0);
        for point in &series {
            assert!((point.histogram - (point.macd - point.signal)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_insufficient_data() {
        assert!(calculate_macd(&[1.0; 25], MACD_FAST, MACD_SLOW, MACD_SIGNAL).is_none());
    }
}
