use super::bollinger::{calculate_bollinger_bands, BOLLINGER_PERIOD, BOLLINGER_STD_DEV};
use super::macd::{macd_series, MACD_FAST, MACD_SIGNAL, MACD_SLOW};
use super::moving_average::calculate_sma;
use super::rsi::{latest_rsi, DEFAULT_RSI_PERIOD, NEUTRAL_RSI};

/// Estimated chance (0-100) that the price keeps rising, from the latest bar
///
/// Weighted vote of five readings, each scored 0-100:
/// - RSI (30%): oversold scores high, overbought low
/// - MACD (25%): above its signal line scores high, more so while the histogram grows
/// - SMA 20/50 (20%): price above both averages with SMA20 > SMA50 scores highest
/// - Bollinger position (15%): near the lower band scores high
/// - Last five closes (10%): more up moves score higher
///
/// Readings without enough history are left out of the sum, so a short series
/// scores lower. An empty series is neutral.
pub fn uptrend_probability(prices: &[f64]) -> f64 {
    let Some(&close) = prices.last() else {
        return NEUTRAL_RSI;
    };

    let mut scores = Vec::with_capacity(5);

    if let Some(rsi) = latest_rsi(prices, DEFAULT_RSI_PERIOD) {
        let score = match rsi {
            r if r < 30.0 => 80.0,
            r if r < 40.0 => 70.0,
            r if r < 50.0 => 55.0,
            r if r < 60.0 => 50.0,
            r if r < 70.0 => 45.0,
            _ => 30.0,
        };
        scores.push(score * 0.3);
    }

    if prices.len() >= MACD_SLOW {
        let series = macd_series(prices, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        if let [.., previous, latest] = series.as_slice() {
            let score = if latest.macd > latest.signal {
                if latest.histogram > previous.histogram {
                    85.0
                } else {
                    75.0
                }
            } else if latest.histogram < previous.histogram {
                25.0
            } else {
                35.0
            };
            scores.push(score * 0.25);
        }
    }

    if let (Some(sma20), Some(sma50)) = (calculate_sma(prices, 20), calculate_sma(prices, 50)) {
        let score = if close > sma20 && close > sma50 {
            if sma20 > sma50 {
                85.0
            } else {
                65.0
            }
        } else if close > sma20 {
            60.0
        } else if close > sma50 {
            45.0
        } else {
            30.0
        };
        scores.push(score * 0.2);
    }

    if let Some(position) = calculate_bollinger_bands(prices, BOLLINGER_PERIOD, BOLLINGER_STD_DEV)
        .and_then(|bands| bands.position(close))
    {
        let score = match position {
            p if p < 0.2 => 75.0,
            p if p < 0.4 => 65.0,
            p if p < 0.6 => 50.0,
            p if p < 0.8 => 40.0,
            _ => 30.0,
        };
        scores.push(score * 0.15);
    }

    if prices.len() >= 5 {
        let up_moves = prices[prices.len() - 5..]
            .windows(2)
            .filter(|w| w[1] > w[0])
            .count();
        let score = match up_moves {
            4.. => 75.0,
            3 => 60.0,
            2 => 50.0,
            _ => 35.0,
        };
        scores.push(score * 0.1);
    }

    let total: f64 = scores.iter().sum();
    (total.clamp(0.0, 100.0) * 100.0).round() / 100.0
}
