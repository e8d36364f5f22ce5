use super::{closing_prices, Strategy};
use crate::indicators::{
    calculate_bollinger_bands, latest_rsi, macd_series, BOLLINGER_PERIOD, BOLLINGER_STD_DEV,
    DEFAULT_RSI_PERIOD, MACD_FAST, MACD_SIGNAL, MACD_SLOW,
};
use crate::models::{Candle, Signal};

/// RSI + MACD + Bollinger Bands strategy
///
/// Buy conditions (ANY triggers):
/// - RSI below `oversold` while the MACD line crosses above its signal line
/// - Close drops below the lower band, having been at or above it on the previous bar
///
/// Sell conditions (ANY triggers):
/// - RSI above `overbought` while the MACD line crosses below its signal line
/// - Close is above the upper band
///
/// BUY is checked before SELL.
#[derive(Debug, Clone)]
pub struct ConfluenceStrategy {
    config: ConfluenceConfig,
}

#[derive(Debug, Clone)]
pub struct ConfluenceConfig {
    pub rsi_period: usize,
    pub oversold: f64,
    pub overbought: f64,

    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,

    pub bb_period: usize,
    /// Band distance from the middle, in standard deviations
    pub bb_std_dev: f64,
}

impl Default for ConfluenceConfig {
    fn default() -> Self {
        Self {
            rsi_period: DEFAULT_RSI_PERIOD,
            oversold: 30.0,
            overbought: 70.0,
            macd_fast: MACD_FAST,
            macd_slow: MACD_SLOW,
            macd_signal: MACD_SIGNAL,
            bb_period: BOLLINGER_PERIOD,
            bb_std_dev: BOLLINGER_STD_DEV,
        }
    }
}

impl ConfluenceStrategy {
    pub fn new(config: ConfluenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConfluenceConfig {
        &self.config
    }
}

impl Default for ConfluenceStrategy {
    fn default() -> Self {
        Self::new(ConfluenceConfig::default())
    }
}

/// Line A moved from at-or-below line B to strictly above it
fn crossed_above(previous: (f64, f64), latest: (f64, f64)) -> bool {
    previous.0 <= previous.1 && latest.0 > latest.1
}

/// Line A moved from at-or-above line B to strictly below it
fn crossed_below(previous: (f64, f64), latest: (f64, f64)) -> bool {
    previous.0 >= previous.1 && latest.0 < latest.1
}

impl Strategy for ConfluenceStrategy {
    fn generate_signal(&self, candles: &[Candle]) -> Signal {
        if candles.len() < self.min_candles_required() {
            return Signal::Hold;
        }

        let cfg = &self.config;
        let prices = closing_prices(candles);
        let close = prices[prices.len() - 1];
        let previous_close = prices[prices.len() - 2];

        let macd = macd_series(&prices, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal);
        let (Some(rsi), [.., previous_macd, latest_macd]) =
            (latest_rsi(&prices, cfg.rsi_period), macd.as_slice())
        else {
            return Signal::Hold;
        };
        let (Some(bands), Some(previous_bands)) = (
            calculate_bollinger_bands(&prices, cfg.bb_period, cfg.bb_std_dev),
            calculate_bollinger_bands(&prices[..prices.len() - 1], cfg.bb_period, cfg.bb_std_dev),
        ) else {
            return Signal::Hold;
        };

        let previous = (previous_macd.macd, previous_macd.signal);
        let latest = (latest_macd.macd, latest_macd.signal);
        let golden_cross = crossed_above(previous, latest);
        let dead_cross = crossed_below(previous, latest);
        let broke_lower = close < bands.lower && previous_close >= previous_bands.lower;
        let above_upper = close > bands.upper;

        tracing::debug!(
            "Confluence check: rsi={:.1}, macd={:.4}, macd_signal={:.4}, close={:.0}, bb=[{:.0}, {:.0}]",
            rsi,
            latest_macd.macd,
            latest_macd.signal,
            close,
            bands.lower,
            bands.upper
        );

        if (rsi < cfg.oversold && golden_cross) || broke_lower {
            tracing::info!(
                "🔵 Buy signal (RSI {:.2}, golden cross {}, lower band break {})",
                rsi,
                golden_cross,
                broke_lower
            );
            Signal::Buy
        } else if (rsi > cfg.overbought && dead_cross) || above_upper {
            tracing::info!(
                "🔴 Sell signal (RSI {:.2}, dead cross {}, above upper band {})",
                rsi,
                dead_cross,
                above_upper
            );
            Signal::Sell
        } else {
            Signal::Hold
        }
    }

    fn name(&self) -> &str {
        "Confluence"
    }

    fn min_candles_required(&self) -> usize {
        let cfg = &self.config;
        (cfg.macd_slow + cfg.macd_signal)
            .max(cfg.bb_period + 1)
            .max(cfg.rsi_period + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn candles_from_prices(prices: &[f64]) -> Vec<Candle> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        prices
            .iter()
            .enumerate()
            .rev()
            .map(|(i, &price)| {
                let time = start + Duration::hours(i as i64);
                Candle {
                    market: "KRW-BTC".to_string(),
                    candle_date_time_utc: time,
                    opening_price: price,
                    high_price: price,
                    low_price: price,
                    trade_price: price,
                    timestamp: time.and_utc().timestamp_millis(),
                    candle_acc_trade_price: 0.0,
                    candle_acc_trade_volume: 1.0,
                }
            })
            .collect()
    }

    /// 100, 101, 100, ... then `last`
    fn choppy_then(last: f64) -> Vec<f64> {
        let mut prices: Vec<f64> = (0..39).map(|i| 100.0 + (i % 2) as f64).collect();
        prices.push(last);
        prices
    }

    #[test]
    fn test_requires_minimum_candles() {
        let strategy = ConfluenceStrategy::default();
        assert_eq!(strategy.min_candles_required(), 35);

        let candles = candles_from_prices(&choppy_then(90.0)[..34]);
        assert_eq!(strategy.generate_signal(&candles), Signal::Hold);
    }

    #[test]
    fn test_buy_on_lower_band_break() {
        // Previous bar sat inside the bands, the crash lands below the lower one
        let candles = candles_from_prices(&choppy_then(90.0));
        assert_eq!(
            ConfluenceStrategy::default().generate_signal(&candles),
            Signal::Buy
        );
    }

    #[test]
    fn test_sell_above_upper_band() {
        let candles = candles_from_prices(&choppy_then(110.0));
        assert_eq!(
            ConfluenceStrategy::default().generate_signal(&candles),
            Signal::Sell
        );
    }

    #[test]
    fn test_flat_market_holds() {
        let candles = candles_from_prices(&[100.0; 40]);
        assert_eq!(
            ConfluenceStrategy::default().generate_signal(&candles),
            Signal::Hold
        );
    }

    #[test]
    fn test_staying_below_lower_band_is_not_a_new_break() {
        // Two crashes in a row: the second bar was already under its band
        let mut prices = choppy_then(90.0);
        prices.push(80.0);
        let candles = candles_from_prices(&prices);
        assert_ne!(
            ConfluenceStrategy::default().generate_signal(&candles),
            Signal::Buy
        );
    }

    #[test]
    fn test_cross_detection() {
        assert!(crossed_above((-1.0, 0.0), (1.0, 0.0)));
        assert!(crossed_above((0.0, 0.0), (0.5, 0.0)));
        assert!(!crossed_above((1.0, 0.0), (2.0, 0.0)));

        assert!(crossed_below((1.0, 0.0), (-1.0, 0.0)));
        assert!(!crossed_below((-1.0, 0.0), (-2.0, 0.0)));
    }
}
