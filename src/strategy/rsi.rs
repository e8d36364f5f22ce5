use super::{closing_prices, Strategy};
use crate::indicators::{calculate_rsi, DEFAULT_RSI_PERIOD};
use crate::models::{Candle, Signal};

/// RSI computed for one set of candles, with the signal it implies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiReading {
    pub value: f64,
    pub signal: Signal,
    /// False when the series was too short and `value` is the neutral default
    pub sufficient_data: bool,
}

/// Oversold/overbought RSI strategy
///
/// Buys below `oversold`, sells above `overbought`, holds otherwise.
#[derive(Debug, Clone)]
pub struct RsiStrategy {
    period: usize,
    oversold: f64,
    overbought: f64,
}

impl RsiStrategy {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        Self {
            period,
            oversold,
            overbought,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn oversold(&self) -> f64 {
        self.oversold
    }

    pub fn overbought(&self) -> f64 {
        self.overbought
    }

    /// RSI of the candles' closing prices
    pub fn rsi(&self, candles: &[Candle]) -> f64 {
        calculate_rsi(&closing_prices(candles), self.period)
    }

    /// Map an RSI value to a signal; BUY is checked before SELL
    pub fn decide(&self, rsi: f64) -> Signal {
        if rsi < self.oversold {
            Signal::Buy
        } else if rsi > self.overbought {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }

    /// Compute the RSI once and derive the signal from it
    pub fn evaluate(&self, candles: &[Candle]) -> RsiReading {
        let value = self.rsi(candles);
        RsiReading {
            value,
            signal: self.decide(value),
            sufficient_data: candles.len() > self.period,
        }
    }

    /// True iff RSI is below the oversold threshold
    pub fn should_buy(&self, candles: &[Candle]) -> bool {
        let rsi = self.rsi(candles);
        tracing::debug!(rsi = %format!("{:.2}", rsi), "📊 RSI");

        if rsi < self.oversold {
            tracing::info!("🔵 Buy signal (RSI {:.2} < {})", rsi, self.oversold);
            return true;
        }
        false
    }

    /// True iff RSI is above the overbought threshold
    pub fn should_sell(&self, candles: &[Candle]) -> bool {
        let rsi = self.rsi(candles);
        tracing::debug!(rsi = %format!("{:.2}", rsi), "📊 RSI");

        if rsi > self.overbought {
            tracing::info!("🔴 Sell signal (RSI {:.2} > {})", rsi, self.overbought);
            return true;
        }
        false
    }
}

impl Default for RsiStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_RSI_PERIOD, 30.0, 70.0)
    }
}

impl Strategy for RsiStrategy {
    fn generate_signal(&self, candles: &[Candle]) -> Signal {
        self.evaluate(candles).signal
    }

    fn name(&self) -> &str {
        "RSI"
    }

    fn min_candles_required(&self) -> usize {
        self.period + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    /// Build candles in exchange order (newest first) from oldest-first prices
    fn candles_from_prices(prices: &[f64]) -> Vec<Candle> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let mut candles: Vec<Candle> = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| {
                let time = start + Duration::minutes(5 * i as i64);
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
            .collect();
        candles.reverse();
        candles
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + 2.0 * i as f64).collect()
    }

    fn falling(n: usize) -> Vec<f64> {
        (0..n).map(|i| 200.0 - 2.0 * i as f64).collect()
    }

    #[test]
    fn test_rising_market_sells() {
        // 100, 102, 104, ... delivered newest first
        let candles = candles_from_prices(&rising(15));
        let strategy = RsiStrategy::default();

        assert_eq!(strategy.rsi(&candles), 100.0);
        assert!(strategy.should_sell(&candles));
        assert!(!strategy.should_buy(&candles));
        assert_eq!(strategy.generate_signal(&candles), Signal::Sell);
    }

    #[test]
    fn test_falling_market_buys() {
        let candles = candles_from_prices(&falling(20));
        let strategy = RsiStrategy::default();

        assert_eq!(strategy.rsi(&candles), 0.0);
        assert!(strategy.should_buy(&candles));
        assert!(!strategy.should_sell(&candles));
    }

    #[test]
    fn test_closing_prices_are_oldest_first() {
        let candles = candles_from_prices(&[1.0, 2.0, 3.0]);
        assert_eq!(candles[0].trade_price, 3.0);
        assert_eq!(closing_prices(&candles), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_insufficient_candles_hold() {
        let candles = candles_from_prices(&rising(10));
        let strategy = RsiStrategy::default();

        let reading = strategy.evaluate(&candles);
        assert_eq!(reading.value, 50.0);
        assert_eq!(reading.signal, Signal::Hold);
        assert!(!reading.sufficient_data);
    }

    #[test]
    fn test_decide_thresholds() {
        let strategy = RsiStrategy::default();

        assert_eq!(strategy.decide(29.99), Signal::Buy);
        assert_eq!(strategy.decide(30.0), Signal::Hold);
        assert_eq!(strategy.decide(50.0), Signal::Hold);
        assert_eq!(strategy.decide(70.0), Signal::Hold);
        assert_eq!(strategy.decide(70.01), Signal::Sell);
    }

    #[test]
    fn test_buy_and_sell_never_both_true() {
        let strategy = RsiStrategy::default();
        let series = vec![
            rising(30),
            falling(30),
            vec![100.0; 20],
            (0..40)
                .map(|i| 100.0 + if i % 3 == 0 { 5.0 } else { -1.0 } * i as f64)
                .collect(),
        ];

        for prices in series {
            let candles = candles_from_prices(&prices);
            assert!(!(strategy.should_buy(&candles) && strategy.should_sell(&candles)));
        }
    }

    #[test]
    fn test_evaluate_matches_predicates() {
        let strategy = RsiStrategy::new(5, 40.0, 60.0);
        let candles = candles_from_prices(&[10.0, 9.0, 8.5, 9.0, 8.0, 7.0, 7.5]);

        let reading = strategy.evaluate(&candles);
        assert!(reading.sufficient_data);
        assert_eq!(reading.signal == Signal::Buy, strategy.should_buy(&candles));
        assert_eq!(reading.signal == Signal::Sell, strategy.should_sell(&candles));
    }
}
