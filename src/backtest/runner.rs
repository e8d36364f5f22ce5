use crate::backtest::metrics::{BacktestMetrics, TradeRecord};
use crate::indicators::uptrend_probability;
use crate::models::{Candle, OrderSide, Signal};
use crate::strategy::Strategy;
use crate::Result;

/// Replays a strategy over historical candles, long-only and all-in
pub struct BacktestRunner {
    initial_capital: f64,
}

impl BacktestRunner {
    /// Create a new backtest runner
    pub fn new(initial_capital: f64) -> Self {
        Self { initial_capital }
    }

    /// Run a backtest with given strategy and candles
    ///
    /// # Arguments
    /// * `strategy` - The trading strategy to test
    /// * `candles` - Historical candle data, oldest first
    /// * `lookback` - How many candles the strategy sees at each step, as the
    ///   live bot would fetch them
    ///
    /// # Returns
    /// BacktestMetrics with performance data
    pub fn run<S: Strategy + ?Sized>(
        &self,
        strategy: &S,
        candles: &[Candle],
        lookback: usize,
    ) -> Result<BacktestMetrics> {
        let samples_needed = strategy.min_candles_required();

        if candles.len() < samples_needed {
            return Err(format!(
                "Not enough candles for backtest. Need {}, got {}",
                samples_needed,
                candles.len()
            )
            .into());
        }
        if lookback < samples_needed {
            return Err(format!(
                "Lookback of {} is shorter than the {} candles {} needs",
                lookback,
                samples_needed,
                strategy.name()
            )
            .into());
        }

        tracing::info!(
            "Starting backtest: {} candles, {} strategy, lookback {}",
            candles.len(),
            strategy.name(),
            lookback
        );

        let mut capital = self.initial_capital;
        let mut holdings = 0.0;
        let mut trades = Vec::new();

        for i in (samples_needed - 1)..candles.len() {
            let start = (i + 1).saturating_sub(lookback);
            // Strategy expects exchange order, newest first
            let window: Vec<Candle> = candles[start..=i].iter().rev().cloned().collect();
            let candle = &candles[i];
            let price = candle.trade_price;

            match strategy.generate_signal(&window) {
                Signal::Buy if holdings == 0.0 && capital > 0.0 => {
                    holdings = capital / price;
                    trades.push(TradeRecord {
                        time: candle.candle_date_time_utc,
                        side: OrderSide::Bid,
                        price,
                        amount: holdings,
                        capital: 0.0,
                        holdings,
                        total_value: holdings * price,
                    });
                    capital = 0.0;
                }
                Signal::Sell if holdings > 0.0 => {
                    trades.push(Self::sell_all(candle, &mut capital, &mut holdings));
                }
                _ => {}
            }
        }

        // Close any position still open at the last price
        if holdings > 0.0 {
            if let Some(last) = candles.last() {
                trades.push(Self::sell_all(last, &mut capital, &mut holdings));
            }
        }

        let first_close = candles.first().map(|c| c.trade_price).unwrap_or(0.0);
        let last_close = candles.last().map(|c| c.trade_price).unwrap_or(0.0);

        let mut metrics =
            BacktestMetrics::from_trades(trades, self.initial_capital, first_close, last_close);
        let closes: Vec<f64> = candles.iter().map(|c| c.trade_price).collect();
        metrics.uptrend_probability = uptrend_probability(&closes);

        tracing::info!(
            "Backtest complete: {} trades, {:+.2}% return",
            metrics.total_trades,
            metrics.total_return_pct
        );

        Ok(metrics)
    }

    fn sell_all(candle: &Candle, capital: &mut f64, holdings: &mut f64) -> TradeRecord {
        let price = candle.trade_price;
        let amount = *holdings;
        *capital += amount * price;
        *holdings = 0.0;

        TradeRecord {
            time: candle.candle_date_time_utc,
            side: OrderSide::Ask,
            price,
            amount,
            capital: *capital,
            holdings: 0.0,
            total_value: *capital,
        }
    }
}
