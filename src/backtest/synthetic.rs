use crate::models::Candle;
use chrono::{Duration, NaiveDateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MarketScenario {
    /// Steady uptrend with noise
    Uptrend,
    /// Steady downtrend with noise
    Downtrend,
    /// Mean-reverting chop around the starting price
    Sideways,
    /// Large swings, ±3% per candle
    Volatile,
}

/// Generates synthetic candles for offline backtests
pub struct SyntheticDataGenerator {
    rng: StdRng,
    market: String,
    base_price: f64,
    base_volume: f64,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            market: "KRW-BTC".to_string(),
            base_price: 50_000_000.0,
            base_volume: 5.0,
        }
    }

    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = market.into();
        self
    }

    pub fn with_base_price(mut self, base_price: f64) -> Self {
        self.base_price = base_price;
        self
    }

    /// Generate `num_candles` candles, oldest first, `interval_minutes` apart
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_candles: usize,
        interval_minutes: i64,
    ) -> Vec<Candle> {
        let start_time =
            Utc::now().naive_utc() - Duration::minutes(num_candles as i64 * interval_minutes);
        let mut candles = Vec::with_capacity(num_candles);
        let mut current_price = self.base_price;

        for i in 0..num_candles {
            let time = start_time + Duration::minutes(i as i64 * interval_minutes);

            current_price += match scenario {
                MarketScenario::Uptrend => {
                    current_price * (0.002 + self.rng.gen_range(-0.004..0.004))
                }
                MarketScenario::Downtrend => {
                    current_price * (-0.002 + self.rng.gen_range(-0.004..0.004))
                }
                MarketScenario::Sideways => {
                    // 10% pull back to the starting price plus ±1% noise
                    (self.base_price - current_price) * 0.1
                        + current_price * self.rng.gen_range(-0.01..0.01)
                }
                MarketScenario::Volatile => current_price * self.rng.gen_range(-0.03..0.03),
            };

            // Prevent price from collapsing
            current_price = current_price.max(self.base_price * 0.1);

            candles.push(self.create_candle(current_price, time));
        }

        candles
    }

    /// Helper to create a candle from price and timestamp
    fn create_candle(&mut self, price: f64, time: NaiveDateTime) -> Candle {
        let noise_pct = 0.002; // ±0.2% intrabar movement

        let high = price * (1.0 + self.rng.gen_range(0.0..noise_pct));
        let low = price * (1.0 - self.rng.gen_range(0.0..noise_pct));
        let open = (price * (1.0 + self.rng.gen_range(-noise_pct..noise_pct))).clamp(low, high);
        let volume = self.base_volume * self.rng.gen_range(0.7..1.3);

        Candle {
            market: self.market.clone(),
            candle_date_time_utc: time,
            opening_price: open,
            high_price: high,
            low_price: low,
            trade_price: price,
            timestamp: time.and_utc().timestamp_millis(),
            candle_acc_trade_price: volume * price,
            candle_acc_trade_volume: volume,
        }
    }
}
