use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::api::RetryPolicy;
use crate::models::Market;

pub const DEFAULT_API_URL: &str = "https://api.upbit.com";

/// Minute-candle sizes the exchange serves
pub const CANDLE_UNITS: &[u32] = &[1, 3, 5, 10, 15, 30, 60, 240];

/// Maximum candles returned per request
pub const MAX_CANDLE_COUNT: u32 = 200;

/// Headroom on top of the retry budget for rate-limiter waits
const CALL_TIMEOUT_SLACK: Duration = Duration::from_secs(1);

/// Bot settings, read once at startup from the environment
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub market: String,
    /// Quote currency spent per buy
    pub trade_amount: f64,
    /// Poll interval in milliseconds
    pub check_interval: u64,

    #[serde(rename = "upbit_open_api_access_key")]
    pub access_key: Option<String>,
    #[serde(rename = "upbit_open_api_secret_key")]
    pub secret_key: Option<String>,
    #[serde(rename = "upbit_api_url")]
    pub api_url: String,

    pub candle_unit: u32,
    pub candle_count: u32,

    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,

    pub request_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,

    pub dry_run: bool,
}

impl BotConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(config::Environment::default())
    }

    /// Load from an explicit variable map instead of the process environment
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(config::Environment::default().source(Some(vars)))
    }

    fn load(env: config::Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("market", "KRW-BTC")?
            .set_default("trade_amount", 5000.0)?
            .set_default("check_interval", 60_000)?
            .set_default("upbit_api_url", DEFAULT_API_URL)?
            .set_default("candle_unit", 5)?
            .set_default("candle_count", 200)?
            .set_default("rsi_period", 14)?
            .set_default("rsi_oversold", 30.0)?
            .set_default("rsi_overbought", 70.0)?
            .set_default("request_timeout_ms", 10_000)?
            .set_default("max_retries", 3)?
            .set_default("retry_backoff_ms", 1_000)?
            .set_default("dry_run", false)?
            .add_source(env.try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        let config: BotConfig = settings
            .try_deserialize()
            .context("Invalid configuration value")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.market()?;

        if !(self.trade_amount > 0.0) {
            bail!("TRADE_AMOUNT must be positive, got {}", self.trade_amount);
        }
        if self.check_interval == 0 {
            bail!("CHECK_INTERVAL must be at least 1 ms");
        }
        if !CANDLE_UNITS.contains(&self.candle_unit) {
            bail!(
                "CANDLE_UNIT must be one of {:?}, got {}",
                CANDLE_UNITS,
                self.candle_unit
            );
        }
        if self.candle_count == 0 || self.candle_count > MAX_CANDLE_COUNT {
            bail!(
                "CANDLE_COUNT must be between 1 and {}, got {}",
                MAX_CANDLE_COUNT,
                self.candle_count
            );
        }
        if self.rsi_period == 0 {
            bail!("RSI_PERIOD must be positive");
        }
        if !(self.rsi_oversold < self.rsi_overbought) {
            bail!(
                "RSI_OVERSOLD ({}) must be below RSI_OVERBOUGHT ({})",
                self.rsi_oversold,
                self.rsi_overbought
            );
        }
        if self.max_retries == 0 {
            bail!("MAX_RETRIES must be at least 1");
        }
        Ok(())
    }

    pub fn market(&self) -> Result<Market> {
        self.market
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.check_interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_backoff())
    }

    /// Bound on one exchange call made by the trading loop
    ///
    /// Wide enough for every retry attempt to use its full request timeout,
    /// so the client gets to retry before the loop gives up on the call.
    pub fn call_timeout(&self) -> Duration {
        self.retry_policy().worst_case(self.request_timeout()) + CALL_TIMEOUT_SLACK
    }

    pub fn has_credentials(&self) -> bool {
        matches!(
            (&self.access_key, &self.secret_key),
            (Some(a), Some(s)) if !a.is_empty() && !s.is_empty()
        )
    }
}
