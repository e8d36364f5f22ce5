pub mod auth;
pub mod retry;
pub mod upbit;

pub use auth::Credentials;
pub use retry::RetryPolicy;
pub use upbit::UpbitClient;

use async_trait::async_trait;

use crate::error::ExchangeError;
use crate::models::{Balances, Candle, Market, Order};

pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;

/// Market data and order placement against a spot exchange
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Last trade price for the market
    async fn current_price(&self, market: &Market) -> ExchangeResult<f64>;

    /// Most recent `count` candles of `unit` minutes, newest first
    async fn candles(&self, market: &Market, unit: u32, count: u32) -> ExchangeResult<Vec<Candle>>;

    /// Available balance of a currency, zero when the account holds none
    async fn balance(&self, currency: &str) -> ExchangeResult<f64>;

    /// Quote and base balances for a market
    async fn balances(&self, market: &Market) -> ExchangeResult<Balances> {
        let quote = self.balance(&market.quote).await?;
        let base = self.balance(&market.base).await?;
        Ok(Balances { quote, base })
    }

    /// Market buy spending `quote_amount` of the quote currency
    async fn buy_market(&self, market: &Market, quote_amount: f64) -> ExchangeResult<Order>;

    /// Market sell of `volume` units of the base currency
    async fn sell_market(&self, market: &Market, volume: f64) -> ExchangeResult<Order>;
}
