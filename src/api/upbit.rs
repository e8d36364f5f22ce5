use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use super::auth::{query_string, Credentials};
use super::retry::RetryPolicy;
use super::{Exchange, ExchangeResult};
use crate::config::BotConfig;
use crate::error::ExchangeError;
use crate::models::{Account, Balances, Candle, Market, Order, OrderRequest, Ticker};

// Exchange API allows 8 requests per second per key
const RATE_LIMIT_PER_SECOND: u32 = 8;

type UpbitRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    name: serde_json::Value,
    #[serde(default)]
    message: String,
}

/// Upbit REST client
///
/// Cloneable; all clones share the rate limiter. GET requests are retried on
/// transient failures, orders are sent exactly once.
#[derive(Clone)]
pub struct UpbitClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
    rate_limiter: Arc<UpbitRateLimiter>,
    retry: RetryPolicy,
}

impl UpbitClient {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Option<Credentials>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> ExchangeResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExchangeError::Transport(format!("failed to build HTTP client: {}", e)))?;

        let quota = Quota::per_second(
            NonZeroU32::new(RATE_LIMIT_PER_SECOND).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            retry,
        })
    }

    /// Client built from bot settings; credentials are optional for public data
    pub fn from_config(config: &BotConfig) -> ExchangeResult<Self> {
        let credentials = match (&config.access_key, &config.secret_key) {
            (Some(access), Some(secret)) if config.has_credentials() => {
                Some(Credentials::new(access.clone(), secret.clone()))
            }
            _ => None,
        };

        Self::new(
            config.api_url.clone(),
            credentials,
            config.request_timeout(),
            config.retry_policy(),
        )
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// `GET /v1/ticker`
    pub async fn ticker(&self, market: &Market) -> ExchangeResult<Ticker> {
        let code = market.code();
        let tickers: Vec<Ticker> = self
            .retry
            .run("ticker", || {
                let request = self
                    .client
                    .get(format!("{}/v1/ticker", self.base_url))
                    .query(&[("markets", code.as_str())]);
                self.execute(request)
            })
            .await?;

        tickers
            .into_iter()
            .find(|t| t.market == code)
            .ok_or_else(|| ExchangeError::Decode(format!("no ticker returned for {}", code)))
    }

    /// `GET /v1/candles/minutes/{unit}`, newest candle first
    pub async fn minute_candles(
        &self,
        market: &Market,
        unit: u32,
        count: u32,
    ) -> ExchangeResult<Vec<Candle>> {
        let code = market.code();
        let count = count.to_string();
        self.retry
            .run("candles", || {
                let request = self
                    .client
                    .get(format!("{}/v1/candles/minutes/{}", self.base_url, unit))
                    .query(&[("market", code.as_str()), ("count", count.as_str())]);
                self.execute(request)
            })
            .await
    }

    /// `GET /v1/accounts`
    pub async fn accounts(&self) -> ExchangeResult<Vec<Account>> {
        let credentials = self.credentials()?;
        self.retry
            .run("accounts", move || async move {
                let request = self
                    .client
                    .get(format!("{}/v1/accounts", self.base_url))
                    .header(reqwest::header::AUTHORIZATION, credentials.authorization(None)?);
                self.execute(request).await
            })
            .await
    }

    /// `POST /v1/orders`
    pub async fn place_order(&self, order: &OrderRequest) -> ExchangeResult<Order> {
        let credentials = self.credentials()?;
        let query = query_string(&order.params());

        let request = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .header(
                reqwest::header::AUTHORIZATION,
                credentials.authorization(Some(&query))?,
            )
            .json(order);

        self.execute(request).await
    }

    fn credentials(&self) -> ExchangeResult<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            ExchangeError::Auth(
                "UPBIT_OPEN_API_ACCESS_KEY and UPBIT_OPEN_API_SECRET_KEY must be set".to_string(),
            )
        })
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ExchangeResult<T> {
        self.rate_limiter.until_ready().await;

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        if status.as_u16() == 429 {
            return Err(ExchangeError::RateLimited);
        }

        let (name, message) = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(ErrorResponse { error }) => {
                let name = match error.name {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => "unknown".to_string(),
                    other => other.to_string(),
                };
                (name, error.message)
            }
            Err(_) => ("unknown".to_string(), body),
        };

        Err(ExchangeError::Api {
            status: status.as_u16(),
            name,
            message,
        })
    }
}

#[async_trait]
impl Exchange for UpbitClient {
    async fn current_price(&self, market: &Market) -> ExchangeResult<f64> {
        Ok(self.ticker(market).await?.trade_price)
    }

    async fn candles(&self, market: &Market, unit: u32, count: u32) -> ExchangeResult<Vec<Candle>> {
        self.minute_candles(market, unit, count).await
    }

    async fn balance(&self, currency: &str) -> ExchangeResult<f64> {
        let accounts = self.accounts().await?;
        Ok(find_balance(&accounts, currency))
    }

    async fn balances(&self, market: &Market) -> ExchangeResult<Balances> {
        let accounts = self.accounts().await?;
        Ok(Balances {
            quote: find_balance(&accounts, &market.quote),
            base: find_balance(&accounts, &market.base),
        })
    }

    async fn buy_market(&self, market: &Market, quote_amount: f64) -> ExchangeResult<Order> {
        self.place_order(&OrderRequest::market_buy(market, quote_amount))
            .await
    }

    async fn sell_market(&self, market: &Market, volume: f64) -> ExchangeResult<Order> {
        self.place_order(&OrderRequest::market_sell(market, volume))
            .await
    }
}

/// Available balance of `currency`; absent accounts count as zero
pub fn find_balance(accounts: &[Account], currency: &str) -> f64 {
    accounts
        .iter()
        .find(|a| a.currency.eq_ignore_ascii_case(currency))
        .map(|a| a.balance)
        .unwrap_or(0.0)
}
