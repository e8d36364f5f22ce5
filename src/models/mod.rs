use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trading pair in exchange notation, e.g. `KRW-BTC`
///
/// `quote` is the pricing currency, `base` is the asset bought and sold.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Market {
    pub quote: String,
    pub base: String,
}

impl Market {
    pub fn new(quote: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            quote: quote.into(),
            base: base.into(),
        }
    }

    /// Exchange code, `QUOTE-BASE`
    pub fn code(&self) -> String {
        format!("{}-{}", self.quote, self.base)
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (quote, base) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("invalid market '{}': expected QUOTE-BASE", s))?;

        let valid =
            |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid(quote) || !valid(base) {
            return Err(format!("invalid market '{}': expected QUOTE-BASE", s));
        }

        Ok(Market::new(quote.to_ascii_uppercase(), base.to_ascii_uppercase()))
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.quote, self.base)
    }
}

/// Minute candle as returned by the exchange (newest first in responses)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub market: String,
    pub candle_date_time_utc: NaiveDateTime,
    pub opening_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub trade_price: f64,
    pub timestamp: i64,
    #[serde(default)]
    pub candle_acc_trade_price: f64,
    #[serde(default)]
    pub candle_acc_trade_volume: f64,
}

/// Latest trade for a market
#[derive(Debug, Clone, Deserialize)]
pub struct Ticker {
    pub market: String,
    pub trade_price: f64,
}

/// One currency entry of the account listing
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub currency: String,
    #[serde(deserialize_with = "decimal_string")]
    pub balance: f64,
    #[serde(default, deserialize_with = "decimal_string")]
    pub locked: f64,
}

/// Available amounts fetched at the start of every iteration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Balances {
    pub quote: f64,
    pub base: f64,
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy
    Bid,
    /// Sell
    Ask,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Market buy by total quote amount
    Price,
    /// Market sell by base volume
    Market,
}

/// Order placement parameters, serialized as the POST body
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderRequest {
    pub market: String,
    pub side: OrderSide,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub ord_type: OrderType,
}

impl OrderRequest {
    /// Market buy spending `quote_amount` of the quote currency
    pub fn market_buy(market: &Market, quote_amount: f64) -> Self {
        Self {
            market: market.code(),
            side: OrderSide::Bid,
            volume: None,
            price: Some(format_decimal(quote_amount)),
            ord_type: OrderType::Price,
        }
    }

    /// Market sell of `volume` units of the base currency
    pub fn market_sell(market: &Market, volume: f64) -> Self {
        Self {
            market: market.code(),
            side: OrderSide::Ask,
            volume: Some(format_decimal(volume)),
            price: None,
            ord_type: OrderType::Market,
        }
    }

    /// Parameters as `key=value` pairs in body order
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("market", self.market.clone())];
        params.push((
            "side",
            match self.side {
                OrderSide::Bid => "bid".to_string(),
                OrderSide::Ask => "ask".to_string(),
            },
        ));
        if let Some(volume) = &self.volume {
            params.push(("volume", volume.clone()));
        }
        if let Some(price) = &self.price {
            params.push(("price", price.clone()));
        }
        params.push((
            "ord_type",
            match self.ord_type {
                OrderType::Price => "price".to_string(),
                OrderType::Market => "market".to_string(),
            },
        ));
        params
    }
}

/// Order acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub uuid: String,
    pub side: OrderSide,
    pub ord_type: OrderType,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
    pub state: String,
    pub market: String,
    pub created_at: String,
}

/// Formats an amount without float noise or a trailing `.0`
pub fn format_decimal(value: f64) -> String {
    let formatted = format!("{:.8}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Accepts decimals encoded either as JSON strings or numbers
fn decimal_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_parsing() {
        let market: Market = "KRW-BTC".parse().unwrap();
        assert_eq!(market.quote, "KRW");
        assert_eq!(market.base, "BTC");
        assert_eq!(market.to_string(), "KRW-BTC");

        let lower: Market = "krw-eth".parse().unwrap();
        assert_eq!(lower.code(), "KRW-ETH");
    }

    #[test]
    fn test_market_parsing_rejects_garbage() {
        assert!("KRWBTC".parse::<Market>().is_err());
        assert!("KRW-".parse::<Market>().is_err());
        assert!("-BTC".parse::<Market>().is_err());
        assert!("KRW-B/TC".parse::<Market>().is_err());
    }

    #[test]
    fn test_candle_deserialization() {
        let json = r#"{
            "market": "KRW-BTC",
            "candle_date_time_utc": "2024-03-01T10:15:00",
            "candle_date_time_kst": "2024-03-01T19:15:00",
            "opening_price": 85000000.0,
            "high_price": 85100000.0,
            "low_price": 84900000.0,
            "trade_price": 85050000.0,
            "timestamp": 1709288100000,
            "candle_acc_trade_price": 1234567.8,
            "candle_acc_trade_volume": 0.5,
            "unit": 5
        }"#;

        let candle: Candle = serde_json::from_str(json).unwrap();
        assert_eq!(candle.trade_price, 85050000.0);
        assert_eq!(candle.candle_acc_trade_volume, 0.5);
        assert_eq!(candle.candle_date_time_utc.to_string(), "2024-03-01 10:15:00");
    }

    #[test]
    fn test_account_balance_from_string() {
        let json = r#"{"currency":"KRW","balance":"1000000.0","locked":"0.0","avg_buy_price":"0","avg_buy_price_modified":false,"unit_currency":"KRW"}"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.currency, "KRW");
        assert_eq!(account.balance, 1_000_000.0);
        assert_eq!(account.locked, 0.0);
    }

    #[test]
    fn test_order_request_params() {
        let market: Market = "KRW-BTC".parse().unwrap();

        let buy = OrderRequest::market_buy(&market, 5000.0);
        assert_eq!(
            buy.params(),
            vec![
                ("market", "KRW-BTC".to_string()),
                ("side", "bid".to_string()),
                ("price", "5000".to_string()),
                ("ord_type", "price".to_string()),
            ]
        );

        let sell = OrderRequest::market_sell(&market, 0.00012345);
        assert_eq!(sell.volume.as_deref(), Some("0.00012345"));
        assert_eq!(sell.ord_type, OrderType::Market);
        assert_eq!(sell.side, OrderSide::Ask);
    }

    #[test]
    fn test_order_request_body() {
        let market: Market = "KRW-BTC".parse().unwrap();
        let body = serde_json::to_value(OrderRequest::market_buy(&market, 5000.0)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "market": "KRW-BTC",
                "side": "bid",
                "price": "5000",
                "ord_type": "price"
            })
        );
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(5000.0), "5000");
        assert_eq!(format_decimal(0.1), "0.1");
        assert_eq!(format_decimal(0.0), "0");
        assert_eq!(format_decimal(1.23456789), "1.23456789");
    }
}
