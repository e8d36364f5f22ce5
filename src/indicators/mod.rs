// Technical indicators module
// Implements RSI, moving averages, MACD and Bollinger Bands over oldest-first price series

pub mod bollinger;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod trend;

pub use bollinger::{calculate_bollinger_bands, BollingerBands, BOLLINGER_PERIOD, BOLLINGER_STD_DEV};
pub use macd::{calculate_macd, macd_series, MacdPoint, MACD_FAST, MACD_SIGNAL, MACD_SLOW};
pub use moving_average::{calculate_ema, calculate_sma, ema_series};
pub use rsi::{calculate_rsi, latest_rsi, DEFAULT_RSI_PERIOD, NEUTRAL_RSI};
pub use trend::uptrend_probability;
