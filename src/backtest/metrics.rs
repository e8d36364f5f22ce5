use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::OrderSide;

/// One simulated fill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub time: NaiveDateTime,
    pub side: OrderSide,
    pub price: f64,
    /// Base units bought or sold
    pub amount: f64,
    /// Quote cash after the fill
    pub capital: f64,
    /// Base units held after the fill
    pub holdings: f64,
    /// Cash plus holdings marked at `price`
    pub total_value: f64,
}

/// Complete backtest performance metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return_pct: f64,
    pub buy_and_hold_return_pct: f64,

    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,

    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,

    /// Uptrend probability (0-100) at the last candle
    pub uptrend_probability: f64,

    pub trades: Vec<TradeRecord>,
}

impl BacktestMetrics {
    /// Calculate metrics from the fill log
    ///
    /// `first_close`/`last_close` bound the buy & hold comparison.
    pub fn from_trades(
        trades: Vec<TradeRecord>,
        initial_capital: f64,
        first_close: f64,
        last_close: f64,
    ) -> Self {
        let buy_and_hold_return_pct = if first_close > 0.0 {
            (last_close - first_close) / first_close * 100.0
        } else {
            0.0
        };

        let final_value = trades
            .last()
            .map(|t| t.total_value)
            .unwrap_or(initial_capital);
        let total_return_pct = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        // Pair the n-th buy with the n-th sell
        let buys = trades.iter().filter(|t| t.side == OrderSide::Bid);
        let sells = trades.iter().filter(|t| t.side == OrderSide::Ask);
        let (winning_trades, losing_trades) =
            buys.zip(sells)
                .fold((0, 0), |(wins, losses), (buy, sell)| {
                    if sell.price > buy.price {
                        (wins + 1, losses)
                    } else {
                        (wins, losses + 1)
                    }
                });
        let win_rate = if winning_trades + losing_trades > 0 {
            winning_trades as f64 / (winning_trades + losing_trades) as f64 * 100.0
        } else {
            0.0
        };

        let values: Vec<f64> = trades.iter().map(|t| t.total_value).collect();

        Self {
            initial_capital,
            final_value,
            total_return_pct,
            buy_and_hold_return_pct,
            total_trades: trades.len(),
            winning_trades,
            losing_trades,
            win_rate,
            max_drawdown_pct: Self::calculate_max_drawdown_pct(&values),
            sharpe_ratio: Self::calculate_sharpe_ratio(&values),
            uptrend_probability: 50.0,
            trades,
        }
    }

    /// Largest peak-to-trough decline of the post-trade portfolio values, in percent
    fn calculate_max_drawdown_pct(values: &[f64]) -> f64 {
        let Some(&first) = values.first() else {
            return 0.0;
        };

        let mut peak = first;
        let mut max_dd = 0.0;
        for &value in values {
            if value > peak {
                peak = value;
            }
            if peak > 0.0 {
                let dd = (peak - value) / peak * 100.0;
                if dd > max_dd {
                    max_dd = dd;
                }
            }
        }
        max_dd
    }

    /// Calculate Sharpe ratio (simplified)
    /// Trade-to-trade returns, annualised with √252, risk-free rate of 0
    fn calculate_sharpe_ratio(values: &[f64]) -> f64 {
        let returns: Vec<f64> = values
            .windows(2)
            .filter(|w| w[0] != 0.0)
            .map(|w| (w[1] - w[0]) / w[0])
            .collect();

        if returns.len() < 2 {
            return 0.0;
        }

        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        // Sample standard deviation
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
            / (returns.len() - 1) as f64;
        let std_dev = variance.sqrt();

        if std_dev > 0.0 {
            mean / std_dev * 252f64.sqrt()
        } else {
            0.0
        }
    }

    /// Print a formatted report to stdout
    pub fn print_report(&self) {
        println!("\n=== BACKTEST PERFORMANCE REPORT ===\n");
        println!("Initial capital:     {:.0}", self.initial_capital);
        println!("Final value:         {:.0}", self.final_value);
        println!("Total return:        {:+.2}%", self.total_return_pct);
        println!("Buy & hold return:   {:+.2}%", self.buy_and_hold_return_pct);
        println!();
        println!("Trades:              {}", self.total_trades);
        println!(
            "Win rate:            {:.1}% ({} W / {} L)",
            self.win_rate, self.winning_trades, self.losing_trades
        );
        println!("Max drawdown:        {:.2}%", self.max_drawdown_pct);
        println!("Sharpe ratio:        {:.2}", self.sharpe_ratio);
        println!("Uptrend probability: {:.2}%", self.uptrend_probability);

        if !self.trades.is_empty() {
            println!("\n--- Trades ---");
            for trade in &self.trades {
                let side = match trade.side {
                    OrderSide::Bid => "BUY ",
                    OrderSide::Ask => "SELL",
                };
                println!(
                    "{}  {}  price {:.2}  amount {:.8}  value {:.0}",
                    trade.time, side, trade.price, trade.amount, trade.total_value
                );
            }
        }
    }
}
