use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

use super::{ExecutionAction, ExecutionDecision, Executor, SkipReason};
use crate::api::{Exchange, ExchangeResult};
use crate::config::BotConfig;
use crate::error::{BotError, ExchangeError};
use crate::indicators::calculate_sma;
use crate::models::{Balances, Market, Order};
use crate::strategy::{closing_prices, RsiReading, RsiStrategy};

/// Moving average shown next to the price in iteration logs
const MA_PERIOD: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
    Stopped,
    Running,
}

/// Cloneable handle used to observe and stop a running bot
#[derive(Clone)]
pub struct BotHandle {
    state: Arc<watch::Sender<BotState>>,
}

impl BotHandle {
    /// Request a stop
    ///
    /// An iteration already in flight runs to completion. The sleep after it
    /// is not waited out: a stop wakes it immediately, so the loop returns
    /// without the remainder of the interval and no further iteration starts.
    pub fn stop(&self) {
        let previous = self.state.send_replace(BotState::Stopped);
        if previous == BotState::Running {
            tracing::info!("🛑 Stop requested");
        }
    }

    pub fn state(&self) -> BotState {
        *self.state.borrow()
    }
}

/// Per-iteration parameters of the polling loop
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub market: Market,
    pub trade_amount: f64,
    pub candle_unit: u32,
    pub candle_count: u32,
    /// Upper bound on each exchange call, retries included
    pub call_timeout: Duration,
    pub dry_run: bool,
}

impl BotSettings {
    pub fn from_config(config: &BotConfig) -> anyhow::Result<Self> {
        Ok(Self {
            market: config.market()?,
            trade_amount: config.trade_amount,
            candle_unit: config.candle_unit,
            candle_count: config.candle_count,
            call_timeout: config.call_timeout(),
            dry_run: config.dry_run,
        })
    }
}

/// What one iteration observed and did
#[derive(Debug, Clone)]
pub struct IterationReport {
    pub price: f64,
    pub rsi: RsiReading,
    pub moving_average: Option<f64>,
    pub balances: Balances,
    pub decision: ExecutionDecision,
    /// Order acknowledged by the exchange, if one was placed
    pub order: Option<Order>,
}

/// Counters returned once the loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub iterations: u64,
    pub failures: u64,
    pub orders_placed: u64,
}

/// Polling trading loop: fetch, decide, dispatch, sleep, repeat
pub struct TradingBot<E: Exchange> {
    exchange: E,
    strategy: RsiStrategy,
    executor: Executor,
    settings: BotSettings,
    state: Arc<watch::Sender<BotState>>,
}

impl<E: Exchange> TradingBot<E> {
    pub fn new(exchange: E, strategy: RsiStrategy, settings: BotSettings) -> Self {
        let (state, _) = watch::channel(BotState::Stopped);
        Self {
            exchange,
            strategy,
            executor: Executor::new(settings.trade_amount),
            settings,
            state: Arc::new(state),
        }
    }

    pub fn handle(&self) -> BotHandle {
        BotHandle {
            state: self.state.clone(),
        }
    }

    pub fn state(&self) -> BotState {
        *self.state.borrow()
    }

    /// Run iterations every `interval` until stopped through a [`BotHandle`]
    ///
    /// Iteration failures are logged and counted, never fatal.
    pub async fn start(&self, interval: Duration) -> Result<LoopSummary, BotError> {
        let started = self.state.send_if_modified(|state| {
            if *state == BotState::Stopped {
                *state = BotState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(BotError::AlreadyRunning);
        }

        tracing::info!("🤖 Trading bot started");
        tracing::info!("📈 Market: {}", self.settings.market);
        tracing::info!(
            "💰 Trade amount: {} {}",
            self.settings.trade_amount,
            self.settings.market.quote
        );
        tracing::info!("⏱️  Check interval: {:?}", interval);
        if self.settings.dry_run {
            tracing::info!("🧪 Dry run: orders will not be sent");
        }

        let mut state = self.state.subscribe();
        let mut summary = LoopSummary::default();

        while *state.borrow_and_update() == BotState::Running {
            summary.iterations += 1;

            match self.run_iteration().await {
                Ok(report) => {
                    if report.order.is_some() {
                        summary.orders_placed += 1;
                    }
                }
                Err(e) => {
                    summary.failures += 1;
                    tracing::error!(kind = e.kind(), "❌ Iteration failed: {}", e);
                }
            }

            tokio::select! {
                _ = sleep(interval) => {}
                _ = wait_for_stop(&mut state) => {}
            }
        }

        tracing::info!(
            iterations = summary.iterations,
            failures = summary.failures,
            orders = summary.orders_placed,
            "🛑 Trading bot stopped"
        );
        Ok(summary)
    }

    /// One fetch, decide, dispatch cycle
    pub async fn run_iteration(&self) -> ExchangeResult<IterationReport> {
        let market = &self.settings.market;
        tracing::info!(
            "⏰ [{}] Checking {}...",
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            market
        );

        let price = self
            .call("ticker", self.exchange.current_price(market))
            .await?;

        let candles = self
            .call(
                "candles",
                self.exchange
                    .candles(market, self.settings.candle_unit, self.settings.candle_count),
            )
            .await?;

        let balances = self
            .call("balances", self.exchange.balances(market))
            .await?;

        let rsi = self.strategy.evaluate(&candles);
        let moving_average = calculate_sma(&closing_prices(&candles), MA_PERIOD);

        match moving_average {
            Some(ma) => tracing::info!("💵 Price: {} (MA{}: {:.2})", price, MA_PERIOD, ma),
            None => tracing::info!("💵 Price: {}", price),
        }
        tracing::info!("💰 {} balance: {}", market.quote, balances.quote);
        tracing::info!("🪙 {} holdings: {}", market.base, balances.base);

        if !rsi.sufficient_data {
            tracing::warn!(
                "Only {} candles, need {}; RSI defaults to neutral",
                candles.len(),
                self.strategy.period() + 1
            );
        }
        tracing::info!("📊 RSI: {:.2}", rsi.value);

        let decision = self.executor.process_signal(rsi.signal, &balances);
        let order = self.dispatch(&decision, &rsi).await?;

        Ok(IterationReport {
            price,
            rsi,
            moving_average,
            balances,
            decision,
            order,
        })
    }

    async fn dispatch(
        &self,
        decision: &ExecutionDecision,
        rsi: &RsiReading,
    ) -> ExchangeResult<Option<Order>> {
        let market = &self.settings.market;

        match decision.action {
            ExecutionAction::Buy { quote_amount } => {
                tracing::info!(
                    "🔵 Buy signal (RSI {:.2} < {})",
                    rsi.value,
                    self.strategy.oversold()
                );
                if self.settings.dry_run {
                    tracing::info!("🧪 Dry run: would buy {} {}", quote_amount, market.quote);
                    return Ok(None);
                }

                let order = self
                    .call("buy", self.exchange.buy_market(market, quote_amount))
                    .await?;
                tracing::info!(
                    uuid = %order.uuid,
                    "✅ Bought {} for {} {}",
                    market.base,
                    quote_amount,
                    market.quote
                );
                Ok(Some(order))
            }

            ExecutionAction::Sell { volume } => {
                tracing::info!(
                    "🔴 Sell signal (RSI {:.2} > {})",
                    rsi.value,
                    self.strategy.overbought()
                );
                if self.settings.dry_run {
                    tracing::info!("🧪 Dry run: would sell {} {}", volume, market.base);
                    return Ok(None);
                }

                let order = self
                    .call("sell", self.exchange.sell_market(market, volume))
                    .await?;
                tracing::info!(uuid = %order.uuid, "✅ Sold {} {}", volume, market.base);
                Ok(Some(order))
            }

            ExecutionAction::Skip(SkipReason::InsufficientFunds { .. })
            | ExecutionAction::Skip(SkipReason::NoHoldings) => {
                tracing::warn!("⚠️  {}", decision.reason);
                Ok(None)
            }

            ExecutionAction::Skip(SkipReason::NoSignal) => {
                tracing::info!("⏸️  Waiting (no signal)");
                Ok(None)
            }
        }
    }

    /// Bound an exchange call by the configured timeout
    async fn call<T, F>(&self, what: &str, fut: F) -> ExchangeResult<T>
    where
        F: Future<Output = ExchangeResult<T>>,
    {
        match timeout(self.settings.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "{} call exceeded {:?}",
                    what,
                    self.settings.call_timeout
                );
                Err(ExchangeError::Timeout)
            }
        }
    }
}

/// Resolves once the state is (or becomes) `Stopped`
async fn wait_for_stop(state: &mut watch::Receiver<BotState>) {
    loop {
        if *state.borrow_and_update() == BotState::Stopped {
            return;
        }
        if state.changed().await.is_err() {
            // Sender gone: nothing can stop us any more, let the sleep decide
            std::future::pending::<()>().await;
        }
    }
}
