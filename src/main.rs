use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rsibot::api::{Exchange, UpbitClient};
use rsibot::backtest::{BacktestRunner, MarketScenario, SyntheticDataGenerator};
use rsibot::config::{BotConfig, MAX_CANDLE_COUNT};
use rsibot::execution::{BotSettings, Executor, TradingBot};
use rsibot::indicators::uptrend_probability;
use rsibot::strategy::{closing_prices, ConfluenceStrategy, RsiStrategy, Strategy};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "RSI trading bot for Upbit spot markets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyKind {
    /// RSI oversold/overbought thresholds
    Rsi,
    /// RSI with MACD crosses, or Bollinger Band breaks
    Confluence,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the polling trading loop (default)
    Run {
        #[arg(long)]
        market: Option<String>,
        #[arg(long)]
        trade_amount: Option<f64>,
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Decide and log, but never send orders
        #[arg(long)]
        dry_run: bool,
    },

    /// Evaluate the current signal once without trading
    Signal {
        #[arg(long)]
        market: Option<String>,
    },

    /// Replay a strategy over past candles
    Backtest {
        #[arg(long, value_enum, default_value = "rsi")]
        strategy: StrategyKind,
        /// Use generated candles instead of fetching from the exchange
        #[arg(long)]
        synthetic: bool,
        #[arg(long, value_enum, default_value = "sideways")]
        scenario: MarketScenario,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Number of candles (capped at 200 for live data)
        #[arg(long, default_value_t = 500)]
        candles: usize,
        #[arg(long, default_value_t = 1_000_000.0)]
        capital: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let mut config = BotConfig::from_env()?;

    match cli.command.unwrap_or(Command::Run {
        market: None,
        trade_amount: None,
        interval_ms: None,
        dry_run: false,
    }) {
        Command::Run {
            market,
            trade_amount,
            interval_ms,
            dry_run,
        } => {
            if let Some(market) = market {
                config.market = market;
            }
            if let Some(amount) = trade_amount {
                config.trade_amount = amount;
            }
            if let Some(interval) = interval_ms {
                config.check_interval = interval;
            }
            config.dry_run |= dry_run;
            config.validate()?;
            run_bot(config).await
        }
        Command::Signal { market } => {
            if let Some(market) = market {
                config.market = market;
            }
            config.validate()?;
            check_signal(&config).await
        }
        Command::Backtest {
            strategy,
            synthetic,
            scenario,
            seed,
            candles,
            capital,
        } => run_backtest(&config, strategy, synthetic, scenario, seed, candles, capital).await,
    }
}

fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rsibot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_bot(config: BotConfig) -> Result<()> {
    let client = UpbitClient::from_config(&config)?;
    if !client.has_credentials() && !config.dry_run {
        tracing::warn!(
            "UPBIT_OPEN_API_ACCESS_KEY / UPBIT_OPEN_API_SECRET_KEY not set; balance and order calls will fail"
        );
    }

    let strategy = RsiStrategy::new(config.rsi_period, config.rsi_oversold, config.rsi_overbought);
    let settings = BotSettings::from_config(&config)?;
    let interval = config.interval();

    let bot = TradingBot::new(client, strategy, settings);
    let handle = bot.handle();

    let bot_task = tokio::spawn(async move { bot.start(interval).await });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    tracing::info!("⚠️  Received Ctrl+C, shutting down...");
    handle.stop();

    let summary = bot_task.await.context("Bot task panicked")??;
    tracing::info!(
        "👋 Stopped after {} iterations ({} failed, {} orders)",
        summary.iterations,
        summary.failures,
        summary.orders_placed
    );
    Ok(())
}

async fn check_signal(config: &BotConfig) -> Result<()> {
    let client = UpbitClient::from_config(config)?;
    let market = config.market()?;
    let strategy = RsiStrategy::new(config.rsi_period, config.rsi_oversold, config.rsi_overbought);

    let price = client.current_price(&market).await?;
    let candles = client
        .candles(&market, config.candle_unit, config.candle_count)
        .await?;
    let reading = strategy.evaluate(&candles);

    println!("Market:  {}", market);
    println!("Price:   {}", price);
    println!("Candles: {} x {}m", candles.len(), config.candle_unit);
    println!(
        "RSI({}): {:.2}{}",
        strategy.period(),
        reading.value,
        if reading.sufficient_data {
            ""
        } else {
            " (not enough candles, neutral default)"
        }
    );
    println!("Signal:  {}", reading.signal);
    println!("Uptrend: {:.2}%", uptrend_probability(&closing_prices(&candles)));

    if client.has_credentials() {
        let balances = client.balances(&market).await?;
        let decision = Executor::new(config.trade_amount).process_signal(reading.signal, &balances);
        println!(
            "Balance: {} {} / {} {}",
            balances.quote, market.quote, balances.base, market.base
        );
        println!("Action:  {}", decision.reason);
    }

    Ok(())
}

async fn run_backtest(
    config: &BotConfig,
    kind: StrategyKind,
    synthetic: bool,
    scenario: MarketScenario,
    seed: u64,
    num_candles: usize,
    capital: f64,
) -> Result<()> {
    let market = config.market()?;
    let strategy: Box<dyn Strategy> = match kind {
        StrategyKind::Rsi => Box::new(RsiStrategy::new(
            config.rsi_period,
            config.rsi_oversold,
            config.rsi_overbought,
        )),
        StrategyKind::Confluence => Box::new(ConfluenceStrategy::default()),
    };

    let candles = if synthetic {
        tracing::info!("🧪 Generating {} {:?} candles (seed {})", num_candles, scenario, seed);
        SyntheticDataGenerator::new(seed)
            .with_market(market.code())
            .generate(scenario, num_candles, config.candle_unit as i64)
    } else {
        let count = num_candles.min(MAX_CANDLE_COUNT as usize) as u32;
        let client = UpbitClient::from_config(config)?;
        tracing::info!("📥 Fetching {} {}m candles for {}", count, config.candle_unit, market);
        let mut candles = tokio::time::timeout(
            Duration::from_secs(60),
            client.candles(&market, config.candle_unit, count),
        )
        .await
        .context("Timed out fetching candles")??;
        // Exchange returns newest first
        candles.reverse();
        candles
    };

    let metrics = BacktestRunner::new(capital)
        .run(strategy.as_ref(), &candles, config.candle_count as usize)
        .map_err(|e| anyhow::anyhow!(e))?;
    metrics.print_report();
    Ok(())
}
