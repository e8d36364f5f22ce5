// Order decision and the polling trading loop
pub mod bot;
pub mod executor;

pub use bot::{BotHandle, BotSettings, BotState, IterationReport, LoopSummary, TradingBot};
pub use executor::{ExecutionAction, ExecutionDecision, Executor, SkipReason};
