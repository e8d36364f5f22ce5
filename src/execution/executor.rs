use crate::models::{Balances, Signal};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    InsufficientFunds { available: f64, required: f64 },
    NoHoldings,
    NoSignal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionAction {
    /// Market buy for a fixed quote amount
    Buy { quote_amount: f64 },
    /// Market sell of the whole base balance
    Sell { volume: f64 },
    Skip(SkipReason),
}

#[derive(Debug, Clone)]
pub struct ExecutionDecision {
    pub action: ExecutionAction,
    pub reason: String,
}

/// Turns a signal into an order, given what the account can afford
pub struct Executor {
    trade_amount: f64,
}

impl Executor {
    pub fn new(trade_amount: f64) -> Self {
        Self { trade_amount }
    }

    /// Process a signal and decide what to do
    pub fn process_signal(&self, signal: Signal, balances: &Balances) -> ExecutionDecision {
        match signal {
            Signal::Buy => {
                if balances.quote >= self.trade_amount {
                    ExecutionDecision {
                        action: ExecutionAction::Buy {
                            quote_amount: self.trade_amount,
                        },
                        reason: format!("Buy signal, spending {}", self.trade_amount),
                    }
                } else {
                    ExecutionDecision {
                        action: ExecutionAction::Skip(SkipReason::InsufficientFunds {
                            available: balances.quote,
                            required: self.trade_amount,
                        }),
                        reason: format!(
                            "Insufficient funds: {} available, {} required",
                            balances.quote, self.trade_amount
                        ),
                    }
                }
            }

            Signal::Sell => {
                if balances.base > 0.0 {
                    ExecutionDecision {
                        action: ExecutionAction::Sell {
                            volume: balances.base,
                        },
                        reason: format!("Sell signal, selling entire balance of {}", balances.base),
                    }
                } else {
                    ExecutionDecision {
                        action: ExecutionAction::Skip(SkipReason::NoHoldings),
                        reason: "No holdings to sell".to_string(),
                    }
                }
            }

            Signal::Hold => ExecutionDecision {
                action: ExecutionAction::Skip(SkipReason::NoSignal),
                reason: "Hold signal".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balances(quote: f64, base: f64) -> Balances {
        Balances { quote, base }
    }

    #[test]
    fn test_execute_buy_when_funded() {
        let executor = Executor::new(5000.0);
        let decision = executor.process_signal(Signal::Buy, &balances(5000.0, 0.0));

        assert_eq!(
            decision.action,
            ExecutionAction::Buy {
                quote_amount: 5000.0
            }
        );
    }

    #[test]
    fn test_skip_buy_when_insufficient_funds() {
        let executor = Executor::new(5000.0);
        let decision = executor.process_signal(Signal::Buy, &balances(1000.0, 0.0));

        assert_eq!(
            decision.action,
            ExecutionAction::Skip(SkipReason::InsufficientFunds {
                available: 1000.0,
                required: 5000.0,
            })
        );
        assert!(decision.reason.contains("Insufficient funds"));
    }

    #[test]
    fn test_sell_entire_base_balance() {
        let executor = Executor::new(5000.0);
        let decision = executor.process_signal(Signal::Sell, &balances(0.0, 0.0123));

        assert_eq!(decision.action, ExecutionAction::Sell { volume: 0.0123 });
    }

    #[test]
    fn test_skip_sell_when_no_holdings() {
        let executor = Executor::new(5000.0);
        let decision = executor.process_signal(Signal::Sell, &balances(100_000.0, 0.0));

        assert_eq!(decision.action, ExecutionAction::Skip(SkipReason::NoHoldings));
        assert!(decision.reason.contains("No holdings"));
    }

    #[test]
    fn test_hold_signal_skips() {
        let executor = Executor::new(5000.0);
        let decision = executor.process_signal(Signal::Hold, &balances(100_000.0, 1.0));

        assert_eq!(decision.action, ExecutionAction::Skip(SkipReason::NoSignal));
        assert!(decision.reason.contains("Hold"));
    }
}
