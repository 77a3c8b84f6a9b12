use rust_decimal::Decimal;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("account restricted for trading")]
    AccountBlocked,
    #[error("order rejected: {0}")]
    Rejected(String),
    #[error("broker unavailable: {0}")]
    Unavailable(String),
}

//what the live trader needs from a brokerage account
pub trait Broker {
    fn is_market_open(&self) -> Result<bool, BrokerError>;

    fn account_blocked(&self) -> Result<bool, BrokerError>;

    //symbols currently held
    fn positions(&self) -> Result<HashSet<String>, BrokerError>;

    fn current_price(&self, symbol: &str) -> Result<Decimal, BrokerError>;

    fn submit_buy(&mut self, symbol: &str, qty: u32) -> Result<(), BrokerError>;

    fn submit_sell(&mut self, symbol: &str, qty: u32) -> Result<(), BrokerError>;
}
