pub mod broker;
pub mod trader;

pub use broker::{Broker, BrokerError};
pub use trader::{LiveAction, LiveTrader};
