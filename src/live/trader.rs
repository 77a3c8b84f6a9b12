use crate::data::BarSeries;
use crate::engine::{BacktestConfig, ConfigError};
use crate::live::broker::{Broker, BrokerError};
use crate::strategy::{should_buy, should_sell, trailing_stop_price};
use rust_decimal::Decimal;
use tracing::{error, info};

//outcome of one scheduled check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveAction {
    MarketClosed,
    AlreadyHolding,
    NotHolding,
    Bought {
        price: Decimal,
    },
    Sold {
        price: Decimal,
        stop_loss_price: Decimal,
    },
    Idle,
}

//drives a broker with the same rules the backtest simulates
//`history` holds completed sessions only, the live price stands in for today's close
pub struct LiveTrader<B: Broker> {
    broker: B,
    symbol: String,
    qty: u32,
    short_window: usize,
    long_window: usize,
    stop_factor: Decimal,
}

impl<B: Broker> LiveTrader<B> {
    pub fn new(
        broker: B,
        symbol: impl Into<String>,
        config: &BacktestConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(LiveTrader {
            broker,
            symbol: symbol.into(),
            qty: 1,
            short_window: config.short_window,
            long_window: config.long_window,
            stop_factor: config.stop_factor,
        })
    }

    pub fn with_qty(mut self, qty: u32) -> Self {
        self.qty = qty;
        self
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    //run near the close, when today's candle is nearly complete
    pub fn run_buy(
        &mut self,
        history: &BarSeries,
        session_open: Decimal,
    ) -> Result<LiveAction, BrokerError> {
        if !self.broker.is_market_open()? {
            info!("Market closed");
            return Ok(LiveAction::MarketClosed);
        }

        if self.holding()? {
            info!(symbol = %self.symbol, "Already holding");
            return Ok(LiveAction::AlreadyHolding);
        }

        let price = self.broker.current_price(&self.symbol)?;
        let short_ma = trailing_average(history, self.short_window, price);
        let long_ma = trailing_average(history, self.long_window, price);

        if !should_buy(session_open, price, short_ma, long_ma) {
            return Ok(LiveAction::Idle);
        }

        self.verify_account_status()?;
        self.broker.submit_buy(&self.symbol, self.qty)?;
        info!(symbol = %self.symbol, price = %price, qty = self.qty, "Bought");

        Ok(LiveAction::Bought { price })
    }

    //polled intraday, sells once the live price trades under the trailed stop
    pub fn run_sell(&mut self, history: &BarSeries) -> Result<LiveAction, BrokerError> {
        if !self.broker.is_market_open()? {
            info!("Market closed");
            return Ok(LiveAction::MarketClosed);
        }

        if !self.holding()? {
            error!(symbol = %self.symbol, "Can't sell, no open position");
            return Ok(LiveAction::NotHolding);
        }

        let Some(last) = history.bars().last() else {
            return Ok(LiveAction::Idle);
        };

        let stop_loss_price = trailing_stop_price(last.close, self.stop_factor);
        let price = self.broker.current_price(&self.symbol)?;

        if !should_sell(stop_loss_price, price) {
            return Ok(LiveAction::Idle);
        }

        self.verify_account_status()?;
        self.broker.submit_sell(&self.symbol, self.qty)?;
        info!(
            symbol = %self.symbol,
            price = %price,
            stop_loss_price = %stop_loss_price.round_dp(2),
            "Sold"
        );

        Ok(LiveAction::Sold {
            price,
            stop_loss_price,
        })
    }

    fn holding(&self) -> Result<bool, BrokerError> {
        Ok(self.broker.positions()?.contains(&self.symbol))
    }

    fn verify_account_status(&self) -> Result<(), BrokerError> {
        if self.broker.account_blocked()? {
            return Err(BrokerError::AccountBlocked);
        }
        Ok(())
    }
}

//average over the last `window_size` completed closes, the live price when history is short
fn trailing_average(history: &BarSeries, window_size: usize, live_price: Decimal) -> Decimal {
    let bars = history.bars();

    if bars.len() < window_size {
        return live_price;
    }

    let sum: Decimal = bars[bars.len() - window_size..]
        .iter()
        .map(|bar| bar.close)
        .sum();
    sum / Decimal::from(window_size)
}
