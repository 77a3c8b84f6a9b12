use crate::data::Bar;
use crate::engine::execution::Fill;
use crate::portfolio::{Account, Position};
use crate::strategy::moving_average::AnnotatedBar;
use rust_decimal::Decimal;
use tracing::info;

//fires when the bar traded below the stop carried over from the previous bar
pub fn should_sell(stop_loss_price: Decimal, low: Decimal) -> bool {
    low < stop_loss_price
}

//bullish bar with the short average at or above the long one
pub fn should_buy(open: Decimal, close: Decimal, short_ma: Decimal, long_ma: Decimal) -> bool {
    close > open && short_ma >= long_ma
}

//a gap below the stop fills at the open, scaled by the slippage factor
pub fn stop_fill_price(
    open: Decimal,
    stop_loss_price: Decimal,
    slippage_factor: Decimal,
) -> Decimal {
    open.min(stop_loss_price) * slippage_factor
}

pub fn trailing_stop_price(close: Decimal, stop_factor: Decimal) -> Decimal {
    close * stop_factor
}

//fixed parameters of the decision rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingRules {
    pub stop_factor: Decimal,
    pub slippage_factor: Decimal,

    //allow a buy on the same bar that just closed a position
    pub same_bar_reentry: bool,
}

//what a single bar did to the position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BarEvents {
    pub sold: Option<Fill>,
    pub bought: Option<Fill>,
}

//flat/holding state machine with a trailing stop
//per bar: sell rule, then buy rule, then stop update
#[derive(Debug, Clone)]
pub struct TradingStateMachine {
    rules: TradingRules,
    position: Position,
    account: Account,
}

impl TradingStateMachine {
    pub fn new(initial_budget: Decimal, rules: TradingRules) -> Self {
        TradingStateMachine {
            rules,
            position: Position::Flat,
            account: Account::new(initial_budget),
        }
    }

    //a bar before the tracked window: only the stop is trailed
    pub fn warm_up(&mut self, bar: &Bar) {
        self.trail(bar);
    }

    //applies the full transition for one in-window bar
    pub fn on_bar(&mut self, annotated: &AnnotatedBar<'_>) -> BarEvents {
        let bar = annotated.bar;
        let mut events = BarEvents::default();

        if let Position::Holding {
            buy_price,
            stop_loss_price,
        } = self.position
        {
            if should_sell(stop_loss_price, bar.low) {
                let sell_price =
                    stop_fill_price(bar.open, stop_loss_price, self.rules.slippage_factor);
                let fill = self
                    .account
                    .settle_sell(bar.date, sell_price, buy_price)
                    .clone();

                info!(
                    date = %bar.date,
                    sell_price = %sell_price.round_dp(2),
                    buy_price = %buy_price.round_dp(2),
                    margin_rate = %fill.return_pct().unwrap_or_default().round_dp(2),
                    "Sold"
                );

                self.position = Position::Flat;
                events.sold = Some(fill);
            }
        }

        let may_enter = self.rules.same_bar_reentry || events.sold.is_none();

        if self.position.is_flat()
            && may_enter
            && should_buy(bar.open, bar.close, annotated.short_ma, annotated.long_ma)
        {
            let buy_price = bar.close;
            let fill = self.account.record_buy(bar.date, buy_price).clone();

            info!(date = %bar.date, buy_price = %buy_price.round_dp(2), "Bought");

            self.position = Position::Holding {
                buy_price,
                stop_loss_price: trailing_stop_price(buy_price, self.rules.stop_factor),
            };
            events.bought = Some(fill);
        }

        self.trail(bar);
        events
    }

    fn trail(&mut self, bar: &Bar) {
        self.position
            .trail_stop(trailing_stop_price(bar.close, self.rules.stop_factor));
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn budget(&self) -> Decimal {
        self.account.budget
    }

    pub fn into_account(self) -> Account {
        self.account
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::execution::OrderSide;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn rules(same_bar_reentry: bool) -> TradingRules {
        TradingRules {
            stop_factor: dec!(0.99),
            slippage_factor: Decimal::ONE,
            same_bar_reentry,
        }
    }

    fn bar(d: u32, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Bar {
        let date = NaiveDate::from_ymd_opt(2021, 6, d).unwrap();
        Bar::new(date, open, high, low, close).unwrap()
    }

    //both averages equal, so the trend filter always passes
    fn flat_trend(bar: &Bar) -> AnnotatedBar<'_> {
        AnnotatedBar {
            bar,
            short_ma: bar.close,
            long_ma: bar.close,
        }
    }

    #[test]
    fn predicates() {
        assert!(should_sell(dec!(10.89), dec!(10.88)));
        assert!(!should_sell(dec!(10.89), dec!(10.89)));

        assert!(should_buy(dec!(10), dec!(11), dec!(5), dec!(5)));
        assert!(!should_buy(dec!(10), dec!(10), dec!(5), dec!(5)));
        assert!(!should_buy(dec!(10), dec!(11), dec!(4.99), dec!(5)));

        assert_eq!(stop_fill_price(dec!(11), dec!(10.89), Decimal::ONE), dec!(10.89));
        assert_eq!(stop_fill_price(dec!(10), dec!(10.89), dec!(0.995)), dec!(9.95));
        assert_eq!(trailing_stop_price(dec!(11), dec!(0.99)), dec!(10.89));
    }

    #[test]
    fn buys_bullish_bar_and_trails_stop() {
        let mut machine = TradingStateMachine::new(dec!(100), rules(true));
        let b1 = bar(1, dec!(10), dec!(11), dec!(10), dec!(11));

        let events = machine.on_bar(&flat_trend(&b1));

        assert!(events.sold.is_none());
        assert_eq!(events.bought.map(|f| f.price), Some(dec!(11)));
        assert_eq!(
            machine.position(),
            Position::Holding {
                buy_price: dec!(11),
                stop_loss_price: dec!(10.89)
            }
        );
        assert_eq!(machine.budget(), dec!(100));
    }

    #[test]
    fn stop_breach_sells_at_stop() {
        let mut machine = TradingStateMachine::new(dec!(100), rules(true));
        let b1 = bar(1, dec!(10), dec!(11), dec!(10), dec!(11));
        let b2 = bar(2, dec!(11), dec!(11), dec!(10), dec!(10));

        machine.on_bar(&flat_trend(&b1));
        let events = machine.on_bar(&flat_trend(&b2));

        let sold = events.sold.unwrap();
        assert_eq!(sold.price, dec!(10.89));
        assert_eq!(sold.entry_price, Some(dec!(11)));
        assert!(events.bought.is_none());
        assert_eq!(machine.budget(), dec!(99));
        assert!(machine.position().is_flat());
    }

    #[test]
    fn low_equal_to_stop_keeps_position() {
        let mut machine = TradingStateMachine::new(dec!(100), rules(true));
        let b1 = bar(1, dec!(10), dec!(11), dec!(10), dec!(11));
        let b2 = bar(2, dec!(11), dec!(11.5), dec!(10.89), dec!(11.2));

        machine.on_bar(&flat_trend(&b1));
        let events = machine.on_bar(&flat_trend(&b2));

        assert_eq!(events, BarEvents::default());
        assert_eq!(machine.position().stop_loss_price(), Some(dec!(11.088)));
    }

    #[test]
    fn same_bar_sell_then_buy() {
        let mut machine = TradingStateMachine::new(dec!(100), rules(true));
        let b1 = bar(1, dec!(10), dec!(11), dec!(10), dec!(11));
        let b2 = bar(2, dec!(10.5), dec!(12), dec!(10), dec!(11.5));

        machine.on_bar(&flat_trend(&b1));
        let events = machine.on_bar(&flat_trend(&b2));

        assert_eq!(events.sold.map(|f| f.price), Some(dec!(10.5)));
        assert_eq!(events.bought.map(|f| f.price), Some(dec!(11.5)));
        assert_eq!(machine.budget(), dec!(95.45));
        assert_eq!(machine.position().stop_loss_price(), Some(dec!(11.385)));

        let sides: Vec<OrderSide> = machine
            .clone()
            .into_account()
            .trade_log
            .iter()
            .map(|f| f.side)
            .collect();
        assert_eq!(sides, vec![OrderSide::Buy, OrderSide::Sell, OrderSide::Buy]);
    }

    #[test]
    fn reentry_can_be_disabled() {
        let mut machine = TradingStateMachine::new(dec!(100), rules(false));
        let b1 = bar(1, dec!(10), dec!(11), dec!(10), dec!(11));
        let b2 = bar(2, dec!(10.5), dec!(12), dec!(10), dec!(11.5));

        machine.on_bar(&flat_trend(&b1));
        let events = machine.on_bar(&flat_trend(&b2));

        assert!(events.sold.is_some());
        assert!(events.bought.is_none());
        assert!(machine.position().is_flat());
    }

    #[test]
    fn trend_filter_blocks_entry() {
        let mut machine = TradingStateMachine::new(dec!(100), rules(true));
        let b1 = bar(1, dec!(16), dec!(17.5), dec!(16), dec!(17));
        let annotated = AnnotatedBar {
            bar: &b1,
            short_ma: dec!(18),
            long_ma: dec!(19),
        };

        let events = machine.on_bar(&annotated);

        assert!(events.bought.is_none());
        assert!(machine.position().is_flat());
    }

    #[test]
    fn warm_up_never_trades() {
        let mut machine = TradingStateMachine::new(dec!(100), rules(true));
        machine.warm_up(&bar(1, dec!(10), dec!(11), dec!(10), dec!(11)));

        assert!(machine.position().is_flat());
        assert!(machine.clone().into_account().trade_log.is_empty());
    }

    #[test]
    fn holding_at_end_is_not_liquidated() {
        let mut machine = TradingStateMachine::new(dec!(100), rules(true));
        machine.on_bar(&flat_trend(&bar(1, dec!(10), dec!(11), dec!(10), dec!(11))));

        let account = machine.clone().into_account();
        assert_eq!(account.budget, dec!(100));
        assert_eq!(account.trade_log.len(), 1);
        assert!(machine.position().is_holding());
    }
}
