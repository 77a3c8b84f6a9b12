use crate::data::round_cents;
use crate::engine::execution::Fill;
use chrono::NaiveDate;
use rust_decimal::Decimal;

//the budget accumulator of a single run
#[derive(Debug, Clone)]
pub struct Account {
    //current budget, always whole cents after a sell
    pub budget: Decimal,

    //complete trade log
    pub trade_log: Vec<Fill>,
}

impl Account {
    pub fn new(initial_budget: Decimal) -> Self {
        Account {
            budget: initial_budget,
            trade_log: Vec::new(),
        }
    }

    //logs an entry, the budget is untouched until the position is sold
    pub fn record_buy(&mut self, date: NaiveDate, buy_price: Decimal) -> &Fill {
        let fill = Fill::buy(date, buy_price, self.budget);
        self.trade_log.push(fill);
        &self.trade_log[self.trade_log.len() - 1]
    }

    //compounds the round trip into the budget and logs the exit
    pub fn settle_sell(
        &mut self,
        date: NaiveDate,
        sell_price: Decimal,
        buy_price: Decimal,
    ) -> &Fill {
        //holding is only entered at a validated, positive close
        debug_assert!(buy_price > Decimal::ZERO, "buy price must be positive");

        let growth = (sell_price - buy_price) / buy_price + Decimal::ONE;
        self.budget = round_cents(self.budget * growth);

        let fill = Fill::sell(date, sell_price, buy_price, self.budget);
        self.trade_log.push(fill);
        &self.trade_log[self.trade_log.len() - 1]
    }
}
