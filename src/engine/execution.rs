use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

//order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "Bought"),
            OrderSide::Sell => write!(f, "Sold"),
        }
    }
}

//a simulated fill, one per bought/sold event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub date: NaiveDate,
    pub side: OrderSide,
    pub price: Decimal,

    //entry price of the position a sell closes
    pub entry_price: Option<Decimal>,

    //budget once the fill is applied
    pub budget_after: Decimal,
}

impl Fill {
    pub fn buy(date: NaiveDate, price: Decimal, budget_after: Decimal) -> Self {
        Fill {
            date,
            side: OrderSide::Buy,
            price,
            entry_price: None,
            budget_after,
        }
    }

    pub fn sell(
        date: NaiveDate,
        price: Decimal,
        entry_price: Decimal,
        budget_after: Decimal,
    ) -> Self {
        Fill {
            date,
            side: OrderSide::Sell,
            price,
            entry_price: Some(entry_price),
            budget_after,
        }
    }

    //percent gained on the round trip a sell closes
    pub fn return_pct(&self) -> Option<Decimal> {
        self.entry_price
            .map(|entry| (self.price - entry) / entry * Decimal::ONE_HUNDRED)
    }
}
