use crate::engine::BudgetTrace;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

//year cursor start, any trace year above it opens the first row
pub const DEFAULT_MIN_YEAR: i32 = 2000;

//one year-boundary (or final) row of the annual report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualReturn {
    pub date: NaiveDate,
    pub budget: Decimal,
    pub annual_return_pct: Decimal,
}

impl fmt::Display for AnnualReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: ${:.2}, Annual Return: {:.2}%",
            self.date, self.budget, self.annual_return_pct
        )
    }
}

//walks the trace once, emitting a row on the first bar of each new year and on the last bar
//the first row has no baseline and reports 0%
pub fn summarize_annual_returns(trace: &BudgetTrace, min_year: i32) -> Vec<AnnualReturn> {
    let mut rows = Vec::new();
    let mut current_year = min_year;
    let mut current_budget = Decimal::ONE;
    let last_index = trace.len().saturating_sub(1);

    for (index, (date, budget)) in trace.iter().enumerate() {
        if date.year() <= current_year && index != last_index {
            continue;
        }

        //no baseline yet, or nothing left to grow from
        let annual_return_pct = if current_year == min_year || current_budget.is_zero() {
            Decimal::ZERO
        } else {
            (budget - current_budget) / current_budget * Decimal::ONE_HUNDRED
        };

        rows.push(AnnualReturn {
            date,
            budget,
            annual_return_pct,
        });

        current_year = date.year();
        current_budget = budget;
    }

    rows
}
