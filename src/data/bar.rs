use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Invalid OHLC values on {date}: high ({high}) < low ({low})")]
    InvalidHighLow {
        date: NaiveDate,
        high: Decimal,
        low: Decimal,
    },
    #[error("Invalid OHLC values on {date}: close ({close}) outside high-low range [{low}, {high}]")]
    InvalidClose {
        date: NaiveDate,
        close: Decimal,
        high: Decimal,
        low: Decimal,
    },
    #[error("Invalid OHLC values on {date}: open ({open}) outside high-low range [{low}, {high}]")]
    InvalidOpen {
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
    },
    #[error("Non-positive close on {date}: {close}")]
    NonPositiveClose { date: NaiveDate, close: Decimal },
    #[error("Bar {index} dated {current} does not follow {previous}")]
    NonMonotonicDate {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },
    #[error("Failed to parse {field} '{value}' at line {line}")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

//prices are kept to cents
pub const PRICE_DP: u32 = 2;

//rounds a price or budget to cents, half away from zero
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRICE_DP, RoundingStrategy::MidpointAwayFromZero)
}

//one daily ohlc price record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Bar {
    //creates a new Bar with validation
    pub fn new(
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Result<Self, DataError> {
        //validate high >= low
        if high < low {
            return Err(DataError::InvalidHighLow { date, high, low });
        }

        //validate close within [low, high]
        if close < low || close > high {
            return Err(DataError::InvalidClose {
                date,
                close,
                high,
                low,
            });
        }

        //validate open within [low, high]
        if open < low || open > high {
            return Err(DataError::InvalidOpen {
                date,
                open,
                high,
                low,
            });
        }

        //a buy fills at the close, so it must be usable as a divisor
        if close <= Decimal::ZERO {
            return Err(DataError::NonPositiveClose { date, close });
        }

        Ok(Bar {
            date,
            open,
            high,
            low,
            close,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, d).unwrap()
    }

    #[test]
    fn accepts_consistent_ohlc() {
        let bar = Bar::new(day(1), dec!(10), dec!(12), dec!(9), dec!(11)).unwrap();
        assert_eq!(bar.close, dec!(11));
    }

    #[test]
    fn rejects_low_above_high() {
        let err = Bar::new(day(1), dec!(10), dec!(9), dec!(11), dec!(10)).unwrap_err();
        assert!(matches!(err, DataError::InvalidHighLow { .. }));
    }

    #[test]
    fn rejects_open_and_close_outside_range() {
        let err = Bar::new(day(1), dec!(13), dec!(12), dec!(9), dec!(10)).unwrap_err();
        assert!(matches!(err, DataError::InvalidOpen { .. }));

        let err = Bar::new(day(1), dec!(10), dec!(12), dec!(9), dec!(8)).unwrap_err();
        assert!(matches!(err, DataError::InvalidClose { .. }));
    }

    #[test]
    fn rejects_zero_close() {
        let err = Bar::new(day(1), dec!(0), dec!(0), dec!(0), dec!(0)).unwrap_err();
        assert!(matches!(err, DataError::NonPositiveClose { .. }));
    }

    #[test]
    fn rounds_half_cents_away_from_zero() {
        assert_eq!(round_cents(dec!(98.505)), dec!(98.51));
        assert_eq!(round_cents(dec!(98.5049)), dec!(98.50));
        assert_eq!(round_cents(dec!(12.3)), dec!(12.30));
    }
}
