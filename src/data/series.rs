use crate::data::bar::{Bar, DataError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::ops::Index;

//an ordered run of daily bars, dates strictly increasing
//read-only once built so one series can back many concurrent runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    //builds a series, rejecting out-of-order or duplicated dates
    pub fn new(bars: Vec<Bar>) -> Result<Self, DataError> {
        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(DataError::NonMonotonicDate {
                    index: index + 1,
                    previous: pair[0].date,
                    current: pair[1].date,
                });
            }
        }

        Ok(BarSeries { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    //closing prices in series order
    pub fn closes(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.bars.iter().map(|bar| bar.close)
    }

    //first and last dates, none for an empty series
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.bars.first(), self.bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }
}

impl Index<usize> for BarSeries {
    type Output = Bar;

    fn index(&self, index: usize) -> &Bar {
        &self.bars[index]
    }
}

impl<'a> IntoIterator for &'a BarSeries {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
