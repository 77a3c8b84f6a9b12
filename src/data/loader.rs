use crate::data::bar::{round_cents, Bar, DataError};
use crate::data::series::BarSeries;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

//one row of a daily price export, any extra columns (volume, adj close) are ignored
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: String,
    #[serde(rename = "High")]
    high: String,
    #[serde(rename = "Low")]
    low: String,
    #[serde(rename = "Close")]
    close: String,
}

//loads bars from a csv file
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<BarSeries, DataError> {
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;

    collect_bars(reader)
}

//loads bars from any csv source (stdin, in-memory buffers)
pub fn read_csv<R: Read>(source: R) -> Result<BarSeries, DataError> {
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    collect_bars(reader)
}

fn collect_bars<R: Read>(mut reader: csv::Reader<R>) -> Result<BarSeries, DataError> {
    let mut bars = Vec::new();

    for (index, result) in reader.deserialize().enumerate() {
        //header is line 1
        let line = index + 2;
        let record: CsvRecord = result?;

        let date = NaiveDate::parse_from_str(&record.date, DATE_FORMAT).map_err(|_| {
            DataError::InvalidField {
                line,
                field: "Date",
                value: record.date.clone(),
            }
        })?;

        let bar = Bar::new(
            date,
            parse_price(&record.open, "Open", line)?,
            parse_price(&record.high, "High", line)?,
            parse_price(&record.low, "Low", line)?,
            parse_price(&record.close, "Close", line)?,
        )?;

        bars.push(bar);
    }

    //order is validated, never repaired
    BarSeries::new(bars)
}

//parses a decimal price and rounds it to cents
fn parse_price(value: &str, field: &'static str, line: usize) -> Result<Decimal, DataError> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map(round_cents)
        .map_err(|_| DataError::InvalidField {
            line,
            field,
            value: value.to_string(),
        })
}
