use crate::engine::BudgetTrace;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io;

//a point in the equity curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub budget: Decimal,
    pub drawdown: f64,
    pub returns: f64,
}

impl EquityPoint {
    pub fn new(date: NaiveDate, budget: Decimal, drawdown: f64, returns: f64) -> Self {
        EquityPoint {
            date,
            budget,
            drawdown,
            returns,
        }
    }

    pub fn budget_f64(&self) -> f64 {
        self.budget.to_f64().unwrap_or(0.0)
    }
}

//calculates the equity curve with drawdowns
pub fn calculate_equity_curve(trace: &BudgetTrace, initial_budget: Decimal) -> Vec<EquityPoint> {
    let mut curve = Vec::with_capacity(trace.len());
    let mut peak = initial_budget;
    let mut prev_budget = initial_budget;

    for (i, (date, budget)) in trace.iter().enumerate() {
        //update peak
        if budget > peak {
            peak = budget;
        }

        //calculate drawdown
        let drawdown = if peak > Decimal::ZERO {
            ((peak - budget) / peak).to_f64().unwrap_or(0.0)
        } else {
            0.0
        };

        //calculate returns
        let returns = if i == 0 || prev_budget.is_zero() {
            0.0
        } else {
            ((budget - prev_budget) / prev_budget)
                .to_f64()
                .unwrap_or(0.0)
        };

        curve.push(EquityPoint::new(date, budget, drawdown, returns));
        prev_budget = budget;
    }

    curve
}

//calculates maximum drawdown from equity curve
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    equity_curve
        .iter()
        .map(|point| point.drawdown)
        .fold(0.0, f64::max)
}

//calculates returns from budget values
pub fn calculate_returns(budgets: &[f64]) -> Vec<f64> {
    if budgets.len() < 2 {
        return vec![];
    }

    budgets
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect()
}

//date,budget rows for an external plotter
pub fn write_trace_csv<W: io::Write>(trace: &BudgetTrace, writer: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["date", "budget"])?;

    for (date, budget) in trace.iter() {
        writer.write_record([date.to_string(), budget.to_string()])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Bar, BarSeries};
    use crate::engine::{run_backtest, BacktestConfig};
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 4, d).unwrap()
    }

    #[test]
    fn drawdown_tracks_running_peak() {
        //buy 10, sell at 9.9 (-1%), buy 10, sell at 10.89 (+8.9%)
        let rows = [
            (1, dec!(9), dec!(10), dec!(9), dec!(10)),
            (2, dec!(10), dec!(10), dec!(9), dec!(9)),
            (3, dec!(9), dec!(10), dec!(9), dec!(10)),
            (4, dec!(11), dec!(11), dec!(11), dec!(11)),
            (5, dec!(10.89), dec!(10.89), dec!(10), dec!(10)),
        ];
        let bars = rows
            .iter()
            .map(|&(d, o, h, l, c)| Bar::new(date(d), o, h, l, c).unwrap())
            .collect();
        let series = BarSeries::new(bars).unwrap();
        let config = BacktestConfig {
            short_window: 1,
            long_window: 1,
            initial_budget: dec!(100),
            start_date: date(1),
            end_date: date(30),
            stop_factor: dec!(0.99),
            slippage_factor: Decimal::ONE,
            same_bar_reentry: false,
        };
        let result = run_backtest(&series, &config).unwrap();
        assert_eq!(
            result.trace.budgets(),
            &[dec!(100), dec!(99), dec!(99), dec!(99), dec!(107.81)]
        );

        let curve = calculate_equity_curve(&result.trace, dec!(100));

        assert_eq!(curve.len(), 5);
        assert_eq!(curve[0].returns, 0.0);
        assert!((curve[1].drawdown - 0.01).abs() < 1e-12);
        assert!((curve[1].returns + 0.01).abs() < 1e-12);
        assert_eq!(curve[4].drawdown, 0.0);
        assert!((max_drawdown(&curve) - 0.01).abs() < 1e-12);
        assert!((curve[4].budget_f64() - 107.81).abs() < 1e-9);
    }

    #[test]
    fn trace_csv_has_header_and_one_row_per_bar() {
        let bars = vec![
            Bar::new(date(1), dec!(10), dec!(10), dec!(10), dec!(10)).unwrap(),
            Bar::new(date(2), dec!(10), dec!(10), dec!(10), dec!(10)).unwrap(),
        ];
        let series = BarSeries::new(bars).unwrap();
        let config = BacktestConfig {
            short_window: 1,
            long_window: 1,
            initial_budget: dec!(250),
            start_date: date(1),
            end_date: date(30),
            ..BacktestConfig::default()
        };
        let result = run_backtest(&series, &config).unwrap();

        let mut out = Vec::new();
        write_trace_csv(&result.trace, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "date,budget\n2021-04-01,250\n2021-04-02,250\n"
        );
    }

    #[test]
    fn returns_need_two_points() {
        assert!(calculate_returns(&[100.0]).is_empty());
        assert_eq!(calculate_returns(&[100.0, 110.0, 99.0]), vec![0.1, -0.1]);
    }
}
