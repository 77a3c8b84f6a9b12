use crate::data::BarSeries;
use crate::engine::execution::Fill;
use crate::portfolio::Position;
use crate::strategy::{MovingAverageCalculator, TradingRules, TradingStateMachine};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} window size must be positive")]
    NonPositiveWindow { name: &'static str },
    #[error("initial budget must be positive, got {0}")]
    NonPositiveBudget(Decimal),
    #[error("start date {start} is after end date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
    #[error("{name} must be in (0, 1], got {value}")]
    FactorOutOfRange { name: &'static str, value: Decimal },
}

//configuration for a backtest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub initial_budget: Decimal,

    //both ends inclusive
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    //trailing stop as a fraction of the latest close
    pub stop_factor: Decimal,

    //applied to the stop fill price
    pub slippage_factor: Decimal,

    pub same_bar_reentry: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            short_window: 3,
            long_window: 30,
            initial_budget: dec!(5000),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).expect("constant date"),
            end_date: NaiveDate::from_ymd_opt(2023, 10, 1).expect("constant date"),
            stop_factor: dec!(0.99),
            slippage_factor: dec!(0.995),
            same_bar_reentry: true,
        }
    }
}

impl BacktestConfig {
    //checks every parameter before any bar is simulated
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.short_window == 0 {
            return Err(ConfigError::NonPositiveWindow { name: "short" });
        }
        if self.long_window == 0 {
            return Err(ConfigError::NonPositiveWindow { name: "long" });
        }
        if self.initial_budget <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveBudget(self.initial_budget));
        }
        if self.start_date > self.end_date {
            return Err(ConfigError::InvertedDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }

        for (name, value) in [
            ("stop_factor", self.stop_factor),
            ("slippage_factor", self.slippage_factor),
        ] {
            if value <= Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::FactorOutOfRange { name, value });
            }
        }

        Ok(())
    }

    //same settings with a different window pair
    pub fn with_windows(&self, short_window: usize, long_window: usize) -> Self {
        BacktestConfig {
            short_window,
            long_window,
            ..self.clone()
        }
    }

    pub fn rules(&self) -> TradingRules {
        TradingRules {
            stop_factor: self.stop_factor,
            slippage_factor: self.slippage_factor,
            same_bar_reentry: self.same_bar_reentry,
        }
    }
}

//budget after every traced bar, dates strictly increasing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BudgetTrace {
    dates: Vec<NaiveDate>,
    budgets: Vec<Decimal>,
}

impl BudgetTrace {
    pub fn with_capacity(capacity: usize) -> Self {
        BudgetTrace {
            dates: Vec::with_capacity(capacity),
            budgets: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, date: NaiveDate, budget: Decimal) {
        debug_assert!(self.dates.last().map_or(true, |last| *last < date));
        self.dates.push(date);
        self.budgets.push(budget);
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn budgets(&self) -> &[Decimal] {
        &self.budgets
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Decimal)> + '_ {
        self.dates.iter().copied().zip(self.budgets.iter().copied())
    }

    pub fn last(&self) -> Option<(NaiveDate, Decimal)> {
        self.dates.last().copied().zip(self.budgets.last().copied())
    }

    //the two parallel sequences handed to plotting
    pub fn into_parts(self) -> (Vec<NaiveDate>, Vec<Decimal>) {
        (self.dates, self.budgets)
    }
}

//result of a backtest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacktestResult {
    pub initial_budget: Decimal,
    pub trace: BudgetTrace,
    pub trades: Vec<Fill>,

    //position left open when the run ended, never force-closed
    pub final_position: Position,

    //traced bars that ended holding
    pub bars_in_market: usize,
}

impl BacktestResult {
    //last traced budget, the initial budget when nothing was traced
    pub fn final_budget(&self) -> Decimal {
        self.trace
            .last()
            .map(|(_, budget)| budget)
            .unwrap_or(self.initial_budget)
    }
}

//main backtest engine
pub struct BacktestEngine<'a> {
    config: BacktestConfig,
    series: &'a BarSeries,
}

impl<'a> BacktestEngine<'a> {
    //validates the configuration up front
    pub fn new(config: BacktestConfig, series: &'a BarSeries) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(BacktestEngine { config, series })
    }

    //runs one pass over the series
    pub fn run(&self) -> BacktestResult {
        let config = &self.config;

        //averages see the whole history, warm-up bars included
        let calculator = MovingAverageCalculator::new(self.series);
        let mut machine = TradingStateMachine::new(config.initial_budget, config.rules());
        let mut trace = BudgetTrace::with_capacity(self.series.len());
        let mut bars_in_market = 0;

        for (index, bar) in self.series.iter().enumerate() {
            if bar.date > config.end_date {
                break;
            }

            if bar.date < config.start_date {
                machine.warm_up(bar);
                continue;
            }

            let annotated = calculator.annotate(index, config.short_window, config.long_window);
            machine.on_bar(&annotated);

            if machine.position().is_holding() {
                bars_in_market += 1;
            }

            trace.push(bar.date, machine.budget());
            debug!(
                date = %bar.date,
                budget = %machine.budget(),
                close = %bar.close,
                "bar processed"
            );
        }

        let final_position = machine.position();
        let account = machine.into_account();

        BacktestResult {
            initial_budget: config.initial_budget,
            trace,
            trades: account.trade_log,
            final_position,
            bars_in_market,
        }
    }
}

//validates `config` and runs a single backtest over `series`
pub fn run_backtest(
    series: &BarSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, ConfigError> {
    Ok(BacktestEngine::new(config.clone(), series)?.run())
}
