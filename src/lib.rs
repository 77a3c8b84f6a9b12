//trailing-stop trend-following backtester for daily bars

pub mod config;
pub mod data;
pub mod engine;
pub mod live;
pub mod metrics;
pub mod portfolio;
pub mod strategy;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{BacktestConfiguration, WindowPreset};
    pub use crate::data::{load_csv, Bar, BarSeries, DataError};
    pub use crate::engine::{
        optimize, run_backtest, BacktestConfig, BacktestEngine, BacktestResult, BudgetTrace,
        ConfigError, Fill, OrderSide, WindowGrid, WindowOptimizer, WindowSizeResult,
    };
    pub use crate::live::{Broker, BrokerError, LiveAction, LiveTrader};
    pub use crate::metrics::{
        calculate_equity_curve, summarize_annual_returns, AnnualReturn, EquityPoint,
        SummaryMetrics,
    };
    pub use crate::portfolio::{Account, Position};
    pub use crate::strategy::{MovingAverageCalculator, TradingRules, TradingStateMachine};
}
