pub mod backtest;
pub mod execution;
pub mod optimizer;

pub use backtest::{
    run_backtest, BacktestConfig, BacktestEngine, BacktestResult, BudgetTrace, ConfigError,
};
pub use execution::{Fill, OrderSide};
pub use optimizer::{optimize, WindowGrid, WindowOptimizer, WindowSizeResult};
