pub mod annual;
pub mod summary;
pub mod timeseries;

pub use annual::{summarize_annual_returns, AnnualReturn, DEFAULT_MIN_YEAR};
pub use summary::SummaryMetrics;
pub use timeseries::{calculate_equity_curve, max_drawdown, write_trace_csv, EquityPoint};
