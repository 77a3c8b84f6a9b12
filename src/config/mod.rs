pub mod backtest_config;

pub use backtest_config::{default_window_presets, BacktestConfiguration, WindowPreset};
