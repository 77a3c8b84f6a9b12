pub mod moving_average;
pub mod trailing_stop;

pub use moving_average::{average, AnnotatedBar, MovingAverageCalculator};
pub use trailing_stop::{
    should_buy, should_sell, stop_fill_price, trailing_stop_price, BarEvents, TradingRules,
    TradingStateMachine,
};
