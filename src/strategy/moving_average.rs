use crate::data::{Bar, BarSeries};
use rust_decimal::Decimal;

//trailing average of the `window_size` closes strictly before `index`
//with fewer than `window_size` bars of history the bar's own close is returned
pub fn average(series: &BarSeries, window_size: usize, index: usize) -> Decimal {
    debug_assert!(window_size > 0, "window size must be positive");

    if index < window_size {
        return series[index].close;
    }

    let window = &series.bars()[index - window_size..index];
    let sum: Decimal = window.iter().map(|bar| bar.close).sum();
    sum / Decimal::from(window_size)
}

//a bar with the two trend-filter averages attached for a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotatedBar<'a> {
    pub bar: &'a Bar,
    pub short_ma: Decimal,
    pub long_ma: Decimal,
}

//same results as `average`, but O(1) per lookup after one pass over the closes
pub struct MovingAverageCalculator<'a> {
    series: &'a BarSeries,
    //prefix[i] = sum of closes[0..i]
    prefix: Vec<Decimal>,
}

impl<'a> MovingAverageCalculator<'a> {
    pub fn new(series: &'a BarSeries) -> Self {
        let mut prefix = Vec::with_capacity(series.len() + 1);
        let mut running = Decimal::ZERO;
        prefix.push(running);

        for close in series.closes() {
            running += close;
            prefix.push(running);
        }

        MovingAverageCalculator { series, prefix }
    }

    pub fn average(&self, window_size: usize, index: usize) -> Decimal {
        debug_assert!(window_size > 0, "window size must be positive");

        if index < window_size {
            return self.series[index].close;
        }

        (self.prefix[index] - self.prefix[index - window_size]) / Decimal::from(window_size)
    }

    //attaches both averages to the bar at `index`
    pub fn annotate(
        &self,
        index: usize,
        short_window: usize,
        long_window: usize,
    ) -> AnnotatedBar<'a> {
        AnnotatedBar {
            bar: &self.series.bars()[index],
            short_ma: self.average(short_window, index),
            long_ma: self.average(long_window, index),
        }
    }
}
