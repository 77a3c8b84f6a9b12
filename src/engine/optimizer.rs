use crate::data::BarSeries;
use crate::engine::backtest::{BacktestConfig, BacktestEngine, ConfigError};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

//long window in [1, max_window), short window in [1, long_window)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGrid {
    pub max_window: usize,
}

impl Default for WindowGrid {
    fn default() -> Self {
        WindowGrid { max_window: 60 }
    }
}

impl WindowGrid {
    //(short_window, long_window) cells in sweep order
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        (1..self.max_window)
            .flat_map(|long_window| {
                (1..long_window).map(move |short_window| (short_window, long_window))
            })
            .collect()
    }

    pub fn size(&self) -> usize {
        let n = self.max_window.saturating_sub(1);
        n * n.saturating_sub(1) / 2
    }
}

//one grid cell's outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSizeResult {
    pub short_window: usize,
    pub long_window: usize,
    pub final_budget: Decimal,
}

//brute-force search over window pairs, ranked by final budget
pub struct WindowOptimizer<'a> {
    series: &'a BarSeries,
    base: BacktestConfig,
    grid: WindowGrid,
    parallel: bool,
}

impl<'a> WindowOptimizer<'a> {
    //the base config supplies everything but the windows
    pub fn new(series: &'a BarSeries, base: BacktestConfig) -> Result<Self, ConfigError> {
        base.with_windows(1, 1).validate()?;

        Ok(WindowOptimizer {
            series,
            base,
            grid: WindowGrid::default(),
            parallel: true,
        })
    }

    pub fn with_grid(mut self, grid: WindowGrid) -> Self {
        self.grid = grid;
        self
    }

    //enables or disables parallel execution
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    //every cell, ascending by final budget, ties in sweep order
    pub fn optimize(&self) -> Result<Vec<WindowSizeResult>, ConfigError> {
        let pairs = self.grid.pairs();

        let mut results: Vec<WindowSizeResult> = if self.parallel {
            pairs
                .par_iter()
                .map(|&(short, long)| self.evaluate(short, long))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            pairs
                .iter()
                .map(|&(short, long)| self.evaluate(short, long))
                .collect::<Result<Vec<_>, _>>()?
        };

        results.sort_by(|a, b| a.final_budget.cmp(&b.final_budget));

        if let Some(best) = results.last() {
            info!(
                cells = results.len(),
                short_window = best.short_window,
                long_window = best.long_window,
                final_budget = %best.final_budget,
                "window sweep finished"
            );
        }

        Ok(results)
    }

    fn evaluate(
        &self,
        short_window: usize,
        long_window: usize,
    ) -> Result<WindowSizeResult, ConfigError> {
        let config = self.base.with_windows(short_window, long_window);
        let result = BacktestEngine::new(config, self.series)?.run();
        let final_budget = result.final_budget();

        debug!(short_window, long_window, final_budget = %final_budget, "grid cell");

        Ok(WindowSizeResult {
            short_window,
            long_window,
            final_budget,
        })
    }
}

//sweeps the default grid
pub fn optimize(
    series: &BarSeries,
    base: &BacktestConfig,
) -> Result<Vec<WindowSizeResult>, ConfigError> {
    WindowOptimizer::new(series, base.clone())?.optimize()
}
