use crate::engine::{BacktestResult, Fill, OrderSide};
use crate::metrics::timeseries::{calculate_equity_curve, calculate_returns, max_drawdown};
use prettytable::{Cell, Row, Table};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

//summary metrics for a backtest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub initial_budget: Decimal,
    pub final_budget: Decimal,
    pub total_return_pct: f64,
    pub cagr: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub win_rate: f64,
    pub avg_win_pct: f64,
    pub avg_loss_pct: f64,
    pub num_trades: usize,
    pub num_winning_trades: usize,
    pub num_losing_trades: usize,
    pub largest_win_pct: f64,
    pub largest_loss_pct: f64,
    pub exposure: f64,
    pub still_holding: bool,
}

impl SummaryMetrics {
    //calculate summary metrics from a finished run
    pub fn from_backtest(result: &BacktestResult) -> Self {
        let initial_budget = result.initial_budget;
        let final_budget = result.final_budget();
        let initial = initial_budget.to_f64().unwrap_or(0.0);
        let last = final_budget.to_f64().unwrap_or(0.0);

        let total_return_pct = if initial > 0.0 {
            (last - initial) / initial * 100.0
        } else {
            0.0
        };

        let equity_curve = calculate_equity_curve(&result.trace, initial_budget);

        //calculate cagr
        let cagr = match (equity_curve.first(), equity_curve.last()) {
            (Some(first), Some(end)) if initial > 0.0 => {
                let duration_days = (end.date - first.date).num_days() as f64;
                let years = duration_days / 365.25;

                if years > 0.0 {
                    ((last / initial).powf(1.0 / years) - 1.0) * 100.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };

        let max_dd = max_drawdown(&equity_curve);

        //calculate returns for sharpe and sortino
        let budgets: Vec<f64> = equity_curve.iter().map(|p| p.budget_f64()).collect();
        let returns = calculate_returns(&budgets);

        let trade_stats = calculate_trade_statistics(&result.trades);

        //share of traced bars that ended in the market
        let exposure = if result.trace.is_empty() {
            0.0
        } else {
            result.bars_in_market as f64 / result.trace.len() as f64
        };

        SummaryMetrics {
            initial_budget,
            final_budget,
            total_return_pct,
            cagr,
            max_drawdown: max_dd,
            sharpe_ratio: calculate_sharpe_ratio(&returns),
            sortino_ratio: calculate_sortino_ratio(&returns),
            win_rate: trade_stats.win_rate,
            avg_win_pct: trade_stats.avg_win_pct,
            avg_loss_pct: trade_stats.avg_loss_pct,
            num_trades: trade_stats.num_trades,
            num_winning_trades: trade_stats.num_winning_trades,
            num_losing_trades: trade_stats.num_losing_trades,
            largest_win_pct: trade_stats.largest_win_pct,
            largest_loss_pct: trade_stats.largest_loss_pct,
            exposure,
            still_holding: result.final_position.is_holding(),
        }
    }

    //prints metrics in a formatted table
    pub fn pretty_print_table(&self) {
        let mut table = Table::new();

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));

        let rows = [
            ("Initial Budget", format!("${:.2}", self.initial_budget)),
            ("Final Budget", format!("${:.2}", self.final_budget)),
            ("Total Return", format!("{:.2}%", self.total_return_pct)),
            ("CAGR", format!("{:.2}%", self.cagr)),
            ("Max Drawdown", format!("{:.2}%", self.max_drawdown * 100.0)),
            ("Sharpe Ratio", format!("{:.3}", self.sharpe_ratio)),
            ("Sortino Ratio", format!("{:.3}", self.sortino_ratio)),
            ("Round Trips", format!("{}", self.num_trades)),
            ("Win Rate", format!("{:.2}%", self.win_rate * 100.0)),
            ("Avg Win", format!("{:.2}%", self.avg_win_pct)),
            ("Avg Loss", format!("{:.2}%", self.avg_loss_pct)),
            ("Largest Win", format!("{:.2}%", self.largest_win_pct)),
            ("Largest Loss", format!("{:.2}%", self.largest_loss_pct)),
            ("Exposure", format!("{:.2}%", self.exposure * 100.0)),
            ("Open At End", format!("{}", self.still_holding)),
        ];

        for (label, value) in rows {
            table.add_row(Row::new(vec![Cell::new(label), Cell::new(&value)]));
        }

        table.printstd();
    }
}

#[derive(Debug, Default)]
struct TradeStats {
    num_trades: usize,
    num_winning_trades: usize,
    num_losing_trades: usize,
    win_rate: f64,
    avg_win_pct: f64,
    avg_loss_pct: f64,
    largest_win_pct: f64,
    largest_loss_pct: f64,
}

//each sell closes exactly one round trip
fn calculate_trade_statistics(trades: &[Fill]) -> TradeStats {
    let round_trips: Vec<f64> = trades
        .iter()
        .filter(|fill| fill.side == OrderSide::Sell)
        .filter_map(|fill| fill.return_pct())
        .filter_map(|pct| pct.to_f64())
        .collect();

    if round_trips.is_empty() {
        return TradeStats::default();
    }

    let winning: Vec<f64> = round_trips.iter().copied().filter(|&r| r > 0.0).collect();
    let losing: Vec<f64> = round_trips.iter().copied().filter(|&r| r < 0.0).collect();

    let avg = |values: &[f64]| {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    };

    TradeStats {
        num_trades: round_trips.len(),
        num_winning_trades: winning.len(),
        num_losing_trades: losing.len(),
        win_rate: winning.len() as f64 / round_trips.len() as f64,
        avg_win_pct: avg(&winning),
        avg_loss_pct: avg(&losing),
        largest_win_pct: winning.iter().fold(0.0f64, |a, &b| a.max(b)),
        largest_loss_pct: losing.iter().fold(0.0f64, |a, &b| a.min(b)),
    }
}

fn calculate_sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.mean();
    let std_dev = returns.std_dev();

    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }

    //annualize assuming daily bars
    (mean / std_dev) * (252.0_f64).sqrt()
}

fn calculate_sortino_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.mean();

    //downside deviation (only negative returns)
    let negative_returns: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).copied().collect();

    if negative_returns.len() < 2 {
        return if negative_returns.is_empty() && mean > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
    }

    let downside_dev = negative_returns.std_dev();

    if downside_dev == 0.0 || !downside_dev.is_finite() {
        return 0.0;
    }

    (mean / downside_dev) * (252.0_f64).sqrt()
}
