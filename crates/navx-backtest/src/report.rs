use serde::Serialize;

use navx_core::TsCode;

use crate::netvalue::NetValuePoint;

/// Per-instrument display row for the result payload.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentReport {
    pub code: TsCode,
    pub name: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub weight_pct: f64,
    pub dividend_yield: f64,
    pub roce: Option<f64>,
}

/// Aggregate statistics for one backtest run.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestSummary {
    pub portfolio_return_pct: Option<f64>,
    pub fund_return_pct: Option<f64>,
    /// Instruments in the requested universe.
    pub requested: usize,
    /// Instruments for which price data actually arrived.
    pub fetched: usize,
}

/// Full result of a backtest: the replicated portfolio curve, the fund's
/// own curve, and the per-instrument rows behind the weights.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub portfolio: Vec<NetValuePoint>,
    pub fund: Vec<NetValuePoint>,
    pub instruments: Vec<InstrumentReport>,
    pub summary: BacktestSummary,
}
