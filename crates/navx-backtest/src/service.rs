use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{info, warn};

use navx_core::{api, run_windows, Table, TradeDate, TsCode, TushareClient, DEFAULT_WINDOW_DELAY};

use crate::error::BacktestError;
use crate::factors::{extract_factors, FactorRecord};
use crate::holdings::resolve_latest_period;
use crate::netvalue::{self, NetValuePoint};
use crate::report::{BacktestReport, BacktestSummary, InstrumentReport};
use crate::weights::{compute_weights, WeightMap};

/// Outcome of one per-instrument price fetch inside a batch window.
/// Failures are data, not control flow: a missing instrument never
/// cancels its window siblings or aborts the run.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Fetched {
        code: TsCode,
        series: Vec<NetValuePoint>,
    },
    Missing {
        code: TsCode,
        reason: String,
    },
}

/// The fund being replicated plus the fan-out shape used when fetching
/// its holdings' data.
#[derive(Debug, Clone)]
pub struct EtfProfile {
    pub fund_code: TsCode,
    /// Concurrent fundamentals fetches per window.
    pub fundamentals_window: usize,
    /// Concurrent bar fetches per window.
    pub bars_window: usize,
    pub window_delay: Duration,
}

impl Default for EtfProfile {
    fn default() -> Self {
        Self {
            fund_code: TsCode::normalize("515180.SH").expect("baseline fund code is valid"),
            fundamentals_window: 5,
            bars_window: 6,
            window_delay: DEFAULT_WINDOW_DELAY,
        }
    }
}

/// Orchestrates the two backtest operations against the provider client.
///
/// All state is per-run: the service itself only carries the shared
/// client and the fund profile.
pub struct BacktestService {
    client: Arc<TushareClient>,
    profile: EtfProfile,
}

impl BacktestService {
    pub fn new(client: Arc<TushareClient>, profile: EtfProfile) -> Self {
        Self { client, profile }
    }

    /// Equal-weight backtest of a caller-supplied instrument list.
    pub async fn run_custom(
        &self,
        codes: &[String],
        start: TradeDate,
        end: TradeDate,
    ) -> Result<BacktestReport, BacktestError> {
        let mut universe = Vec::new();
        let mut seen = HashSet::new();
        for raw in codes {
            let code = TsCode::normalize(raw)?;
            if seen.insert(code.clone()) {
                universe.push(code);
            }
        }

        if universe.is_empty() {
            return Err(BacktestError::EmptyUniverse);
        }

        info!(count = universe.len(), "running custom equal-weight backtest");
        let records = self.fetch_factor_records(&universe).await;

        let weight = 1.0 / universe.len() as f64;
        let weights: WeightMap = universe
            .iter()
            .map(|code| (code.clone(), weight))
            .collect();

        self.assemble(universe, records, weights, start, end).await
    }

    /// Dual-factor backtest of the fund's own replicated holdings.
    pub async fn run_etf(
        &self,
        start: TradeDate,
        end: TradeDate,
    ) -> Result<BacktestReport, BacktestError> {
        let disclosure = self
            .client
            .call(
                api::FUND_PORTFOLIO,
                json!({ "ts_code": self.profile.fund_code.as_str() }),
                "ts_code,symbol,end_date,mkv,amount,stk_mkv_ratio",
            )
            .await?;

        let holdings = resolve_latest_period(&disclosure, TradeDate::today())?;

        let mut universe = Vec::new();
        let mut seen = HashSet::new();
        for row in &holdings {
            if seen.insert(row.code.clone()) {
                universe.push(row.code.clone());
            }
        }

        if universe.is_empty() {
            return Err(BacktestError::EmptyUniverse);
        }

        info!(
            fund = %self.profile.fund_code,
            period = %holdings[0].end_date,
            count = universe.len(),
            "resolved holdings universe"
        );

        let records = self.fetch_factor_records(&universe).await;
        let weights = compute_weights(&records);

        self.assemble(universe, records, weights, start, end).await
    }

    /// Shared tail of both operations: price fan-out, merge, fund curve,
    /// report shaping.
    async fn assemble(
        &self,
        universe: Vec<TsCode>,
        records: Vec<FactorRecord>,
        weights: WeightMap,
        start: TradeDate,
        end: TradeDate,
    ) -> Result<BacktestReport, BacktestError> {
        let outcomes = self.fetch_bar_series(&universe, start, end).await;

        let mut per_instrument = Vec::new();
        for outcome in outcomes {
            match outcome {
                FetchOutcome::Fetched { code, series } => per_instrument.push((code, series)),
                FetchOutcome::Missing { code, reason } => {
                    warn!(code = %code, reason, "instrument excluded from net-value merge");
                }
            }
        }

        let portfolio = netvalue::build_portfolio_series(&per_instrument, &weights);

        let fund_table = self
            .client
            .call(
                api::FUND_DAILY,
                json!({
                    "ts_code": self.profile.fund_code.as_str(),
                    "start_date": start.compact(),
                    "end_date": end.compact(),
                }),
                "ts_code,trade_date,unit_nav,close",
            )
            .await?;
        let mut fund = netvalue::fund_series(&fund_table);
        netvalue::normalize(&mut fund);

        let instruments = universe
            .iter()
            .map(|code| {
                let record = records.iter().find(|record| &record.code == code);
                InstrumentReport {
                    code: code.clone(),
                    name: record.and_then(|r| r.name.clone()),
                    industry: record.and_then(|r| r.industry.clone()),
                    market_cap: record.and_then(|r| r.market_cap),
                    weight_pct: weights.get(code).copied().unwrap_or(0.0) * 100.0,
                    dividend_yield: record.map(|r| r.dividend_yield).unwrap_or(0.0),
                    roce: record.and_then(|r| r.roce),
                }
            })
            .collect();

        let summary = BacktestSummary {
            portfolio_return_pct: netvalue::total_return_pct(&portfolio),
            fund_return_pct: netvalue::total_return_pct(&fund),
            requested: universe.len(),
            fetched: per_instrument.len(),
        };

        Ok(BacktestReport {
            portfolio,
            fund,
            instruments,
            summary,
        })
    }

    /// Windowed fundamentals fan-out. Each worker degrades its own
    /// failures table-by-table, so one unreachable statement never costs
    /// the instrument its record.
    async fn fetch_factor_records(&self, universe: &[TsCode]) -> Vec<FactorRecord> {
        run_windows(
            universe.to_vec(),
            self.profile.fundamentals_window,
            self.profile.window_delay,
            |code, _index| async move { self.factor_record(code).await },
        )
        .await
    }

    async fn factor_record(&self, code: TsCode) -> FactorRecord {
        let params = json!({ "ts_code": code.as_str() });

        let basic = self
            .optional_call(api::STOCK_BASIC, params.clone(), "ts_code,name,industry")
            .await;
        let daily_basic = self
            .optional_call(
                api::DAILY_BASIC,
                params.clone(),
                "ts_code,trade_date,dv_ratio,dv_ttm,total_mv",
            )
            .await;
        let income = self
            .optional_call(
                api::INCOME,
                params.clone(),
                "ts_code,end_date,ebit,operate_profit,total_profit",
            )
            .await;
        let balance = self
            .optional_call(
                api::BALANCESHEET,
                params,
                "ts_code,end_date,total_assets,total_cur_liab,total_hldr_eqy_exc_min_int",
            )
            .await;

        extract_factors(
            code,
            basic.as_ref(),
            daily_basic.as_ref(),
            income.as_ref(),
            balance.as_ref(),
        )
    }

    /// One provider call degraded to `None` on failure or an empty
    /// table. Used where a missing source feeds a fallback chain instead
    /// of failing the run.
    async fn optional_call(
        &self,
        api_name: &str,
        params: serde_json::Value,
        fields: &str,
    ) -> Option<Table> {
        match self.client.call(api_name, params, fields).await {
            Ok(table) if !table.is_empty() => Some(table),
            Ok(_) => None,
            Err(error) => {
                warn!(api_name, error = %error, "provider call degraded to absent");
                None
            }
        }
    }

    /// Windowed daily-bar fan-out with per-item fault isolation.
    async fn fetch_bar_series(
        &self,
        universe: &[TsCode],
        start: TradeDate,
        end: TradeDate,
    ) -> Vec<FetchOutcome> {
        run_windows(
            universe.to_vec(),
            self.profile.bars_window,
            self.profile.window_delay,
            |code, _index| async move {
                let params = json!({
                    "ts_code": code.as_str(),
                    "start_date": start.compact(),
                    "end_date": end.compact(),
                });
                match self
                    .client
                    .call(api::DAILY, params, "ts_code,trade_date,close")
                    .await
                {
                    Ok(table) => {
                        let series = netvalue::close_series(&table);
                        if series.is_empty() {
                            FetchOutcome::Missing {
                                code,
                                reason: String::from("no price data in the requested window"),
                            }
                        } else {
                            FetchOutcome::Fetched { code, series }
                        }
                    }
                    Err(error) => FetchOutcome::Missing {
                        code,
                        reason: error.to_string(),
                    },
                }
            },
        )
        .await
    }
}
