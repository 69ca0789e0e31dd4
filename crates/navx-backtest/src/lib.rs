//! # navx-backtest
//!
//! The data-orchestration and factor/weighting pipeline:
//!
//! - [`holdings`]: reporting-period selection over fund disclosure rows
//! - [`factors`]: dividend yield and ROCE extraction with multi-level
//!   fallbacks
//! - [`weights`]: dual-factor min-max scoring into portfolio weights
//! - [`netvalue`]: per-instrument return series merged into one
//!   normalized net-value curve
//! - [`service`]: the two backtest operations wired over the provider
//!   client and window scheduler
//!
//! Everything here is per-request and transient; nothing is cached or
//! persisted between runs.

pub mod error;
pub mod factors;
pub mod holdings;
pub mod netvalue;
pub mod report;
pub mod service;
pub mod weights;

pub use error::BacktestError;
pub use factors::{extract_factors, FactorRecord};
pub use holdings::{resolve_latest_period, HoldingRow};
pub use netvalue::{build_portfolio_series, close_series, fund_series, normalize, NetValuePoint};
pub use report::{BacktestReport, BacktestSummary, InstrumentReport};
pub use service::{BacktestService, EtfProfile, FetchOutcome};
pub use weights::{compute_weights, WeightMap};
