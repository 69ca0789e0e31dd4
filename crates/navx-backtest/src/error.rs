use navx_core::{ProviderError, TradeDate, ValidationError};
use thiserror::Error;

/// Pipeline-level failures. Each variant's message is user-facing; the
/// HTTP layer forwards it verbatim in the failure response.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("the fund returned no holdings disclosure rows")]
    NoHoldings,
    #[error("no reporting period on or before {as_of} is available")]
    NoReportingPeriod { as_of: TradeDate },
    #[error("instrument list is empty after normalization")]
    EmptyUniverse,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
