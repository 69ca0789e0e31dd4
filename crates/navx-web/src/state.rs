use std::sync::Arc;

use navx_backtest::BacktestService;

/// Shared handler state. The service is stateless per request, so one
/// instance serves every connection.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BacktestService>,
}
