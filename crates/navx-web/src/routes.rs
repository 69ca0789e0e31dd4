use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use navx_backtest::BacktestReport;
use navx_core::TradeDate;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CustomBacktestRequest {
    pub codes: Vec<String>,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Deserialize)]
pub struct EtfBacktestRequest {
    pub start_date: String,
    pub end_date: String,
}

/// Uniform response wrapper: either `data` on success or a user-facing
/// `message` on failure. There is no partial-success shape.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(request_id: String, data: T) -> Self {
        Self {
            success: true,
            request_id,
            data: Some(data),
            message: None,
        }
    }

    fn failure(request_id: String, message: String) -> Self {
        Self {
            success: false,
            request_id,
            data: None,
            message: Some(message),
        }
    }
}

/// Backtest a caller-supplied instrument list with equal weights.
pub async fn custom_backtest(
    State(state): State<AppState>,
    Json(request): Json<CustomBacktestRequest>,
) -> Json<ApiResponse<BacktestReport>> {
    let request_id = Uuid::new_v4().to_string();
    info!(
        request_id = %request_id,
        codes = request.codes.len(),
        "custom backtest requested"
    );

    let (start, end) = match parse_window(&request.start_date, &request.end_date) {
        Ok(window) => window,
        Err(message) => return Json(ApiResponse::failure(request_id, message)),
    };

    match state.service.run_custom(&request.codes, start, end).await {
        Ok(report) => Json(ApiResponse::ok(request_id, report)),
        Err(err) => {
            error!(request_id = %request_id, error = %err, "custom backtest failed");
            Json(ApiResponse::failure(request_id, err.to_string()))
        }
    }
}

/// Backtest the ETF's replicated holdings with dual-factor weights.
pub async fn etf_backtest(
    State(state): State<AppState>,
    Json(request): Json<EtfBacktestRequest>,
) -> Json<ApiResponse<BacktestReport>> {
    let request_id = Uuid::new_v4().to_string();
    info!(request_id = %request_id, "etf replication backtest requested");

    let (start, end) = match parse_window(&request.start_date, &request.end_date) {
        Ok(window) => window,
        Err(message) => return Json(ApiResponse::failure(request_id, message)),
    };

    match state.service.run_etf(start, end).await {
        Ok(report) => Json(ApiResponse::ok(request_id, report)),
        Err(err) => {
            error!(request_id = %request_id, error = %err, "etf backtest failed");
            Json(ApiResponse::failure(request_id, err.to_string()))
        }
    }
}

fn parse_window(start: &str, end: &str) -> Result<(TradeDate, TradeDate), String> {
    let start = TradeDate::parse(start).map_err(|e| e.to_string())?;
    let end = TradeDate::parse(end).map_err(|e| e.to_string())?;
    if end < start {
        return Err(format!("end date {end} precedes start date {start}"));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_rejects_reversed_dates() {
        let err = parse_window("20240201", "20240101").expect_err("must fail");
        assert!(err.contains("precedes"));
    }

    #[test]
    fn window_rejects_malformed_dates() {
        let err = parse_window("2024-01-01", "20240201").expect_err("must fail");
        assert!(err.contains("YYYYMMDD"));
    }

    #[test]
    fn failure_response_omits_data_field() {
        let response: ApiResponse<()> =
            ApiResponse::failure(String::from("req-1"), String::from("boom"));
        let body = serde_json::to_value(&response).expect("serializable");

        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "boom");
        assert!(body.get("data").is_none());
    }
}
