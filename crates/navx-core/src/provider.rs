use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::table::{TabularResponse, Table};

/// Operation catalog consumed from the provider. The names and their
/// semantic purpose are fixed by the upstream API.
pub mod api {
    /// Daily OHLCV bars for a stock.
    pub const DAILY: &str = "daily";
    /// Daily price/NAV bars for an exchange-traded fund.
    pub const FUND_DAILY: &str = "fund_daily";
    /// Static instrument metadata (display name, industry).
    pub const STOCK_BASIC: &str = "stock_basic";
    /// Issuer/company metadata.
    pub const STOCK_COMPANY: &str = "stock_company";
    /// Daily valuation metrics, including dividend ratios and market cap.
    pub const DAILY_BASIC: &str = "daily_basic";
    /// Fund holdings disclosure rows.
    pub const FUND_PORTFOLIO: &str = "fund_portfolio";
    /// Financial ratio indicators.
    pub const FINA_INDICATOR: &str = "fina_indicator";
    /// Balance sheet line items.
    pub const BALANCESHEET: &str = "balancesheet";
    /// Income statement line items.
    pub const INCOME: &str = "income";
    /// Dividend events.
    pub const DIVIDEND: &str = "dividend";
}

pub const DEFAULT_ENDPOINT: &str = "http://api.tushare.pro";

/// Gap enforced between consecutive provider calls.
pub const DEFAULT_CALL_INTERVAL: Duration = Duration::from_millis(100);

/// Immutable provider credentials and pacing, injected at construction.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub token: String,
    pub endpoint: String,
    pub call_interval: Duration,
}

impl ProviderConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            endpoint: String::from(DEFAULT_ENDPOINT),
            call_interval: DEFAULT_CALL_INTERVAL,
        }
    }

    /// Read the token (and optional endpoint override) from the
    /// environment. Returns `None` when no token is configured.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("TUSHARE_TOKEN").ok()?;
        let mut config = Self::new(token);
        if let Ok(endpoint) = std::env::var("TUSHARE_ENDPOINT") {
            config.endpoint = endpoint;
        }
        Some(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_call_interval(mut self, call_interval: Duration) -> Self {
        self.call_interval = call_interval;
        self
    }
}

type CallPacer = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Single-call client for the provider's tabular API.
///
/// Every call waits on a shared pacer so the process as a whole stays
/// under the provider's per-minute quota no matter how many pipeline
/// stages fan out concurrently. There are no retries: a failed call
/// surfaces immediately and the caller decides whether to degrade.
pub struct TushareClient {
    config: ProviderConfig,
    http: Arc<dyn HttpClient>,
    pacer: CallPacer,
}

impl TushareClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http_client(config: ProviderConfig, http: Arc<dyn HttpClient>) -> Self {
        let pacer = RateLimiter::direct(pacing_quota(config.call_interval));
        Self {
            config,
            http,
            pacer,
        }
    }

    /// Execute one provider call and reshape the payload into a [`Table`].
    ///
    /// Fails with [`ProviderError::Api`] when the provider returns a
    /// non-zero status code, carrying the provider's own message.
    pub async fn call(
        &self,
        api_name: &str,
        params: Value,
        fields: &str,
    ) -> Result<Table, ProviderError> {
        self.pacer.until_ready().await;

        let body = json!({
            "api_name": api_name,
            "token": self.config.token,
            "params": params,
            "fields": fields,
        });

        let request = HttpRequest::post_json(&self.config.endpoint, body.to_string());
        let response =
            self.http
                .execute(request)
                .await
                .map_err(|error| ProviderError::Transport {
                    api_name: api_name.to_owned(),
                    message: error.message().to_owned(),
                })?;

        if !response.is_success() {
            return Err(ProviderError::Transport {
                api_name: api_name.to_owned(),
                message: format!("upstream returned status {}", response.status),
            });
        }

        let envelope: ApiEnvelope =
            serde_json::from_str(&response.body).map_err(|error| ProviderError::Malformed {
                api_name: api_name.to_owned(),
                message: error.to_string(),
            })?;

        if envelope.code != 0 {
            return Err(ProviderError::Api {
                api_name: api_name.to_owned(),
                code: envelope.code,
                message: envelope
                    .msg
                    .unwrap_or_else(|| String::from("provider returned a non-zero status")),
            });
        }

        let data = envelope.data.ok_or_else(|| ProviderError::Malformed {
            api_name: api_name.to_owned(),
            message: String::from("response carried no data section"),
        })?;

        Ok(Table::from_response(data)?)
    }
}

/// Pacing quota: one call per interval, burst of one. An interval of zero
/// collapses to one millisecond so the quota stays constructible.
fn pacing_quota(call_interval: Duration) -> Quota {
    let period = call_interval.max(Duration::from_millis(1));
    Quota::with_period(period)
        .expect("pacing period is non-zero")
        .allow_burst(NonZeroU32::MIN)
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<TabularResponse>,
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::http_client::{HttpError, HttpResponse};

    struct ScriptedHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttpClient {
        fn returning(response: Result<HttpResponse, HttpError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn recorded(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn fast_config() -> ProviderConfig {
        ProviderConfig::new("token-123").with_call_interval(Duration::ZERO)
    }

    #[tokio::test]
    async fn successful_call_yields_named_column_table() {
        let body = json!({
            "code": 0,
            "msg": null,
            "data": {
                "fields": ["ts_code", "close"],
                "items": [["600519.SH", 1720.5]]
            }
        });
        let transport = ScriptedHttpClient::returning(Ok(HttpResponse::ok_json(body.to_string())));
        let client = TushareClient::with_http_client(fast_config(), transport.clone());

        let table = client
            .call(api::DAILY, json!({"ts_code": "600519.SH"}), "ts_code,close")
            .await
            .expect("call should succeed");

        assert_eq!(table.len(), 1);
        let row = table.row(0).expect("row exists");
        assert_eq!(row.str("ts_code"), Some("600519.SH"));
        assert_eq!(row.f64("close"), Some(1720.5));

        let sent = transport.recorded();
        assert_eq!(sent.len(), 1);
        let payload: Value = serde_json::from_str(&sent[0].body).expect("request body is JSON");
        assert_eq!(payload["api_name"], "daily");
        assert_eq!(payload["token"], "token-123");
    }

    #[tokio::test]
    async fn non_zero_status_carries_provider_message() {
        let body = json!({"code": 40203, "msg": "token is invalid", "data": null});
        let transport = ScriptedHttpClient::returning(Ok(HttpResponse::ok_json(body.to_string())));
        let client = TushareClient::with_http_client(fast_config(), transport);

        let err = client
            .call(api::DAILY_BASIC, json!({}), "")
            .await
            .expect_err("call must fail");

        match err {
            ProviderError::Api { code, message, .. } => {
                assert_eq!(code, 40203);
                assert_eq!(message, "token is invalid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_propagates_without_retry() {
        let transport = ScriptedHttpClient::returning(Err(HttpError::new("connection failed")));
        let client = TushareClient::with_http_client(fast_config(), transport.clone());

        let err = client
            .call(api::INCOME, json!({}), "ebit")
            .await
            .expect_err("call must fail");

        assert!(matches!(err, ProviderError::Transport { .. }));
        assert_eq!(transport.recorded().len(), 1);
    }

    #[tokio::test]
    async fn upstream_http_error_is_a_transport_failure() {
        let transport = ScriptedHttpClient::returning(Ok(HttpResponse {
            status: 503,
            body: String::new(),
        }));
        let client = TushareClient::with_http_client(fast_config(), transport);

        let err = client
            .call(api::BALANCESHEET, json!({}), "")
            .await
            .expect_err("call must fail");

        assert!(err.to_string().contains("status 503"));
    }
}
