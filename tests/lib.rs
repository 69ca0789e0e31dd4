//! Shared fixtures for the workspace-level behavioral suites.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use navx_backtest::{BacktestService, EtfProfile};
use navx_core::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ProviderConfig, TushareClient,
};

/// Scripted provider transport.
///
/// Responses are keyed by `api_name:ts_code`, falling back to the bare
/// `api_name`, so one script serves both per-instrument fan-outs and
/// singleton calls. Unscripted calls answer with an empty table, which
/// the pipeline treats as absent data rather than as a failure.
#[derive(Default)]
pub struct ScriptedProvider {
    tables: HashMap<String, Value>,
    failures: HashMap<String, (i64, String)>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful tabular payload under `key`.
    pub fn with_table(mut self, key: &str, fields: &[&str], items: Value) -> Self {
        self.tables
            .insert(key.to_owned(), json!({ "fields": fields, "items": items }));
        self
    }

    /// Script a provider-level failure (non-zero status) under `key`.
    pub fn with_failure(mut self, key: &str, code: i64, msg: &str) -> Self {
        self.failures.insert(key.to_owned(), (code, msg.to_owned()));
        self
    }

    /// Keys of every call seen so far, in arrival order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("call log should not be poisoned")
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// The `fields` string sent with the first call recorded under `key`.
    pub fn requested_fields(&self, key: &str) -> Option<String> {
        self.calls
            .lock()
            .expect("call log should not be poisoned")
            .iter()
            .find(|(recorded, _)| recorded == key)
            .map(|(_, fields)| fields.clone())
    }
}

impl HttpClient for ScriptedProvider {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let envelope: Value = match serde_json::from_str(&request.body) {
            Ok(value) => value,
            Err(error) => {
                let message = format!("unparsable request body: {error}");
                return Box::pin(async move { Err(HttpError::new(message)) });
            }
        };

        let api_name = envelope["api_name"].as_str().unwrap_or("").to_owned();
        let fields = envelope["fields"].as_str().unwrap_or("").to_owned();
        let key = match envelope["params"]["ts_code"].as_str() {
            Some(ts_code) => format!("{api_name}:{ts_code}"),
            None => api_name.clone(),
        };
        self.calls
            .lock()
            .expect("call log should not be poisoned")
            .push((key.clone(), fields));

        let body = if let Some((code, msg)) = self
            .failures
            .get(&key)
            .or_else(|| self.failures.get(&api_name))
        {
            json!({ "code": code, "msg": msg, "data": null })
        } else if let Some(table) = self.tables.get(&key).or_else(|| self.tables.get(&api_name)) {
            json!({ "code": 0, "msg": null, "data": table })
        } else {
            json!({ "code": 0, "msg": null, "data": { "fields": [], "items": [] } })
        };

        Box::pin(async move { Ok(HttpResponse::ok_json(body.to_string())) })
    }
}

/// Default profile with the inter-window delay removed so suites run
/// without wall-clock waits.
pub fn fast_profile() -> EtfProfile {
    EtfProfile {
        window_delay: Duration::ZERO,
        ..EtfProfile::default()
    }
}

/// A backtest service wired to a scripted transport with pacing disabled.
pub fn service_over(provider: Arc<ScriptedProvider>) -> BacktestService {
    let config = ProviderConfig::new("suite-token").with_call_interval(Duration::ZERO);
    let client = Arc::new(TushareClient::with_http_client(config, provider));
    BacktestService::new(client, fast_profile())
}

/// A bare client over a scripted transport, for provider-contract suites.
pub fn client_over(provider: Arc<ScriptedProvider>) -> TushareClient {
    let config = ProviderConfig::new("suite-token").with_call_interval(Duration::ZERO);
    TushareClient::with_http_client(config, provider)
}
