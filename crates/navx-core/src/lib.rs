//! # navx-core
//!
//! Provider boundary and scheduling primitives for navx:
//!
//! - [`Table`]: typed named-column view over the provider's parallel
//!   `fields`/`items` response shape
//! - [`TushareClient`]: paced single-call wrapper with no retries
//! - [`run_windows`]: bounded concurrent fan-out with positional result
//!   collection
//! - [`domain`]: exchange-qualified instrument codes and `YYYYMMDD`
//!   trade dates
//!
//! The crate holds no state across calls and persists nothing; every
//! pipeline run is transient by design.

pub mod batch;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod provider;
pub mod table;

pub use batch::{run_windows, DEFAULT_WINDOW_DELAY};
pub use domain::{TradeDate, TsCode};
pub use error::{ProviderError, TableError, ValidationError};
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use provider::{api, ProviderConfig, TushareClient, DEFAULT_CALL_INTERVAL, DEFAULT_ENDPOINT};
pub use table::{Row, Table, TabularResponse};
