//! Action executor
//!
//! Builds the request, hands it to the transport and decodes the response.

use crate::error::{EngineError, EngineResult};
use crate::http::body::is_json_content_type;
use crate::http::{
    HttpResponse, HttpTransport, PreparedRequest, ReqwestTransport, RequestBuilder, RunRequest,
    TransportSettings,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Decoded response payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    /// Non UTF-8 payload, base64 encoded
    Binary(String),
}

impl ResponseBody {
    /// JSON when the content type says so (empty bodies become null), text otherwise
    pub fn decode(content_type: Option<&str>, bytes: &[u8]) -> Self {
        let text = std::str::from_utf8(bytes);

        if content_type.map(is_json_content_type).unwrap_or(false) {
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return ResponseBody::Json(Value::Null);
            }
            if let Ok(value) = serde_json::from_slice(bytes) {
                return ResponseBody::Json(value);
            }
        }

        match text {
            Ok(text) => ResponseBody::Text(text.to_string()),
            Err(_) => ResponseBody::Binary(STANDARD.encode(bytes)),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            ResponseBody::Json(value) => value,
            ResponseBody::Text(text) | ResponseBody::Binary(text) => Value::String(text),
        }
    }
}

/// Result of a successful (2xx) action run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: ResponseBody,
}

impl ActionResult {
    fn from_response(response: HttpResponse) -> Self {
        let body = ResponseBody::decode(response.content_type(), &response.body);
        Self {
            status: response.status,
            headers: response.headers,
            body,
        }
    }
}

/// Executes actions against a data source through an [`HttpTransport`]
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor").finish_non_exhaustive()
    }
}

impl Executor {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Executor over a reqwest client built from `settings`
    pub fn with_settings(settings: &TransportSettings) -> EngineResult<Self> {
        Ok(Self::new(Arc::new(ReqwestTransport::new(settings)?)))
    }

    /// Build the request without sending it
    pub fn prepare(&self, request: &RunRequest<'_>) -> EngineResult<PreparedRequest> {
        RequestBuilder::build(request)
    }

    pub async fn run(&self, request: &RunRequest<'_>) -> EngineResult<ActionResult> {
        let prepared = self.prepare(request)?;
        self.execute(&prepared).await
    }

    /// Like [`Executor::run`], abandoning the call once `cancel` completes
    pub async fn run_until<F>(&self, request: &RunRequest<'_>, cancel: F) -> EngineResult<ActionResult>
    where
        F: Future<Output = ()>,
    {
        let prepared = self.prepare(request)?;
        tokio::select! {
            biased;
            _ = cancel => {
                debug!(method = %prepared.method, path = %prepared.url.path(), "request cancelled");
                Err(EngineError::cancelled())
            }
            result = self.execute(&prepared) => result,
        }
    }

    /// Send an already prepared request; non-2xx statuses become upstream errors
    pub async fn execute(&self, request: &PreparedRequest) -> EngineResult<ActionResult> {
        let started = Instant::now();
        let response = self.transport.send(request).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        debug!(
            method = %request.method,
            path = %request.url.path(),
            status = response.status,
            elapsed_ms,
            "action request completed"
        );

        if !response.is_success() {
            return Err(EngineError::upstream(response.status, response.text()));
        }

        Ok(ActionResult::from_response(response))
    }
}
