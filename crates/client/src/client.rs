use std::time::Duration;

use keybatch_engine::{BatchTransport, CalculationRequest, ResultRecord, TransportError};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Geometry service client (blocking).
#[derive(Clone)]
pub struct GeometryClient {
    http: reqwest::blocking::Client,
    api_base: Url,
    token: Option<String>,
}

/// Error type for service calls.
#[derive(Debug)]
pub enum ClientError {
    /// Connection, DNS, timeout
    Network(String),
    /// HTTP error with status code and body
    Http(u16, String),
    /// Body was not the expected JSON
    Parse(String),
    /// Base URL could not be parsed or cannot carry a path
    InvalidUrl(String),
    /// Service answered with `"status": "error"`
    Service(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Network(msg) => write!(f, "network error: {}", msg),
            ClientError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            ClientError::Parse(msg) => write!(f, "parse error: {}", msg),
            ClientError::InvalidUrl(msg) => write!(f, "invalid API base URL: {}", msg),
            ClientError::Service(msg) => write!(f, "service error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<ClientError> for TransportError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Network(msg) | ClientError::InvalidUrl(msg) => TransportError::Network(msg),
            ClientError::Http(code, body) => TransportError::Http(code, body),
            ClientError::Parse(msg) | ClientError::Service(msg) => TransportError::Parse(msg),
        }
    }
}

/// Per-row failure reported by the service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ErrorDetail {
    pub index: usize,
    pub error: String,
}

/// Envelope of `POST /batch`. Only `data` is required.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_processed: Option<usize>,
    #[serde(default)]
    pub successful: Option<usize>,
    #[serde(default)]
    pub errors: Option<usize>,
    pub data: Vec<Option<ResultRecord>>,
    #[serde(default)]
    pub error_details: Option<Vec<ErrorDetail>>,
}

#[derive(Serialize)]
struct BatchBody<'a> {
    calculations: &'a [CalculationRequest],
}

/// Envelope of the metadata endpoints.
#[derive(Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Vec<String>,
}

impl GeometryClient {
    /// `api_base` is the service root the endpoints hang off, e.g.
    /// `http://localhost:5000/api/geometry`.
    pub fn new(api_base: &str, token: Option<String>, timeout: Duration) -> Result<Self, ClientError> {
        let api_base = Url::parse(api_base.trim_end_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{api_base}: {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(api_base.to_string()));
        }

        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("kbatch/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_base,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_str()
    }

    /// Send one chunk of calculations.
    pub fn process_batch(&self, requests: &[CalculationRequest]) -> Result<BatchResponse, ClientError> {
        let url = self.endpoint(&["batch"])?;
        log::debug!("POST {} ({} calculation(s))", url, requests.len());
        let resp = self.send(self.http.post(url).json(&BatchBody { calculations: requests }))?;
        let body: BatchResponse = resp.json().map_err(|e| ClientError::Parse(e.to_string()))?;
        if body.status.as_deref() == Some("error") {
            return Err(ClientError::Service("batch rejected".into()));
        }
        Ok(body)
    }

    pub fn list_operations(&self) -> Result<Vec<String>, ClientError> {
        self.get_list(&["operations"])
    }

    pub fn list_shapes(&self) -> Result<Vec<String>, ClientError> {
        self.get_list(&["shapes"])
    }

    /// Shapes the service accepts for `operation` (the wire label).
    pub fn shapes_for_operation(&self, operation: &str) -> Result<Vec<String>, ClientError> {
        self.get_list(&["operations", operation, "shapes"])
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_list(&self, segments: &[&str]) -> Result<Vec<String>, ClientError> {
        let url = self.endpoint(segments)?;
        log::debug!("GET {}", url);
        let resp = self.send(self.http.get(url))?;
        let body: ListEnvelope = resp.json().map_err(|e| ClientError::Parse(e.to_string()))?;
        if body.status.as_deref() == Some("error") {
            return Err(ClientError::Service(
                body.message.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        Ok(body.data)
    }

    fn send(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response, ClientError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(ClientError::Http(status, body));
        }
        Ok(response)
    }
}

impl BatchTransport for GeometryClient {
    fn send_batch(
        &self,
        requests: &[CalculationRequest],
    ) -> Result<Vec<Option<ResultRecord>>, TransportError> {
        let response = self.process_batch(requests)?;
        if let Some(details) = &response.error_details {
            for detail in details {
                log::debug!("row {} of chunk rejected: {}", detail.index, detail.error);
            }
        }
        Ok(response.data)
    }
}
