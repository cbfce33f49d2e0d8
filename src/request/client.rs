use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::BackendConfig;
use crate::request::model::RewriteRequest;

pub const PROCESS_PATH: &str = "/process";

/// What the backend answered, once the transport succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResponse {
    Success { result: String },
    Failure { status: u16, error: Option<String> },
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend answered {status} without a usable body: {reason}")]
    Contract { status: u16, reason: String },
}

/// One rewrite round trip. Implementations send exactly one request per call.
pub trait Backend: Send + Sync {
    fn process(&self, request: &RewriteRequest) -> Result<ProcessResponse, BackendError>;
}

#[derive(Debug, Deserialize)]
struct SuccessBody {
    result: String,
}

#[derive(Debug, Default, Deserialize)]
struct FailureBody {
    #[serde(default)]
    error: Option<String>,
}

/// Maps a status code and raw body onto the response schema.
pub fn interpret_response(status: u16, body: &str) -> Result<ProcessResponse, BackendError> {
    if (200..300).contains(&status) {
        let parsed: SuccessBody =
            serde_json::from_str(body).map_err(|e| BackendError::Contract {
                status,
                reason: e.to_string(),
            })?;
        return Ok(ProcessResponse::Success {
            result: parsed.result,
        });
    }

    // Proxies in front of the backend may answer with HTML; keep the status, drop the body.
    let parsed: FailureBody = serde_json::from_str(body).unwrap_or_default();
    Ok(ProcessResponse::Failure {
        status,
        error: parsed.error.filter(|e| !e.trim().is_empty()),
    })
}

pub struct HttpBackend {
    client: Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let timeout = config.timeout_secs.map(Duration::from_secs);
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint_url(&config.base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Backend for HttpBackend {
    fn process(&self, request: &RewriteRequest) -> Result<ProcessResponse, BackendError> {
        info!(
            endpoint = %self.endpoint,
            chars = request.paragraph.chars().count(),
            tone = %request.tone,
            language = %request.language,
            "sending rewrite request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()?;

        let status = response.status().as_u16();
        let body = response.text()?;
        let interpreted = interpret_response(status, &body);
        match &interpreted {
            Ok(ProcessResponse::Success { result }) => {
                info!(status, bytes = result.len(), "backend returned a result");
            }
            Ok(ProcessResponse::Failure { error, .. }) => {
                warn!(status, error = error.as_deref().unwrap_or(""), "backend reported failure");
            }
            Err(err) => warn!(%err, "backend response broke the contract"),
        }
        interpreted
    }
}

fn endpoint_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), PROCESS_PATH)
}
