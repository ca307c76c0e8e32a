//! Signed HTTP transport for the Tencent Cloud ASR API.

use super::messages::{
    has_envelope, parse_envelope, CreateRecTaskRequest, CreateRecTaskResponse,
    DescribeTaskStatusRequest, DescribeTaskStatusResponse, SentenceRecognitionRequest,
    SentenceRecognitionResponse, ACTION_CREATE_REC_TASK, ACTION_DESCRIBE_TASK_STATUS,
    ACTION_SENTENCE_RECOGNITION,
};
use super::AsrApi;
use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::error::{AsrError, Result};
use crate::signing::{sign, Credential, SigningRequest, JSON_CONTENT_TYPE};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Default timeout for task submission and synchronous recognition.
const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 30;

/// Default timeout for a single status query.
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 10;

const CONNECT_TIMEOUT_SECS: u64 = 10;

const USER_AGENT: &str = concat!("feyn-asr/", env!("CARGO_PKG_VERSION"));

/// Transport options independent of credentials.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL, e.g. `https://asr.tencentcloudapi.com`.
    pub endpoint: String,
    /// Value of `X-TC-Version`.
    pub api_version: String,
    pub submit_timeout: Duration,
    pub query_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: "https://asr.tencentcloudapi.com".to_string(),
            api_version: "2019-06-14".to_string(),
            submit_timeout: Duration::from_secs(DEFAULT_SUBMIT_TIMEOUT_SECS),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }
}

impl ClientOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            endpoint: settings.tencent.endpoint.clone(),
            api_version: settings.tencent.api_version.clone(),
            submit_timeout: Duration::from_secs(settings.transcription.submit_timeout_secs),
            query_timeout: Duration::from_secs(settings.transcription.query_timeout_secs),
        }
    }
}

/// Client for the three ASR actions this crate uses.
///
/// Holds no per-request state; one instance can serve any number of concurrent
/// orchestrations.
pub struct TencentAsrClient {
    http: reqwest::Client,
    credential: Arc<Credential>,
    url: Url,
    host: String,
    api_version: String,
    submit_timeout: Duration,
    query_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl TencentAsrClient {
    /// Create a client with the given options, signing with the wall clock.
    pub fn new(credential: Arc<Credential>, options: ClientOptions) -> Result<Self> {
        let url = Url::parse(&options.endpoint).map_err(|e| {
            AsrError::Config(format!("Invalid endpoint '{}': {}", options.endpoint, e))
        })?;
        let host = host_header(&url)?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AsrError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            credential,
            url,
            host,
            api_version: options.api_version,
            submit_timeout: options.submit_timeout,
            query_timeout: options.query_timeout,
            clock: Arc::new(SystemClock),
        })
    }

    /// Create a client from loaded settings.
    pub fn from_settings(settings: &Settings, credential: Arc<Credential>) -> Result<Self> {
        Self::new(credential, ClientOptions::from_settings(settings))
    }

    /// Replace the clock used for request timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Host header value, which is also what gets signed.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Serialize, sign and send one action, then unwrap its response envelope.
    #[instrument(skip(self, body), fields(action = %action))]
    async fn call<B, R>(&self, action: &str, body: &B, timeout: Duration) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_string(body)
            .map_err(|e| AsrError::Signing(format!("payload serialization failed: {}", e)))?;

        // One clock read per call: the header and the signed date must agree.
        let timestamp = self.clock.now_unix();
        let signing_request = SigningRequest::post_json(&self.host, action, timestamp, payload);
        let authorization = sign(&self.credential, &signing_request)?;

        debug!(payload_bytes = signing_request.payload.len(), timestamp, "Sending request");

        let response = self
            .http
            .post(self.url.clone())
            .timeout(timeout)
            .header("Authorization", authorization)
            .header("Content-Type", JSON_CONTENT_TYPE)
            .header("Host", &self.host)
            .header("X-TC-Action", action)
            .header("X-TC-Version", &self.api_version)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("X-TC-Region", &self.credential.region)
            .body(signing_request.payload)
            .send()
            .await
            .map_err(AsrError::from_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(AsrError::from_transport)?;

        debug!(%status, response_bytes = text.len(), "Received response");

        if !status.is_success() {
            warn!(%status, "ASR endpoint returned non-success HTTP status");
            if !has_envelope(&text) {
                return Err(AsrError::Transport(format!(
                    "HTTP {} without a provider response",
                    status
                )));
            }
        }

        parse_envelope(&text).inspect_err(|e| {
            if matches!(e, AsrError::RemoteRejected { .. }) {
                debug!(body = %truncate(&text, 512), "Rejected response body");
            }
        })
    }
}

#[async_trait]
impl AsrApi for TencentAsrClient {
    async fn create_rec_task(
        &self,
        request: &CreateRecTaskRequest,
    ) -> Result<CreateRecTaskResponse> {
        self.call(ACTION_CREATE_REC_TASK, request, self.submit_timeout)
            .await
    }

    async fn describe_task_status(&self, task_id: u64) -> Result<DescribeTaskStatusResponse> {
        self.call(
            ACTION_DESCRIBE_TASK_STATUS,
            &DescribeTaskStatusRequest { task_id },
            self.query_timeout,
        )
        .await
    }

    async fn sentence_recognition(
        &self,
        request: &SentenceRecognitionRequest,
    ) -> Result<SentenceRecognitionResponse> {
        self.call(ACTION_SENTENCE_RECOGNITION, request, self.submit_timeout)
            .await
    }
}

/// `host[:port]` as reqwest will send it.
fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| AsrError::Config(format!("Endpoint '{}' has no host", url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Arc<Credential> {
        Arc::new(Credential::new("AKIDEXAMPLE", "SECRETEXAMPLE", "ap-guangzhou", "asr"))
    }

    #[test]
    fn test_host_header_default_port() {
        let client = TencentAsrClient::new(credential(), ClientOptions::default()).unwrap();
        assert_eq!(client.host(), "asr.tencentcloudapi.com");
    }

    #[test]
    fn test_host_header_explicit_port() {
        let options = ClientOptions {
            endpoint: "http://127.0.0.1:8089".to_string(),
            ..ClientOptions::default()
        };
        let client = TencentAsrClient::new(credential(), options).unwrap();
        assert_eq!(client.host(), "127.0.0.1:8089");
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let options = ClientOptions {
            endpoint: "not a url".to_string(),
            ..ClientOptions::default()
        };
        let err = TencentAsrClient::new(credential(), options).err().unwrap();
        assert!(matches!(err, AsrError::Config(_)));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
