//! Job API client: the one place that talks HTTP to the jobs backend.
//!
//! Submits (create/update) are sent exactly once; a failure is reported to the
//! caller, who decides whether to try again. Reads may be retried on 5xx.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::collaborators::{Category, StaticCategories};
use crate::config::Config;
use crate::errors::SubmitError;
use crate::models::{ApiJobRecord, JobPayload};

/// Sends create/update bodies to the job API.
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn create(&self, payload: &JobPayload) -> Result<ApiJobRecord, SubmitError>;

    async fn update(
        &self,
        job_id: &str,
        payload: &JobPayload,
    ) -> Result<ApiJobRecord, SubmitError>;
}

/// Loads an existing job for editing.
#[async_trait]
pub trait JobFetcher: Send + Sync {
    async fn fetch(&self, job_id: &str) -> Result<ApiJobRecord, SubmitError>;
}

#[derive(Clone)]
pub struct HttpJobClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    max_retries: u32,
}

impl HttpJobClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, SubmitError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            max_retries,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SubmitError> {
        Self::new(
            config.api_url.clone(),
            config.api_token.clone(),
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )
    }

    /// Fetches `{id, name}` categories for display-name resolution.
    pub async fn fetch_categories(&self) -> Result<StaticCategories, SubmitError> {
        let value = self.get_with_retry("/categories").await?;
        let list = match unwrap_envelope(value, &["data", "categories"]) {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        let total = list.len();
        let categories: Vec<Category> = list
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        if categories.len() < total {
            warn!(
                "Skipped {} undecodable categories",
                total - categories.len()
            );
        }
        debug!("Loaded {} categories", categories.len());
        Ok(StaticCategories::new(categories))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.url(path))
            .header("accept", "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// GET with exponential backoff on 5xx and transport errors.
    async fn get_with_retry(&self, path: &str) -> Result<Value, SubmitError> {
        let mut last_error: Option<SubmitError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 500ms, 1s, 2s, ...
                let delay = Duration::from_millis(500 * (1 << (attempt - 1).min(6)));
                warn!(
                    "GET {} attempt {} failed, retrying after {}ms...",
                    path,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.request(Method::GET, path).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(SubmitError::Http(e));
                    continue;
                }
            };

            match read_json(response).await {
                Err(SubmitError::Api { status, message }) if status >= 500 => {
                    last_error = Some(SubmitError::Api { status, message });
                }
                other => return other,
            }
        }

        Err(last_error.unwrap_or(SubmitError::EmptyBody))
    }

    async fn send_payload(
        &self,
        method: Method,
        path: &str,
        payload: &JobPayload,
    ) -> Result<ApiJobRecord, SubmitError> {
        let response = self.request(method.clone(), path).json(payload).send().await?;
        let value = read_json(response).await?;
        info!("{} {} succeeded", method, path);
        Ok(ApiJobRecord::from_value(unwrap_envelope(value, &["data", "job"])))
    }
}

#[async_trait]
impl JobSubmitter for HttpJobClient {
    async fn create(&self, payload: &JobPayload) -> Result<ApiJobRecord, SubmitError> {
        self.send_payload(Method::POST, "/jobs", payload).await
    }

    async fn update(
        &self,
        job_id: &str,
        payload: &JobPayload,
    ) -> Result<ApiJobRecord, SubmitError> {
        self.send_payload(Method::PUT, &format!("/jobs/{job_id}"), payload)
            .await
    }
}

#[async_trait]
impl JobFetcher for HttpJobClient {
    async fn fetch(&self, job_id: &str) -> Result<ApiJobRecord, SubmitError> {
        let value = self.get_with_retry(&format!("/jobs/{job_id}")).await?;
        Ok(ApiJobRecord::from_value(unwrap_envelope(value, &["data", "job"])))
    }
}

/// Reads a response body as JSON, mapping non-2xx statuses to errors.
async fn read_json(response: Response) -> Result<Value, SubmitError> {
    let status = response.status();
    let body = response.text().await?;

    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(SubmitError::Unauthorized);
    }
    if !status.is_success() {
        warn!("Job API returned {}: {}", status, body);
        return Err(SubmitError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    if body.trim().is_empty() {
        return Err(SubmitError::EmptyBody);
    }
    Ok(serde_json::from_str(&body)?)
}

/// Peels envelope keys (`{"data": {"job": {...}}}`) until none is left.
fn unwrap_envelope(mut value: Value, keys: &[&str]) -> Value {
    loop {
        let inner = match &value {
            Value::Object(map) => keys
                .iter()
                .filter_map(|key| map.get(*key))
                .find(|inner| inner.is_object() || inner.is_array())
                .cloned(),
            _ => None,
        };
        match inner {
            Some(inner) => value = inner,
            None => return value,
        }
    }
}

/// Best-effort server message: `{message}`, `{error: {message}}` or `{error: "..."}`.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        v.get("message")
            .and_then(Value::as_str)
            .or_else(|| v.pointer("/error/message").and_then(Value::as_str))
            .or_else(|| v.get("error").and_then(Value::as_str))
    });
    match message {
        Some(m) => m.to_string(),
        None if body.trim().is_empty() => "No response body".to_string(),
        None => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use crate::collaborators::CategoryLookup;
    use crate::models::{FormState, SubmitStatus};
    use crate::posting::mapper::to_api;

    /// Serves every request with the same canned response and counts requests.
    async fn stub_server(status: u16, body: &'static str) -> (HttpJobClient, Arc<AtomicUsize>) {
        stub_server_with_retries(status, body, 0).await
    }

    async fn stub_server_with_retries(
        status: u16,
        body: &'static str,
        max_retries: u32,
    ) -> (HttpJobClient, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                read_request(&mut socket).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        let client = HttpJobClient::new(
            format!("http://{addr}"),
            Some("token".to_string()),
            Duration::from_secs(5),
            max_retries,
        )
        .unwrap();
        (client, hits)
    }

    /// Reads one request: headers plus `content-length` bytes of body.
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    return;
                }
            }
        }
    }

    fn draft_payload() -> JobPayload {
        to_api(
            &FormState {
                title: "Cook".to_string(),
                ..FormState::default()
            },
            SubmitStatus::Draft,
        )
    }

    #[tokio::test]
    async fn test_fetch_unwraps_nested_envelope() {
        let (client, hits) =
            stub_server(200, r#"{"success": true, "data": {"job": {"_id": "j1", "title": "Cook"}}}"#)
                .await;
        let record = client.fetch("j1").await.unwrap();
        assert_eq!(record.job_id(), Some("j1"));
        assert_eq!(record.title.as_deref(), Some("Cook"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_statuses() {
        let (client, _) = stub_server(401, r#"{"message": "token expired"}"#).await;
        assert!(matches!(client.fetch("j1").await, Err(SubmitError::Unauthorized)));

        let (client, _) = stub_server(403, "").await;
        assert!(matches!(
            client.create(&draft_payload()).await,
            Err(SubmitError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_client_error_carries_server_message() {
        let (client, hits) = stub_server(422, r#"{"error": {"message": "Title too long"}}"#).await;
        match client.update("j1", &draft_payload()).await {
            Err(SubmitError::Api { status, message }) => {
                assert_eq!(status, 422);
                assert_eq!(message, "Title too long");
            }
            other => panic!("expected API error, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_retries_server_errors() {
        let (client, hits) = stub_server_with_retries(503, r#"{"message": "busy"}"#, 1).await;
        assert!(matches!(
            client.fetch("j1").await,
            Err(SubmitError::Api { status: 503, .. })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_does_not_retry_client_errors() {
        let (client, hits) = stub_server_with_retries(404, r#"{"message": "Job not found"}"#, 2).await;
        assert!(matches!(
            client.fetch("missing").await,
            Err(SubmitError::Api { status: 404, .. })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_is_sent_once_on_server_error() {
        let (client, hits) = stub_server_with_retries(500, r#"{"message": "boom"}"#, 3).await;
        assert!(matches!(
            client.create(&draft_payload()).await,
            Err(SubmitError::Api { status: 500, .. })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_success_body() {
        let (client, _) = stub_server(200, "").await;
        assert!(matches!(
            client.create(&draft_payload()).await,
            Err(SubmitError::EmptyBody)
        ));
    }

    #[tokio::test]
    async fn test_fetch_categories_keeps_both_id_spellings() {
        let (client, _) = stub_server(
            200,
            r#"{"data": [{"_id": "c1", "id": "c1", "name": "Retail"}, {"_id": "c2", "name": "Logistics"}]}"#,
        )
        .await;
        let categories = client.fetch_categories().await.unwrap();
        assert_eq!(categories.name_for("c1").as_deref(), Some("Retail"));
        assert_eq!(categories.name_for("c2").as_deref(), Some("Logistics"));
    }

    #[test]
    fn test_unwrap_envelope_double_wrapped() {
        let value = json!({"data": {"job": {"title": "Cook"}}});
        assert_eq!(unwrap_envelope(value, &["data", "job"]), json!({"title": "Cook"}));
    }

    #[test]
    fn test_unwrap_envelope_data() {
        let value = json!({"success": true, "data": {"title": "Cook"}});
        assert_eq!(unwrap_envelope(value, &["data", "job"]), json!({"title": "Cook"}));
    }

    #[test]
    fn test_unwrap_envelope_job_key() {
        let value = json!({"job": {"title": "Cook"}});
        assert_eq!(unwrap_envelope(value, &["data", "job"]), json!({"title": "Cook"}));
    }

    #[test]
    fn test_unwrap_envelope_bare_record() {
        let value = json!({"title": "Cook", "data": "not an envelope"});
        assert_eq!(unwrap_envelope(value.clone(), &["data", "job"]), value);
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(error_message(r#"{"message": "Title too long"}"#), "Title too long");
        assert_eq!(error_message(r#"{"error": {"message": "Bad salary"}}"#), "Bad salary");
        assert_eq!(error_message(r#"{"error": "Nope"}"#), "Nope");
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
        assert_eq!(error_message(""), "No response body");
    }

    #[test]
    fn test_client_trims_base_url() {
        let client =
            HttpJobClient::new("https://api.example/v1/", None, Duration::from_secs(5), 0).unwrap();
        assert_eq!(client.url("/jobs"), "https://api.example/v1/jobs");
    }
}
