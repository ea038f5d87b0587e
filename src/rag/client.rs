//! RAG gateway client.
//!
//! Wire protocol: `POST {api_url}/api/v1/request` submits a question
//! and returns an opaque request id; `GET {api_url}/api/v1/request/{id}`
//! reports `processing`, `completed` or `failed`. Both carry the key in
//! an `ApiKey` header.

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{QuestionLedger, RagConfig, RagError};
use crate::database::RequestStatus;
use crate::utils::truncate_chars;

/// Sentinel request id for ledger rows produced in test mode.
pub const TEST_MODE_REQUEST_ID: &str = "test-mode";

/// Canned answer returned in test mode.
const TEST_MODE_ANSWER: &str = "Test answer [the RAG backend was not contacted]";

/// Questions are truncated to this many characters for ledger storage.
const STORED_TEXT_MAX_CHARS: usize = 200;

#[derive(Serialize)]
struct CreateRequest<'a> {
    text: &'a str,
    dialog_id: String,
}

#[derive(Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    response_text: Option<String>,
}

/// Client for the RAG backend.
pub struct RagClient {
    http: Client,
    config: RagConfig,
    ledger: Arc<dyn QuestionLedger>,
}

impl RagClient {
    pub fn new(config: RagConfig, ledger: Arc<dyn QuestionLedger>) -> anyhow::Result<Self> {
        // Per-call transport timeout; the poll budget is the overall
        // request timeout.
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        if config.test_mode {
            info!("RAG gateway in TEST MODE - returning canned answers");
        }

        Ok(Self {
            http,
            config,
            ledger,
        })
    }

    /// Ask a question on behalf of a user.
    ///
    /// Returns the answer text, or `None` when no answer could be
    /// produced for any reason. Whenever a ledger row was created it is
    /// left in a terminal state: `success` with an answer, `failed`
    /// otherwise.
    pub async fn ask(&self, text: &str, user_id: i64, username: Option<&str>) -> Option<String> {
        info!(
            "RAG request for user {} (@{}): {}",
            user_id,
            username.unwrap_or("-"),
            truncate_chars(text, 100)
        );

        if self.config.test_mode {
            return Some(self.answer_test_mode(text, user_id).await);
        }

        match self.ask_live(text, user_id).await {
            Ok(answer) => {
                info!(
                    "RAG answer for user {}, length {} chars",
                    user_id,
                    answer.chars().count()
                );
                Some(answer)
            }
            Err(err) => {
                warn!("RAG request for user {} produced no answer: {}", user_id, err);
                None
            }
        }
    }

    /// Test-mode answer: no network, a successful ledger row under the
    /// sentinel request id.
    async fn answer_test_mode(&self, text: &str, user_id: i64) -> String {
        self.record_pending(user_id, TEST_MODE_REQUEST_ID, text).await;
        self.record_status(TEST_MODE_REQUEST_ID, RequestStatus::Success)
            .await;
        TEST_MODE_ANSWER.to_string()
    }

    async fn ask_live(&self, text: &str, user_id: i64) -> Result<String, RagError> {
        let request_id = self.submit(text, user_id).await?;
        debug!("RAG request created with id {}", request_id);

        self.record_pending(user_id, &request_id, text).await;

        self.poll(&request_id).await
    }

    /// Create the request. Submission failures leave no ledger row; no
    /// retry at this stage.
    async fn submit(&self, text: &str, user_id: i64) -> Result<String, RagError> {
        let body = CreateRequest {
            text,
            dialog_id: user_id.to_string(),
        };

        let response = self
            .http
            .post(self.requests_url())
            .header("ApiKey", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::Submission(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Submission(format!(
                "unexpected status {}: {}",
                status,
                truncate_chars(&body, 200)
            )));
        }

        let created: CreateResponse = response
            .json()
            .await
            .map_err(|e| RagError::Submission(format!("malformed response body: {}", e)))?;

        Ok(created.id)
    }

    /// Poll for a terminal status, at most `max_attempts` times spaced
    /// `poll_interval` apart. Every exit path other than a completed
    /// answer marks the ledger row `failed`.
    async fn poll(&self, request_id: &str) -> Result<String, RagError> {
        for _attempt in 0..self.config.max_attempts {
            let body = match self.fetch_status(request_id).await {
                Ok(body) => body,
                Err(err) => {
                    self.record_status(request_id, RequestStatus::Failed).await;
                    return Err(err);
                }
            };

            match body.status.as_str() {
                "completed" => match body.response_text {
                    Some(answer) => {
                        self.record_status(request_id, RequestStatus::Success).await;
                        return Ok(answer);
                    }
                    None => {
                        warn!("RAG request {} completed without answer text", request_id);
                        self.record_status(request_id, RequestStatus::Failed).await;
                        return Err(RagError::RemoteFailed);
                    }
                },
                "failed" => {
                    self.record_status(request_id, RequestStatus::Failed).await;
                    return Err(RagError::RemoteFailed);
                }
                // Still processing; wait for the next poll.
                _ => {}
            }

            sleep(self.config.poll_interval).await;
        }

        self.record_status(request_id, RequestStatus::Failed).await;
        Err(RagError::Timeout {
            attempts: self.config.max_attempts,
        })
    }

    async fn fetch_status(&self, request_id: &str) -> Result<StatusResponse, RagError> {
        let url = format!("{}/{}", self.requests_url(), request_id);

        let response = self
            .http
            .get(url)
            .header("ApiKey", &self.config.api_key)
            .send()
            .await
            .map_err(|e| RagError::PollTransport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::PollTransport(format!(
                "unexpected status {}: {}",
                status,
                truncate_chars(&body, 200)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RagError::PollTransport(format!("malformed status body: {}", e)))
    }

    /// Audit writes must not fail the question; a broken ledger is an
    /// operator problem, not a user problem.
    async fn record_pending(&self, user_id: i64, request_id: &str, text: &str) {
        let stored = truncate_chars(text, STORED_TEXT_MAX_CHARS);
        if let Err(err) = self.ledger.insert_pending(user_id, request_id, &stored).await {
            warn!("Ledger insert for request {} failed: {}", request_id, err);
        }
    }

    async fn record_status(&self, request_id: &str, status: RequestStatus) {
        if let Err(err) = self.ledger.mark_status(request_id, status).await {
            warn!(
                "Ledger status update for request {} failed: {}",
                request_id, err
            );
        }
    }

    fn requests_url(&self) -> String {
        format!(
            "{}/api/v1/request",
            self.config.api_url.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[derive(Debug, Clone)]
    struct LedgerRow {
        user_id: i64,
        request_id: String,
        text: String,
        status: RequestStatus,
    }

    /// In-memory stand-in for the Mongo-backed ledger.
    #[derive(Default)]
    struct MemoryLedger {
        rows: Mutex<Vec<LedgerRow>>,
    }

    impl MemoryLedger {
        fn rows(&self) -> Vec<LedgerRow> {
            self.rows.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QuestionLedger for MemoryLedger {
        async fn insert_pending(
            &self,
            user_id: i64,
            request_id: &str,
            text: &str,
        ) -> anyhow::Result<()> {
            self.rows.lock().unwrap().push(LedgerRow {
                user_id,
                request_id: request_id.to_string(),
                text: text.to_string(),
                status: RequestStatus::Pending,
            });
            Ok(())
        }

        async fn mark_status(&self, request_id: &str, status: RequestStatus) -> anyhow::Result<()> {
            let mut rows = self.rows.lock().unwrap();
            for row in rows.iter_mut().filter(|r| r.request_id == request_id) {
                if row.status.accepts_mark(status) {
                    row.status = status;
                }
            }
            Ok(())
        }
    }

    fn test_config(api_url: &str, max_attempts: u32) -> RagConfig {
        RagConfig {
            api_url: api_url.to_string(),
            api_key: "secret-key".to_string(),
            poll_interval: Duration::from_millis(5),
            max_attempts,
            test_mode: false,
        }
    }

    fn client_with(
        config: RagConfig,
    ) -> (RagClient, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::default());
        let client = RagClient::new(config, ledger.clone()).unwrap();
        (client, ledger)
    }

    #[tokio::test]
    async fn test_mode_returns_canned_answer_without_network() {
        let config = RagConfig {
            // Unroutable on purpose; test mode must not touch it.
            api_url: "http://127.0.0.1:1".to_string(),
            api_key: String::new(),
            poll_interval: Duration::from_millis(5),
            max_attempts: 3,
            test_mode: true,
        };
        let (client, ledger) = client_with(config);

        let answer = client.ask("How often do I change oil?", 42, Some("bob")).await;
        assert_eq!(answer.as_deref(), Some(TEST_MODE_ANSWER));

        let rows = ledger.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, 42);
        assert_eq!(rows[0].request_id, TEST_MODE_REQUEST_ID);
        assert_eq!(rows[0].status, RequestStatus::Success);
    }

    #[tokio::test]
    async fn submit_failure_returns_none_and_no_ledger_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/request"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let (client, ledger) = client_with(test_config(&server.uri(), 3));

        let answer = client.ask("question", 1, None).await;
        assert_eq!(answer, None);
        assert!(ledger.rows().is_empty());
    }

    #[tokio::test]
    async fn answer_on_third_poll_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/request"))
            .and(header("ApiKey", "secret-key"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "id": "req-7" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        // First two polls report processing, the third completes.
        Mock::given(method("GET"))
            .and(path("/api/v1/request/req-7"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "status": "processing" })),
            )
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/request/req-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "completed",
                "response_text": "OK",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, ledger) = client_with(test_config(&server.uri(), 10));

        let answer = client.ask("question", 5, Some("alice")).await;
        assert_eq!(answer.as_deref(), Some("OK"));

        let rows = ledger.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].request_id, "req-7");
        assert_eq!(rows[0].status, RequestStatus::Success);
        // Question text is stored truncated with the row.
        assert_eq!(rows[0].text, "question");
    }

    #[tokio::test]
    async fn poll_exhaustion_marks_failed_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/request"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "req-8" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/request/req-8"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "status": "processing" })),
            )
            .expect(3)
            .mount(&server)
            .await;

        let (client, ledger) = client_with(test_config(&server.uri(), 3));

        let answer = client.ask("question", 5, None).await;
        assert_eq!(answer, None);

        let rows = ledger.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, RequestStatus::Failed);

        // Exactly max_attempts polls were made (wiremock verifies the
        // expect(3) on drop).
        server.verify().await;
    }

    #[tokio::test]
    async fn remote_failure_marks_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/request"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "req-9" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/request/req-9"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "status": "failed" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (client, ledger) = client_with(test_config(&server.uri(), 10));

        let answer = client.ask("question", 5, None).await;
        assert_eq!(answer, None);
        assert_eq!(ledger.rows()[0].status, RequestStatus::Failed);
    }

    #[tokio::test]
    async fn poll_transport_failure_marks_failed_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/request"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "req-10" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/request/req-10"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let (client, ledger) = client_with(test_config(&server.uri(), 10));

        let answer = client.ask("question", 5, None).await;
        assert_eq!(answer, None);
        assert_eq!(ledger.rows()[0].status, RequestStatus::Failed);
        server.verify().await;
    }

    #[tokio::test]
    async fn completed_without_text_marks_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/request"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "req-11" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/request/req-11"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "status": "completed" })),
            )
            .mount(&server)
            .await;

        let (client, ledger) = client_with(test_config(&server.uri(), 10));

        let answer = client.ask("question", 5, None).await;
        assert_eq!(answer, None);
        assert_eq!(ledger.rows()[0].status, RequestStatus::Failed);
    }

    #[tokio::test]
    async fn question_text_is_truncated_for_storage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/request"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "req-12" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/request/req-12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "completed",
                "response_text": "fine",
            })))
            .mount(&server)
            .await;

        let (client, ledger) = client_with(test_config(&server.uri(), 10));

        let long_question = "x".repeat(500);
        let answer = client.ask(&long_question, 5, None).await;
        assert_eq!(answer.as_deref(), Some("fine"));

        let stored = &ledger.rows()[0].text;
        assert_eq!(stored.chars().count(), STORED_TEXT_MAX_CHARS + 3);
        assert!(stored.ends_with("..."));
    }

    #[tokio::test]
    async fn mark_status_is_idempotent_for_same_terminal_status() {
        let ledger = MemoryLedger::default();
        ledger.insert_pending(1, "req-1", "q").await.unwrap();

        ledger
            .mark_status("req-1", RequestStatus::Success)
            .await
            .unwrap();
        ledger
            .mark_status("req-1", RequestStatus::Success)
            .await
            .unwrap();
        assert_eq!(ledger.rows()[0].status, RequestStatus::Success);

        // A conflicting terminal mark must not overwrite.
        ledger
            .mark_status("req-1", RequestStatus::Failed)
            .await
            .unwrap();
        assert_eq!(ledger.rows()[0].status, RequestStatus::Success);
    }
}
