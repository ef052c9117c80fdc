//! @ai:module:intent HTTP client for the remote verification service
//! @ai:module:layer infrastructure
//! @ai:module:public_api VerificationGatewayTrait, HttpVerificationGateway, MockVerificationGateway, GenerationParams
//! @ai:module:stateless true

use crate::gateway::outcome::VerificationOutcome;
use anyhow::Result;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Maximum number of response-body characters kept in an HTTP error message.
const BODY_EXCERPT_CHARS: usize = 200;

/// @ai:intent Parameters accepted by the instance generator endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub id_instance: String,
    pub nb_vehicles: u32,
    pub nb_depots: u32,
    pub nb_garages: u32,
    pub nb_stations: u32,
    pub nb_produits: u32,
    pub max_coord: u32,
    pub min_capacite: u32,
    pub max_capacite: u32,
    pub min_transition_cost: u32,
    pub max_transition_cost: u32,
    pub min_demand: u32,
    pub max_demand: u32,
    pub seed: u64,
}

/// @ai:intent Trait for the verification service
#[allow(async_fn_in_trait)]
pub trait VerificationGatewayTrait: Send + Sync {
    /// @ai:intent Liveness probe; any failure resolves to false
    async fn is_alive(&self, timeout: Duration) -> bool;

    /// @ai:intent Upload an instance/solution pair and normalize the verdict; never fails
    async fn verify(&self, instance_path: &Path, solution_path: &Path, timeout: Duration) -> VerificationOutcome;

    /// @ai:intent Request raw content of a generated instance; None unless the service answers 200
    async fn generate(&self, params: &GenerationParams, timeout: Duration) -> Option<String>;
}

/// @ai:intent reqwest-backed gateway bound to one base URL
pub struct HttpVerificationGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVerificationGateway {
    /// @ai:intent Create a gateway for the service at `base_url`
    /// @ai:effects pure
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// @ai:effects pure
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// @ai:intent Absolute URL of an endpoint
    /// @ai:effects pure
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// @ai:intent Read a file into a multipart part named after the file
    /// @ai:effects fs:read
    async fn file_part(path: &Path) -> Result<Part> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")?)
    }

    /// @ai:intent Map a transport error to an infeasible outcome
    /// @ai:effects pure
    fn transport_failure(error: &reqwest::Error, timeout: Duration) -> VerificationOutcome {
        if error.is_timeout() {
            VerificationOutcome::failure(format!(
                "Verification service timed out (> {}s)",
                timeout.as_secs_f64()
            ))
        } else if error.is_connect() {
            VerificationOutcome::failure(format!("Connection error: {error}"))
        } else {
            VerificationOutcome::failure(format!("Request error: {error}"))
        }
    }
}

impl VerificationGatewayTrait for HttpVerificationGateway {
    /// @ai:intent GET /health and require a 200
    /// @ai:effects network
    async fn is_alive(&self, timeout: Duration) -> bool {
        match self
            .client
            .get(self.endpoint("/health"))
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                tracing::debug!("Health check failed: {}", e);
                false
            }
        }
    }

    /// @ai:intent POST both files to /model/verify as multipart
    /// @ai:effects fs:read, network
    async fn verify(&self, instance_path: &Path, solution_path: &Path, timeout: Duration) -> VerificationOutcome {
        if !instance_path.exists() {
            return VerificationOutcome::failure(format!(
                "Instance file not found: {}",
                instance_path.display()
            ));
        }

        if !solution_path.exists() {
            return VerificationOutcome::failure(format!(
                "Solution file not found: {}",
                solution_path.display()
            ));
        }

        let form = match (Self::file_part(instance_path).await, Self::file_part(solution_path).await) {
            (Ok(instance), Ok(solution)) => Form::new()
                .part("instance_file", instance)
                .part("solution_file", solution),
            (Err(e), _) | (_, Err(e)) => {
                return VerificationOutcome::failure(format!("Failed to read upload files: {e}"));
            }
        };

        let response = match self
            .client
            .post(self.endpoint("/model/verify"))
            .multipart(form)
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Self::transport_failure(&e, timeout),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Self::transport_failure(&e, timeout),
        };

        if status != StatusCode::OK {
            let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
            return VerificationOutcome::failure(format!("HTTP error {}: {}", status.as_u16(), excerpt));
        }

        VerificationOutcome::from_payload(&body)
    }

    /// @ai:intent POST the parameters as JSON to /generator/generate
    /// @ai:effects network
    async fn generate(&self, params: &GenerationParams, timeout: Duration) -> Option<String> {
        let response = match self
            .client
            .post(self.endpoint("/generator/generate"))
            .json(params)
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Instance generation request failed: {}", e);
                return None;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("Instance generation failed with status {}", status.as_u16());
            return None;
        }

        match response.text().await {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::warn!("Failed to read generated instance: {}", e);
                None
            }
        }
    }
}

/// @ai:intent Offline gateway returning canned answers and counting calls
pub struct MockVerificationGateway {
    alive: bool,
    outcome: VerificationOutcome,
    generated: Option<String>,
    health_calls: AtomicUsize,
    verify_calls: AtomicUsize,
}

impl MockVerificationGateway {
    /// @ai:intent Create a mock with a fixed liveness answer and verdict
    /// @ai:effects pure
    pub fn new(alive: bool, outcome: VerificationOutcome) -> Self {
        Self {
            alive,
            outcome,
            generated: None,
            health_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        }
    }

    /// @ai:intent Set the content returned by `generate`
    /// @ai:effects pure
    pub fn with_generated(mut self, content: String) -> Self {
        self.generated = Some(content);
        self
    }

    /// @ai:effects pure
    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    /// @ai:effects pure
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl VerificationGatewayTrait for MockVerificationGateway {
    async fn is_alive(&self, _timeout: Duration) -> bool {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        self.alive
    }

    async fn verify(&self, _instance_path: &Path, _solution_path: &Path, _timeout: Duration) -> VerificationOutcome {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }

    async fn generate(&self, _params: &GenerationParams, _timeout: Duration) -> Option<String> {
        self.generated.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const SHORT: Duration = Duration::from_secs(5);

    /// Consume one HTTP request (headers plus body) from the socket.
    async fn read_request(socket: &mut TcpStream) {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buffer.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&buffer[..header_end]).to_lowercase();
        let chunked = headers.contains("transfer-encoding: chunked");
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        let mut body = buffer[header_end..].to_vec();
        loop {
            let done = if chunked {
                body.ends_with(b"0\r\n\r\n")
            } else {
                body.len() >= content_length
            };
            if done {
                return;
            }
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            body.extend_from_slice(&chunk[..n]);
        }
    }

    /// Serve the same canned response to every connection; returns the base URL.
    async fn serve(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{addr}")
    }

    /// Accept connections and never answer.
    async fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        format!("http://{addr}")
    }

    /// Address with nothing listening.
    async fn closed_address() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    fn write_pair(temp: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
        let instance = temp.path().join("MPVRP_test.dat");
        let solution = temp.path().join("Sol_MPVRP_test.dat");
        std::fs::write(&instance, "1 1 1 1 1\n").unwrap();
        std::fs::write(&solution, "0\n0\n").unwrap();
        (instance, solution)
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let gateway = HttpVerificationGateway::new("http://localhost:8000/").unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:8000");
        assert_eq!(gateway.endpoint("/health"), "http://localhost:8000/health");
    }

    #[tokio::test]
    async fn test_is_alive_on_200() {
        let url = serve("200 OK", r#"{"status":"ok"}"#).await;
        let gateway = HttpVerificationGateway::new(&url).unwrap();
        assert!(gateway.is_alive(SHORT).await);
    }

    #[tokio::test]
    async fn test_is_not_alive_on_503() {
        let url = serve("503 Service Unavailable", "").await;
        let gateway = HttpVerificationGateway::new(&url).unwrap();
        assert!(!gateway.is_alive(SHORT).await);
    }

    #[tokio::test]
    async fn test_is_not_alive_when_unreachable() {
        let url = closed_address().await;
        let gateway = HttpVerificationGateway::new(&url).unwrap();
        assert!(!gateway.is_alive(SHORT).await);
    }

    #[tokio::test]
    async fn test_verify_missing_file_skips_network() {
        let temp = TempDir::new().unwrap();
        let (instance, _) = write_pair(&temp);
        let gateway = HttpVerificationGateway::new(&closed_address().await).unwrap();

        let outcome = gateway
            .verify(&instance, &temp.path().join("missing.dat"), SHORT)
            .await;
        assert!(!outcome.feasible);
        assert!(outcome.errors[0].starts_with("Solution file not found"));

        let outcome = gateway
            .verify(&temp.path().join("missing.dat"), &instance, SHORT)
            .await;
        assert!(outcome.errors[0].starts_with("Instance file not found"));
    }

    #[tokio::test]
    async fn test_verify_success_payload() {
        let temp = TempDir::new().unwrap();
        let (instance, solution) = write_pair(&temp);
        let url = serve(
            "200 OK",
            r#"{"feasible": true, "errors": [], "metrics": {"total_distance": 12.5, "total_changeover_cost": 3.0}}"#,
        )
        .await;
        let gateway = HttpVerificationGateway::new(&url).unwrap();

        let outcome = gateway.verify(&instance, &solution, SHORT).await;
        assert!(outcome.feasible, "errors: {:?}", outcome.errors);
        let extracted = outcome.metrics.unwrap().extract();
        assert_eq!(extracted.total_cost(), Some(15.5));
    }

    #[tokio::test]
    async fn test_verify_http_error_includes_status_and_excerpt() {
        let temp = TempDir::new().unwrap();
        let (instance, solution) = write_pair(&temp);
        let url = serve("422 Unprocessable Entity", r#"{"detail":"bad solution file"}"#).await;
        let gateway = HttpVerificationGateway::new(&url).unwrap();

        let outcome = gateway.verify(&instance, &solution, SHORT).await;
        assert!(!outcome.feasible);
        assert!(outcome.errors[0].starts_with("HTTP error 422"));
        assert!(outcome.errors[0].contains("bad solution file"));
        assert!(outcome.metrics.is_none());
    }

    #[tokio::test]
    async fn test_verify_timeout_is_reported() {
        let temp = TempDir::new().unwrap();
        let (instance, solution) = write_pair(&temp);
        let gateway = HttpVerificationGateway::new(&serve_silence().await).unwrap();

        let outcome = gateway
            .verify(&instance, &solution, Duration::from_millis(200))
            .await;
        assert!(!outcome.feasible);
        assert!(outcome.errors[0].contains("timed out"));
    }

    #[tokio::test]
    async fn test_verify_connection_error_is_reported() {
        let temp = TempDir::new().unwrap();
        let (instance, solution) = write_pair(&temp);
        let gateway = HttpVerificationGateway::new(&closed_address().await).unwrap();

        let outcome = gateway.verify(&instance, &solution, SHORT).await;
        assert!(!outcome.feasible);
        assert!(outcome.errors[0].starts_with("Connection error"));
    }

    #[tokio::test]
    async fn test_generate_returns_body_on_200() {
        let url = serve("200 OK", "2 1 1 3 2\n").await;
        let gateway = HttpVerificationGateway::new(&url).unwrap();

        let content = gateway.generate(&sample_params(), SHORT).await;
        assert_eq!(content.as_deref(), Some("2 1 1 3 2\n"));
    }

    #[tokio::test]
    async fn test_generate_returns_none_on_error_status() {
        let url = serve("500 Internal Server Error", "boom").await;
        let gateway = HttpVerificationGateway::new(&url).unwrap();
        assert!(gateway.generate(&sample_params(), SHORT).await.is_none());

        let gateway = HttpVerificationGateway::new(&closed_address().await).unwrap();
        assert!(gateway.generate(&sample_params(), SHORT).await.is_none());
    }

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let mock = MockVerificationGateway::new(true, VerificationOutcome::default())
            .with_generated("content".to_string());

        assert!(mock.is_alive(SHORT).await);
        let _ = mock.verify(Path::new("a"), Path::new("b"), SHORT).await;
        let _ = mock.verify(Path::new("a"), Path::new("b"), SHORT).await;

        assert_eq!(mock.health_calls(), 1);
        assert_eq!(mock.verify_calls(), 2);
        assert_eq!(mock.generate(&sample_params(), SHORT).await.as_deref(), Some("content"));
    }

    fn sample_params() -> GenerationParams {
        GenerationParams {
            id_instance: "small_01".to_string(),
            nb_vehicles: 2,
            nb_depots: 1,
            nb_garages: 1,
            nb_stations: 5,
            nb_produits: 2,
            max_coord: 100,
            min_capacite: 15000,
            max_capacite: 20000,
            min_transition_cost: 10,
            max_transition_cost: 30,
            min_demand: 1000,
            max_demand: 3000,
            seed: 42,
        }
    }
}
