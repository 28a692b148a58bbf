//! reqwest-backed HTTP transport.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::config::FetchConfig;
use super::protocols::{FetchObserver, FetchRequest, FetchResult, Fetcher, LoggingFetchObserver};
use crate::errors::{NetworkError, NetworkErrorKind, ResearchError};
use crate::observability::SpanTimer;

/// Shared HTTP client with content negotiation and transport-level retries.
///
/// Holds one connection pool for the life of the process. Cloning is cheap and
/// clones share the pool.
#[derive(Clone)]
pub struct HttpFetchClient {
    client: reqwest::Client,
    config: Arc<FetchConfig>,
    observer: Arc<dyn FetchObserver>,
}

impl HttpFetchClient {
    /// Builds a client from configuration.
    pub fn new(config: FetchConfig) -> Result<Self, ResearchError> {
        let headers = default_headers(&config)?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| ResearchError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: Arc::new(config),
            observer: Arc::new(LoggingFetchObserver),
        })
    }

    /// Replaces the fetch observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn FetchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn fetch_once(&self, request: &FetchRequest) -> Result<FetchResult, NetworkError> {
        let timer = SpanTimer::start("fetch");

        let mut builder = self.client.get(&request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&request.url, &e))?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let content_type = headers.get("content-type").cloned();

        // Failed responses are never parsed, skip the body.
        let text = if response.status().is_success() {
            response
                .text()
                .await
                .map_err(|e| classify_reqwest_error(&request.url, &e))?
        } else {
            String::new()
        };

        Ok(FetchResult {
            status_code,
            headers,
            text,
            final_url,
            content_type,
            duration_ms: timer.finish(),
        })
    }

    fn is_retryable(&self, err: &NetworkError) -> bool {
        let retry = &self.config.retry;
        match err.kind {
            NetworkErrorKind::Status(code) => retry.should_retry_status(code),
            NetworkErrorKind::Timeout | NetworkErrorKind::Unreachable => {
                retry.retry_transport_errors
            }
            NetworkErrorKind::Request => false,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetchClient {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResult, ResearchError> {
        let request_id = Uuid::new_v4().to_string();
        let retry = &self.config.retry;
        self.observer.on_fetch_start(&request.url, &request_id);

        let mut attempt = 0;
        loop {
            let err = match self.fetch_once(&request).await {
                Ok(result) => {
                    self.observer.on_fetch_complete(
                        &request.url,
                        &request_id,
                        result.duration_ms,
                        result.status_code,
                    );
                    if result.is_success() {
                        return Ok(result);
                    }
                    NetworkError::status(&request.url, result.status_code)
                }
                Err(err) => err,
            };

            if attempt < retry.max_retries && self.is_retryable(&err) {
                attempt += 1;
                self.observer
                    .on_fetch_retry(&request.url, &request_id, attempt, &err.message);
                tokio::time::sleep(retry.jittered_delay_for_attempt(attempt - 1)).await;
                continue;
            }

            self.observer
                .on_fetch_error(&request.url, &request_id, &err.to_string());
            return Err(err.into());
        }
    }
}

impl std::fmt::Debug for HttpFetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetchClient")
            .field("timeout_seconds", &self.config.timeout_seconds)
            .field("max_retries", &self.config.retry.max_retries)
            .finish()
    }
}

fn default_headers(config: &FetchConfig) -> Result<HeaderMap, ResearchError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, header_value(&config.accept)?);
    headers.insert(ACCEPT_LANGUAGE, header_value(&config.accept_language)?);

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ResearchError::config(format!("invalid header name '{name}': {e}")))?;
        headers.insert(name, header_value(value)?);
    }

    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, ResearchError> {
    HeaderValue::from_str(value)
        .map_err(|e| ResearchError::config(format!("invalid header value '{value}': {e}")))
}

fn classify_reqwest_error(url: &str, err: &reqwest::Error) -> NetworkError {
    let kind = if err.is_timeout() {
        NetworkErrorKind::Timeout
    } else if err.is_connect() {
        NetworkErrorKind::Unreachable
    } else {
        NetworkErrorKind::Request
    };
    NetworkError::new(url, kind, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websearch::config::RetryConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves the given raw HTTP responses, one per connection, in order.
    async fn serve(responses: Vec<String>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}"), hits)
    }

    fn response(status: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn fast_retry(max_retries: usize) -> FetchConfig {
        FetchConfig::new().with_timeout(2.0).with_retry(RetryConfig {
            max_retries,
            retry_delay_seconds: 0.01,
            jitter: false,
            ..RetryConfig::default()
        })
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let (base, _) = serve(vec![response("200 OK", "text/html", "<p>hi</p>")]).await;
        let client = HttpFetchClient::new(fast_retry(0)).unwrap();

        let result = client
            .fetch(FetchRequest::get(format!("{base}/page")).with_query("q", "a b"))
            .await
            .unwrap();

        assert_eq!(result.status_code, 200);
        assert_eq!(result.text, "<p>hi</p>");
        assert!(result.is_html());
        assert!(result.final_url.contains("q=a+b"));
    }

    #[tokio::test]
    async fn test_not_found_is_network_error_without_retry() {
        let (base, hits) = serve(vec![
            response("404 Not Found", "text/html", "missing"),
            response("200 OK", "text/html", "unexpected"),
        ])
        .await;
        let client = HttpFetchClient::new(fast_retry(2)).unwrap();

        let err = client.fetch(FetchRequest::get(base)).await.unwrap_err();

        match err {
            ResearchError::Network(net) => assert_eq!(net.status_code(), Some(404)),
            other => panic!("expected network error, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retryable_status_is_retried() {
        let (base, hits) = serve(vec![
            response("503 Service Unavailable", "text/html", "busy"),
            response("200 OK", "text/html", "ok"),
        ])
        .await;
        let client = HttpFetchClient::new(fast_retry(2)).unwrap();

        let result = client.fetch(FetchRequest::get(base)).await.unwrap();

        assert_eq!(result.text, "ok");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retries_exhausted_surfaces_last_status() {
        let (base, hits) = serve(vec![
            response("503 Service Unavailable", "text/html", ""),
            response("503 Service Unavailable", "text/html", ""),
        ])
        .await;
        let client = HttpFetchClient::new(fast_retry(1)).unwrap();

        let err = client.fetch(FetchRequest::get(base)).await.unwrap_err();

        assert!(err.is_network());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpFetchClient::new(fast_retry(0)).unwrap();
        let err = client
            .fetch(FetchRequest::get(format!("http://{addr}/")))
            .await
            .unwrap_err();

        match err {
            ResearchError::Network(net) => assert_eq!(net.kind, NetworkErrorKind::Unreachable),
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let Ok((_socket, _)) = listener.accept().await else {
                return;
            };
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        });

        let config = fast_retry(0).with_timeout(0.2);
        let client = HttpFetchClient::new(config).unwrap();
        let err = client
            .fetch(FetchRequest::get(format!("http://{addr}/")))
            .await
            .unwrap_err();

        match err {
            ResearchError::Network(net) => assert_eq!(net.kind, NetworkErrorKind::Timeout),
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_header_is_config_error() {
        let config = FetchConfig::new().with_header("bad header", "x");
        let err = HttpFetchClient::new(config).unwrap_err();
        assert!(matches!(err, ResearchError::Config(_)));
    }
}
