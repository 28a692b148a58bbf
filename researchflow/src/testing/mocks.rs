//! In-memory transport for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::errors::{NetworkError, ResearchError};
use crate::websearch::{FetchRequest, FetchResult, Fetcher};

#[derive(Debug, Clone)]
enum Canned {
    Response(FetchResult),
    Error(NetworkError),
}

/// A `Fetcher` that serves canned responses keyed by URL.
///
/// Query parameters are ignored for lookup but recorded. Unknown URLs fail
/// with a 404 `NetworkError`.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Canned>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl StaticFetcher {
    /// Creates a fetcher with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves an HTML body for a URL.
    #[must_use]
    pub fn with_html(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        let response = FetchResult::html(url.clone(), body);
        self.with_response(url, response)
    }

    /// Serves a full response for a URL.
    #[must_use]
    pub fn with_response(mut self, url: impl Into<String>, response: FetchResult) -> Self {
        self.responses.insert(url.into(), Canned::Response(response));
        self
    }

    /// Fails requests for a URL.
    #[must_use]
    pub fn with_error(mut self, url: impl Into<String>, error: NetworkError) -> Self {
        self.responses.insert(url.into(), Canned::Error(error));
        self
    }

    /// Requests seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests seen so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResult, ResearchError> {
        self.requests.lock().push(request.clone());

        match self.responses.get(&request.url) {
            Some(Canned::Response(response)) => Ok(response.clone()),
            Some(Canned::Error(error)) => Err(error.clone().into()),
            None => Err(NetworkError::status(request.url, 404).into()),
        }
    }
}
