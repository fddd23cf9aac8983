use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::models::{
    CategoriesResponse, CountriesResponse, ErrorBody, HealthStatus, RecommendationsResponse,
    Tender, TenderPage,
};
use crate::params::ListParams;
use crate::retry::{is_retryable_status, with_retry_if, RetryConfig};

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";

#[derive(Error, Debug)]
pub enum ApiError {
    /// No usable response came back: connect failure, reset, timeout
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Request rejected (status {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },

    /// No credential token was supplied, so nothing was sent
    #[error("Authentication required")]
    AuthRequired,

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether a repeat of the same request has a chance of succeeding
    ///
    /// A 500 with an `error` body is the handler rejecting this request
    /// (e.g. a malformed id) and is not repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::NetworkError(e) => !e.is_builder(),
            ApiError::Rejected {
                status: 500,
                message: Some(_),
            } => false,
            ApiError::Rejected { status, .. } => reqwest::StatusCode::from_u16(*status)
                .map(is_retryable_status)
                .unwrap_or(false),
            ApiError::AuthRequired | ApiError::ParseError(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// HTTP client for the tender service
pub struct TenderClient {
    client: reqwest::Client,
    base_url: String,
    retry_config: RetryConfig,
}

impl TenderClient {
    /// Point the client at a specific deployment, e.g. `https://api.example.org/api`
    pub fn with_base_url(base_url: String) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(concat!(
                "TenderScout/",
                env!("CARGO_PKG_VERSION")
            )),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_config: RetryConfig::default(),
        })
    }

    /// Create client with custom retry configuration
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One page of tenders matching `params`
    pub async fn list_tenders(&self, params: &ListParams) -> Result<TenderPage> {
        debug!("GET /tenders?{}", params.to_query_string());
        self.get_json("tenders", &params.to_pairs(), None).await
    }

    /// A single tender by identifier
    pub async fn get_tender(&self, id: &str) -> Result<Tender> {
        let path = format!("tenders/{}", urlencoding::encode(id));
        self.get_json(&path, &[], None).await
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        let body: CategoriesResponse = self.get_json("tenders/categories", &[], None).await?;
        Ok(body.categories)
    }

    pub async fn countries(&self) -> Result<Vec<String>> {
        let body: CountriesResponse = self.get_json("tenders/countries", &[], None).await?;
        Ok(body.countries)
    }

    /// Personalized picks for the holder of `token`
    pub async fn recommendations(&self, token: &str) -> Result<Vec<Tender>> {
        if token.trim().is_empty() {
            return Err(ApiError::AuthRequired);
        }
        let body: RecommendationsResponse = self
            .get_json("user/recommendations", &[], Some(token))
            .await?;
        Ok(body.recommendations)
    }

    /// Liveness probe
    pub async fn health(&self) -> Result<HealthStatus> {
        self.get_json("health", &[], None).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        bearer: Option<&str>,
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);

        with_retry_if(&self.retry_config, ApiError::is_retryable, || {
            self.get_once(&url, query, bearer)
        })
        .await
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        bearer: Option<&str>,
    ) -> Result<T> {
        let mut request = self.client.get(url).query(query);

        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(rejection(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Turn a failed response into an error, keeping the server's message if it sent one
fn rejection(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty());

    ApiError::Rejected { status, message }
}
