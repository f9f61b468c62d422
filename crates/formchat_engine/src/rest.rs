use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use engine_logging::{engine_debug, engine_warn};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::records::Record;
use crate::store::Collection;
use crate::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub extract_path: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            extract_path: "/extract".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Source of the bearer token for REST calls (the auth collaborator).
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Option<String>;
}

/// Fixed token, e.g. from configuration or the environment.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token.filter(|t| !t.trim().is_empty()))
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Authenticated JSON client for the templates, forms and extraction endpoints.
#[derive(Clone)]
pub struct RestClient {
    settings: ApiSettings,
    base: Url,
    client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
}

impl RestClient {
    pub fn new(settings: ApiSettings, tokens: Arc<dyn TokenProvider>) -> Result<Self, FetchError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
            tokens,
        })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// Appends path segments to the base url; segments are percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::new(FailureKind::InvalidUrl, "base url cannot be a base"))?
            .pop_if_empty()
            .extend(segments.iter().filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    pub(crate) async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, FetchError> {
        let token = self
            .tokens
            .bearer_token()
            .await
            .ok_or_else(|| FetchError::new(FailureKind::Unauthorized, "please login again"))?;
        engine_debug!("{} {}", method, url);
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, FetchError> {
        let response = checked(request).await?;
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&bytes)
            .map_err(|err| FetchError::new(FailureKind::InvalidResponse, err.to_string()))
    }

    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> Result<(), FetchError> {
        checked(request).await.map(|_| ())
    }
}

async fn checked(request: RequestBuilder) -> Result<reqwest::Response, FetchError> {
    let response = request.send().await.map_err(map_reqwest_error)?;
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FetchError::new(FailureKind::Unauthorized, "please login again"));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        engine_warn!("request failed with {}: {}", status, body);
        return Err(FetchError::new(
            FailureKind::HttpStatus(status.as_u16()),
            if body.is_empty() { status.to_string() } else { body },
        ));
    }
    Ok(response)
}

#[async_trait]
impl<R: Record> Collection<R> for RestClient {
    async fn list(&self) -> Result<Vec<R>, FetchError> {
        let url = self.endpoint(&[R::COLLECTION.path()])?;
        let request = self.request(Method::GET, url).await?;
        self.send_json(request).await
    }

    async fn create(&self, draft: &R::Draft) -> Result<R, FetchError> {
        let url = self.endpoint(&[R::COLLECTION.path()])?;
        let request = self.request(Method::POST, url).await?.json(draft);
        self.send_json(request).await
    }

    async fn update(&self, id: &str, patch: &R::Patch) -> Result<R, FetchError> {
        let url = self.endpoint(&[R::COLLECTION.path(), id])?;
        let request = self.request(Method::PUT, url).await?.json(patch);
        self.send_json(request).await
    }

    async fn delete(&self, id: &str) -> Result<(), FetchError> {
        let url = self.endpoint(&[R::COLLECTION.path(), id])?;
        let request = self.request(Method::DELETE, url).await?;
        self.send_empty(request).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
