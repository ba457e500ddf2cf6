use anyhow::{Context, Result as AnyResult};
use http::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::error::{BackendError, Result};

/// Thin client for the hosted data service's REST endpoint.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone, Debug)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

/// Create a client for `base_url` (e.g. "https://abc.supabase.co") using the anon key
pub fn create_client(base_url: &str, api_key: &str, timeout: Duration) -> AnyResult<BackendClient> {
    // No-op when main already installed it
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut base_url = Url::parse(base_url.trim())
        .with_context(|| format!("Invalid data service URL '{}'", base_url))?;
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        "apikey",
        HeaderValue::from_str(api_key).context("Anon key contains invalid characters")?,
    );
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key))
            .context("Anon key contains invalid characters")?,
    );

    let http = reqwest::Client::builder()
        .default_headers(headers)
        .user_agent(concat!("scoreboard/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")?;

    Ok(BackendClient {
        http,
        base_url,
        api_key: api_key.to_string(),
    })
}

impl BackendClient {
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// URL of a table under the REST prefix, with query parameters appended
    pub fn table_url(&self, table: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("{}rest/v1/{}", self.base_url.path(), table);
        url.set_path(&path);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        url
    }

    pub(crate) fn request(&self, method: Method, table: &str, params: &[(&str, &str)]) -> RequestBuilder {
        self.http.request(method, self.table_url(table, params))
    }
}

/// Send a request and fail on any non-success status
pub(crate) async fn send(builder: RequestBuilder, team: Option<&str>) -> Result<Response> {
    let response = builder.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::from_response(status.as_u16(), &body, team))
}

/// Send a request and decode its JSON body
pub(crate) async fn send_json<T: DeserializeOwned>(builder: RequestBuilder, team: Option<&str>) -> Result<T> {
    let response = send(builder, team).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
}
