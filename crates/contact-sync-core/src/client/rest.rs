//! Shared JSON-over-HTTP plumbing for the CRM clients.

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::UpstreamError;
use crate::error::{Error, Result};
use crate::models::ContactOrigin;
use crate::util::{is_http_url, normalize_text_option};

/// Bearer-authenticated JSON client bound to one CRM.
///
/// Non-2xx responses become [`UpstreamError`] carrying the status and body.
/// Nothing here retries.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    origin: ContactOrigin,
}

impl RestClient {
    pub fn new(origin: ContactOrigin) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("contact-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| UpstreamError::transport(origin, &error))?;
        Ok(Self { http, origin })
    }

    pub const fn origin(&self) -> ContactOrigin {
        self.origin
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<T, UpstreamError> {
        let request = self.request(Method::GET, url, token).query(query);
        self.execute(request).await
    }

    pub async fn post_json<B, T>(
        &self,
        url: &str,
        token: &str,
        body: &B,
    ) -> std::result::Result<T, UpstreamError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, url, token).json(body);
        self.execute(request).await
    }

    pub async fn patch_json<B, T>(
        &self,
        url: &str,
        token: &str,
        body: &B,
    ) -> std::result::Result<T, UpstreamError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PATCH, url, token).json(body);
        self.execute(request).await
    }

    fn request(&self, method: Method, url: &str, token: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(token)
            .header("Accept", "application/json")
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<T, UpstreamError> {
        let response = request
            .send()
            .await
            .map_err(|error| UpstreamError::transport(self.origin, &error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                source = self.origin.label(),
                status = status.as_u16(),
                "CRM request returned non-success status"
            );
            return Err(UpstreamError::http(self.origin, status.as_u16(), body));
        }

        let body = response
            .text()
            .await
            .map_err(|error| UpstreamError::transport(self.origin, &error))?;
        serde_json::from_str(&body).map_err(|error| {
            UpstreamError::http(
                self.origin,
                status.as_u16(),
                format!("invalid JSON payload: {error}"),
            )
        })
    }
}

/// Validate a base URL and strip trailing slashes.
pub fn normalize_base_url(raw: impl Into<String>) -> Result<String> {
    let url = normalize_text_option(Some(raw.into()))
        .ok_or_else(|| Error::InvalidInput("base URL must not be empty".to_string()))?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(
            "base URL must include http:// or https://".to_string(),
        ))
    }
}
