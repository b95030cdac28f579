//! Thin HTTP layer: credential header, per-call timeouts and response classification.
//! Only JSON calls ask for `application/json`; attachment streams send no `Accept`.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::{RedmineConfig, API_KEY_HEADER};
use crate::error::{RedmineError, Result};
use crate::models::Fetched;

#[derive(Clone)]
pub struct Transport {
    http: HttpClient,
    root: String,
}

impl Transport {
    pub fn new(config: &RedmineConfig) -> Result<Self> {
        let http = build_http_client(config)?;
        Ok(Self {
            http,
            root: config.api_root(),
        })
    }

    /// Performs a GET and decodes the body as JSON. 404 is reported as
    /// [`Fetched::NotFound`]; every other non-2xx status is an error.
    pub async fn get_json(
        &self,
        path: &str,
        query: Option<&[(&str, &str)]>,
        timeout: Duration,
    ) -> Result<Fetched<Value>> {
        let request = self
            .request(path, query, timeout)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        let response = Self::send(path, request).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(path, "resource not found");
            return Ok(Fetched::NotFound);
        }
        if !status.is_success() {
            return Err(Self::status_error(path, response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| RedmineError::request(path, err))?;
        serde_json::from_slice::<Value>(&bytes)
            .map(Fetched::Found)
            .map_err(|err| RedmineError::Malformed {
                path: path.to_string(),
                message: err.to_string(),
            })
    }

    /// Performs a GET and returns only the status; the body is never read.
    pub async fn get_status(
        &self,
        path: &str,
        query: Option<&[(&str, &str)]>,
        timeout: Duration,
    ) -> Result<StatusCode> {
        let response = Self::send(path, self.request(path, query, timeout)).await?;
        Ok(response.status())
    }

    /// Performs a GET whose body the caller reads incrementally via
    /// [`Response::chunk`]. Any non-2xx status, 404 included, is an error.
    pub async fn get_stream(&self, path: &str, timeout: Duration) -> Result<Response> {
        let response = Self::send(path, self.request(path, None, timeout)).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::status_error(path, response).await)
        }
    }

    fn request(
        &self,
        path: &str,
        query: Option<&[(&str, &str)]>,
        timeout: Duration,
    ) -> RequestBuilder {
        let request = self.http.get(self.url_for(path)).timeout(timeout);
        match query {
            Some(params) => request.query(params),
            None => request,
        }
    }

    async fn send(path: &str, request: RequestBuilder) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|err| RedmineError::request(path, err))
    }

    async fn status_error(path: &str, response: Response) -> RedmineError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        RedmineError::http(path, status, &body)
    }

    fn url_for(&self, path: &str) -> String {
        let mut base = self.root.clone();
        base.push_str(path.trim_start_matches('/'));
        base
    }
}

fn build_http_client(config: &RedmineConfig) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();

    let mut key_value = header_value(config.api_key.clone())?;
    key_value.set_sensitive(true);
    let key_name = HeaderName::from_bytes(API_KEY_HEADER.as_bytes())
        .map_err(|err| RedmineError::Configuration(err.to_string()))?;
    headers.insert(key_name, key_value);
    headers.insert(USER_AGENT, header_value(config.user_agent.clone())?);

    HttpClient::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|err| RedmineError::Configuration(err.to_string()))
}

fn header_value(value: String) -> Result<HeaderValue> {
    HeaderValue::from_str(&value).map_err(|err| RedmineError::Configuration(err.to_string()))
}
