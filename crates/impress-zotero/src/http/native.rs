//! Native HTTP client using reqwest

use super::{HttpError, HttpResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::time::Duration;

/// Header the local API requires on every request from another application
pub const ALLOWED_REQUEST_HEADER: &str = "zotero-allowed-request";
pub const API_KEY_HEADER: &str = "zotero-api-key";

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(api_key: Option<&str>, timeout: Option<Duration>) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(ALLOWED_REQUEST_HEADER),
            HeaderValue::from_static("1"),
        );
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key).map_err(|e| HttpError::RequestFailed {
                message: format!("invalid API key header: {}", e),
            })?;
            headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        }

        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent("impress-zotero/0.1");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| HttpError::RequestFailed {
            message: e.to_string(),
        })?;

        Ok(Self { client })
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::RequestFailed {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();

        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let body = response.text().await.map_err(|e| HttpError::ParseError {
            message: e.to_string(),
        })?;

        Ok(HttpResponse {
            status,
            body,
            headers,
        })
    }

    pub async fn get_with_params(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<HttpResponse, HttpError> {
        let url =
            url::Url::parse_with_params(url, params).map_err(|_| HttpError::InvalidUrl {
                url: url.to_string(),
            })?;

        self.get(url.as_str()).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").finish_non_exhaustive()
    }
}
