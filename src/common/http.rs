//! networking module
//! function:
//! - wraps a reqwest client bound to one base url
//! - non 2xx answers are turned into CoeError
//! - input and output bodies are json

use serde_json::Value;
use super::error::CoeError;
use crate::trace;

const LOG_TAG: &str = "http";

pub struct HttpConnection {
    base_url: String,
    client: reqwest::Client,
}

impl HttpConnection {
    pub fn new(host: &str) -> Self {
        HttpConnection {
            base_url: normalize_base_url(host),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, api_url: &str) -> String {
        format!("{}/{}", self.base_url, api_url.trim_start_matches('/'))
    }

    /// wrapper for get api
    pub async fn api_get(&self, api_url: &str) -> Result<Value, CoeError> {
        let url = self.url(api_url);
        trace!(LOG_TAG, "GET {}", url);
        let resp = self.client.get(url.as_str()).send().await?;
        read_json(resp).await
    }

    /// wrapper for post api
    pub async fn api_post(&self, api_url: &str, data: Value) -> Result<Value, CoeError> {
        let url = self.url(api_url);
        trace!(LOG_TAG, "POST {} body: {}", url, data);
        let resp = self.client.post(url.as_str()).json(&data).send().await?;
        read_json(resp).await
    }
}

/// check the status code, an empty body is returned as null
async fn read_json(resp: reqwest::Response) -> Result<Value, CoeError> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(CoeError(format!("{} answered {}: {}", url, status, body)));
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body.as_str())
        .map_err(|e| CoeError(format!("{} answered malformed json: {e}", url)))
}

fn normalize_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}
