//! The single seam between [`crate::ApiClient`] and the network.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, multipart, Method, StatusCode};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Debug, Clone)]
pub enum RequestBody {
    None,
    Json(Value),
    /// One file field, as sent by the resume upload form.
    Multipart {
        field: String,
        filename: String,
        content_type: String,
        bytes: Bytes,
    },
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Path below the base URL, starting with `/`.
    pub path: String,
    pub bearer: Option<String>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            bearer: None,
            body: RequestBody::None,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}

/// `reqwest` transport. The cookie store keeps the http-only refresh cookie
/// between calls, the same way a browser would.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.clone(), &url);
        if let Some(token) = &request.bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder = match request.body {
            RequestBody::None => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart {
                field,
                filename,
                content_type,
                bytes,
            } => {
                let part = multipart::Part::bytes(bytes.to_vec())
                    .file_name(filename)
                    .mime_str(&content_type)
                    .map_err(|e| ClientError::Transport(e.to_string()))?;
                builder.multipart(multipart::Form::new().part(field, part))
            }
        };

        tracing::debug!("{} {}", request.method, request.path);
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}
