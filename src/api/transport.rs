//! Wire transport behind the API client.
//!
//! The client builds fully-formed requests and hands them to a `Transport`.
//! Production uses reqwest; tests plug in an in-memory backend.

use futures::future::BoxFuture;
use reqwest::Method;
use url::Url;

use super::error::ApiError;

/// A request ready to go on the wire
#[derive(Debug, Clone)]
pub struct ApiRequest {
  pub method: Method,
  pub url: Url,
  pub headers: Vec<(&'static str, String)>,
  pub body: Option<String>,
}

impl ApiRequest {
  /// Look up a header value by name (case-insensitive)
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }
}

/// Status and raw text of a response
#[derive(Debug, Clone)]
pub struct RawResponse {
  pub status: u16,
  pub body: String,
}

impl RawResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Sends requests and returns raw responses.
pub trait Transport: Send + Sync {
  fn send(&self, request: ApiRequest) -> BoxFuture<'static, Result<RawResponse, ApiError>>;
}

/// reqwest-backed transport. No retries and no timeout: a hung request only
/// blocks the operation that issued it.
#[derive(Clone)]
pub struct HttpTransport {
  client: reqwest::Client,
}

impl HttpTransport {
  pub fn new() -> Result<Self, ApiError> {
    let client = reqwest::Client::builder()
      .build()
      .map_err(|e| ApiError::Network(e.to_string()))?;
    Ok(Self { client })
  }
}

impl Transport for HttpTransport {
  fn send(&self, request: ApiRequest) -> BoxFuture<'static, Result<RawResponse, ApiError>> {
    let client = self.client.clone();
    Box::pin(async move {
      let mut builder = client.request(request.method, request.url);
      for (name, value) in request.headers {
        builder = builder.header(name, value);
      }
      if let Some(body) = request.body {
        builder = builder.body(body);
      }

      let response = builder
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
      let status = response.status().as_u16();
      let body = response
        .text()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;

      Ok(RawResponse { status, body })
    })
  }
}
