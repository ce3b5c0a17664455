use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::debug;

use crate::error::HttpError;
use crate::policy::HttpPolicy;
use crate::types::{HttpMethod, HttpRequest, HttpResponse};

/// Outbound HTTP transport.
#[async_trait]
pub trait HttpClient: Send + Sync {
  /// Send a request. Any received status is returned as a response.
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// [`HttpClient`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
  client: Client,
  policy: HttpPolicy,
}

impl ReqwestHttpClient {
  pub fn new(policy: HttpPolicy, timeout: Option<Duration>) -> Result<Self, HttpError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
      builder = builder.timeout(timeout);
    }

    Ok(Self {
      client: builder.build()?,
      policy,
    })
  }
}

impl Default for ReqwestHttpClient {
  fn default() -> Self {
    Self {
      client: Client::new(),
      policy: HttpPolicy::allow_all(),
    }
  }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
    let url = self.policy.check(&request.url)?;

    debug!(
      method = %request.method,
      host = url.host_str().unwrap_or_default(),
      path = url.path(),
      "http_request"
    );

    let mut builder = self.client.request(to_reqwest(request.method), url);
    for (key, value) in &request.headers {
      builder = builder.header(key, value);
    }
    if let Some(body) = request.body {
      builder = builder.body(body);
    }

    let response = builder.send().await?;

    let status = response.status().as_u16();
    let headers = response
      .headers()
      .iter()
      .filter_map(|(k, v)| {
        v.to_str()
          .ok()
          .map(|val| (k.as_str().to_string(), val.to_string()))
      })
      .collect();
    let body = response.text().await?;

    debug!(status, "http_response");

    Ok(HttpResponse {
      status,
      headers,
      body,
    })
  }
}

fn to_reqwest(method: HttpMethod) -> Method {
  match method {
    HttpMethod::Get => Method::GET,
    HttpMethod::Post => Method::POST,
    HttpMethod::Put => Method::PUT,
    HttpMethod::Delete => Method::DELETE,
    HttpMethod::Patch => Method::PATCH,
    HttpMethod::Head => Method::HEAD,
    HttpMethod::Options => Method::OPTIONS,
  }
}
