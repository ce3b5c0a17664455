use thiserror::Error;

/// Errors produced by an [`HttpClient`](crate::HttpClient).
#[derive(Debug, Error)]
pub enum HttpError {
  #[error("invalid url '{url}': {message}")]
  InvalidUrl { url: String, message: String },

  #[error("unsupported HTTP method: {0}")]
  UnsupportedMethod(String),

  #[error("host '{host}' is not allowed by policy")]
  HostNotAllowed { host: String },

  #[error("request timed out")]
  Timeout,

  #[error("request failed: {message}")]
  Request { message: String },
}

// reqwest includes the request URL in its message. Query strings can carry
// credentials, so the URL is dropped.
impl From<reqwest::Error> for HttpError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      HttpError::Timeout
    } else {
      HttpError::Request {
        message: e.without_url().to_string(),
      }
    }
  }
}

/// `raw` up to its query string or fragment.
pub(crate) fn strip_query(raw: &str) -> &str {
  raw.split(['?', '#']).next().unwrap_or(raw)
}
