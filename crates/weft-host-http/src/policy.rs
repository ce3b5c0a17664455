use url::Url;

use crate::error::{HttpError, strip_query};

/// Outbound host policy.
///
/// With no allow-list every host is permitted. An allow-list entry matches the
/// host exactly, and `*.example.com` matches any subdomain of `example.com`.
#[derive(Debug, Clone, Default)]
pub struct HttpPolicy {
  allowed_hosts: Option<Vec<String>>,
}

impl HttpPolicy {
  pub fn allow_all() -> Self {
    Self::default()
  }

  pub fn allow_hosts(hosts: Vec<String>) -> Self {
    Self {
      allowed_hosts: Some(hosts),
    }
  }

  /// Parse the URL and check its host against the policy.
  pub fn check(&self, raw: &str) -> Result<Url, HttpError> {
    let url = Url::parse(raw).map_err(|e| HttpError::InvalidUrl {
      url: strip_query(raw).to_string(),
      message: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
      return Err(HttpError::InvalidUrl {
        url: strip_query(raw).to_string(),
        message: format!("unsupported scheme '{}'", url.scheme()),
      });
    }

    let Some(allowed) = &self.allowed_hosts else {
      return Ok(url);
    };

    let host = url.host_str().unwrap_or_default();
    if allowed.iter().any(|pattern| host_matches(pattern, host)) {
      Ok(url)
    } else {
      Err(HttpError::HostNotAllowed {
        host: host.to_string(),
      })
    }
  }
}

fn host_matches(pattern: &str, host: &str) -> bool {
  match pattern.strip_prefix("*.") {
    Some(domain) => host
      .strip_suffix(domain)
      .is_some_and(|prefix| prefix.ends_with('.')),
    None => pattern.eq_ignore_ascii_case(host),
  }
}
