//! HTTP capability for weft executors.
//!
//! All outbound traffic from node executors (HTTP nodes, LLM and image
//! providers) goes through an [`HttpClient`]. The production implementation is
//! [`ReqwestHttpClient`]; tests substitute a scripted client.

mod client;
mod error;
mod policy;
mod types;

pub use client::{HttpClient, ReqwestHttpClient};
pub use error::HttpError;
pub use policy::HttpPolicy;
pub use types::{HttpMethod, HttpRequest, HttpResponse};
