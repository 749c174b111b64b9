//! Authenticated clients for the two external APIs.
//!
//! Each client owns its own [`TokenCache`](crate::auth::TokenCache); they
//! never share tokens. Calls are made once; retrying a failed execution is
//! the journey platform's job, not ours.

pub mod management;
pub mod push;

pub use management::{Template, TemplateClient};
pub use push::{PushClient, PushOutcome, PushRequest};

use std::time::Duration;

/// Shared outbound HTTP client. One connection pool serves the token
/// endpoints and both APIs.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(5))
        .user_agent("PushActivity/1.0")
        .build()
        .expect("failed to build HTTP client")
}
