//! Bearer-token acquisition for the external APIs.
//!
//! Each external API gets its own [`TokenCache`], which hands out a cached
//! token while it is fresh and coalesces concurrent refreshes into a single
//! outstanding fetch (single-flight). The actual token endpoint call lives
//! behind the [`TokenFetcher`] trait so tests can inject counting fakes.

pub mod oauth;
pub mod token_cache;

pub use oauth::ClientCredentialsFetcher;
pub use token_cache::{IssuedToken, TokenCache, TokenError, TokenFetcher};
