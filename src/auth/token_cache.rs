use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tokio::sync::Mutex;

/// A token is only handed out while `now < expiry − margin`, so no caller
/// ever presents a token that expires mid-flight.
pub const EXPIRY_SAFETY_MARGIN_SECS: i64 = 60;

/// What the token endpoint issues: the bearer value plus its lifetime.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: u64,
}

/// Errors are `Clone` because every waiter on a coalesced fetch receives
/// the same failure.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("token credentials are not configured: {0}")]
    ConfigurationMissing(String),

    #[error("token acquisition failed: {0}")]
    AcquisitionFailed(String),
}

/// The token-endpoint call, supplied at construction time.
#[async_trait]
pub trait TokenFetcher: Send + Sync + 'static {
    async fn fetch(&self) -> Result<IssuedToken, TokenError>;
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::seconds(EXPIRY_SAFETY_MARGIN_SECS)
    }
}

type TokenFlight = Shared<BoxFuture<'static, Result<CachedToken, TokenError>>>;

struct CacheState {
    token: Option<CachedToken>,
    /// At most one outstanding refresh; concurrent callers await the same
    /// shared future. The generation tag lets a completing waiter tell
    /// whether the in-flight slot still belongs to its fetch.
    in_flight: Option<(u64, TokenFlight)>,
    generation: u64,
}

/// Per-API token cache with single-flight refresh.
///
/// One instance exists per external API (management, push); instances share
/// nothing. The lock is only held to inspect or swap state; the fetch
/// itself is awaited outside the critical section.
pub struct TokenCache {
    fetcher: Arc<dyn TokenFetcher>,
    state: Mutex<CacheState>,
}

impl TokenCache {
    pub fn new(fetcher: Arc<dyn TokenFetcher>) -> Self {
        Self {
            fetcher,
            state: Mutex::new(CacheState {
                token: None,
                in_flight: None,
                generation: 0,
            }),
        }
    }

    /// Return a bearer token that is valid for at least the safety margin.
    ///
    /// Fresh cached token → returned without I/O. Refresh already in
    /// flight → this caller awaits the same pending fetch. Otherwise a new
    /// fetch starts, and its outcome (token or failure) is delivered to
    /// every waiter. Failures clear the in-flight slot so a later call may
    /// retry; there is no automatic retry here.
    pub async fn acquire(&self) -> Result<String, TokenError> {
        let (generation, flight) = {
            let mut state = self.state.lock().await;

            if let Some(token) = &state.token {
                if token.is_fresh(Utc::now()) {
                    return Ok(token.value.clone());
                }
            }

            match &state.in_flight {
                Some((generation, flight)) => (*generation, flight.clone()),
                None => {
                    state.generation += 1;
                    let generation = state.generation;
                    let fetcher = Arc::clone(&self.fetcher);
                    let flight: TokenFlight = async move {
                        let issued = fetcher.fetch().await?;
                        Ok(CachedToken {
                            expires_at: Utc::now()
                                + Duration::seconds(issued.expires_in as i64),
                            value: issued.access_token,
                        })
                    }
                    .boxed()
                    .shared();
                    state.in_flight = Some((generation, flight.clone()));
                    tracing::debug!(generation, "starting token refresh");
                    (generation, flight)
                }
            }
        };

        let result = flight.await;

        let mut state = self.state.lock().await;
        // Only the fetch that still owns the slot may update it; a stale
        // completion must not clobber a newer in-flight refresh.
        if state.in_flight.as_ref().map(|(g, _)| *g) == Some(generation) {
            state.in_flight = None;
            match &result {
                Ok(token) => {
                    tracing::debug!(expires_at = %token.expires_at, "token refreshed");
                    state.token = Some(token.clone());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "token refresh failed");
                }
            }
        }

        result.map(|token| token.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    /// Counts fetches and yields a distinct token per call.
    struct CountingFetcher {
        calls: AtomicUsize,
        expires_in: u64,
    }

    impl CountingFetcher {
        fn new(expires_in: u64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                expires_in,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenFetcher for CountingFetcher {
        async fn fetch(&self) -> Result<IssuedToken, TokenError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            // Keep the fetch pending long enough for callers to pile up.
            tokio::time::sleep(StdDuration::from_millis(20)).await;
            Ok(IssuedToken {
                access_token: format!("tok-{n}"),
                expires_in: self.expires_in,
            })
        }
    }

    /// Fails on the first call, succeeds afterwards.
    struct FlakyFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenFetcher for FlakyFetcher {
        async fn fetch(&self) -> Result<IssuedToken, TokenError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(TokenError::AcquisitionFailed("token endpoint down".into()))
            } else {
                Ok(IssuedToken {
                    access_token: "tok-recovered".into(),
                    expires_in: 3600,
                })
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_acquires_trigger_one_fetch() {
        let fetcher = Arc::new(CountingFetcher::new(3600));
        let cache = Arc::new(TokenCache::new(fetcher.clone()));

        let (a, b, c) = tokio::join!(cache.acquire(), cache.acquire(), cache.acquire());

        assert_eq!(a.unwrap(), "tok-0");
        assert_eq!(b.unwrap(), "tok-0");
        assert_eq!(c.unwrap(), "tok-0");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_spawned_acquires_share_one_fetch() {
        let fetcher = Arc::new(CountingFetcher::new(3600));
        let cache = Arc::new(TokenCache::new(fetcher.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.acquire().await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "tok-0");
        }
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_fresh_token_is_reused_without_fetch() {
        let fetcher = Arc::new(CountingFetcher::new(3600));
        let cache = TokenCache::new(fetcher.clone());

        assert_eq!(cache.acquire().await.unwrap(), "tok-0");
        assert_eq!(cache.acquire().await.unwrap(), "tok-0");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_expires_in_at_safety_margin_forces_refresh() {
        // expires_in == 60 leaves nothing beyond the 60s margin, so the
        // token is stale the moment it is cached.
        let fetcher = Arc::new(CountingFetcher::new(60));
        let cache = TokenCache::new(fetcher.clone());

        assert_eq!(cache.acquire().await.unwrap(), "tok-0");
        assert_eq!(cache.acquire().await.unwrap(), "tok-1");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_clears_in_flight_so_next_call_retries() {
        let fetcher = Arc::new(FlakyFetcher {
            calls: AtomicUsize::new(0),
        });
        let cache = TokenCache::new(fetcher);

        let first = cache.acquire().await;
        assert!(matches!(first, Err(TokenError::AcquisitionFailed(_))));

        let second = cache.acquire().await;
        assert_eq!(second.unwrap(), "tok-recovered");
    }

    #[tokio::test]
    async fn test_concurrent_waiters_all_see_the_failure() {
        struct AlwaysFails;

        #[async_trait]
        impl TokenFetcher for AlwaysFails {
            async fn fetch(&self) -> Result<IssuedToken, TokenError> {
                tokio::time::sleep(StdDuration::from_millis(20)).await;
                Err(TokenError::AcquisitionFailed("boom".into()))
            }
        }

        let cache = Arc::new(TokenCache::new(Arc::new(AlwaysFails)));
        let (a, b) = tokio::join!(cache.acquire(), cache.acquire());
        assert!(a.is_err());
        assert!(b.is_err());
    }

    #[tokio::test]
    async fn test_caches_are_independent() {
        let mgmt_fetcher = Arc::new(CountingFetcher::new(3600));
        let push_fetcher = Arc::new(CountingFetcher::new(3600));
        let mgmt = TokenCache::new(mgmt_fetcher.clone());
        let push = TokenCache::new(push_fetcher.clone());

        mgmt.acquire().await.unwrap();
        assert_eq!(mgmt_fetcher.calls(), 1);
        assert_eq!(push_fetcher.calls(), 0);

        push.acquire().await.unwrap();
        assert_eq!(push_fetcher.calls(), 1);
        assert_eq!(mgmt_fetcher.calls(), 1);
    }
}
