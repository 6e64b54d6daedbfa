//! GET with identity rotation, per-host pacing and linear-backoff retries.

use rand::Rng;
use std::time::Duration;
use url::Url;

use super::client::HttpClient;
use super::rate_limiter::RateLimiter;

/// Browser identities rotated across requests.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:129.0) Gecko/20100101 Firefox/129.0",
];

/// Timeout and attempt budget for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub timeout: Duration,
    pub attempts: u32,
}

/// Retrying GET on top of any [`HttpClient`].
///
/// Failures never surface as errors: a fetch either yields a body or `None`,
/// and callers treat `None` as "this source had nothing to say".
pub struct ResilientFetcher<C: HttpClient> {
    client: C,
    user_agents: Vec<String>,
    /// Sleep after failed attempt `n` is `backoff_unit * n`.
    backoff_unit: Duration,
    rate_limiter: RateLimiter,
}

impl<C: HttpClient> ResilientFetcher<C> {
    pub fn new(client: C, user_agents: Vec<String>, backoff_unit: Duration) -> Self {
        Self {
            client,
            user_agents,
            backoff_unit,
            rate_limiter: RateLimiter::disabled(),
        }
    }

    /// Space requests to the same host by at least `min_delay`.
    pub fn with_rate_limit(mut self, min_delay: Duration) -> Self {
        self.rate_limiter = RateLimiter::new(min_delay);
        self
    }

    fn pick_user_agent(&self) -> &str {
        if self.user_agents.is_empty() {
            return DEFAULT_USER_AGENTS[0];
        }
        let index = rand::rng().random_range(0..self.user_agents.len());
        &self.user_agents[index]
    }

    /// Fetch `url`, returning the body of the first success response.
    ///
    /// Makes at most `policy.attempts` requests. A request that fails outright
    /// is followed by a sleep of `backoff_unit * attempt` before the next one;
    /// a non-success status is retried immediately.
    pub async fn get(&self, url: &Url, policy: FetchPolicy) -> Option<String> {
        let user_agent = self.pick_user_agent();
        let host = url.host_str();

        for attempt in 1..=policy.attempts {
            if let Some(host) = host {
                self.rate_limiter.wait(host).await;
            }

            match self.client.get(url, user_agent, policy.timeout).await {
                Ok(response) if response.is_success() => {
                    tracing::debug!(url = %url, attempt, "fetched");
                    return Some(response.body);
                }
                Ok(response) => {
                    tracing::debug!(url = %url, attempt, status = response.status, "non-success status");
                }
                Err(e) => {
                    tracing::debug!(url = %url, attempt, error = %e, "request failed");
                    if attempt < policy.attempts {
                        tokio::time::sleep(self.backoff_unit * attempt).await;
                    }
                }
            }
        }

        tracing::debug!(url = %url, attempts = policy.attempts, "no response");
        None
    }
}
