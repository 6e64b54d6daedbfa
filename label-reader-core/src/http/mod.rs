//! Outgoing HTTP for every lookup source.
//!
//! All requests go through [`ResilientFetcher`] so that identity rotation,
//! pacing and retry behave the same for the search API and the encyclopedia.

mod client;
mod fetcher;
mod rate_limiter;

pub use client::{HttpClient, HttpResponse, MockClient, MockResponse, RecordedRequest, ReqwestClient};
pub use fetcher::{FetchPolicy, ResilientFetcher, DEFAULT_USER_AGENTS};
pub use rate_limiter::RateLimiter;
