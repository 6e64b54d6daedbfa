//! Network sources consulted after the regulatory table.
//!
//! Each source method returns `Some(description)` on its first hit and `None`
//! when it has nothing to say. Network failures and malformed payloads both
//! end up as `None`; they are visible only in debug logs.

mod encyclopedia_page;
mod encyclopedia_summary;
mod web_search;

use url::Url;

use crate::config::LookupConfig;
use crate::error::LookupError;
use crate::http::{FetchPolicy, HttpClient, ResilientFetcher};

pub use encyclopedia_page::lead_paragraph;

/// Validated base URLs for every source.
#[derive(Debug, Clone)]
pub struct Endpoints {
    search: Url,
    wiki_base: Url,
}

impl Endpoints {
    pub fn new(search_url: &str, wiki_base_url: &str) -> Result<Self, LookupError> {
        Ok(Self {
            search: parse_base(search_url)?,
            wiki_base: parse_base(wiki_base_url)?,
        })
    }

    /// `https://api.duckduckgo.com/?q={query}&format=json&no_html=1`
    pub fn search_url(&self, query: &str) -> Url {
        let mut url = self.search.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json")
            .append_pair("no_html", "1");
        url
    }

    /// `{wiki}/api/rest_v1/page/summary/{slug}`
    pub fn summary_url(&self, title: &str) -> Url {
        self.wiki_url(&["api", "rest_v1", "page", "summary"], title)
    }

    /// `{wiki}/wiki/{slug}`
    pub fn page_url(&self, title: &str) -> Url {
        self.wiki_url(&["wiki"], title)
    }

    fn wiki_url(&self, prefix: &[&str], title: &str) -> Url {
        let mut url = self.wiki_base.clone();
        // parse_base rejected cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(prefix)
                .push(&article_slug(title));
        }
        url
    }
}

fn parse_base(raw: &str) -> Result<Url, LookupError> {
    let invalid = |reason: String| LookupError::InvalidEndpoint {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("cannot be a base URL".to_string()));
    }
    Ok(url)
}

/// Article slug: spaces become underscores. Percent-encoding happens when the
/// slug is pushed as a path segment.
fn article_slug(title: &str) -> String {
    title.trim().replace(' ', "_")
}

/// The three network sources sharing one fetcher.
pub struct Sources<C: HttpClient> {
    fetcher: ResilientFetcher<C>,
    endpoints: Endpoints,
    search_policy: FetchPolicy,
    wiki_policy: FetchPolicy,
}

impl<C: HttpClient> Sources<C> {
    pub fn new(client: C, config: &LookupConfig) -> Result<Self, LookupError> {
        let fetcher = ResilientFetcher::new(client, config.user_agents.clone(), config.backoff_unit)
            .with_rate_limit(config.rate_limit);
        Ok(Self {
            fetcher,
            endpoints: Endpoints::new(&config.search_url, &config.wiki_base_url)?,
            search_policy: config.search,
            wiki_policy: config.wiki,
        })
    }
}
