use serde::Deserialize;

use super::Sources;
use crate::http::HttpClient;
use crate::text::{clean_text, first_sentences};
use crate::variants::query_variants;

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(default)]
    extract: Option<String>,
}

impl<C: HttpClient> Sources<C> {
    /// First two sentences of the first non-empty summary extract across the
    /// query variants.
    ///
    /// No relevance filtering happens here; the caller decides whether the
    /// extract is about food.
    pub async fn encyclopedia_summary(&self, query: &str) -> Option<String> {
        if query.trim().is_empty() {
            return None;
        }

        for variant in query_variants(query) {
            let url = self.endpoints.summary_url(&variant);
            let Some(body) = self.fetcher.get(&url, self.wiki_policy).await else {
                continue;
            };

            match serde_json::from_str::<PageSummary>(&body) {
                Ok(summary) => {
                    let extract = clean_text(summary.extract.as_deref().unwrap_or_default());
                    if !extract.is_empty() {
                        tracing::debug!(variant = %variant, "summary hit");
                        return Some(first_sentences(&extract, 2));
                    }
                }
                Err(e) => {
                    tracing::debug!(variant = %variant, error = %e, "malformed summary payload");
                }
            }
        }

        None
    }
}
