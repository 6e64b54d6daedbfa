//! Encyclopedia article scrape, the last network fallback.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::Sources;
use crate::classifier::looks_like_food_use;
use crate::http::HttpClient;
use crate::text::{clean_text, finish_description};
use crate::variants::query_variants;

/// Leading paragraphs inspected per article.
const MAX_PARAGRAPHS: usize = 6;

/// Paragraphs longer than this are accepted even without food keywords.
const MIN_PARAGRAPH_CHARS: usize = 40;

static PARAGRAPH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("Invalid paragraph selector"));

/// First useful paragraph of an article, already cleaned and cut to two
/// sentences.
///
/// Useful means food-relevant or longer than [`MIN_PARAGRAPH_CHARS`]; empty
/// paragraphs (common at the top of articles) are skipped.
pub fn lead_paragraph(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    document
        .select(&PARAGRAPH_SELECTOR)
        .take(MAX_PARAGRAPHS)
        .map(|p| clean_text(&p.text().collect::<Vec<_>>().join(" ")))
        .find(|text| {
            !text.is_empty()
                && (looks_like_food_use(text) || text.chars().count() > MIN_PARAGRAPH_CHARS)
        })
        .map(|text| finish_description(&text))
}

impl<C: HttpClient> Sources<C> {
    /// Scrape the article page for each query variant and return the first
    /// useful lead paragraph.
    pub async fn encyclopedia_page(&self, query: &str) -> Option<String> {
        if query.trim().is_empty() {
            return None;
        }

        for variant in query_variants(query) {
            let url = self.endpoints.page_url(&variant);
            let Some(body) = self.fetcher.get(&url, self.wiki_policy).await else {
                continue;
            };

            // Parsed documents are not Send; keep them out of the await above.
            match lead_paragraph(&body) {
                Some(text) => {
                    tracing::debug!(variant = %variant, "article hit");
                    return Some(text);
                }
                None => tracing::debug!(variant = %variant, "no usable paragraph"),
            }
        }

        None
    }
}
