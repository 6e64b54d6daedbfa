//! Per-ingredient fallback chain.
//!
//! Stages run in strict priority order and the first one to produce text
//! wins:
//!
//! 1. additive codes (`E621`, `INS 330`) resolve against the regulatory
//!    table and never reach the network, hit or miss;
//! 2. web search;
//! 3. encyclopedia summary, kept only if it reads as food use, otherwise the
//!    article page is scraped for a better paragraph;
//! 4. encyclopedia article page;
//! 5. the "no data" outcome.

use crate::classifier::looks_like_food_use;
use crate::config::LookupConfig;
use crate::error::LookupError;
use crate::http::{HttpClient, ReqwestClient};
use crate::record::{ResolutionRecord, SourceTag, NO_FOOD_DATA};
use crate::regulatory::{additive_code, BannedLookup, RegulatoryTable, TableOrigin};
use crate::sources::Sources;
use crate::text::{clip_description, finish_description, normalize_key};

/// Resolves ingredient names to records. Shared read-only across workers.
pub struct Resolver<C: HttpClient> {
    sources: Sources<C>,
    regulatory: RegulatoryTable,
    banned: BannedLookup,
    pub(crate) max_workers: usize,
}

impl<C: HttpClient> Resolver<C> {
    /// Build a resolver, loading any table files named in `config`.
    pub fn new(client: C, config: &LookupConfig) -> Result<Self, LookupError> {
        let regulatory = match &config.ins_table_path {
            Some(path) => RegulatoryTable::load(path)?,
            None => RegulatoryTable::built_in(),
        };
        let banned = match &config.banned_table_path {
            Some(path) => BannedLookup::load(path)?,
            None => BannedLookup::default(),
        };

        Ok(Self {
            sources: Sources::new(client, config)?,
            regulatory,
            banned,
            max_workers: config.max_workers.max(1),
        })
    }

    /// Replace the regulatory table.
    pub fn with_regulatory_table(mut self, table: RegulatoryTable) -> Self {
        self.regulatory = table;
        self
    }

    /// Replace the banned-substance lookup.
    pub fn with_banned_lookup(mut self, banned: BannedLookup) -> Self {
        self.banned = banned;
        self
    }

    /// Jurisdictions banning this ingredient.
    ///
    /// For an additive code with a table entry, a ban listed under the
    /// additive's proper name wins over one found by the input text.
    pub(crate) fn banned_in(&self, original: &str, canonical: &str) -> Option<&str> {
        let by_name = additive_code(original)
            .and_then(|code| {
                self.regulatory
                    .lookup(&code)
                    .map(|(entry, _)| normalize_key(&entry.display_name(&code)))
            })
            .and_then(|name_key| self.banned.get(&name_key));

        by_name.or_else(|| self.banned.lookup(canonical))
    }

    /// Resolve one ingredient. Never fails; exhaustion is a normal record.
    pub async fn resolve(&self, ingredient: &str) -> ResolutionRecord {
        let original = ingredient.trim();
        let canonical = normalize_key(original);
        let banned_in = self.banned_in(original, &canonical);

        if original.is_empty() {
            return exhausted(original, canonical, banned_in);
        }

        if let Some(code) = additive_code(original) {
            return self.resolve_additive(original, canonical, banned_in, &code);
        }

        match self.search_stages(original).await {
            Some((description, source)) => {
                ResolutionRecord::new(original, canonical, description, source, banned_in)
            }
            None => exhausted(original, canonical, banned_in),
        }
    }

    fn resolve_additive(
        &self,
        original: &str,
        canonical: String,
        banned_in: Option<&str>,
        code: &str,
    ) -> ResolutionRecord {
        let Some((entry, origin)) = self.regulatory.lookup(code) else {
            tracing::debug!(code, "additive code not in any table");
            return exhausted(original, canonical, banned_in);
        };

        let source = match origin {
            TableOrigin::External => SourceTag::RegulatoryAuthoritative,
            TableOrigin::BuiltIn => SourceTag::RegulatoryFallback,
        };

        ResolutionRecord::new(
            original,
            canonical,
            clip_description(&entry.describe(code)),
            source,
            banned_in,
        )
    }

    /// Stages 2-4. Each adapter walks its own query variants.
    async fn search_stages(&self, original: &str) -> Option<(String, SourceTag)> {
        if let Some(text) = self.sources.web_search(original).await {
            return Some((finish_description(&text), SourceTag::WebSearch));
        }

        if let Some(summary) = self.sources.encyclopedia_summary(original).await {
            if looks_like_food_use(&summary) {
                return Some((finish_description(&summary), SourceTag::EncyclopediaSummary));
            }
            tracing::debug!(ingredient = original, "summary is not about food, trying article");
            if let Some(text) = self.sources.encyclopedia_page(original).await {
                return Some((finish_description(&text), SourceTag::EncyclopediaFallback));
            }
        }

        self.sources
            .encyclopedia_page(original)
            .await
            .map(|text| (finish_description(&text), SourceTag::EncyclopediaFallback))
    }
}

impl Resolver<ReqwestClient> {
    /// Resolver over a real HTTP client.
    pub fn from_config(config: &LookupConfig) -> Result<Self, LookupError> {
        Self::new(ReqwestClient::new()?, config)
    }
}

fn exhausted(original: &str, canonical: String, banned_in: Option<&str>) -> ResolutionRecord {
    ResolutionRecord::new(
        original,
        canonical,
        NO_FOOD_DATA.to_string(),
        SourceTag::None,
        banned_in,
    )
}
