use serde::{Deserialize, Serialize};

/// Description used when no stage produced any text.
pub const NO_FOOD_DATA: &str = "No food-specific data available.";

/// Description for a batch slot with no completed record.
pub const MISSING_RECORD: &str = "No data";

/// `banned_in` when no jurisdiction is known.
pub const NOT_BANNED: &str = "None";

/// Which stage produced a record's description.
///
/// Serialized names match the labels existing consumers already parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    #[serde(rename = "Fallback")]
    RegulatoryFallback,
    #[serde(rename = "Wikipedia INS")]
    RegulatoryAuthoritative,
    #[serde(rename = "DuckDuckGo")]
    WebSearch,
    #[serde(rename = "Wikipedia Summary")]
    EncyclopediaSummary,
    #[serde(rename = "Wikipedia (HTML Fallback)")]
    EncyclopediaFallback,
    None,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::RegulatoryFallback => "Fallback",
            SourceTag::RegulatoryAuthoritative => "Wikipedia INS",
            SourceTag::WebSearch => "DuckDuckGo",
            SourceTag::EncyclopediaSummary => "Wikipedia Summary",
            SourceTag::EncyclopediaFallback => "Wikipedia (HTML Fallback)",
            SourceTag::None => "None",
        }
    }

    /// True for every tag except [`SourceTag::None`].
    pub fn found(&self) -> bool {
        !matches!(self, SourceTag::None)
    }
}

/// One resolved ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    /// The ingredient as supplied, trimmed.
    #[serde(rename = "Ingredient")]
    pub ingredient: String,
    #[serde(rename = "Canonical_Name")]
    pub canonical_name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Sources")]
    pub source: SourceTag,
    #[serde(rename = "Banned_In", default = "not_banned")]
    pub banned_in: String,
}

fn not_banned() -> String {
    NOT_BANNED.to_string()
}

impl ResolutionRecord {
    pub fn new(
        ingredient: &str,
        canonical_name: String,
        description: String,
        source: SourceTag,
        banned_in: Option<&str>,
    ) -> Self {
        Self {
            ingredient: ingredient.to_string(),
            canonical_name,
            description,
            source,
            banned_in: banned_in.unwrap_or(NOT_BANNED).to_string(),
        }
    }

    /// Placeholder for a batch slot that never completed.
    pub fn missing(ingredient: &str) -> Self {
        Self::new(
            ingredient.trim(),
            crate::text::normalize_key(ingredient),
            MISSING_RECORD.to_string(),
            SourceTag::None,
            None,
        )
    }
}
