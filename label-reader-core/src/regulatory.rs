//! INS/E-number additives and banned-substance lookups.
//!
//! Codes resolve against an optional external table first and a small
//! built-in curated set second. Both tables are read-only once a resolver
//! is built.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::text::normalize_key;

/// `E621`, `INS 330`, `(e 102)`. The prefix must start a word.
static ADDITIVE_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:E|INS)\s*(\d+)").expect("Invalid additive code regex"));

/// Built-in curated entries, used when the external table has no match.
static FALLBACK_INS: LazyLock<HashMap<&'static str, RegulatoryEntry>> = LazyLock::new(|| {
    HashMap::from([
        (
            "621",
            RegulatoryEntry::new("Monosodium glutamate", "flavour enhancer", "USA, European Union, India"),
        ),
        (
            "330",
            RegulatoryEntry::new("Citric acid", "food acid", "USA, European Union, India"),
        ),
    ])
});

/// Numeric part of an additive code found anywhere in `text`.
pub fn additive_code(text: &str) -> Option<String> {
    ADDITIVE_CODE_REGEX
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// One additive. All fields are optional in external tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulatoryEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub function: Option<String>,
    /// Free-text list of approving jurisdictions.
    #[serde(default)]
    pub approved: Option<String>,
}

impl RegulatoryEntry {
    pub fn new(name: &str, function: &str, approved: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            function: Some(function.to_string()),
            approved: Some(approved.to_string()),
        }
    }

    /// Name, or `INS {code}` when the table has none.
    pub fn display_name(&self, code: &str) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("INS {code}"),
        }
    }

    /// `"{name} (INS {code}). is used as {function}. Approved in: {approved}."`
    pub fn describe(&self, code: &str) -> String {
        let function = non_empty(self.function.as_deref()).unwrap_or("food additive");
        let approved = non_empty(self.approved.as_deref()).unwrap_or("various countries");
        let mut description = format!(
            "{} (INS {code}). is used as {function}. Approved in: {approved}",
            self.display_name(code)
        );
        if !description.ends_with('.') {
            description.push('.');
        }
        description
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Which table answered a code lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOrigin {
    External,
    BuiltIn,
}

/// External entries layered over the built-in curated set.
#[derive(Debug, Clone, Default)]
pub struct RegulatoryTable {
    external: HashMap<String, RegulatoryEntry>,
}

impl RegulatoryTable {
    /// Only the built-in curated entries.
    pub fn built_in() -> Self {
        Self::default()
    }

    pub fn with_external(external: HashMap<String, RegulatoryEntry>) -> Self {
        Self { external }
    }

    /// Load external entries from a JSON object keyed by numeric code.
    pub fn load(path: &Path) -> Result<Self, LookupError> {
        let external: HashMap<String, RegulatoryEntry> = read_json(path)?;
        tracing::debug!(path = %path.display(), entries = external.len(), "loaded INS table");
        Ok(Self::with_external(external))
    }

    pub fn lookup(&self, code: &str) -> Option<(&RegulatoryEntry, TableOrigin)> {
        if let Some(entry) = self.external.get(code) {
            return Some((entry, TableOrigin::External));
        }
        FALLBACK_INS
            .get(code)
            .map(|entry| (entry, TableOrigin::BuiltIn))
    }
}

/// Banned jurisdictions, either as one string or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Jurisdictions {
    One(String),
    Many(Vec<String>),
}

impl Jurisdictions {
    fn joined(self) -> String {
        match self {
            Jurisdictions::One(s) => s,
            Jurisdictions::Many(list) => list.join(", "),
        }
    }
}

/// Canonical ingredient name -> jurisdictions where it is banned.
#[derive(Debug, Clone, Default)]
pub struct BannedLookup {
    entries: HashMap<String, String>,
}

impl BannedLookup {
    /// Build from raw names; keys are normalized on the way in.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (normalize_key(k.as_ref()), v.into()))
                .filter(|(k, _)| !k.is_empty())
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, LookupError> {
        let raw: HashMap<String, Jurisdictions> = read_json(path)?;
        let lookup = Self::new(raw.into_iter().map(|(k, v)| (k, v.joined())));
        tracing::debug!(path = %path.display(), entries = lookup.entries.len(), "loaded banned table");
        Ok(lookup)
    }

    /// Exact canonical match only.
    pub fn get(&self, canonical: &str) -> Option<&str> {
        self.entries.get(canonical).map(String::as_str)
    }

    /// Canonical match, then the key with whitespace and hyphens removed.
    pub fn lookup(&self, canonical: &str) -> Option<&str> {
        self.get(canonical).or_else(|| {
            let squashed: String = canonical
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '-')
                .collect();
            self.get(&squashed)
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LookupError> {
    let table_err = |reason: String| LookupError::TableLoad {
        path: path.to_path_buf(),
        reason,
    };
    let content = fs::read_to_string(path).map_err(|e| table_err(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| table_err(e.to_string()))
}
