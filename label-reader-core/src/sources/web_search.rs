//! Web search source (DuckDuckGo instant answers).

use serde::{Deserialize, Deserializer};

use super::Sources;
use crate::classifier::looks_like_food_use;
use crate::http::HttpClient;
use crate::text::{clean_text, finish_description};

/// Appended to the ingredient to bias results toward culinary meanings.
const FOOD_CONTEXTS: &[&str] = &[
    "food additive",
    "ingredient",
    "food use",
    "cooking",
    "edible",
    "seasoning",
];

/// The subset of the instant-answer payload we inspect.
///
/// Text fields sometimes come back as objects or numbers, and the topic list
/// as `null`; anything of the wrong shape is treated as absent rather than
/// failing the whole payload.
#[derive(Debug, Default, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "Abstract", default, deserialize_with = "string_only")]
    abstract_summary: Option<String>,
    #[serde(rename = "Answer", default, deserialize_with = "string_only")]
    answer: Option<String>,
    #[serde(rename = "Definition", default, deserialize_with = "string_only")]
    definition: Option<String>,
    #[serde(rename = "AbstractText", default, deserialize_with = "string_only")]
    abstract_text: Option<String>,
    #[serde(rename = "RelatedTopics", default, deserialize_with = "list_only")]
    related_topics: Vec<serde_json::Value>,
}

impl InstantAnswer {
    /// Candidate texts in inspection order: the named fields, then each
    /// related topic's `Text`.
    fn candidates(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        let fields = [
            ("Abstract", self.abstract_summary.as_deref()),
            ("Answer", self.answer.as_deref()),
            ("Definition", self.definition.as_deref()),
            ("AbstractText", self.abstract_text.as_deref()),
        ];
        let topics = self
            .related_topics
            .iter()
            .filter_map(|topic| topic.get("Text").and_then(|t| t.as_str()));

        fields
            .into_iter()
            .filter_map(|(name, text)| text.map(|t| (name, t)))
            .chain(topics.map(|t| ("RelatedTopics", t)))
    }

    /// First cleaned candidate that reads as food use.
    fn first_food_text(&self) -> Option<(&'static str, String)> {
        self.candidates()
            .map(|(field, text)| (field, clean_text(text)))
            .find(|(_, text)| !text.is_empty() && looks_like_food_use(text))
    }
}

fn string_only<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

fn list_only<'de, D>(deserializer: D) -> Result<Vec<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items,
        _ => Vec::new(),
    })
}

impl<C: HttpClient> Sources<C> {
    /// Query the search API with each food-biased rewrite of `query`.
    ///
    /// Returns the first field that passes the food-relevance check, cut to
    /// two sentences.
    pub async fn web_search(&self, query: &str) -> Option<String> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        for context in FOOD_CONTEXTS {
            let rewrite = format!("{query} {context}");
            let url = self.endpoints.search_url(&rewrite);
            let Some(body) = self.fetcher.get(&url, self.search_policy).await else {
                continue;
            };

            match serde_json::from_str::<InstantAnswer>(&body) {
                Ok(answer) => {
                    if let Some((field, text)) = answer.first_food_text() {
                        tracing::debug!(query = %rewrite, field, "search hit");
                        return Some(finish_description(&text));
                    }
                }
                Err(e) => {
                    tracing::debug!(query = %rewrite, error = %e, "malformed search payload");
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order() {
        let answer: InstantAnswer = serde_json::from_str(
            r#"{
                "Abstract": "A plant of the ginger family.",
                "Answer": "Used as a spice in curries.",
                "Definition": "A food colouring.",
                "RelatedTopics": []
            }"#,
        )
        .unwrap();
        let (field, text) = answer.first_food_text().unwrap();
        assert_eq!(field, "Answer");
        assert_eq!(text, "Used as a spice in curries.");
    }

    #[test]
    fn test_related_topics_fallback() {
        let answer: InstantAnswer = serde_json::from_str(
            r#"{
                "Abstract": "",
                "Answer": {"type": "calc"},
                "RelatedTopics": [
                    {"Name": "Group", "Topics": []},
                    {"Text": "Turmeric - a flowering plant"},
                    {"Text": "Turmeric is used in cooking [1]"}
                ]
            }"#,
        )
        .unwrap();
        let (field, text) = answer.first_food_text().unwrap();
        assert_eq!(field, "RelatedTopics");
        assert_eq!(text, "Turmeric is used in cooking");
    }

    #[test]
    fn test_null_topics_keep_abstract() {
        let answer: InstantAnswer = serde_json::from_str(
            r#"{"Abstract": "Paprika is a spice.", "RelatedTopics": null}"#,
        )
        .unwrap();
        assert!(answer.related_topics.is_empty());
        let (field, _) = answer.first_food_text().unwrap();
        assert_eq!(field, "Abstract");
    }

    #[test]
    fn test_nothing_relevant() {
        let answer: InstantAnswer =
            serde_json::from_str(r#"{"Abstract": "A perennial plant.", "RelatedTopics": []}"#)
                .unwrap();
        assert!(answer.first_food_text().is_none());
    }
}
