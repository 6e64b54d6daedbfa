//! End-to-end lookups through the public API against a scripted HTTP client.
//!
//! Each test wires a `MockClient` that answers by URL fragment, so the whole
//! fallback chain runs without touching the network.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use label_reader_core::{
    BannedLookup, DiskRecordCache, LookupConfig, LookupError, MockClient, MockResponse,
    RecordCache, RegulatoryTable, ResolutionRecord, Resolver, SourceTag, NO_FOOD_DATA,
};
use tempfile::TempDir;

const TURMERIC_SEARCH: &str = r#"{
    "Abstract": "",
    "AbstractText": "Turmeric is a bright yellow spice used in curries. It has a warm taste. It stains.",
    "RelatedTopics": []
}"#;

const SAFFRON_PAGE: &str = r#"<html><body>
  <p class="mw-empty-elt"></p>
  <p>Saffron is a spice derived from the flower of Crocus sativus.[1] It is used for seasoning and colouring food.[2] It is expensive.</p>
</body></html>"#;

fn config() -> LookupConfig {
    LookupConfig {
        max_workers: 3,
        backoff_unit: Duration::ZERO,
        ..LookupConfig::default()
    }
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn scripted_client() -> Arc<MockClient> {
    Arc::new(
        MockClient::new()
            .with_body("Turmeric", TURMERIC_SEARCH)
            .with_response("api.duckduckgo.com", MockResponse::Status(503))
            .with_body(
                "summary/Vanilla",
                r#"{"extract": "Vanilla is a flavoring derived from orchids. Second. Third."}"#,
            )
            .with_body("/wiki/Saffron", SAFFRON_PAGE),
    )
}

#[tokio::test]
async fn test_mixed_batch_uses_each_stage() {
    let client = scripted_client();
    let resolver = Arc::new(Resolver::new(Arc::clone(&client), &config()).unwrap());

    let records = resolver
        .lookup_batch(&names(&["Turmeric", "E330", "Vanilla", "Saffron", "Unobtainium"]))
        .await
        .unwrap();

    let sources: Vec<SourceTag> = records.iter().map(|r| r.source).collect();
    assert_eq!(
        sources,
        vec![
            SourceTag::WebSearch,
            SourceTag::RegulatoryFallback,
            SourceTag::EncyclopediaSummary,
            SourceTag::EncyclopediaFallback,
            SourceTag::None,
        ]
    );

    assert_eq!(
        records[0].description,
        "Turmeric is a bright yellow spice used in curries. It has a warm taste."
    );
    assert_eq!(
        records[2].description,
        "Vanilla is a flavoring derived from orchids. Second."
    );
    assert_eq!(
        records[3].description,
        "Saffron is a spice derived from the flower of Crocus sativus. It is used for seasoning and colouring food."
    );
    assert_eq!(records[4].description, NO_FOOD_DATA);
}

#[tokio::test]
async fn test_every_description_is_bounded() {
    let long_sentence = "Sugar is a sweetener used in food ".repeat(30);
    let body = format!(r#"{{"Abstract": "{}"}}"#, long_sentence.trim());
    let client = Arc::new(MockClient::new().with_body("api.duckduckgo.com", &body));
    let resolver = Arc::new(Resolver::new(client, &config()).unwrap());

    let records = resolver.lookup_batch(&names(&["Sugar"])).await.unwrap();
    let description = &records[0].description;

    assert!(description.chars().count() <= 400);
    assert!(description.ends_with('.'));
}

#[tokio::test]
async fn test_records_serialize_with_wire_names() {
    let client = Arc::new(MockClient::offline());
    let resolver = Arc::new(
        Resolver::new(client, &config())
            .unwrap()
            .with_banned_lookup(BannedLookup::new([("Monosodium glutamate", "Nowhere")])),
    );

    let records = resolver.lookup_batch(&names(&["E621"])).await.unwrap();
    let json = serde_json::to_value(&records).unwrap();

    assert_eq!(json[0]["Ingredient"], "E621");
    assert_eq!(json[0]["Sources"], "Fallback");
    assert_eq!(json[0]["Banned_In"], "Nowhere");
    assert!(json[0]["Description"]
        .as_str()
        .unwrap()
        .starts_with("Monosodium glutamate (INS 621)."));
}

#[tokio::test]
async fn test_tables_loaded_from_config_paths() {
    let temp_dir = TempDir::new().unwrap();
    let ins_path = temp_dir.path().join("ins.json");
    let banned_path = temp_dir.path().join("banned.json");
    fs::write(
        &ins_path,
        r#"{"102": {"name": "Tartrazine", "function": "colour", "approved": "European Union, India"}}"#,
    )
    .unwrap();
    fs::write(&banned_path, r#"{"Tartrazine": "Norway"}"#).unwrap();

    let config = LookupConfig {
        ins_table_path: Some(ins_path),
        banned_table_path: Some(banned_path),
        ..config()
    };
    let resolver = Arc::new(Resolver::new(Arc::new(MockClient::offline()), &config).unwrap());

    let records = resolver
        .lookup_batch(&names(&["E102", "E621"]))
        .await
        .unwrap();

    assert_eq!(records[0].source, SourceTag::RegulatoryAuthoritative);
    assert!(records[0].description.contains("Tartrazine (INS 102)."));
    assert!(records[0].description.contains("European Union, India"));
    assert_eq!(records[0].banned_in, "Norway");
    // Codes missing from the external table still fall back to the built-in one.
    assert_eq!(records[1].source, SourceTag::RegulatoryFallback);
}

#[tokio::test]
async fn test_unreadable_table_is_a_setup_error() {
    let config = LookupConfig {
        ins_table_path: Some("/nonexistent/ins.json".into()),
        ..config()
    };
    let result = Resolver::new(Arc::new(MockClient::offline()), &config);
    assert!(matches!(result, Err(LookupError::TableLoad { .. })));
}

#[tokio::test]
async fn test_disk_cache_survives_new_resolver() {
    let temp_dir = TempDir::new().unwrap();
    let cache = DiskRecordCache::new(temp_dir.path().to_path_buf());
    let input = names(&["Turmeric"]);

    let first_client = scripted_client();
    let first = Arc::new(Resolver::new(Arc::clone(&first_client), &config()).unwrap())
        .lookup_batch_cached(&input, &cache)
        .await
        .unwrap();
    assert!(first_client.request_count() > 0);

    let second_client = Arc::new(MockClient::offline());
    let second = Arc::new(Resolver::new(Arc::clone(&second_client), &config()).unwrap())
        .lookup_batch_cached(&input, &cache)
        .await
        .unwrap();

    assert_eq!(second_client.request_count(), 0);
    assert_eq!(first, second);
    assert_eq!(cache.stats().cached_records, 1);
}

#[tokio::test]
async fn test_custom_table_via_builder() {
    let table = RegulatoryTable::with_external(HashMap::new());
    let resolver = Arc::new(
        Resolver::new(Arc::new(MockClient::offline()), &config())
            .unwrap()
            .with_regulatory_table(table),
    );
    let records: Vec<ResolutionRecord> =
        resolver.lookup_batch(&names(&["INS 330"])).await.unwrap();
    assert_eq!(records[0].source, SourceTag::RegulatoryFallback);
}

#[test]
fn test_cache_is_object_safe() {
    let temp_dir = TempDir::new().unwrap();
    let cache: Box<dyn RecordCache> = Box::new(DiskRecordCache::new(temp_dir.path().into()));
    assert!(cache.get("anything").is_none());
}
