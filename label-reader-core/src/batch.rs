//! Bounded-concurrency batch lookups.

use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};
use tracing::{info_span, Instrument};

use crate::cache::RecordCache;
use crate::error::LookupError;
use crate::http::HttpClient;
use crate::record::{ResolutionRecord, NOT_BANNED};
use crate::resolver::Resolver;
use crate::text::normalize_key;

type Slots = Vec<Option<ResolutionRecord>>;

impl<C: HttpClient + 'static> Resolver<C> {
    /// Resolve every ingredient with at most `max_workers` in flight.
    ///
    /// The output has one record per input, in input order. Duplicates are
    /// resolved independently. A worker that dies leaves a
    /// [`ResolutionRecord::missing`] placeholder in its slot.
    pub async fn lookup_batch(
        self: &Arc<Self>,
        ingredients: &[String],
    ) -> Result<Vec<ResolutionRecord>, LookupError> {
        if ingredients.is_empty() {
            return Err(LookupError::EmptyBatch);
        }

        let concurrency = self.max_workers.min(ingredients.len());
        tracing::info!(count = ingredients.len(), concurrency, "starting batch");

        let mut slots: Slots = vec![None; ingredients.len()];
        let mut tasks = JoinSet::new();

        for (index, ingredient) in ingredients.iter().enumerate() {
            let resolver = Arc::clone(self);
            let ingredient = ingredient.clone();
            let span = info_span!("resolve_ingredient", index, ingredient = %ingredient);

            tasks.spawn(
                async move {
                    let record = resolver.resolve(&ingredient).await;
                    tracing::debug!(source = record.source.as_str(), "resolved");
                    (index, record)
                }
                .instrument(span),
            );

            // Limit concurrency
            if tasks.len() >= concurrency {
                if let Some(joined) = tasks.join_next().await {
                    fill_slot(&mut slots, joined);
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            fill_slot(&mut slots, joined);
        }

        Ok(assemble(slots, ingredients))
    }

    /// Like [`lookup_batch`](Self::lookup_batch), but reuses records from
    /// `cache` and stores newly found ones.
    ///
    /// Records whose source is `None` are never cached, so a later run can
    /// retry them. Cache hits take `banned_in` from the resolver's current
    /// banned table.
    pub async fn lookup_batch_cached(
        self: &Arc<Self>,
        ingredients: &[String],
        cache: &dyn RecordCache,
    ) -> Result<Vec<ResolutionRecord>, LookupError> {
        if ingredients.is_empty() {
            return Err(LookupError::EmptyBatch);
        }

        let mut slots: Slots = ingredients
            .iter()
            .map(|ingredient| {
                let original = ingredient.trim();
                let canonical = normalize_key(original);
                // Bans come from the current table, not the one in force when cached.
                let banned_in = self.banned_in(original, &canonical).unwrap_or(NOT_BANNED);
                cache.get(&canonical).map(|cached| ResolutionRecord {
                    ingredient: original.to_string(),
                    banned_in: banned_in.to_string(),
                    ..cached
                })
            })
            .collect();

        let misses: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.is_none().then_some(index))
            .collect();
        tracing::info!(
            hits = ingredients.len() - misses.len(),
            misses = misses.len(),
            "record cache"
        );

        if !misses.is_empty() {
            let pending: Vec<String> = misses.iter().map(|&i| ingredients[i].clone()).collect();
            let resolved = self.lookup_batch(&pending).await?;

            for (index, record) in misses.into_iter().zip(resolved) {
                if record.source.found() {
                    if let Err(e) = cache.put(&record) {
                        tracing::warn!(ingredient = %record.ingredient, error = %e, "failed to cache record");
                    }
                }
                slots[index] = Some(record);
            }
        }

        Ok(assemble(slots, ingredients))
    }
}

fn fill_slot(slots: &mut Slots, joined: Result<(usize, ResolutionRecord), JoinError>) {
    match joined {
        Ok((index, record)) => slots[index] = Some(record),
        Err(e) => tracing::warn!(error = %e, "lookup worker failed"),
    }
}

fn assemble(slots: Slots, ingredients: &[String]) -> Vec<ResolutionRecord> {
    slots
        .into_iter()
        .zip(ingredients)
        .map(|(slot, ingredient)| {
            slot.unwrap_or_else(|| {
                tracing::warn!(ingredient = %ingredient, "no record produced");
                ResolutionRecord::missing(ingredient)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryRecordCache;
    use crate::config::LookupConfig;
    use crate::error::FetchError;
    use crate::http::{HttpResponse, MockClient};
    use crate::record::{SourceTag, MISSING_RECORD, NO_FOOD_DATA};
    use crate::regulatory::BannedLookup;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use url::Url;

    /// Answers every request after a delay and tracks how many are in flight.
    #[derive(Default)]
    struct SlowClient {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl HttpClient for SlowClient {
        async fn get(
            &self,
            _url: &Url,
            _user_agent: &str,
            _timeout: Duration,
        ) -> Result<HttpResponse, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(500)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            Ok(HttpResponse {
                status: 200,
                body: r#"{"Abstract": "A common food ingredient."}"#.to_string(),
            })
        }
    }

    fn slow_resolver(
        client: &Arc<SlowClient>,
        max_workers: usize,
    ) -> Arc<Resolver<Arc<SlowClient>>> {
        let config = LookupConfig {
            max_workers,
            ..LookupConfig::default()
        };
        Arc::new(Resolver::new(Arc::clone(client), &config).unwrap())
    }

    fn resolver(mock: &Arc<MockClient>, max_workers: usize) -> Arc<Resolver<Arc<MockClient>>> {
        let config = LookupConfig {
            max_workers,
            backoff_unit: Duration::ZERO,
            ..LookupConfig::default()
        };
        Arc::new(Resolver::new(Arc::clone(mock), &config).unwrap())
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_batch_is_an_error() {
        let mock = Arc::new(MockClient::offline());
        let result = resolver(&mock, 4).lookup_batch(&[]).await;
        assert!(matches!(result, Err(LookupError::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_order_preserved_with_duplicates() {
        let mock = Arc::new(
            MockClient::new().with_body(
                "api.duckduckgo.com",
                r#"{"Abstract": "A common food ingredient."}"#,
            ),
        );
        let input = names(&["Salt", "E621", "Sugar", "Salt", "INS 330"]);
        let records = resolver(&mock, 2).lookup_batch(&input).await.unwrap();

        assert_eq!(records.len(), input.len());
        let ingredients: Vec<&str> = records.iter().map(|r| r.ingredient.as_str()).collect();
        assert_eq!(ingredients, vec!["Salt", "E621", "Sugar", "Salt", "INS 330"]);
        assert_eq!(records[1].source, SourceTag::RegulatoryFallback);
        assert!(records[4].description.contains("Citric acid"));
        assert_eq!(records[0], records[3]);
    }

    #[tokio::test]
    async fn test_additive_codes_make_no_requests() {
        let mock = Arc::new(MockClient::offline());
        let records = resolver(&mock, 6)
            .lookup_batch(&names(&["E621", "INS330"]))
            .await
            .unwrap();
        assert!(records.iter().all(|r| r.source == SourceTag::RegulatoryFallback));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_total_failure_still_returns_every_record() {
        let mock = Arc::new(MockClient::offline());
        let records = resolver(&mock, 1)
            .lookup_batch(&names(&["Quinoa", "Amaranth"]))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.description == NO_FOOD_DATA));
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_bounded_by_max_workers() {
        let client = Arc::new(SlowClient::default());
        let input: Vec<String> = (0..10).map(|i| format!("Ingredient {i}")).collect();

        let records = slow_resolver(&client, 3).lookup_batch(&input).await.unwrap();

        assert_eq!(records.len(), 10);
        assert!(records.iter().all(|r| r.source == SourceTag::WebSearch));
        let peak = client.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak in flight was {peak}");
        assert!(peak > 1, "batch never ran concurrently");
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_bounded_by_batch_length() {
        let client = Arc::new(SlowClient::default());
        slow_resolver(&client, 6)
            .lookup_batch(&names(&["Salt", "Sugar"]))
            .await
            .unwrap();

        let peak = client.peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "peak in flight was {peak}");
    }

    #[tokio::test]
    async fn test_cache_hit_uses_current_banned_table() {
        let mock = Arc::new(
            MockClient::new().with_body(
                "api.duckduckgo.com",
                r#"{"Abstract": "Potassium bromate is a flour additive."}"#,
            ),
        );
        let cache = MemoryRecordCache::new();
        let input = names(&["Potassium bromate"]);

        let first = resolver(&mock, 2)
            .lookup_batch_cached(&input, &cache)
            .await
            .unwrap();
        assert_eq!(first[0].banned_in, "None");

        let config = LookupConfig {
            backoff_unit: Duration::ZERO,
            ..LookupConfig::default()
        };
        let banning = Arc::new(
            Resolver::new(Arc::clone(&mock), &config)
                .unwrap()
                .with_banned_lookup(BannedLookup::new([("Potassium bromate", "EU, Canada")])),
        );
        let requests_before = mock.request_count();
        let second = banning.lookup_batch_cached(&input, &cache).await.unwrap();

        assert_eq!(mock.request_count(), requests_before);
        assert_eq!(second[0].banned_in, "EU, Canada");
        assert_eq!(second[0].description, first[0].description);
    }

    #[test]
    fn test_missing_slot_gets_placeholder() {
        let input = names(&["Salt", "Pepper"]);
        let records = assemble(vec![None, None], &input);
        assert_eq!(records[1].ingredient, "Pepper");
        assert_eq!(records[1].description, MISSING_RECORD);
    }

    #[tokio::test]
    async fn test_cached_batch_skips_network_on_second_run() {
        let mock = Arc::new(
            MockClient::new().with_body(
                "api.duckduckgo.com",
                r#"{"Abstract": "Cumin is a spice."}"#,
            ),
        );
        let cache = MemoryRecordCache::new();
        let resolver = resolver(&mock, 2);

        let first = resolver
            .lookup_batch_cached(&names(&["Cumin"]), &cache)
            .await
            .unwrap();
        let after_first = mock.request_count();
        assert_eq!(cache.len(), 1);

        let second = resolver
            .lookup_batch_cached(&names(&["  CUMIN "]), &cache)
            .await
            .unwrap();
        assert_eq!(mock.request_count(), after_first);
        assert_eq!(second[0].ingredient, "CUMIN");
        assert_eq!(second[0].description, first[0].description);
    }

    #[tokio::test]
    async fn test_unresolved_records_not_cached() {
        let mock = Arc::new(MockClient::offline());
        let cache = MemoryRecordCache::new();
        resolver(&mock, 2)
            .lookup_batch_cached(&names(&["Nothing"]), &cache)
            .await
            .unwrap();
        assert!(cache.is_empty());
    }
}
