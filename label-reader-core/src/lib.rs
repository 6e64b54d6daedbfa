pub mod batch;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod http;
pub mod record;
pub mod regulatory;
pub mod resolver;
pub mod sources;
pub mod text;
pub mod variants;

pub use cache::{CacheStats, DiskRecordCache, MemoryRecordCache, RecordCache};
pub use classifier::looks_like_food_use;
pub use config::{ConfigError, LookupConfig};
pub use error::{FetchError, LookupError};
pub use http::{
    FetchPolicy, HttpClient, HttpResponse, MockClient, MockResponse, RateLimiter, ReqwestClient,
    ResilientFetcher,
};
pub use record::{ResolutionRecord, SourceTag, MISSING_RECORD, NO_FOOD_DATA, NOT_BANNED};
pub use regulatory::{additive_code, BannedLookup, RegulatoryEntry, RegulatoryTable};
pub use resolver::Resolver;
pub use variants::query_variants;
