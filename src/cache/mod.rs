// In-memory resource cache.
// Stale-while-revalidate entries with in-flight deduplication and preload.

pub mod entry;
pub mod keys;
pub mod store;

pub use keys::CacheKey;
pub use store::{Read, ResourceCache};
