// REST API module.
// Provides the HTTP client, typed endpoints and response types.

pub mod client;
pub mod endpoints;
#[cfg(test)]
pub mod mock;
pub mod types;

use async_trait::async_trait;

use crate::error::FetchResult;

pub use client::{ApiClient, CacheBuster};
pub use types::*;

/// How a request treats intermediate HTTP caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Plain request; any caching is left to the transport.
    Normal,
    /// No-cache headers plus a `_t` query stamp.
    Bypass { stamp: u64 },
}

/// Read-only access to the posts API.
///
/// The strategies only talk to this trait, which keeps them testable
/// against a scripted backend.
#[async_trait]
pub trait PostsApi: Send + Sync + 'static {
    async fn fetch_posts(&self, limit: u32, mode: FetchMode) -> FetchResult<Vec<Post>>;

    async fn fetch_comments(&self, post_id: u64, mode: FetchMode) -> FetchResult<Vec<Comment>>;

    async fn fetch_user(&self, user_id: u64, mode: FetchMode) -> FetchResult<User>;

    async fn fetch_user_albums(&self, user_id: u64, mode: FetchMode) -> FetchResult<Vec<Album>>;

    async fn fetch_album_photos(
        &self,
        album_id: u64,
        limit: u32,
        mode: FetchMode,
    ) -> FetchResult<Vec<Photo>>;
}
