// Cache keys.
// One key per distinct remote resource, rendered like the request path.

use std::fmt;

use crate::api::endpoints;
use crate::error::Resource;

/// Identity of a cached resource.
///
/// Cache-busting parameters are never part of a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Posts { limit: u32 },
    Comments { post_id: u64 },
    User { user_id: u64 },
    UserAlbums { user_id: u64 },
    AlbumPhotos { album_id: u64, limit: u32 },
}

impl CacheKey {
    pub fn resource(&self) -> Resource {
        match self {
            CacheKey::Posts { .. } => Resource::Posts,
            CacheKey::Comments { .. } => Resource::Comments,
            CacheKey::User { .. } => Resource::User,
            CacheKey::UserAlbums { .. } => Resource::Albums,
            CacheKey::AlbumPhotos { .. } => Resource::Photos,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Posts { limit } => write!(f, "{}?_limit={}", endpoints::posts_path(), limit),
            CacheKey::Comments { post_id } => f.write_str(&endpoints::comments_path(*post_id)),
            CacheKey::User { user_id } => f.write_str(&endpoints::user_path(*user_id)),
            CacheKey::UserAlbums { user_id } => {
                f.write_str(&endpoints::user_albums_path(*user_id))
            }
            CacheKey::AlbumPhotos { album_id, limit } => write!(
                f,
                "{}?_limit={}",
                endpoints::album_photos_path(*album_id),
                limit
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        assert_eq!(CacheKey::Posts { limit: 5 }.to_string(), "/posts?_limit=5");
        assert_eq!(
            CacheKey::Comments { post_id: 1 }.to_string(),
            "/posts/1/comments"
        );
        assert_eq!(CacheKey::User { user_id: 2 }.to_string(), "/users/2");
        assert_eq!(
            CacheKey::UserAlbums { user_id: 2 }.to_string(),
            "/users/2/albums"
        );
        assert_eq!(
            CacheKey::AlbumPhotos {
                album_id: 4,
                limit: 10
            }
            .to_string(),
            "/albums/4/photos?_limit=10"
        );
    }

    #[test]
    fn test_key_resource() {
        assert_eq!(CacheKey::UserAlbums { user_id: 1 }.resource(), Resource::Albums);
    }
}
