// Error types for postcache.
// Separates per-resource fetch failures from general application errors.

#![allow(dead_code)]

use std::fmt;

use thiserror::Error;

/// Which remote resource a fetch was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Posts,
    Comments,
    User,
    Albums,
    Photos,
}

impl Resource {
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Posts => "posts",
            Resource::Comments => "comments",
            Resource::User => "user",
            Resource::Albums => "albums",
            Resource::Photos => "photos",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failed read against the REST API.
///
/// Cloneable so one cached failure can be handed to every waiter on a key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Failed to fetch {resource}: HTTP {status}")]
    Status { resource: Resource, status: u16 },

    #[error("Failed to fetch {resource}: {message}")]
    Network { resource: Resource, message: String },

    #[error("Failed to decode {resource}: {message}")]
    Decode { resource: Resource, message: String },

    #[error("{resource} {id} not found")]
    NotFound { resource: Resource, id: u64 },
}

impl FetchError {
    pub fn status(resource: Resource, status: u16) -> Self {
        FetchError::Status { resource, status }
    }

    pub fn network(resource: Resource, err: impl fmt::Display) -> Self {
        FetchError::Network {
            resource,
            message: err.to_string(),
        }
    }

    pub fn decode(resource: Resource, err: impl fmt::Display) -> Self {
        FetchError::Decode {
            resource,
            message: err.to_string(),
        }
    }

    /// The resource this failure originated from.
    pub fn resource(&self) -> Resource {
        match self {
            FetchError::Status { resource, .. }
            | FetchError::Network { resource, .. }
            | FetchError::Decode { resource, .. }
            | FetchError::NotFound { resource, .. } => *resource,
        }
    }

    /// Short text shown to the user in place of the failed data.
    pub fn user_message(&self) -> String {
        format!("Error loading {}", self.resource())
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[derive(Error, Debug)]
pub enum PostcacheError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, PostcacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_origin() {
        let err = FetchError::status(Resource::Comments, 500);
        assert_eq!(err.resource(), Resource::Comments);
        assert_eq!(err.user_message(), "Error loading comments");
        assert_eq!(err.to_string(), "Failed to fetch comments: HTTP 500");
    }

    #[test]
    fn test_network_and_decode_keep_resource() {
        let err = FetchError::network(Resource::Photos, "connection reset");
        assert_eq!(err.resource(), Resource::Photos);
        assert!(err.to_string().contains("connection reset"));

        let err = FetchError::decode(Resource::User, "missing field `id`");
        assert_eq!(err.user_message(), "Error loading user");

        let err = FetchError::NotFound {
            resource: Resource::Posts,
            id: 9,
        };
        assert_eq!(err.to_string(), "posts 9 not found");
    }
}
