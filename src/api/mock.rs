// Scripted `PostsApi` for tests.
// Records every call, can fail per resource and hold responses behind gates.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{FetchError, FetchResult, Resource};

use super::types::{Album, Comment, Photo, Post, User};
use super::{FetchMode, PostsApi};

/// One recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub resource: Resource,
    pub id: u64,
    pub mode: FetchMode,
}

/// In-memory backend with expectation-free scripting.
///
/// # Example
/// ```ignore
/// let api = MockApi::new()
///     .with_posts(vec![post(1, 1)])
///     .with_comments(1, vec![comment(1, 1, "hi")])
///     .gate_comments(1);
/// ```
#[derive(Default)]
pub struct MockApi {
    posts: Vec<Post>,
    comments: HashMap<u64, Vec<Comment>>,
    users: HashMap<u64, User>,
    albums: HashMap<u64, Vec<Album>>,
    photos: HashMap<u64, Vec<Photo>>,
    failing: HashSet<Resource>,
    posts_gate: Option<Arc<Notify>>,
    comment_gates: HashMap<u64, Arc<Notify>>,
    revising_comments: bool,
    calls: Mutex<Vec<Call>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Five posts by users 1 and 2, each user with two albums of photos.
    pub fn seeded() -> Self {
        let mut api = Self::new().with_posts((1..=5).map(|id| post(id, (id + 1) % 2 + 1)).collect());
        for user_id in 1..=2 {
            api = api
                .with_user(user(user_id))
                .with_albums(user_id, vec![album(user_id * 10 + 1, user_id), album(user_id * 10 + 2, user_id)])
                .with_photos(user_id * 10 + 1, vec![photo(1, user_id * 10 + 1), photo(2, user_id * 10 + 1)]);
        }
        for post_id in 1..=5 {
            api = api.with_comments(post_id, vec![comment(post_id * 100, post_id, "first")]);
        }
        api
    }

    pub fn with_posts(mut self, posts: Vec<Post>) -> Self {
        self.posts = posts;
        self
    }

    pub fn with_comments(mut self, post_id: u64, comments: Vec<Comment>) -> Self {
        self.comments.insert(post_id, comments);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.id, user);
        self
    }

    pub fn with_albums(mut self, user_id: u64, albums: Vec<Album>) -> Self {
        self.albums.insert(user_id, albums);
        self
    }

    pub fn with_photos(mut self, album_id: u64, photos: Vec<Photo>) -> Self {
        self.photos.insert(album_id, photos);
        self
    }

    /// Answer every request for `resource` with HTTP 500.
    pub fn failing(mut self, resource: Resource) -> Self {
        self.failing.insert(resource);
        self
    }

    /// Answer each comments request with a single comment whose body
    /// names the request count ("rev 1", "rev 2", ...).
    pub fn revising_comments(mut self) -> Self {
        self.revising_comments = true;
        self
    }

    /// Hold posts responses until [`MockApi::release_posts`].
    pub fn gate_posts(mut self) -> Self {
        self.posts_gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Hold comments for `post_id` until [`MockApi::release_comments`].
    pub fn gate_comments(mut self, post_id: u64) -> Self {
        self.comment_gates.insert(post_id, Arc::new(Notify::new()));
        self
    }

    pub fn release_posts(&self) {
        if let Some(gate) = &self.posts_gate {
            gate.notify_one();
        }
    }

    pub fn release_comments(&self, post_id: u64) {
        if let Some(gate) = self.comment_gates.get(&post_id) {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, resource: Resource) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.resource == resource)
            .count()
    }

    fn record(&self, resource: Resource, id: u64, mode: FetchMode) -> FetchResult<()> {
        self.calls.lock().unwrap().push(Call { resource, id, mode });
        if self.failing.contains(&resource) {
            Err(FetchError::status(resource, 500))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PostsApi for MockApi {
    async fn fetch_posts(&self, limit: u32, mode: FetchMode) -> FetchResult<Vec<Post>> {
        self.record(Resource::Posts, 0, mode)?;
        if let Some(gate) = &self.posts_gate {
            gate.notified().await;
        }
        Ok(self.posts.iter().take(limit as usize).cloned().collect())
    }

    async fn fetch_comments(&self, post_id: u64, mode: FetchMode) -> FetchResult<Vec<Comment>> {
        self.record(Resource::Comments, post_id, mode)?;
        if let Some(gate) = self.comment_gates.get(&post_id) {
            gate.notified().await;
        }
        if self.revising_comments {
            let revision = self.count(Resource::Comments);
            return Ok(vec![comment(post_id * 100, post_id, &format!("rev {}", revision))]);
        }
        Ok(self.comments.get(&post_id).cloned().unwrap_or_default())
    }

    async fn fetch_user(&self, user_id: u64, mode: FetchMode) -> FetchResult<User> {
        self.record(Resource::User, user_id, mode)?;
        self.users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| FetchError::status(Resource::User, 404))
    }

    async fn fetch_user_albums(&self, user_id: u64, mode: FetchMode) -> FetchResult<Vec<Album>> {
        self.record(Resource::Albums, user_id, mode)?;
        Ok(self.albums.get(&user_id).cloned().unwrap_or_default())
    }

    async fn fetch_album_photos(
        &self,
        album_id: u64,
        limit: u32,
        mode: FetchMode,
    ) -> FetchResult<Vec<Photo>> {
        self.record(Resource::Photos, album_id, mode)?;
        let photos = self.photos.get(&album_id).cloned().unwrap_or_default();
        Ok(photos.into_iter().take(limit as usize).collect())
    }
}

pub fn post(id: u64, user_id: u64) -> Post {
    Post {
        id,
        title: format!("Post {}", id),
        body: format!("Body of post {}", id),
        user_id,
    }
}

pub fn comment(id: u64, post_id: u64, body: &str) -> Comment {
    Comment {
        id,
        name: format!("Comment {}", id),
        email: format!("c{}@example.com", id),
        body: body.to_string(),
        post_id,
    }
}

pub fn user(id: u64) -> User {
    User {
        id,
        name: format!("User {}", id),
        username: format!("user{}", id),
        email: format!("user{}@example.com", id),
        phone: "555-0100".to_string(),
        website: "example.com".to_string(),
    }
}

pub fn album(id: u64, user_id: u64) -> Album {
    Album {
        id,
        title: format!("Album {}", id),
        user_id,
    }
}

pub fn photo(id: u64, album_id: u64) -> Photo {
    Photo {
        id,
        title: format!("Photo {}", id),
        url: format!("https://example.com/600/{}", id),
        thumbnail_url: format!("https://example.com/150/{}", id),
        album_id,
    }
}
