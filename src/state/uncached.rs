// Uncached fetch strategy.
// Every selection goes to the network with cache-defeating requests, and
// the detail is only published once the whole chain has resolved.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::{CacheBuster, FetchMode, Post, PostDetails, PostsApi};
use crate::config::Config;
use crate::error::{FetchError, FetchResult, Resource};

use super::loading::LoadingState;
use super::metrics::LoadTimer;
use super::{DetailStatus, PostStrategy};

/// Result delivered from a background fetch.
#[derive(Debug)]
enum UncachedEvent {
    Posts(FetchResult<Vec<Post>>),
    Details {
        generation: u64,
        result: FetchResult<PostDetails>,
    },
}

/// Post list that refetches everything on each click.
pub struct UncachedPosts<A: PostsApi> {
    api: Arc<A>,
    buster: CacheBuster,
    posts_limit: u32,
    photos_limit: u32,
    events_tx: mpsc::UnboundedSender<UncachedEvent>,
    events_rx: mpsc::UnboundedReceiver<UncachedEvent>,
    posts: LoadingState<Vec<Post>>,
    selected: Option<u64>,
    /// Bumped on every toggle; results tagged with an older value are dropped.
    generation: u64,
    details: LoadingState<PostDetails>,
    timer: LoadTimer,
}

impl<A: PostsApi> UncachedPosts<A> {
    pub fn new(api: Arc<A>, config: &Config) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            buster: CacheBuster::new(),
            posts_limit: config.posts_limit,
            photos_limit: config.photos_limit,
            events_tx,
            events_rx,
            posts: LoadingState::Idle,
            selected: None,
            generation: 0,
            details: LoadingState::Idle,
            timer: LoadTimer::new(),
        }
    }

    /// Wait for the next background result and apply it.
    /// Returns false if it belonged to a superseded selection.
    #[cfg(test)]
    pub async fn next_update(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => self.apply(event),
            None => false,
        }
    }

    fn apply(&mut self, event: UncachedEvent) -> bool {
        match event {
            UncachedEvent::Posts(Ok(posts)) => {
                tracing::info!(count = posts.len(), "uncached: posts loaded");
                self.posts = LoadingState::Loaded(posts);
                true
            }
            UncachedEvent::Posts(Err(e)) => {
                tracing::error!(error = %e, "uncached: posts fetch failed");
                self.posts = LoadingState::Error(e.user_message());
                true
            }
            UncachedEvent::Details { generation, result } => {
                if generation != self.generation {
                    tracing::debug!(generation, current = self.generation, "uncached: dropping stale result");
                    return false;
                }
                self.details = match result {
                    Ok(details) => LoadingState::Loaded(details),
                    Err(e) => {
                        tracing::warn!(error = %e, post_id = ?self.selected, "uncached: detail fetch failed");
                        LoadingState::Error(e.user_message())
                    }
                };
                self.timer.finish();
                true
            }
        }
    }

    fn find_post(&self, post_id: u64) -> Option<Post> {
        self.posts
            .data()?
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
    }
}

/// Fetch comments, user and albums together, then the first album's photos.
async fn load_details<A: PostsApi>(
    api: Arc<A>,
    post: Post,
    photos_limit: u32,
    mode: FetchMode,
) -> FetchResult<PostDetails> {
    let (comments, user, albums) = tokio::try_join!(
        api.fetch_comments(post.id, mode),
        api.fetch_user(post.user_id, mode),
        api.fetch_user_albums(post.user_id, mode),
    )?;

    let photos = match albums.first() {
        Some(album) => api.fetch_album_photos(album.id, photos_limit, mode).await?,
        None => Vec::new(),
    };

    Ok(PostDetails {
        post,
        comments,
        user,
        albums,
        photos,
    })
}

impl<A: PostsApi> PostStrategy for UncachedPosts<A> {
    fn title(&self) -> &'static str {
        "Single Query (No Optimizations)"
    }

    fn metrics_title(&self) -> &'static str {
        "Single Query Performance"
    }

    fn is_optimized(&self) -> bool {
        false
    }

    fn mount(&mut self) {
        self.posts = LoadingState::Loading;
        let api = self.api.clone();
        let limit = self.posts_limit;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_posts(limit, FetchMode::Normal).await;
            let _ = tx.send(UncachedEvent::Posts(result));
        });
    }

    fn posts(&self) -> &LoadingState<Vec<Post>> {
        &self.posts
    }

    fn selected_post(&self) -> Option<u64> {
        self.selected
    }

    fn details(&self) -> Option<PostDetails> {
        self.details.data().cloned()
    }

    fn detail_status(&self) -> DetailStatus {
        DetailStatus {
            loading: self.details.is_loading(),
            errors: self.details.error().map(str::to_string).into_iter().collect(),
        }
    }

    fn timer(&self) -> &LoadTimer {
        &self.timer
    }

    fn toggle_post(&mut self, post_id: u64) {
        self.generation += 1;

        if self.selected == Some(post_id) {
            self.selected = None;
            self.details = LoadingState::Idle;
            self.timer.reset();
            return;
        }

        self.selected = Some(post_id);
        self.details = LoadingState::Loading;
        self.timer.start();

        let Some(post) = self.find_post(post_id) else {
            let e = FetchError::NotFound {
                resource: Resource::Posts,
                id: post_id,
            };
            tracing::warn!(error = %e, "uncached: selected post is not in the list");
            self.details = LoadingState::Error(e.user_message());
            self.timer.finish();
            return;
        };

        // One stamp for the whole chain of this selection
        let mode = FetchMode::Bypass {
            stamp: self.buster.next_stamp(),
        };
        let api = self.api.clone();
        let photos_limit = self.photos_limit;
        let generation = self.generation;
        let tx = self.events_tx.clone();
        tracing::debug!(post_id, generation, ?mode, "uncached: loading details");
        tokio::spawn(async move {
            let result = load_details(api, post, photos_limit, mode).await;
            let _ = tx.send(UncachedEvent::Details { generation, result });
        });
    }

    fn apply_pending(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events_rx.try_recv() {
            changed |= self.apply(event);
        }
        changed
    }
}
