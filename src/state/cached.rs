// Cached fetch strategy.
// Reads go through the shared resource cache; hovering a post prefetches
// its detail chain so a later click can be served from memory.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::api::{Album, Comment, FetchMode, Photo, Post, PostDetails, PostsApi, User};
use crate::cache::{CacheKey, Read, ResourceCache};
use crate::config::Config;
use crate::error::{FetchError, FetchResult, Resource};

use super::loading::LoadingState;
use super::metrics::LoadTimer;
use super::{DetailStatus, PostStrategy, aggregate};

type BoxFetch<T> = Pin<Box<dyn Future<Output = FetchResult<T>> + Send>>;

/// Result delivered from a background read.
#[derive(Debug)]
enum CachedEvent {
    Posts(FetchResult<Vec<Post>>),
    Comments(u64, FetchResult<Vec<Comment>>),
    User(u64, FetchResult<User>),
    Albums(u64, FetchResult<Vec<Album>>),
    Photos(u64, LoadingState<Vec<Photo>>),
}

/// Post list backed by the shared cache, with polling and hover prefetch.
pub struct CachedPosts<A: PostsApi> {
    api: Arc<A>,
    cache: ResourceCache,
    posts_limit: u32,
    photos_limit: u32,
    refresh_interval: Duration,
    revalidate_on_focus: bool,
    events_tx: mpsc::UnboundedSender<CachedEvent>,
    events_rx: mpsc::UnboundedReceiver<CachedEvent>,
    posts: LoadingState<Vec<Post>>,
    selected: Option<u64>,
    /// Bumped on every toggle; results tagged with an older value are dropped.
    generation: u64,
    comments: LoadingState<Vec<Comment>>,
    user: LoadingState<User>,
    albums: LoadingState<Vec<Album>>,
    photos: LoadingState<Vec<Photo>>,
    /// Posts already prefetched by this instance.
    prefetched: HashSet<u64>,
    poller: Option<JoinHandle<()>>,
    /// Re-reads the open post's detail every refresh interval.
    detail_watch: Option<JoinHandle<()>>,
    timer: LoadTimer,
}

impl<A: PostsApi> CachedPosts<A> {
    pub fn new(api: Arc<A>, cache: ResourceCache, config: &Config) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            cache,
            posts_limit: config.posts_limit,
            photos_limit: config.photos_limit,
            refresh_interval: config.refresh_interval(),
            revalidate_on_focus: config.revalidate_on_focus,
            events_tx,
            events_rx,
            posts: LoadingState::Idle,
            selected: None,
            generation: 0,
            comments: LoadingState::Idle,
            user: LoadingState::Idle,
            albums: LoadingState::Idle,
            photos: LoadingState::Idle,
            prefetched: HashSet::new(),
            poller: None,
            detail_watch: None,
            timer: LoadTimer::new(),
        }
    }

    fn posts_key(&self) -> CacheKey {
        CacheKey::Posts {
            limit: self.posts_limit,
        }
    }

    fn find_post(&self, post_id: u64) -> Option<Post> {
        self.posts
            .data()?
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
    }

    /// Warm the cache with a post's full detail chain.
    ///
    /// Only the first call per listed post does anything; a post that is not
    /// in the list yet is skipped so a later hover can retry. Returns whether
    /// work was started. Failures are logged, never shown.
    pub fn prefetch_post_data(&mut self, post_id: u64) -> bool {
        if self.prefetched.contains(&post_id) {
            return false;
        }
        let Some(post) = self.find_post(post_id) else {
            return false;
        };
        self.prefetched.insert(post_id);
        tracing::debug!(post_id, "prefetching post data");

        let user_id = post.user_id;
        self.cache.preload(
            CacheKey::Comments { post_id },
            comments_fetch(self.api.clone(), post_id),
        );
        self.cache
            .preload(CacheKey::User { user_id }, user_fetch(self.api.clone(), user_id));
        self.cache.preload(
            CacheKey::UserAlbums { user_id },
            albums_fetch(self.api.clone(), user_id),
        );

        // Photos depend on the albums, so resolve those first
        let cache = self.cache.clone();
        let api = self.api.clone();
        let photos_limit = self.photos_limit;
        tokio::spawn(async move {
            let albums = cache
                .get(CacheKey::UserAlbums { user_id }, albums_fetch(api.clone(), user_id))
                .await;
            match albums {
                Ok(albums) => {
                    if let Some(album) = albums.first() {
                        cache.preload(
                            CacheKey::AlbumPhotos {
                                album_id: album.id,
                                limit: photos_limit,
                            },
                            photos_fetch(api.clone(), album.id, photos_limit),
                        );
                    }
                }
                Err(e) => tracing::warn!(post_id, error = %e, "prefetch of albums failed"),
            }
        });
        true
    }

    fn apply(&mut self, event: CachedEvent) -> bool {
        let generation = match &event {
            CachedEvent::Posts(_) => None,
            CachedEvent::Comments(g, _)
            | CachedEvent::User(g, _)
            | CachedEvent::Albums(g, _)
            | CachedEvent::Photos(g, _) => Some(*g),
        };
        if generation.is_some_and(|g| g != self.generation) {
            tracing::debug!(?generation, current = self.generation, "cached: dropping stale result");
            return false;
        }

        match event {
            CachedEvent::Posts(Ok(posts)) => {
                tracing::info!(count = posts.len(), "cached: posts loaded");
                self.posts = LoadingState::Loaded(posts);
            }
            CachedEvent::Posts(Err(e)) => {
                if self.posts.is_loaded() {
                    // Keep showing the list we have; the next poll may succeed
                    tracing::warn!(error = %e, "cached: posts refresh failed");
                } else {
                    tracing::error!(error = %e, "cached: posts fetch failed");
                    self.posts = LoadingState::Error(e.user_message());
                }
            }
            CachedEvent::Comments(_, result) => self.comments = settled(result),
            CachedEvent::User(_, result) => self.user = settled(result),
            CachedEvent::Albums(_, result) => self.albums = settled(result),
            CachedEvent::Photos(_, state) => self.photos = state,
        }

        if self.timer.is_running() && !self.is_loading_details() {
            self.timer.finish();
        }
        true
    }

    fn is_loading_details(&self) -> bool {
        self.comments.is_loading()
            || self.user.is_loading()
            || self.albums.is_loading()
            || self.photos.is_loading()
    }

    fn clear_details(&mut self) {
        self.comments = LoadingState::Idle;
        self.user = LoadingState::Idle;
        self.albums = LoadingState::Idle;
        self.photos = LoadingState::Idle;
    }

    fn detail_reader(&self, post: &Post) -> DetailReader<A> {
        DetailReader {
            api: self.api.clone(),
            cache: self.cache.clone(),
            events: self.events_tx.clone(),
            generation: self.generation,
            post_id: post.id,
            user_id: post.user_id,
            photos_limit: self.photos_limit,
        }
    }

    /// Show whatever the cache already holds for a post's detail.
    fn show_cached_details(&mut self, post: &Post) {
        self.comments = LoadingState::from_cached(self.cache.peek(&CacheKey::Comments {
            post_id: post.id,
        }));
        self.user = LoadingState::from_cached(self.cache.peek(&CacheKey::User {
            user_id: post.user_id,
        }));
        self.albums = LoadingState::from_cached(self.cache.peek(&CacheKey::UserAlbums {
            user_id: post.user_id,
        }));
        self.photos = match self.albums.data() {
            Some(albums) => match albums.first() {
                Some(album) => LoadingState::from_cached(self.cache.peek(&CacheKey::AlbumPhotos {
                    album_id: album.id,
                    limit: self.photos_limit,
                })),
                None => LoadingState::Loaded(Vec::new()),
            },
            None => LoadingState::Loading,
        };
    }

    /// Read the selected post's detail now and again every refresh interval
    /// for as long as it stays open.
    fn load_details(&mut self, post_id: u64, force: bool) {
        self.stop_detail_watch();

        let Some(post) = self.find_post(post_id) else {
            let e = FetchError::NotFound {
                resource: Resource::Posts,
                id: post_id,
            };
            tracing::warn!(error = %e, "cached: selected post is not in the list");
            self.user = LoadingState::Error(e.user_message());
            return;
        };

        if !force {
            self.show_cached_details(&post);
        }
        let reader = self.detail_reader(&post);
        tokio::spawn(reader.clone().read(force));

        let period = self.refresh_interval;
        self.detail_watch = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if reader.events.is_closed() {
                    break;
                }
                tracing::debug!(post_id = reader.post_id, "polling post detail");
                // Detached, so aborting the watch never cancels a read midway
                tokio::spawn(reader.clone().read(true));
            }
        }));
    }

    fn stop_detail_watch(&mut self) {
        if let Some(watch) = self.detail_watch.take() {
            watch.abort();
        }
    }

    /// Read one key on a task and report the result as an event.
    fn spawn_read<T, F>(
        &self,
        key: CacheKey,
        fetch: F,
        force: bool,
        event: impl Fn(FetchResult<T>) -> CachedEvent + Send + 'static,
    ) where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> BoxFetch<T> + Send + 'static,
    {
        tokio::spawn(report(
            self.cache.clone(),
            key,
            fetch,
            force,
            self.events_tx.clone(),
            event,
        ));
    }

    fn start_poller(&mut self) {
        let cache = self.cache.clone();
        let api = self.api.clone();
        let key = self.posts_key();
        let limit = self.posts_limit;
        let period = self.refresh_interval;
        let tx = self.events_tx.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately; mount already read the key
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                tracing::debug!(%key, "polling");
                tokio::spawn(report(
                    cache.clone(),
                    key.clone(),
                    posts_fetch(api.clone(), limit),
                    true,
                    tx.clone(),
                    CachedEvent::Posts,
                ));
            }
        });
        self.poller = Some(handle);
    }
}

#[cfg(test)]
impl<A: PostsApi> CachedPosts<A> {
    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn comments(&self) -> &LoadingState<Vec<Comment>> {
        &self.comments
    }

    pub fn user(&self) -> &LoadingState<User> {
        &self.user
    }

    /// Wait for the next background result and apply it.
    /// Returns false if it belonged to a superseded selection.
    pub async fn next_update(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => self.apply(event),
            None => false,
        }
    }
}

impl<A: PostsApi> Drop for CachedPosts<A> {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        self.stop_detail_watch();
    }
}

/// Everything a background task needs to read one post's detail chain.
struct DetailReader<A: PostsApi> {
    api: Arc<A>,
    cache: ResourceCache,
    events: mpsc::UnboundedSender<CachedEvent>,
    generation: u64,
    post_id: u64,
    user_id: u64,
    photos_limit: u32,
}

impl<A: PostsApi> Clone for DetailReader<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            cache: self.cache.clone(),
            events: self.events.clone(),
            ..*self
        }
    }
}

impl<A: PostsApi> DetailReader<A> {
    /// Read comments, author and albums together, then the first album's
    /// photos, reporting each piece as it lands.
    async fn read(self, force: bool) {
        let generation = self.generation;
        let (post_id, user_id) = (self.post_id, self.user_id);

        let comments = report(
            self.cache.clone(),
            CacheKey::Comments { post_id },
            comments_fetch(self.api.clone(), post_id),
            force,
            self.events.clone(),
            move |r| CachedEvent::Comments(generation, r),
        );
        let user = report(
            self.cache.clone(),
            CacheKey::User { user_id },
            user_fetch(self.api.clone(), user_id),
            force,
            self.events.clone(),
            move |r| CachedEvent::User(generation, r),
        );
        let albums_then_photos = async {
            let albums = report(
                self.cache.clone(),
                CacheKey::UserAlbums { user_id },
                albums_fetch(self.api.clone(), user_id),
                force,
                self.events.clone(),
                move |r| CachedEvent::Albums(generation, r),
            )
            .await;

            match albums.ok().and_then(|a| a.first().map(|album| album.id)) {
                Some(album_id) => {
                    let _ = report(
                        self.cache.clone(),
                        CacheKey::AlbumPhotos {
                            album_id,
                            limit: self.photos_limit,
                        },
                        photos_fetch(self.api.clone(), album_id, self.photos_limit),
                        force,
                        self.events.clone(),
                        move |r| CachedEvent::Photos(generation, settled(r)),
                    )
                    .await;
                }
                // No album (or no albums at all): nothing to load
                None => {
                    let _ = self
                        .events
                        .send(CachedEvent::Photos(generation, LoadingState::Idle));
                }
            }
        };

        let _ = tokio::join!(comments, user, albums_then_photos);
    }
}

/// Read one key and send the result as an event.
///
/// When a stale value was served, a second event carries the refreshed
/// value once it lands. A failed refresh sends nothing; the stale value
/// stays on screen.
async fn report<T, F>(
    cache: ResourceCache,
    key: CacheKey,
    fetch: F,
    force: bool,
    events: mpsc::UnboundedSender<CachedEvent>,
    event: impl Fn(FetchResult<T>) -> CachedEvent + Send + 'static,
) -> FetchResult<T>
where
    T: Clone + Send + Sync + 'static,
    F: FnOnce() -> BoxFetch<T> + Send + 'static,
{
    if force {
        let result = cache.revalidate(key, fetch).await;
        let _ = events.send(event(result.clone()));
        return result;
    }

    let Read { result, refresh } = cache.read(key, fetch).await;
    let _ = events.send(event(result.clone()));
    if let Some(refresh) = refresh {
        tokio::spawn(async move {
            if let Ok(Ok(fresh)) = refresh.await {
                let _ = events.send(event(Ok(fresh)));
            }
        });
    }
    result
}

impl<A: PostsApi> PostStrategy for CachedPosts<A> {
    fn title(&self) -> &'static str {
        "Optimized with Prefetch, Polling and Cache"
    }

    fn metrics_title(&self) -> &'static str {
        "Cache Performance"
    }

    fn is_optimized(&self) -> bool {
        true
    }

    fn mount(&mut self) {
        let key = self.posts_key();
        self.posts = LoadingState::from_cached(self.cache.peek(&key));

        let fetch = posts_fetch(self.api.clone(), self.posts_limit);
        self.spawn_read(key, fetch, false, CachedEvent::Posts);

        if self.poller.is_none() {
            self.start_poller();
        }
    }

    fn posts(&self) -> &LoadingState<Vec<Post>> {
        &self.posts
    }

    fn selected_post(&self) -> Option<u64> {
        self.selected
    }

    fn details(&self) -> Option<PostDetails> {
        let post = self.selected.and_then(|id| self.find_post(id));
        aggregate(
            post.as_ref(),
            self.comments.data(),
            self.user.data(),
            self.albums.data(),
            self.photos.data(),
        )
    }

    fn detail_status(&self) -> DetailStatus {
        DetailStatus {
            loading: self.is_loading_details(),
            errors: [
                self.comments.error(),
                self.user.error(),
                self.albums.error(),
                self.photos.error(),
            ]
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect(),
        }
    }

    fn timer(&self) -> &LoadTimer {
        &self.timer
    }

    fn toggle_post(&mut self, post_id: u64) {
        self.generation += 1;

        if self.selected == Some(post_id) {
            self.selected = None;
            self.stop_detail_watch();
            self.clear_details();
            self.timer.reset();
            return;
        }

        self.selected = Some(post_id);
        self.clear_details();
        self.timer.start();
        self.load_details(post_id, false);

        if !self.is_loading_details() {
            tracing::debug!(post_id, "cached: detail served from cache");
            self.timer.finish();
        }
    }

    fn hover(&mut self, post_id: u64) {
        self.prefetch_post_data(post_id);
    }

    fn focus_gained(&mut self) {
        if !self.revalidate_on_focus {
            return;
        }
        tracing::debug!("cached: focus regained, revalidating");
        let key = self.posts_key();
        let fetch = posts_fetch(self.api.clone(), self.posts_limit);
        self.spawn_read(key, fetch, true, CachedEvent::Posts);
        if let Some(post_id) = self.selected {
            self.load_details(post_id, true);
        }
    }

    fn apply_pending(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events_rx.try_recv() {
            changed |= self.apply(event);
        }
        changed
    }
}

fn settled<T>(result: FetchResult<T>) -> LoadingState<T> {
    match result {
        Ok(data) => LoadingState::Loaded(data),
        Err(e) => LoadingState::Error(e.user_message()),
    }
}

fn posts_fetch<A: PostsApi>(
    api: Arc<A>,
    limit: u32,
) -> impl FnOnce() -> BoxFetch<Vec<Post>> + Send + 'static {
    move || -> BoxFetch<Vec<Post>> {
        Box::pin(async move { api.fetch_posts(limit, FetchMode::Normal).await })
    }
}

fn comments_fetch<A: PostsApi>(
    api: Arc<A>,
    post_id: u64,
) -> impl FnOnce() -> BoxFetch<Vec<Comment>> + Send + 'static {
    move || -> BoxFetch<Vec<Comment>> {
        Box::pin(async move { api.fetch_comments(post_id, FetchMode::Normal).await })
    }
}

fn user_fetch<A: PostsApi>(
    api: Arc<A>,
    user_id: u64,
) -> impl FnOnce() -> BoxFetch<User> + Send + 'static {
    move || -> BoxFetch<User> {
        Box::pin(async move { api.fetch_user(user_id, FetchMode::Normal).await })
    }
}

fn albums_fetch<A: PostsApi>(
    api: Arc<A>,
    user_id: u64,
) -> impl FnOnce() -> BoxFetch<Vec<Album>> + Send + 'static {
    move || -> BoxFetch<Vec<Album>> {
        Box::pin(async move { api.fetch_user_albums(user_id, FetchMode::Normal).await })
    }
}

fn photos_fetch<A: PostsApi>(
    api: Arc<A>,
    album_id: u64,
    limit: u32,
) -> impl FnOnce() -> BoxFetch<Vec<Photo>> + Send + 'static {
    move || -> BoxFetch<Vec<Photo>> {
        Box::pin(async move {
            api.fetch_album_photos(album_id, limit, FetchMode::Normal)
                .await
        })
    }
}
