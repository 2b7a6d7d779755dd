// State management module.
// The two fetch strategies and the pieces they share.

pub mod cached;
pub mod details;
pub mod loading;
pub mod metrics;
pub mod uncached;

use crate::api::{Post, PostDetails};

pub use cached::CachedPosts;
pub use details::aggregate;
pub use loading::{ListCursor, LoadingState};
pub use metrics::LoadTimer;
pub use uncached::UncachedPosts;

/// Progress of the expanded post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailStatus {
    /// Some detail resource is still being fetched.
    pub loading: bool,
    /// User-facing messages for the resources that failed.
    pub errors: Vec<String>,
}

/// What the presentation layer needs from a data-fetching strategy.
///
/// Both strategies expose the same shape; they differ only in how and when
/// they hit the network.
pub trait PostStrategy {
    /// Heading of the pane.
    fn title(&self) -> &'static str;

    /// Heading of the load-time panel.
    fn metrics_title(&self) -> &'static str;

    fn is_optimized(&self) -> bool;

    /// Start loading the post list.
    fn mount(&mut self);

    fn posts(&self) -> &LoadingState<Vec<Post>>;

    fn selected_post(&self) -> Option<u64>;

    /// Detail of the selected post, once its post and author are known.
    fn details(&self) -> Option<PostDetails>;

    fn detail_status(&self) -> DetailStatus;

    fn timer(&self) -> &LoadTimer;

    /// Open a post, or close it if it is already open.
    fn toggle_post(&mut self, post_id: u64);

    /// The cursor moved onto a post.
    fn hover(&mut self, _post_id: u64) {}

    /// The terminal regained focus.
    fn focus_gained(&mut self) {}

    /// Apply every result that arrived since the last call.
    /// Returns true if anything visible changed.
    fn apply_pending(&mut self) -> bool;
}
