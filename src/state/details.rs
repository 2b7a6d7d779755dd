// Detail aggregation.
// Builds the expanded view of a post from whatever pieces have resolved.

use crate::api::{Album, Comment, Photo, Post, PostDetails, User};

/// Assemble `PostDetails`, or `None` until both the post and its author are
/// known. Missing lists become empty.
pub fn aggregate(
    post: Option<&Post>,
    comments: Option<&Vec<Comment>>,
    user: Option<&User>,
    albums: Option<&Vec<Album>>,
    photos: Option<&Vec<Photo>>,
) -> Option<PostDetails> {
    let (post, user) = (post?, user?);
    Some(PostDetails {
        post: post.clone(),
        comments: comments.cloned().unwrap_or_default(),
        user: user.clone(),
        albums: albums.cloned().unwrap_or_default(),
        photos: photos.cloned().unwrap_or_default(),
    })
}
