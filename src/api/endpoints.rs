// REST API endpoint functions.
// Path builders plus the typed `PostsApi` implementation over HTTP.

use async_trait::async_trait;

use crate::error::{FetchResult, Resource};

use super::client::ApiClient;
use super::types::{Album, Comment, Photo, Post, User};
use super::{FetchMode, PostsApi};

pub fn posts_path() -> String {
    "/posts".to_string()
}

pub fn comments_path(post_id: u64) -> String {
    format!("/posts/{}/comments", post_id)
}

pub fn user_path(user_id: u64) -> String {
    format!("/users/{}", user_id)
}

pub fn user_albums_path(user_id: u64) -> String {
    format!("/users/{}/albums", user_id)
}

pub fn album_photos_path(album_id: u64) -> String {
    format!("/albums/{}/photos", album_id)
}

#[async_trait]
impl PostsApi for ApiClient {
    async fn fetch_posts(&self, limit: u32, mode: FetchMode) -> FetchResult<Vec<Post>> {
        let params = [("_limit", limit.to_string())];
        self.get_json(Resource::Posts, &posts_path(), &params, mode)
            .await
    }

    async fn fetch_comments(&self, post_id: u64, mode: FetchMode) -> FetchResult<Vec<Comment>> {
        self.get_json(Resource::Comments, &comments_path(post_id), &[], mode)
            .await
    }

    async fn fetch_user(&self, user_id: u64, mode: FetchMode) -> FetchResult<User> {
        self.get_json(Resource::User, &user_path(user_id), &[], mode)
            .await
    }

    async fn fetch_user_albums(&self, user_id: u64, mode: FetchMode) -> FetchResult<Vec<Album>> {
        self.get_json(Resource::Albums, &user_albums_path(user_id), &[], mode)
            .await
    }

    async fn fetch_album_photos(
        &self,
        album_id: u64,
        limit: u32,
        mode: FetchMode,
    ) -> FetchResult<Vec<Photo>> {
        let params = [("_limit", limit.to_string())];
        self.get_json(Resource::Photos, &album_photos_path(album_id), &params, mode)
            .await
    }
}
