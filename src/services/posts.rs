use std::sync::Arc;

use crate::{
    models::posts::{Comment, CreatePostDto, Post, UpdatePost},
    repositories::PostsRepository,
    services::assets::AssetStore,
    Result,
};

#[derive(Clone)]
pub struct PostsService {
    repo: Arc<dyn PostsRepository>,
    assets: AssetStore,
}

impl PostsService {
    pub fn new(repo: Arc<dyn PostsRepository>, assets: AssetStore) -> Self {
        Self { repo, assets }
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub async fn get_posts(&self) -> Result<Vec<Post>> {
        let posts = self.repo.get_posts().await?;

        Ok(posts)
    }

    pub async fn get_post(&self, token: &str) -> Result<Option<Post>> {
        let post = self.repo.get_post(token).await?;

        Ok(post)
    }

    /// Stores the post. Uploaded images that end up unreferenced because the
    /// post was rejected are removed again.
    pub async fn create_post(&self, post: CreatePostDto) -> Result<Post> {
        let uploads: Vec<String> = [post.image_url.clone(), post.backgroundimg.clone()]
            .into_iter()
            .flatten()
            .collect();

        match self.repo.create_post(post).await {
            Ok(post) => Ok(post),
            Err(err) => {
                self.assets
                    .remove_best_effort(uploads.iter().map(String::as_str))
                    .await;
                Err(err)
            }
        }
    }

    pub async fn update_post(&self, token: &str, patch: UpdatePost) -> Result<()> {
        self.repo.update_post(token, patch).await?;
        Ok(())
    }

    pub async fn delete_post(&self, token: &str) -> Result<()> {
        self.repo.delete_post(token).await?;
        Ok(())
    }

    pub async fn add_comment(&self, token: &str, comment: Comment) -> Result<Comment> {
        let comment = self.repo.add_comment(token, comment).await?;

        Ok(comment)
    }

    pub async fn delete_comments(&self, token: &str) -> Result<()> {
        self.repo.delete_comments(token).await?;
        Ok(())
    }
}
