use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    models::posts::{Comment, CreatePostDto, Post, UpdatePost},
    services::assets::AssetStore,
    Error, Result,
};

use super::{new_token, PostsRepository};

/// All posts in one pretty-printed JSON array.
///
/// Every mutation reads the whole document, changes it in memory and writes
/// it back. There is no lock around that sequence, so two concurrent writers
/// can lose one of the updates.
#[derive(Clone)]
pub struct JsonFileRepo {
    path: PathBuf,
    assets: AssetStore,
}

impl JsonFileRepo {
    /// Creates the document as an empty array if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>, assets: AssetStore) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        match tokio::fs::metadata(&path).await {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("{} does not exist, starting with no posts", path.display());
                tokio::fs::write(&path, "[]").await?;
            }
            Err(err) => return Err(err.into()),
        }

        Ok(Self { path, assets })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) async fn read_posts(&self) -> Result<Vec<Post>> {
        let data = tokio::fs::read_to_string(&self.path).await?;
        let posts = serde_json::from_str(&data)?;
        Ok(posts)
    }

    pub(crate) async fn write_posts(&self, posts: &[Post]) -> Result<()> {
        let data = serde_json::to_string_pretty(posts)?;
        tokio::fs::write(&self.path, data).await?;
        Ok(())
    }
}

#[async_trait]
impl PostsRepository for JsonFileRepo {
    async fn get_posts(&self) -> Result<Vec<Post>> {
        self.read_posts().await
    }

    async fn get_post(&self, token: &str) -> Result<Option<Post>> {
        let posts = self.read_posts().await?;
        Ok(posts.into_iter().find(|post| post.token == token))
    }

    async fn create_post(&self, post: CreatePostDto) -> Result<Post> {
        let post = post.into_post_with_defaults(new_token());

        let mut posts = self.read_posts().await?;
        posts.push(post.clone());
        self.write_posts(&posts).await?;
        info!("Created post {}", post.token);

        Ok(post)
    }

    /// Unknown tokens are ignored.
    async fn update_post(&self, token: &str, patch: UpdatePost) -> Result<()> {
        let mut posts = self.read_posts().await?;

        if let Some(post) = posts.iter_mut().find(|post| post.token == token) {
            post.apply(patch);
        }

        self.write_posts(&posts).await
    }

    async fn delete_post(&self, token: &str) -> Result<()> {
        let mut posts = self.read_posts().await?;

        let Some(index) = posts.iter().position(|post| post.token == token) else {
            return Ok(());
        };
        let removed = posts.remove(index);
        self.write_posts(&posts).await?;
        info!("Deleted post {}", token);

        // Images another post was patched to point at stay on disk.
        let orphans: Vec<&str> = removed
            .image_paths()
            .into_iter()
            .filter(|path| !posts.iter().any(|post| post.references_image(path)))
            .collect();
        self.assets.remove_best_effort(orphans).await;

        Ok(())
    }

    async fn get_comments(&self, token: &str) -> Result<Vec<Comment>> {
        let post = self.get_post(token).await?;
        Ok(post.map(|post| post.comments).unwrap_or_default())
    }

    async fn add_comment(&self, token: &str, comment: Comment) -> Result<Comment> {
        comment.validate()?;

        let mut posts = self.read_posts().await?;
        let post = posts
            .iter_mut()
            .find(|post| post.token == token)
            .ok_or(Error::NotFound)?;

        post.comments.push(comment.clone());
        self.write_posts(&posts).await?;

        Ok(comment)
    }

    async fn delete_comments(&self, token: &str) -> Result<()> {
        let mut posts = self.read_posts().await?;

        let Some(post) = posts.iter_mut().find(|post| post.token == token) else {
            return Ok(());
        };
        post.comments.clear();

        self.write_posts(&posts).await
    }
}
