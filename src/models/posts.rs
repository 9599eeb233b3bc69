use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

pub const DEFAULT_TITLE: &str = "Default Title";
pub const DEFAULT_DESCRIPTION: &str = "Default Description";
pub const DEFAULT_CONTENT: &str = "Default Content";
pub const DEFAULT_AUTHOR_NAME: &str = "Unknown";
pub const DEFAULT_AUTHOR_EMAIL: &str = "unknown@example.com";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Post {
    pub token: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub author: Author,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub backgroundimg: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Post {
    /// Shallow merge: every field present in the patch replaces the stored
    /// one. The token is never part of a patch.
    pub fn apply(&mut self, patch: UpdatePost) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(author) = patch.author {
            self.author = author;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = image_url;
        }
        if let Some(backgroundimg) = patch.backgroundimg {
            self.backgroundimg = backgroundimg;
        }
        if let Some(comments) = patch.comments {
            self.comments = comments;
        }
    }

    pub fn image_paths(&self) -> Vec<&str> {
        [self.image_url.as_deref(), self.backgroundimg.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn references_image(&self, path: &str) -> bool {
        self.image_url.as_deref() == Some(path) || self.backgroundimg.as_deref() == Some(path)
    }
}

#[derive(Validate, Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Author {
    #[validate(length(min = 1, message = "Author name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Author email is required"))]
    pub email: String,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            name: DEFAULT_AUTHOR_NAME.to_string(),
            email: DEFAULT_AUTHOR_EMAIL.to_string(),
        }
    }
}

#[derive(Validate, Debug, Deserialize, Serialize, Clone, PartialEq, sqlx::FromRow)]
pub struct Comment {
    #[validate(length(min = 1, message = "Comment user is required"))]
    pub user: String,
    #[validate(length(min = 1, message = "Comment text is required"))]
    pub text: String,
    #[validate(length(min = 1, message = "Comment timestamp is required"))]
    pub timestamp: String,
}

#[derive(Validate, Debug, Default, Deserialize, Clone)]
pub struct CreatePostDto {
    #[validate(
        required(message = "Title is required"),
        length(min = 1, message = "Title is required")
    )]
    pub title: Option<String>,
    #[validate(
        required(message = "Description is required"),
        length(min = 1, message = "Description is required")
    )]
    pub description: Option<String>,
    #[validate(
        required(message = "Content is required"),
        length(min = 1, message = "Content is required")
    )]
    pub content: Option<String>,
    #[validate(required(message = "Author is required"), nested)]
    pub author: Option<Author>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub backgroundimg: Option<String>,
    pub comments: Option<Vec<Comment>>,
}

impl CreatePostDto {
    /// Builds the stored post, filling every missing or empty field with its
    /// default.
    pub fn into_post_with_defaults(self, token: String) -> Post {
        Post {
            token,
            title: or_default(self.title, DEFAULT_TITLE),
            description: or_default(self.description, DEFAULT_DESCRIPTION),
            content: or_default(self.content, DEFAULT_CONTENT),
            author: self.author.unwrap_or_default(),
            image_url: self.image_url.filter(|path| !path.is_empty()),
            backgroundimg: self.backgroundimg.filter(|path| !path.is_empty()),
            comments: self.comments.unwrap_or_default(),
        }
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Body of `PUT /posts/{token}`. Image fields distinguish "absent" from an
/// explicit `null`, which clears the stored path.
#[derive(Validate, Debug, Default, Deserialize, Clone)]
pub struct UpdatePost {
    #[validate(required(message = "Title is required"))]
    pub title: Option<String>,
    #[validate(required(message = "Description is required"))]
    pub description: Option<String>,
    #[validate(required(message = "Content is required"))]
    pub content: Option<String>,
    #[validate(required(message = "Author is required"), nested)]
    pub author: Option<Author>,
    #[serde(rename = "imageURL", default, deserialize_with = "present")]
    #[validate(required(message = "imageURL is required"))]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "backgroundimg is required"))]
    pub backgroundimg: Option<Option<String>>,
    pub comments: Option<Vec<Comment>>,
}

fn present<'de, D>(deserializer: D) -> core::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentDto {
    pub user: Option<String>,
    pub text: Option<String>,
}
