use std::sync::Arc;

use axum::{
    extract::{Multipart, Path},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use chrono::{SecondsFormat, Utc};

use crate::{
    models::posts::{
        Author, Comment, CreateCommentDto, CreatePostDto, Post, UpdatePost, DEFAULT_AUTHOR_EMAIL,
        DEFAULT_AUTHOR_NAME,
    },
    services::assets::{AssetStore, ImageKind},
    AppState, Error, Result,
};

pub fn posts_handler() -> Router {
    Router::new()
        .route("/", get(get_posts).post(create_post))
        .route(
            "/{token}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route(
            "/{token}/comments",
            post(add_comment).delete(delete_comments),
        )
}

fn base_url(headers: &HeaderMap) -> Option<String> {
    let host = headers.get(header::HOST)?.to_str().ok()?;
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|proto| proto.to_str().ok())
        .filter(|proto| proto.eq_ignore_ascii_case("https"))
        .map_or("http", |_| "https");

    Some(format!("{scheme}://{host}"))
}

fn absolute(base: &str, path: Option<String>) -> Option<String> {
    path.map(|path| {
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            path
        }
    })
}

/// Stored image paths are host-relative; responses carry full URLs.
fn with_absolute_urls(mut post: Post, base: Option<&str>) -> Post {
    if let Some(base) = base {
        post.image_url = absolute(base, post.image_url.take());
        post.backgroundimg = absolute(base, post.backgroundimg.take());
    }
    post
}

async fn get_posts(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let base = base_url(&headers);
    let posts: Vec<Post> = app_state
        .posts_service
        .get_posts()
        .await?
        .into_iter()
        .map(|post| with_absolute_urls(post, base.as_deref()))
        .collect();

    Ok((StatusCode::OK, Json(posts)))
}

async fn get_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let post = app_state
        .posts_service
        .get_post(&token)
        .await?
        .ok_or(Error::NotFound)?;

    Ok((
        StatusCode::OK,
        Json(with_absolute_urls(post, base_url(&headers).as_deref())),
    ))
}

#[derive(Default)]
struct PostForm {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    author_name: Option<String>,
    author_email: Option<String>,
    face: Option<String>,
    background: Option<String>,
}

impl PostForm {
    fn uploads(&self) -> impl Iterator<Item = &str> {
        self.face.iter().chain(self.background.iter()).map(String::as_str)
    }

    fn into_dto(self) -> CreatePostDto {
        let author = Author {
            name: self
                .author_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string()),
            email: self
                .author_email
                .filter(|email| !email.is_empty())
                .unwrap_or_else(|| DEFAULT_AUTHOR_EMAIL.to_string()),
        };

        CreatePostDto {
            title: self.title,
            description: self.description,
            content: self.content,
            author: Some(author),
            image_url: self.face,
            backgroundimg: self.background,
            comments: None,
        }
    }
}

async fn read_form(multipart: &mut Multipart, assets: &AssetStore, form: &mut PostForm) -> Result<()> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(kind) = ImageKind::from_field(&name) {
            let slot = match kind {
                ImageKind::Face => &mut form.face,
                ImageKind::Background => &mut form.background,
            };
            if slot.is_some() {
                return Err(Error::BadRequest(format!("Only one {name} file is allowed")));
            }

            let file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await?;
            *slot = Some(assets.save(kind, &file_name, &bytes).await?);
            continue;
        }

        let value = field.text().await?;
        match name.as_str() {
            "title" => form.title = Some(value),
            "description" => form.description = Some(value),
            "content" => form.content = Some(value),
            "authorName" => form.author_name = Some(value),
            "authorEmail" => form.author_email = Some(value),
            _ => {}
        }
    }

    Ok(())
}

async fn create_post(
    Extension(app_state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let assets = app_state.posts_service.assets();
    let mut form = PostForm::default();

    let read = read_form(&mut multipart, assets, &mut form).await;
    if let Err(err) = read {
        assets.remove_best_effort(form.uploads()).await;
        return Err(err);
    }

    if form.face.is_none() || form.background.is_none() {
        assets.remove_best_effort(form.uploads()).await;
        return Err(Error::BadRequest("Both images are required".to_string()));
    }

    let post = app_state.posts_service.create_post(form.into_dto()).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(token): Path<String>,
    WithRejection(Json(patch), _): WithRejection<Json<UpdatePost>, Error>,
) -> Result<impl IntoResponse> {
    app_state.posts_service.update_post(&token, patch).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse> {
    app_state.posts_service.delete_post(&token).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn add_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(token): Path<String>,
    WithRejection(Json(comment), _): WithRejection<Json<CreateCommentDto>, Error>,
) -> Result<impl IntoResponse> {
    let (Some(user), Some(text)) = (
        comment.user.filter(|user| !user.is_empty()),
        comment.text.filter(|text| !text.is_empty()),
    ) else {
        return Err(Error::BadRequest("User and text are required".to_string()));
    };

    let comment = Comment {
        user,
        text,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    let comment = app_state.posts_service.add_comment(&token, comment).await?;

    Ok((StatusCode::OK, Json(comment)))
}

async fn delete_comments(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse> {
    app_state.posts_service.delete_comments(&token).await?;

    Ok(StatusCode::NO_CONTENT)
}
