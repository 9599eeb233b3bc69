use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::Result;

pub const PUBLIC_PREFIX: &str = "/assets";
const FACES_DIR: &str = "faces";

/// Which of the two post images an upload is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Face,
    Background,
}

impl ImageKind {
    pub fn from_field(name: &str) -> Option<Self> {
        match name {
            "imageURL" => Some(Self::Face),
            "backgroundimg" => Some(Self::Background),
            _ => None,
        }
    }
}

/// Uploaded images on local disk, served under `/assets`.
#[derive(Clone, Debug)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_dirs(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.root.join(FACES_DIR)).await?;
        Ok(())
    }

    /// Writes the upload with a fresh uuid prefix and returns its public path.
    pub async fn save(&self, kind: ImageKind, original_name: &str, bytes: &[u8]) -> Result<String> {
        let file_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(original_name));
        let (dir, public) = match kind {
            ImageKind::Face => (
                self.root.join(FACES_DIR),
                format!("{PUBLIC_PREFIX}/{FACES_DIR}/{file_name}"),
            ),
            ImageKind::Background => (self.root.clone(), format!("{PUBLIC_PREFIX}/{file_name}")),
        };

        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), bytes).await?;
        debug!("Stored upload at {}", public);

        Ok(public)
    }

    /// Maps a public `/assets/...` path back to the file on disk. Anything
    /// outside the asset root resolves to `None`.
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let relative = public_path.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        let relative = Path::new(relative);

        if relative.as_os_str().is_empty()
            || !relative.components().all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }

        Some(self.root.join(relative))
    }

    /// Best-effort unlink. A missing file is ignored, any other failure is
    /// logged and swallowed so it never blocks the caller.
    pub async fn remove_best_effort<'a, I>(&self, public_paths: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for public_path in public_paths {
            let Some(path) = self.resolve(public_path) else {
                warn!("Skipping cleanup of image outside the asset root: {}", public_path);
                continue;
            };

            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("Removed image {}", path.display()),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => warn!("Failed to remove image {}: {:?}", path.display(), err),
            }
        }
    }
}

fn sanitize_file_name(original_name: &str) -> String {
    let name = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        "upload".to_string()
    } else {
        name.to_string()
    }
}
