use sqlx::PgPool;
use uuid::Uuid;

use crate::services::assets::AssetStore;

pub mod json_file_repo;
pub mod posts_repo;

pub use json_file_repo::JsonFileRepo;
pub use posts_repo::PostsRepository;

#[derive(Clone)]
pub struct PostgresRepo {
    pool: PgPool,
    assets: AssetStore,
}

impl PostgresRepo {
    pub fn new(pool: PgPool, assets: AssetStore) -> Self {
        Self { pool, assets }
    }
}

/// Fresh post token. Tokens are v4 uuids and never change after creation.
pub fn new_token() -> String {
    Uuid::new_v4().to_string()
}
