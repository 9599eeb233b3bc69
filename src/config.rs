use std::{env, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{bail, Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    File,
    Postgres,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(Self::File),
            "postgres" | "postgresql" | "sql" => Ok(Self::Postgres),
            other => bail!("unknown BLOG_BACKEND `{other}`, expected `file` or `postgres`"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub data_file: PathBuf,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub assets_dir: PathBuf,
    pub port: u16,
}

impl Config {
    pub fn init() -> Result<Config> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let backend = match lookup("BLOG_BACKEND") {
            Some(value) => value.parse()?,
            None => Backend::File,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if backend == Backend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when BLOG_BACKEND=postgres");
        }

        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;
        let acquire_timeout_secs = parse_or(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 3600)?;
        let port = parse_or(&lookup, "PORT", 5000)?;

        Ok(Config {
            backend,
            data_file: lookup("BLOG_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/posts.json")),
            database_url,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            assets_dir: lookup("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("assets")),
            port,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value `{value}`")),
        None => Ok(default),
    }
}
