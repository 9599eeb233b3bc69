pub mod assets;
pub mod posts;
