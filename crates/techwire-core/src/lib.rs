pub mod ai;
pub mod articles;
pub mod config;
pub mod content;
pub mod error;
pub mod rss;
pub mod scheduler;
pub mod scrape;
pub mod seo;
pub mod sources;
pub mod storage;

pub use config::AppConfig;
pub use error::{Error, Result};
