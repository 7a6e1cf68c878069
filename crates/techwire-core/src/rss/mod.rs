mod fetcher;
mod parser;
mod sweep;

pub use fetcher::FeedFetcher;
pub use parser::parse_feed;
pub use sweep::{sweep_rss_sources, SweepOutcome};
