mod extractor;
mod loader;
mod sweep;

pub use extractor::ProductExtractor;
pub use loader::{HttpPageLoader, PageLoader};
pub use sweep::{sweep_scrape_sources, ScrapeOutcome};
