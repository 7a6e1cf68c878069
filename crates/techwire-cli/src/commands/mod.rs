pub mod article;
pub mod fetch;
pub mod generate;
pub mod run_tasks;
pub mod scrape;
pub mod source;
pub mod task;
pub mod watch;
