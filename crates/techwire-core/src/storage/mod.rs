mod article_repo;
mod database;
mod product_repo;
mod source_repo;
mod task_repo;

pub use article_repo::{ArticleRepository, FeedUpsert};
pub use database::Database;
pub use product_repo::{ProductRepository, ProductUpsert};
pub use source_repo::SourceRepository;
pub use task_repo::TaskRepository;
