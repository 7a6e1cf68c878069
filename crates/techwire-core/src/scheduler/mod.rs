mod frequency;
mod runner;
mod service;
mod task;

pub use frequency::Frequency;
pub use runner::{RunSummary, TaskRunner};
pub use service::SchedulerService;
pub use task::{NewTask, RunStatus, ScheduledTask, TaskKind};
