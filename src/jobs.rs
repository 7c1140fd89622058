use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;

use crate::config;
use crate::error::{self, Context};
use crate::stats::DataPersistTask;

pub mod executor;
pub mod trigger;
pub mod registry;

pub use executor::JobExecutor;
pub use trigger::JobTrigger;
pub use registry::{JobRegistry, JobInfo};

/// delay before the first statistics persist after startup
const PERSIST_STARTUP_DELAY: i64 = 10;

/// strips the module path and any generics from a type name
pub fn short_type_name(full: &'static str) -> &'static str {
    let base = match full.find('<') {
        Some(index) => &full[..index],
        None => full,
    };

    base.rsplit("::").next().unwrap_or(base)
}

/// delivered to a task every time its trigger fires
#[derive(Debug, Clone)]
pub struct JobEvent {
    pub job_id: String,
    pub fired: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum JobStatus {
    NotStarted = 0,
    Running = 1,
    Stopped = 2,
    Finished = 3,
}

impl JobStatus {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => JobStatus::Running,
            2 => JobStatus::Stopped,
            3 => JobStatus::Finished,
            _ => JobStatus::NotStarted,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::NotStarted => "NOT_STARTED",
            JobStatus::Running => "RUNNING",
            JobStatus::Stopped => "STOPPED",
            JobStatus::Finished => "FINISHED",
        }
    }
}

impl serde::Serialize for JobStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer
    {
        serializer.serialize_str(self.as_str())
    }
}

pub trait JobTask: Send + Sync {
    fn name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    fn execute<'a>(&'a self, event: &'a JobEvent) -> BoxFuture<'a, error::Result<()>>;
}

pub type ArcJobTask = Arc<dyn JobTask>;

/// registers the built in jobs
pub fn background(
    registry: &JobRegistry,
    persist: Arc<DataPersistTask>,
    settings: &config::Jobs,
) -> error::Result<Vec<String>> {
    let cron = JobTrigger::cron(&settings.persist_cron)
        .context("invalid statistics persist schedule")?;
    let startup = JobTrigger::at(Utc::now() + Duration::seconds(PERSIST_STARTUP_DELAY));

    Ok(vec![
        registry.register(persist.clone(), cron),
        registry.register(persist, startup),
    ])
}

#[cfg(test)]
mod test {
    use super::*;

    struct TaskName;

    impl JobTask for TaskName {
        fn execute<'a>(&'a self, _event: &'a JobEvent) -> BoxFuture<'a, error::Result<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[test]
    fn type_names() {
        assert_eq!(TaskName.name(), "TaskName");
        assert_eq!(short_type_name("a::b::Task<c::D>"), "Task");
        assert_eq!(short_type_name("Task"), "Task");
    }

    #[test]
    fn status_values() {
        for status in [JobStatus::NotStarted, JobStatus::Running, JobStatus::Stopped, JobStatus::Finished] {
            assert_eq!(JobStatus::from_u8(status as u8), status);
        }
    }
}
