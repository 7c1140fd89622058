use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use super::{ArcJobTask, JobExecutor, JobStatus, JobTrigger};

struct RegisteredJob {
    task: ArcJobTask,
    trigger: JobTrigger,
}

/// a snapshot of a registered job
#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub id: String,
    pub task_name: String,
    pub trigger_name: String,
    pub status: JobStatus,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
}

impl JobInfo {
    fn of(id: &str, job: &RegisteredJob) -> Self {
        JobInfo {
            id: id.to_owned(),
            task_name: job.task.name().to_owned(),
            trigger_name: job.trigger.name().to_owned(),
            status: job.trigger.status(),
            last_run: job.trigger.last_run(),
            next_run: job.trigger.next_run(),
        }
    }
}

/// jobs are identified by `<task name>-<n>` where `n` counts the
/// registrations of a task name starting at 1
pub struct JobRegistry {
    executor: Arc<JobExecutor>,
    counters: DashMap<&'static str, u64>,
    live: DashMap<String, RegisteredJob>,
    stopped: DashMap<String, RegisteredJob>,
}

impl JobRegistry {
    pub fn new(executor: Arc<JobExecutor>) -> Self {
        JobRegistry {
            executor,
            counters: DashMap::new(),
            live: DashMap::new(),
            stopped: DashMap::new(),
        }
    }

    fn next_id(&self, name: &'static str) -> String {
        let mut count = self.counters.entry(name).or_insert(0);
        *count += 1;

        format!("{}-{}", name, *count)
    }

    /// starts the trigger and returns the id of the new job
    pub fn register(&self, task: ArcJobTask, trigger: JobTrigger) -> String {
        let id = self.next_id(task.name());

        trigger.start(id.clone(), Arc::clone(&task), Arc::clone(&self.executor));

        tracing::info!("registered job {} with {} trigger", id, trigger.kind());

        self.live.insert(id.clone(), RegisteredJob { task, trigger });

        id
    }

    /// stops the trigger of a live job. unknown ids are ignored
    pub fn unregister(&self, id: &str) {
        let Some((id, job)) = self.live.remove(id) else {
            return;
        };

        job.trigger.stop();

        tracing::info!("unregistered job {}", id);

        self.stopped.insert(id, job);
    }

    pub fn job(&self, id: &str) -> Option<JobInfo> {
        self.live.get(id).map(|entry| JobInfo::of(entry.key(), entry.value()))
    }

    /// all live jobs ordered by id
    pub fn jobs(&self) -> Vec<JobInfo> {
        let mut list: Vec<JobInfo> = self.live.iter()
            .map(|entry| JobInfo::of(entry.key(), entry.value()))
            .collect();

        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    pub fn stopped(&self) -> Vec<JobInfo> {
        let mut list: Vec<JobInfo> = self.stopped.iter()
            .map(|entry| JobInfo::of(entry.key(), entry.value()))
            .collect();

        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    /// stops every live job then waits for the executions already queued
    pub async fn shutdown(&self) {
        let ids: Vec<String> = self.live.iter()
            .map(|entry| entry.key().clone())
            .collect();

        for id in ids {
            self.unregister(&id);
        }

        self.executor.shutdown().await;

        tracing::info!("job registry shut down");
    }
}
