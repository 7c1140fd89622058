use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use futures::future::{AbortHandle, Abortable};

use crate::error::api;

use super::{ArcJobTask, JobEvent, JobExecutor, JobStatus};

const NO_TIME: i64 = i64::MIN;

#[derive(Debug, Clone)]
pub enum TriggerKind {
    Cron {
        expression: String,
        schedule: Box<cron::Schedule>,
    },
    At(DateTime<Utc>),
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerKind::Cron { expression, .. } => write!(f, "cron({})", expression),
            TriggerKind::At(time) => write!(f, "at({})", time.to_rfc3339()),
        }
    }
}

#[derive(Debug)]
struct TriggerState {
    status: AtomicU8,
    last: AtomicI64,
    next: AtomicI64,
    abort: Mutex<Option<AbortHandle>>,
}

impl TriggerState {
    fn set_time(slot: &AtomicI64, time: Option<DateTime<Utc>>) {
        slot.store(time.map(|t| t.timestamp_millis()).unwrap_or(NO_TIME), Ordering::Relaxed);
    }

    fn get_time(slot: &AtomicI64) -> Option<DateTime<Utc>> {
        match slot.load(Ordering::Relaxed) {
            NO_TIME => None,
            millis => Utc.timestamp_millis_opt(millis).single(),
        }
    }

    fn set_status(&self, status: JobStatus) {
        self.status.store(status as u8, Ordering::Relaxed);
    }

    /// only moves a running trigger into a final state
    fn finish(&self, status: JobStatus) {
        let _ = self.status.compare_exchange(
            JobStatus::Running as u8,
            status as u8,
            Ordering::Relaxed,
            Ordering::Relaxed
        );
    }
}

/// decides when a job runs
#[derive(Debug, Clone)]
pub struct JobTrigger {
    kind: TriggerKind,
    state: Arc<TriggerState>,
}

impl JobTrigger {
    fn new(kind: TriggerKind) -> Self {
        JobTrigger {
            kind,
            state: Arc::new(TriggerState {
                status: AtomicU8::new(JobStatus::NotStarted as u8),
                last: AtomicI64::new(NO_TIME),
                next: AtomicI64::new(NO_TIME),
                abort: Mutex::new(None),
            }),
        }
    }

    /// accepts the 6 or 7 field format of the `cron` crate
    pub fn cron(expression: &str) -> api::Result<Self> {
        let schedule = cron::Schedule::from_str(expression)?;

        Ok(Self::new(TriggerKind::Cron {
            expression: expression.to_owned(),
            schedule: Box::new(schedule),
        }))
    }

    pub fn at(time: DateTime<Utc>) -> Self {
        Self::new(TriggerKind::At(time))
    }

    pub fn kind(&self) -> &TriggerKind {
        &self.kind
    }

    pub fn name(&self) -> &'static str {
        match &self.kind {
            TriggerKind::Cron { .. } => "cron",
            TriggerKind::At(_) => "at",
        }
    }

    pub fn status(&self) -> JobStatus {
        JobStatus::from_u8(self.state.status.load(Ordering::Relaxed))
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        TriggerState::get_time(&self.state.last)
    }

    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        TriggerState::get_time(&self.state.next)
    }

    /// spawns the driver that submits the task every time the trigger
    /// fires
    pub fn start(&self, job_id: String, task: ArcJobTask, executor: Arc<JobExecutor>) {
        if self.status() != JobStatus::NotStarted {
            return;
        }

        if let TriggerKind::At(time) = &self.kind {
            if *time <= Utc::now() {
                tracing::debug!("{job_id} scheduled in the past, finishing");

                self.state.set_status(JobStatus::Finished);

                return;
            }
        }

        let (handle, registration) = AbortHandle::new_pair();

        if let Ok(mut abort) = self.state.abort.lock() {
            *abort = Some(handle);
        }

        TriggerState::set_time(&self.state.next, self.first_run());

        self.state.set_status(JobStatus::Running);

        let driver = drive(self.kind.clone(), Arc::clone(&self.state), job_id.clone(), task, executor);

        tokio::spawn(async move {
            if Abortable::new(driver, registration).await.is_err() {
                tracing::debug!("{job_id} trigger aborted");
            }
        });
    }

    /// a trigger that was never started stays `NotStarted`, any other
    /// trigger becomes `Stopped`
    pub fn stop(&self) {
        let handle = match self.state.abort.lock() {
            Ok(mut abort) => abort.take(),
            Err(_) => None,
        };

        if let Some(handle) = handle {
            handle.abort();
        }

        if self.status() != JobStatus::NotStarted {
            self.state.set_status(JobStatus::Stopped);
        }

        TriggerState::set_time(&self.state.next, None);
    }

    fn first_run(&self) -> Option<DateTime<Utc>> {
        match &self.kind {
            TriggerKind::Cron { schedule, .. } => schedule.upcoming(Utc).next(),
            TriggerKind::At(time) => Some(*time),
        }
    }
}

async fn sleep_until(time: DateTime<Utc>) {
    if let Ok(delta) = (time - Utc::now()).to_std() {
        tokio::time::sleep(delta).await;
    }
}

fn fire(
    state: &TriggerState,
    job_id: &str,
    task: &ArcJobTask,
    executor: &JobExecutor
) {
    let now = Utc::now();

    TriggerState::set_time(&state.last, Some(now));

    executor.submit(Arc::clone(task), JobEvent {
        job_id: job_id.to_owned(),
        fired: now,
    });
}

async fn drive(
    kind: TriggerKind,
    state: Arc<TriggerState>,
    job_id: String,
    task: ArcJobTask,
    executor: Arc<JobExecutor>,
) {
    match kind {
        TriggerKind::Cron { schedule, .. } => {
            for next in schedule.upcoming_owned(Utc) {
                TriggerState::set_time(&state.next, Some(next));

                tracing::debug!("{job_id} next run {next}");

                sleep_until(next).await;

                fire(&state, &job_id, &task, &executor);
            }
        }
        TriggerKind::At(time) => {
            TriggerState::set_time(&state.next, Some(time));

            sleep_until(time).await;

            fire(&state, &job_id, &task, &executor);
        }
    }

    TriggerState::set_time(&state.next, None);

    state.finish(JobStatus::Finished);
}
