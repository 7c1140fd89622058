use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::{ArcJobTask, JobEvent};

struct Execution {
    task: ArcJobTask,
    event: JobEvent,
}

/// a fixed number of workers pulling from a bounded queue. submissions made
/// while the queue is full are dropped
pub struct JobExecutor {
    sender: RwLock<Option<mpsc::Sender<Execution>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl JobExecutor {
    pub fn new(workers: usize, queue: usize) -> Self {
        let (sender, receiver) = mpsc::channel(queue.max(1));
        let receiver = Arc::new(AsyncMutex::new(receiver));

        let workers = (0..workers.max(1))
            .map(|worker| tokio::spawn(work(worker, Arc::clone(&receiver))))
            .collect();

        JobExecutor {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    }

    /// false if the execution was rejected
    pub fn submit(&self, task: ArcJobTask, event: JobEvent) -> bool {
        let Ok(sender) = self.sender.read() else {
            tracing::error!("job executor lock poisoned, rejected {}", event.job_id);

            return false;
        };

        let Some(sender) = sender.as_ref() else {
            tracing::warn!("job executor shut down, rejected {}", event.job_id);

            return false;
        };

        match sender.try_send(Execution { task, event }) {
            Ok(()) => true,
            Err(TrySendError::Full(execution)) => {
                tracing::warn!(
                    "job executor saturated, rejected {}",
                    execution.event.job_id
                );

                false
            }
            Err(TrySendError::Closed(execution)) => {
                tracing::error!(
                    "job executor closed, rejected {}",
                    execution.event.job_id
                );

                false
            }
        }
    }

    /// stops accepting executions and waits for the queued ones to finish.
    /// later calls return immediately
    pub async fn shutdown(&self) {
        if let Ok(mut sender) = self.sender.write() {
            sender.take();
        }

        let workers = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(_) => Vec::new(),
        };

        for handle in workers {
            if let Err(err) = handle.await {
                tracing::error!("job worker failed: {err}");
            }
        }
    }
}

async fn work(worker: usize, receiver: Arc<AsyncMutex<mpsc::Receiver<Execution>>>) {
    loop {
        let next = {
            let mut guard = receiver.lock().await;

            guard.recv().await
        };

        let Some(Execution { task, event }) = next else {
            break;
        };

        let job_span = tracing::info_span!(
            "job",
            id = event.job_id.as_str(),
            worker = worker
        );

        async {
            tracing::debug!("running {}", task.name());

            if let Err(err) = task.execute(&event).await {
                tracing::error!("job failed with error: {err}");
            }
        }
            .instrument(job_span)
            .await;
    }

    tracing::debug!("job worker {worker} finished");
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use futures::future::BoxFuture;
    use tokio::sync::Notify;

    use super::*;
    use crate::error;
    use crate::jobs::JobTask;

    struct Blocking {
        started: mpsc::UnboundedSender<()>,
        release: Notify,
        runs: AtomicUsize,
    }

    impl JobTask for Blocking {
        fn execute<'a>(&'a self, _event: &'a JobEvent) -> BoxFuture<'a, error::Result<()>> {
            Box::pin(async move {
                let _ = self.started.send(());

                self.release.notified().await;
                self.runs.fetch_add(1, Ordering::Relaxed);

                Ok(())
            })
        }
    }

    fn event(id: &str) -> JobEvent {
        JobEvent {
            job_id: id.into(),
            fired: Utc::now(),
        }
    }

    #[tokio::test]
    async fn rejects_when_saturated() {
        let (started, mut started_rx) = mpsc::unbounded_channel();
        let task = Arc::new(Blocking {
            started,
            release: Notify::new(),
            runs: AtomicUsize::new(0),
        });

        let executor = JobExecutor::new(1, 1);

        assert!(executor.submit(task.clone(), event("Blocking-1")));

        // the single worker is now busy
        started_rx.recv().await.unwrap();

        assert!(executor.submit(task.clone(), event("Blocking-2")));
        assert!(!executor.submit(task.clone(), event("Blocking-3")));

        task.release.notify_one();
        started_rx.recv().await.unwrap();
        task.release.notify_one();

        executor.shutdown().await;

        assert_eq!(task.runs.load(Ordering::Relaxed), 2);
        assert!(!executor.submit(task.clone(), event("Blocking-4")));
    }
}
