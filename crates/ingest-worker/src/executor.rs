//! Job executor: consumes `video_id` tasks from the queue and drives
//! each one through [`crate::pipeline::run`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use ingest_queue::{JobQueue, QueueJob};

use crate::config::WorkerConfig;
use crate::context::WorkerContext;
use crate::error::WorkerResult;
use crate::pipeline;

/// Job executor that processes ingest tasks from the queue.
pub struct JobExecutor {
    config: WorkerConfig,
    queue: Arc<JobQueue>,
    ctx: Arc<WorkerContext>,
    job_semaphore: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(config: WorkerConfig, queue: JobQueue, ctx: WorkerContext) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let consumer_name = format!("ingest-worker-{}", Uuid::new_v4());

        Self {
            config,
            queue: Arc::new(queue),
            ctx: Arc::new(ctx),
            job_semaphore,
            shutdown,
            consumer_name,
        }
    }

    /// Start the executor's consume loop. Runs until [`Self::shutdown`]
    /// is called.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            consumer = %self.consumer_name,
            max_concurrent_jobs = self.config.max_concurrent_jobs,
            "starting ingest-worker job executor",
        );

        self.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();
        let claim_task = self.spawn_claim_task();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_jobs() => {
                    if let Err(e) = result {
                        error!(error = %e, "error consuming jobs, backing off");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("waiting for in-flight jobs to complete");
        let _ = tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs()).await;

        info!("job executor stopped");
        Ok(())
    }

    /// Signal shutdown; in-flight jobs are allowed to finish.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    fn spawn_claim_task(&self) -> tokio::task::JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let ctx = Arc::clone(&self.ctx);
        let semaphore = Arc::clone(&self.job_semaphore);
        let consumer_name = self.consumer_name.clone();
        let claim_interval = self.config.claim_interval;
        let claim_min_idle_ms = self.config.claim_min_idle.as_millis() as u64;
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match queue.claim_pending(&consumer_name, claim_min_idle_ms, 5).await {
                            Ok(jobs) if !jobs.is_empty() => {
                                info!(count = jobs.len(), "claimed pending jobs from crashed workers");
                                for (message_id, job) in jobs {
                                    let ctx = Arc::clone(&ctx);
                                    let queue = Arc::clone(&queue);
                                    let permit = match semaphore.clone().acquire_owned().await {
                                        Ok(p) => p,
                                        Err(_) => break,
                                    };
                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        Self::execute_job(ctx, queue, message_id, job).await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => warn!(error = %e, "failed to claim pending jobs"),
                        }
                    }
                }
            }
        })
    }

    async fn consume_jobs(&self) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let jobs = self
            .queue
            .consume(&self.consumer_name, 1000, available.min(5))
            .await?;

        if jobs.is_empty() {
            return Ok(());
        }

        debug!(count = jobs.len(), "consumed jobs from queue");

        for (message_id, job) in jobs {
            let ctx = Arc::clone(&self.ctx);
            let queue = Arc::clone(&self.queue);
            let permit = self
                .job_semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| crate::error::WorkerError::dependency_unavailable("semaphore closed"))?;

            tokio::spawn(async move {
                let _permit = permit;
                Self::execute_job(ctx, queue, message_id, job).await;
            });
        }

        Ok(())
    }

    /// Run the pipeline for one task and resolve its queue message.
    ///
    /// A fatal pipeline failure has already marked the video `Failed` by
    /// the time this returns, so the message is acked either way --
    /// there is nothing left for redelivery to retry. A transient
    /// failure leaves the message pending so it is picked up again by
    /// the claim task or redelivered to another consumer; it only
    /// reaches the dead-letter queue after `max_retries` transient
    /// attempts.
    async fn execute_job(
        ctx: Arc<WorkerContext>,
        queue: Arc<JobQueue>,
        message_id: String,
        job: QueueJob,
    ) {
        let video_id = job.video_id();
        info!(%video_id, message_id = %message_id, "executing ingest task");

        match pipeline::run(&ctx, video_id).await {
            Ok(()) => {
                if let Err(e) = queue.ack(&message_id).await {
                    error!(%video_id, error = %e, "failed to ack completed task");
                }
                if let Err(e) = queue.clear_dedup(&job).await {
                    warn!(%video_id, error = %e, "failed to clear dedup key");
                }
            }
            Err(e) if e.is_fatal() => {
                warn!(%video_id, error = %e, "task failed fatally, video marked failed");
                if let Err(ack_err) = queue.ack(&message_id).await {
                    error!(%video_id, error = %ack_err, "failed to ack fatally-failed task");
                }
                if let Err(e) = queue.clear_dedup(&job).await {
                    warn!(%video_id, error = %e, "failed to clear dedup key");
                }
            }
            Err(e) => {
                let retry_count = queue.increment_retry(&message_id).await.unwrap_or(u32::MAX);
                let max_retries = queue.max_retries();

                if retry_count >= max_retries {
                    warn!(%video_id, error = %e, retry_count, "task exceeded max transient retries, moving to DLQ");
                    if let Err(dlq_err) = queue.dlq(&message_id, &job, &e.to_string()).await {
                        error!(%video_id, error = %dlq_err, "failed to move task to DLQ");
                    }
                    if let Err(e) = queue.clear_dedup(&job).await {
                        warn!(%video_id, error = %e, "failed to clear dedup key");
                    }
                } else {
                    info!(%video_id, error = %e, retry_count, max_retries, "task failed transiently, leaving for redelivery");
                }
            }
        }
    }

    async fn wait_for_jobs(&self) {
        loop {
            if self.job_semaphore.available_permits() == self.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
