//! Job Queue (Redis Streams) integration tests.

/// Test connection and bare queue length reads.
#[tokio::test]
#[ignore = "requires a live Redis instance reachable via REDIS_URL"]
async fn test_queue_connection() {
    dotenvy::dotenv().ok();

    let queue = ingest_queue::JobQueue::from_env().expect("failed to build JobQueue");
    queue.init().await.expect("failed to init consumer group");

    let len = queue.len().await.expect("failed to read queue length");
    println!("queue length: {}", len);
}

/// Test the enqueue/consume/ack cycle for a single ingest task.
#[tokio::test]
#[ignore = "requires a live Redis instance reachable via REDIS_URL"]
async fn test_enqueue_consume_ack_cycle() {
    use ingest_models::VideoId;

    dotenvy::dotenv().ok();

    let queue = ingest_queue::JobQueue::from_env().expect("failed to build JobQueue");
    queue.init().await.expect("failed to init consumer group");

    let video_id = VideoId::new();
    let message_id = queue
        .enqueue_ingest(video_id)
        .await
        .expect("failed to enqueue");
    assert!(!message_id.is_empty());

    let consumer = format!("integration-test-{}", uuid::Uuid::new_v4());
    let jobs = queue
        .consume(&consumer, 2_000, 10)
        .await
        .expect("failed to consume");

    let (claimed_id, job) = jobs
        .into_iter()
        .find(|(_, job)| job.video_id() == video_id)
        .expect("enqueued task should be delivered back to us");

    queue.ack(&claimed_id).await.expect("failed to ack");
    queue.clear_dedup(&job).await.expect("failed to clear dedup key");
}

/// Test enqueue-level idempotency: a second enqueue for the same
/// `video_id` while a task is already in flight must be suppressed.
#[tokio::test]
#[ignore = "requires a live Redis instance reachable via REDIS_URL"]
async fn test_idempotency_key_suppresses_duplicate_enqueue() {
    dotenvy::dotenv().ok();

    let queue = ingest_queue::JobQueue::from_env().expect("failed to build JobQueue");

    let key = format!("integration-test:idempotency:{}", uuid::Uuid::new_v4());
    let first = queue
        .try_acquire_idempotency(&key, 60)
        .await
        .expect("first acquire");
    assert!(first, "first caller should acquire the idempotency key");

    let second = queue
        .try_acquire_idempotency(&key, 60)
        .await
        .expect("second acquire");
    assert!(
        !second,
        "second caller must not re-acquire an already-held idempotency key"
    );

    queue.release_idempotency(&key).await.expect("release");
}

/// Test that pending messages older than the visibility timeout can be
/// claimed by a different consumer, recovering from a crashed worker.
#[tokio::test]
#[ignore = "requires a live Redis instance reachable via REDIS_URL"]
async fn test_claim_pending_recovers_stale_message() {
    use ingest_models::VideoId;

    dotenvy::dotenv().ok();

    let queue = ingest_queue::JobQueue::from_env().expect("failed to build JobQueue");
    queue.init().await.expect("failed to init consumer group");

    let video_id = VideoId::new();
    queue.enqueue_ingest(video_id).await.expect("enqueue");

    let crashed_consumer = format!("integration-test-crashed-{}", uuid::Uuid::new_v4());
    let delivered = queue
        .consume(&crashed_consumer, 2_000, 10)
        .await
        .expect("initial consume");
    assert!(delivered.iter().any(|(_, job)| job.video_id() == video_id));

    // The message is now pending against `crashed_consumer` but never
    // acked. A second consumer claims anything idle for >= 0ms, simulating
    // recovery after the original consumer died mid-task.
    let recovering_consumer = format!("integration-test-recovery-{}", uuid::Uuid::new_v4());
    let reclaimed = queue
        .claim_pending(&recovering_consumer, 0, 10)
        .await
        .expect("claim_pending");

    let (message_id, job) = reclaimed
        .into_iter()
        .find(|(_, job)| job.video_id() == video_id)
        .expect("stale message should be claimable by another consumer");

    queue.ack(&message_id).await.expect("ack after reclaim");
    queue.clear_dedup(&job).await.expect("clear dedup key");
}
