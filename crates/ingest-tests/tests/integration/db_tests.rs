//! Metadata Store (Postgres) integration tests.

/// Test that the pool connects and embedded migrations apply cleanly.
#[tokio::test]
#[ignore = "requires a live Postgres instance reachable via DATABASE_URL"]
async fn test_connect_and_migrate() {
    dotenvy::dotenv().ok();

    let config = ingest_db::DbConfig::from_env().expect("DATABASE_URL not set");
    let pool = ingest_db::connect(&config)
        .await
        .expect("failed to connect and migrate");

    let row: (i32,) = sqlx::query_as("SELECT 1")
        .fetch_one(&pool)
        .await
        .expect("SELECT 1 failed");
    assert_eq!(row.0, 1);
}

/// Test user get-or-create idempotency on `external_auth_id`.
#[tokio::test]
#[ignore = "requires a live Postgres instance reachable via DATABASE_URL"]
async fn test_user_get_or_create_is_idempotent() {
    use ingest_db::UserRepository;
    use ingest_models::User;

    dotenvy::dotenv().ok();

    let config = ingest_db::DbConfig::from_env().expect("DATABASE_URL not set");
    let pool = ingest_db::connect(&config).await.expect("connect failed");
    let repo = UserRepository::new(pool);

    let external_id = format!("integration-test|{}", uuid::Uuid::new_v4());
    let seed = User::new_from_verified_identity(external_id.clone(), "integration@example.com", true);

    let first = repo.get_or_create(&seed).await.expect("first get_or_create");
    let second = repo
        .get_or_create(&User::new_from_verified_identity(
            external_id,
            "integration@example.com",
            true,
        ))
        .await
        .expect("second get_or_create");

    assert_eq!(first.user_id, second.user_id);
}

/// Test video creation, ownership-scoped lookup, listing order, and the
/// state-machine save path.
#[tokio::test]
#[ignore = "requires a live Postgres instance reachable via DATABASE_URL"]
async fn test_video_repository_crud_and_ordering() {
    use ingest_db::{UserRepository, VideoRepository};
    use ingest_models::{User, Video};

    dotenvy::dotenv().ok();

    let config = ingest_db::DbConfig::from_env().expect("DATABASE_URL not set");
    let pool = ingest_db::connect(&config).await.expect("connect failed");

    let users = UserRepository::new(pool.clone());
    let videos = VideoRepository::new(pool);

    let user = users
        .get_or_create(&User::new_from_verified_identity(
            format!("integration-test|{}", uuid::Uuid::new_v4()),
            "video-owner@example.com",
            true,
        ))
        .await
        .expect("create user");

    let mut created = Vec::new();
    for i in 0..3 {
        let video = Video::new_uploading(
            user.user_id,
            format!("uploads/{}/{}/clip-{i}.mp4", user.user_id, uuid::Uuid::new_v4()),
            "video/mp4",
            1_000_000,
        );
        videos.create(&video).await.expect("create video");
        created.push(video);
    }

    let listed = videos
        .list_owned(&user.user_id, 10, 0)
        .await
        .expect("list_owned");
    assert!(listed.len() >= 3);
    // Deterministic order: created_at DESC, so the most recently created
    // of our three videos comes out ahead of the earliest.
    let last_created = created.last().unwrap().video_id;
    assert!(listed.iter().take(3).any(|v| v.video_id == last_created));

    let fetched = videos
        .get_owned(&user.user_id, &created[0].video_id)
        .await
        .expect("get_owned");
    assert_eq!(fetched.video_id, created[0].video_id);

    let indexed = fetched
        .begin_validating()
        .begin_processing(42.0)
        .mark_indexed();
    videos.save(&indexed).await.expect("save transition");

    let reloaded = videos.get(&indexed.video_id).await.expect("get by id");
    assert_eq!(reloaded.state, ingest_models::VideoState::Indexed);
    assert!(reloaded.indexed_at.is_some());
}

/// Test the advisory lock used for pipeline-entry mutual exclusion:
/// a second taker on the same `video_id` must not acquire it.
#[tokio::test]
#[ignore = "requires a live Postgres instance reachable via DATABASE_URL"]
async fn test_advisory_lock_excludes_concurrent_taker() {
    use ingest_db::VideoLock;
    use ingest_models::VideoId;

    dotenvy::dotenv().ok();

    let config = ingest_db::DbConfig::from_env().expect("DATABASE_URL not set");
    let pool = ingest_db::connect(&config).await.expect("connect failed");

    let video_id = VideoId::new();

    let first = VideoLock::try_acquire(&pool, &video_id)
        .await
        .expect("first acquire attempt");
    assert!(first.is_some(), "first caller should acquire the lock");

    let second = VideoLock::try_acquire(&pool, &video_id)
        .await
        .expect("second acquire attempt");
    assert!(
        second.is_none(),
        "second concurrent caller must not acquire the same lock"
    );

    drop(first);
}
