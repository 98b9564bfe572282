//! Object Store Gateway (S3-compatible) integration tests.

use ingest_storage::Bucket;

/// Test connectivity and bucket bootstrap.
#[tokio::test]
#[ignore = "requires OSG_* credentials for a live S3-compatible endpoint"]
async fn test_connectivity_and_ensure_buckets() {
    dotenvy::dotenv().ok();

    let client = ingest_storage::ObjectStoreClient::from_env()
        .await
        .expect("failed to build ObjectStoreClient");

    client
        .ensure_buckets()
        .await
        .expect("failed to ensure buckets");

    client
        .check_connectivity()
        .await
        .expect("connectivity check failed");
}

/// Test presigned PUT and GET URL generation.
#[tokio::test]
#[ignore = "requires OSG_* credentials for a live S3-compatible endpoint"]
async fn test_presigned_urls() {
    dotenvy::dotenv().ok();

    let client = ingest_storage::ObjectStoreClient::from_env()
        .await
        .expect("failed to build ObjectStoreClient");

    let key = format!("integration-test/{}/source.mp4", uuid::Uuid::new_v4());

    let put_url = client
        .presign_put(Bucket::Uploads, &key, "video/mp4", std::time::Duration::from_secs(900))
        .await
        .expect("failed to presign PUT");
    assert!(put_url.contains("X-Amz-Signature"));

    let get_url = client
        .presign_get(Bucket::Uploads, &key, std::time::Duration::from_secs(3600))
        .await
        .expect("failed to presign GET");
    assert!(get_url.contains("X-Amz-Signature"));
}

/// Test the upload/stat/download/delete cycle used by the pipeline's
/// `tmp` and `sidecars` buckets.
#[tokio::test]
#[ignore = "requires OSG_* credentials for a live S3-compatible endpoint"]
async fn test_upload_stat_download_delete_cycle() {
    dotenvy::dotenv().ok();

    let client = ingest_storage::ObjectStoreClient::from_env()
        .await
        .expect("failed to build ObjectStoreClient");

    let key = format!("integration-test/{}/sidecar.json", uuid::Uuid::new_v4());
    let body = br#"{"scene_id":"test","start_s":0.0,"end_s":2.0}"#.to_vec();

    client
        .upload_bytes(Bucket::Sidecars, body.clone(), &key, "application/json")
        .await
        .expect("failed to upload");

    let stat = client
        .stat(Bucket::Sidecars, &key)
        .await
        .expect("failed to stat");
    assert_eq!(stat.size_bytes, body.len() as u64);

    let downloaded = client
        .download_bytes(Bucket::Sidecars, &key)
        .await
        .expect("failed to download");
    assert_eq!(downloaded, body);

    assert!(client
        .exists(Bucket::Sidecars, &key)
        .await
        .expect("exists check failed"));

    client
        .delete_object(Bucket::Sidecars, &key)
        .await
        .expect("failed to delete");

    assert!(!client
        .exists(Bucket::Sidecars, &key)
        .await
        .expect("exists check after delete failed"));
}
