//! Integration tests for the ingestion workspace.
//!
//! Most tests here require external services (Postgres, Redis, an
//! S3-compatible object store) and are `#[ignore]`d by default.
//! Run with: `cargo test -p ingest-integration-tests --test integration -- --ignored`

pub mod api_tests;
pub mod db_tests;
pub mod queue_tests;
pub mod storage_tests;
