//! Integration test runner.
//!
//! Run all integration tests:
//!   cargo test -p ingest-integration-tests --test integration
//!
//! Run only tests that don't require external services:
//!   cargo test -p ingest-integration-tests --test integration
//!
//! Run tests that require external services (Postgres, Redis, an
//! S3-compatible object store):
//!   cargo test -p ingest-integration-tests --test integration -- --ignored

mod integration;

pub use integration::*;
