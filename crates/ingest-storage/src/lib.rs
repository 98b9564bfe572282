//! Object Store Gateway client.
//!
//! Thin, stateless wrapper around an S3-compatible object store:
//! - bucket lifecycle (ensure `uploads`, `sidecars`, `tmp` exist)
//! - presigned PUT/GET URL generation
//! - streaming upload/download for worker use
//!
//! Does not verify uploaded content; that is the indexing pipeline's job.

pub mod client;
pub mod error;

pub use client::{Bucket, ObjectStat, ObjectStoreClient, ObjectStoreConfig};
pub use error::{StorageError, StorageResult};
