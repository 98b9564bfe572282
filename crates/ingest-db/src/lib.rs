//! Metadata Store client: a transactional relational store with vector
//! column support, backing Users/Videos/Scenes/Jobs/FaceProfiles.
//!
//! Repositories are typed, one per entity, each wrapping a shared
//! connection pool — the same per-entity-repository architecture the
//! workspace's earlier document-store client used, adapted to
//! `sqlx`/Postgres with `pgvector` columns for the dense embeddings.

pub mod advisory_lock;
pub mod commit;
pub mod error;
pub mod face_profile_repo;
pub mod job_repo;
pub mod pool;
pub mod scene_repo;
pub mod user_repo;
pub mod video_repo;

pub use advisory_lock::VideoLock;
pub use commit::commit_video;
pub use error::{DbError, DbResult};
pub use face_profile_repo::FaceProfileRepository;
pub use job_repo::JobRepository;
pub use pool::{connect, DbConfig};
pub use scene_repo::SceneRepository;
pub use sqlx::PgPool;
pub use user_repo::UserRepository;
pub use video_repo::VideoRepository;
