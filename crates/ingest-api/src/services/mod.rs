//! Business logic services.

pub mod user;

pub use user::UserService;
