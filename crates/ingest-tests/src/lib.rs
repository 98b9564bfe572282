//! Empty library target; this crate exists only to host
//! `tests/integration.rs` against the rest of the workspace.
