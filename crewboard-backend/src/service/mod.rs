//! Request-scoped services holding the domain rules.
//!
//! A service borrows the connection, object storage and clock from
//! [crate::AppState] for the length of one request.

pub mod comment;
pub mod project;

pub use comment::CommentService;
pub use project::ProjectService;
