/// Business logic layer for posts-service
///
/// This module provides high-level operations:
/// - Post service: publishing, author-only edits and deletes, listings
/// - Comment service: append-only comments on posts
/// - Group service: group lifecycle
///
/// Services work against `Arc<dyn Store>` and never touch HTTP types.
pub mod comments;
pub mod groups;
pub mod posts;

// Re-export commonly used services
pub use comments::CommentService;
pub use groups::GroupService;
pub use posts::{AuthorListing, PostDetail, PostService};
