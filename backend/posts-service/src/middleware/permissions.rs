/// Authorization checks for posts
///
/// Only the author may modify a post. There is no staff override.
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Post;

/// Result type for permission checks
pub type PermissionResult = Result<(), AppError>;

/// Check if a user wrote a post
pub fn check_post_ownership(user_id: Uuid, post: &Post) -> PermissionResult {
    if post.author_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to modify this post".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post_by(author_id: Uuid) -> Post {
        Post {
            id: Uuid::new_v4(),
            text: "text".into(),
            pub_date: Utc::now(),
            author_id,
            group_id: None,
        }
    }

    #[test]
    fn author_may_modify() {
        let author = Uuid::new_v4();
        assert!(check_post_ownership(author, &post_by(author)).is_ok());
    }

    #[test]
    fn others_are_forbidden() {
        let err = check_post_ownership(Uuid::new_v4(), &post_by(Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
