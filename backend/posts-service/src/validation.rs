//! Form validation shared by the HTTP handlers and the services.
//!
//! These functions only look at the submitted values. Checks that need the
//! store (group existence, slug uniqueness) happen in the services, which add
//! their findings to the same `ValidationErrors`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

pub const MSG_TEXT_REQUIRED: &str = "text required";
pub const MSG_UNKNOWN_GROUP: &str = "unknown group";

const SLUG_MAX_LEN: usize = 50;

lazy_static! {
    static ref SLUG_RE: Regex = Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex");
}

/// Submitted post form. `group` carries a group id; empty means no group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: Option<String>,
}

/// Submitted comment form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct GroupForm {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 50, message = "slug must be 1-50 characters"))]
    pub slug: String,
}

/// Post fields after form-level checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<Uuid>,
}

impl PostForm {
    pub fn new(text: impl Into<String>, group: Option<Uuid>) -> Self {
        Self {
            text: text.into(),
            group: group.map(|id| id.to_string()),
        }
    }

    /// Trim the text and parse the group reference. A group id that is not
    /// even a UUID cannot name an existing group, so it is reported the same
    /// way as a missing one.
    pub fn clean(&self) -> Result<CleanPost, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let text = clean_text(&self.text, &mut errors);

        let group_id = match self.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match Uuid::parse_str(raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("group", unknown_group());
                    None
                }
            },
        };

        if errors.is_empty() {
            Ok(CleanPost { text, group_id })
        } else {
            Err(errors)
        }
    }
}

impl CommentForm {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn clean(&self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let text = clean_text(&self.text, &mut errors);
        if errors.is_empty() {
            Ok(text)
        } else {
            Err(errors)
        }
    }
}

impl GroupForm {
    pub fn clean(&self) -> Result<GroupForm, ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        let title = self.title.trim();
        if title.is_empty() && !self.title.is_empty() {
            errors.add("title", message_error("blank", "title required"));
        }

        let slug = self.slug.trim();
        if !slug.is_empty() && !is_valid_slug(slug) {
            errors.add(
                "slug",
                message_error(
                    "invalid_slug",
                    "slug may contain only letters, digits, hyphens and underscores",
                ),
            );
        }

        if errors.is_empty() {
            Ok(GroupForm {
                title: title.to_string(),
                description: self.description.trim().to_string(),
                slug: slug.to_string(),
            })
        } else {
            Err(errors)
        }
    }
}

/// Whether `slug` is URL-safe and short enough to be a group slug.
pub fn is_valid_slug(slug: &str) -> bool {
    slug.len() <= SLUG_MAX_LEN && SLUG_RE.is_match(slug)
}

/// Derive a slug from a title: ASCII letters and digits are kept (lowercased),
/// every other run of characters collapses into a single hyphen.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug.truncate(SLUG_MAX_LEN);
    slug.trim_end_matches('-').to_string()
}

pub fn unknown_group() -> ValidationError {
    message_error("unknown_group", MSG_UNKNOWN_GROUP)
}

fn clean_text(raw: &str, errors: &mut ValidationErrors) -> String {
    let text = raw.trim();
    if text.is_empty() {
        errors.add("text", message_error("required", MSG_TEXT_REQUIRED));
    }
    text.to_string()
}

fn message_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}
