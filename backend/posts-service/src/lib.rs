/// Posts Service Library
///
/// A small publishing platform: authenticated users write text posts, file
/// them under groups, and comment on each other's posts. Listings are
/// paginated newest-first.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers returning page contexts
/// - `models`: Records for users, groups, posts, comments
/// - `services`: Business logic layer
/// - `db`: Repository traits with PostgreSQL and in-memory stores
/// - `pagination`: Page windows over ordered listings
/// - `validation`: Form checks shared by handlers and services
/// - `middleware`: Session authentication and request timing
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Observability and metrics collection
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod services;
pub mod validation;

pub use config::Config;
pub use error::{AppError, Result};
