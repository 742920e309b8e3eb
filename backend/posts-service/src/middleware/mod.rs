/// HTTP middleware utilities for posts-service
///
/// Provides optional session authentication (JWT issued by the external auth
/// subsystem) and simple request timing logs.
pub mod permissions;

pub use permissions::*;

use crate::error::AppError;
use crate::handlers::AppState;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Cookie consulted when no `Authorization` header is present.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

const DEFAULT_LOGIN_URL: &str = "/auth/login/";

// =====================================================================
// Session authentication
// =====================================================================

/// Claims carried by identity tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub exp: usize,
}

/// Authenticated caller, stored in request extensions by the middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
}

/// Validates HS256 identity tokens.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Option<CurrentUser> {
        let data = decode::<Claims>(token, &self.key, &self.validation).ok()?;
        let id = Uuid::parse_str(&data.claims.sub).ok()?;

        Some(CurrentUser {
            id,
            username: data.claims.username,
        })
    }
}

/// Attaches `CurrentUser` when the request carries a valid token.
///
/// Unlike a hard auth gate this never rejects: anonymous requests pass through
/// and protected handlers redirect via the `CurrentUser` extractor.
#[derive(Clone)]
pub struct SessionAuthMiddleware {
    verifier: Arc<TokenVerifier>,
}

impl SessionAuthMiddleware {
    pub fn new(secret: &str) -> Self {
        Self {
            verifier: Arc::new(TokenVerifier::new(secret)),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct SessionAuthMiddlewareService<S> {
    service: Rc<S>,
    verifier: Arc<TokenVerifier>,
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = bearer_token(&req).or_else(|| {
            req.cookie(ACCESS_TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_string())
        });

        if let Some(token) = token {
            match self.verifier.verify(&token) {
                Some(user) => {
                    req.extensions_mut().insert(user);
                }
                None => tracing::debug!(path = %req.path(), "ignoring invalid session token"),
            }
        }

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Login redirect target that brings the user back to `req` afterwards.
pub fn login_redirect(req: &HttpRequest) -> String {
    let login_url = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.login_url.as_str())
        .unwrap_or(DEFAULT_LOGIN_URL);
    let next = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.path());

    format!("{}?next={}", login_url, urlencoding::encode(next))
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CurrentUser>()
                .cloned()
                .ok_or_else(|| AppError::AuthenticationRequired {
                    location: login_redirect(req),
                }),
        )
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let duration = start.elapsed();
            let elapsed = duration.as_millis();
            crate::metrics::observe_request(&method, duration.as_secs_f64());
            tracing::debug!(%method, %path, %elapsed, "request completed");
            res
        })
    }
}
