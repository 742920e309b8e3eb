use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use db_pool::{create_pool as create_pg_pool, DbConfig as DbPoolConfig};
use posts_service::config::StoreBackend;
use posts_service::db::{MemoryStore, PgStore, Store};
use posts_service::handlers::{self, AppState};
use posts_service::middleware;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    db_pool: Option<sqlx::PgPool>,
}

impl HealthState {
    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        match &self.db_pool {
            Some(pool) => sqlx::query("SELECT 1").fetch_one(pool).await.map(|_| ()),
            None => Ok(()),
        }
    }
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.check_postgres().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "posts-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "posts-service"
        })),
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Posts Service
///
/// Serves the feed, group and profile listings, post detail pages, and the
/// post and comment forms.
///
/// # Routes
///
/// - `/`, `/group/{slug}/`, `/profile/{username}/` - paginated listings
/// - `/posts/{post_id}/` - post detail with comments
/// - `/create/`, `/posts/{post_id}/edit/` - post form (authenticated)
/// - `/posts/{post_id}/comment/`, `/posts/{post_id}/delete/` - authenticated actions
/// - `/health`, `/health/live`, `/metrics` - operations
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match posts_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting posts-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let (store, db_pool): (Arc<dyn Store>, Option<sqlx::PgPool>) = match config.database.backend {
        StoreBackend::Postgres => {
            let mut db_cfg = DbPoolConfig::from_env("posts-service", &config.database.url)
                .map_err(anyhow::Error::msg)
                .context("invalid database pool configuration")?;
            if std::env::var("DB_MAX_CONNECTIONS").is_err() {
                db_cfg.max_connections = config.database.max_connections;
                db_cfg.min_connections = db_cfg.min_connections.min(db_cfg.max_connections);
            }

            db_cfg.log_config();
            let pool = create_pg_pool(db_cfg)
                .await
                .context("failed to create database pool")?;

            let pg_store = PgStore::new(pool.clone());
            pg_store
                .migrate()
                .await
                .context("failed to run database migrations")?;

            tracing::info!("Connected to database via db-pool crate");
            (Arc::new(pg_store) as Arc<dyn Store>, Some(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on shutdown");
            (Arc::new(MemoryStore::new()) as Arc<dyn Store>, None)
        }
    };

    let app_state = web::Data::new(AppState::new(
        store,
        config.listing.items_per_page,
        config.auth.login_url.clone(),
    ));
    let health_state = web::Data::new(HealthState { db_pool });
    let session_auth = middleware::SessionAuthMiddleware::new(&config.auth.jwt_secret);

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", http_bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(health_state.clone())
            .wrap(session_auth.clone())
            .wrap(middleware::MetricsMiddleware)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(posts_service::metrics::serve_metrics),
            )
            // Health check endpoints
            .route("/health", web::get().to(health_summary))
            .route("/health/live", web::get().to(liveness_check))
            .configure(handlers::configure)
    })
    .bind(&http_bind_address)
    .with_context(|| format!("failed to bind {}", http_bind_address))?
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            result
                .context("HTTP server task panicked")?
                .context("HTTP server failed")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            server_task
                .await
                .context("HTTP server task panicked")?
                .context("HTTP server failed")?;
        }
    }

    tracing::info!("posts-service shut down");
    Ok(())
}
