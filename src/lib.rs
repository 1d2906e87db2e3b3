//! Library Catalog
//!
//! Authors, books and categories with their relations, served either as
//! server-rendered HTML forms or as a JSON API.

use std::sync::Arc;

use axum::{routing::get, Router};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod web;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub repository: repository::Repository,
}

/// Routes for the surface selected by `interface.mode`. `/health` and
/// `/ready` answer at the root in both modes.
pub fn router(state: AppState) -> Router {
    let mode = state.config.interface.mode;
    match mode {
        config::InterfaceMode::Api => Router::new()
            .route("/health", get(api::health::health_check))
            .route("/ready", get(api::health::readiness_check))
            .with_state(state.clone())
            .nest("/api", api::router(state))
            .merge(api::openapi::create_openapi_router()),
        config::InterfaceMode::Html => web::router(state),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use sqlx::postgres::PgPoolOptions;

    use crate::config::{
        AppConfig, DatabaseConfig, InterfaceConfig, InterfaceMode, LoggingConfig, ServerConfig,
    };
    use crate::{repository::Repository, services::Services, AppState};

    /// State over a pool that never connects, for routes that answer
    /// before touching the database
    pub fn lazy_state(mode: InterfaceMode) -> AppState {
        let database = DatabaseConfig::default();
        let pool = PgPoolOptions::new()
            .connect_lazy(&database.url)
            .expect("lazy pool");
        let repository = Repository::new(pool);
        let config = AppConfig {
            server: ServerConfig::default(),
            database,
            logging: LoggingConfig::default(),
            interface: InterfaceConfig { mode },
        };

        AppState {
            config: Arc::new(config),
            services: Arc::new(Services::new(repository.clone(), mode)),
            repository,
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{config::InterfaceMode, testing::lazy_state};

    async fn status_of(mode: InterfaceMode, uri: &str) -> StatusCode {
        router(lazy_state(mode))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response")
            .status()
    }

    #[tokio::test]
    async fn test_health_at_root_in_both_modes() {
        assert_eq!(status_of(InterfaceMode::Api, "/health").await, StatusCode::OK);
        assert_eq!(status_of(InterfaceMode::Api, "/api/health").await, StatusCode::OK);
        assert_eq!(status_of(InterfaceMode::Html, "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_html_pages_only_in_html_mode() {
        assert_eq!(status_of(InterfaceMode::Html, "/authors/create").await, StatusCode::OK);
        assert_eq!(status_of(InterfaceMode::Api, "/authors/create").await, StatusCode::NOT_FOUND);
    }
}
