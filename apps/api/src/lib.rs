//! # Petstore API
//!
//! HTTP façade over the entity store and the transition engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Petstore API                                   │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /pet          │  │  /store        │  │  /user                     ││
//! │  │                │  │                │  │                            ││
//! │  │ • add / edit   │  │ • inventory    │  │ • register / createWithList││
//! │  │ • get / delete │  │ • place order  │  │ • login / logout           ││
//! │  │ • findByStatus │  │ • get / update │  │ • get / update / delete    ││
//! │  │ • findByTags   │  │ • cancel       │  │ • orders                   ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │  ┌──────────────┐  ┌──────────────────┐  ┌─────────────────────┐ │  │
//! │  │  │  SQLite      │  │ TransitionEngine │  │    JWT Auth         │ │  │
//! │  │  │  (Database)  │  │ (status owner)   │  │    (AuthPrincipal)  │ │  │
//! │  │  └──────────────┘  └──────────────────┘  └─────────────────────┘ │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - listen port (default: 3002)
//! - `DATABASE_PATH` - SQLite file (default: ./data/petstore.db)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `DB_LOCK_TIMEOUT_MS` - atomic unit wait before 503 (default: 5000)
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_LIFETIME_SECS` - Token lifetime (default: 3600)

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::JwtManager;
use petstore_db::{Database, TransitionEngine};

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: TransitionEngine,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        AppState {
            engine: TransitionEngine::new(db.clone()),
            db,
            jwt: Arc::new(jwt),
        }
    }
}

/// Builds the full router, mounted under `/api/v3`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v3", routes::api())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
