//! # petstore-db: Entity Store and Transition Engine
//!
//! SQLite storage for pets, orders and users, plus the engine that owns every
//! pet/order status change.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Petstore Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /store/order)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   petstore-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ PetRepo       │    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo     │    │              │  │   │
//! │  │   │ Write gate    │    │ UserRepo      │    │              │  │   │
//! │  │   └───────▲───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │   ┌───────┴───────────────────────────┐                         │   │
//! │  │   │ TransitionEngine (engine.rs)      │ ◄── petstore-core rules │   │
//! │  │   │ place / update / cancel / delete  │                         │   │
//! │  │   └───────────────────────────────────┘                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, write gate and atomic units
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Pet, order and user repositories
//! - [`engine`] - State transition engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use petstore_db::{Database, DbConfig, TransitionEngine};
//!
//! let db = Database::new(DbConfig::new("./data/petstore.db")).await?;
//! let engine = TransitionEngine::new(db.clone());
//!
//! let order = engine.place_order(&principal, pet_id, 1, None).await?;
//! let inventory = db.pets().inventory().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::{EngineError, EngineResult, TransitionEngine};
pub use error::{DbError, DbResult};
pub use pool::{AtomicUnit, Database, DbConfig};

// Repository re-exports for convenience
pub use repository::order::OrderRepository;
pub use repository::pet::PetRepository;
pub use repository::user::UserRepository;
