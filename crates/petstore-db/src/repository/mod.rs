//! # Repository Module
//!
//! Database repository implementations for the petstore.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Ways Into the Store                              │
//! │                                                                         │
//! │  HTTP handler                        TransitionEngine                   │
//! │       │                                    │                            │
//! │       │  db.pets().find_by_status(..)      │  db.atomic()               │
//! │       ▼                                    ▼                            │
//! │  PetRepository / OrderRepository /   in-unit fns (conn, ..)             │
//! │  UserRepository                      pet::set_status                    │
//! │  ├── reads on the pool               order::insert / apply_update       │
//! │  └── multi-row writes in a unit      order::delete, user::delete        │
//! │       │                                    │                            │
//! │       └────────────────┬───────────────────┘                            │
//! │                        ▼                                                │
//! │                 SQLite Database                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`PetRepository`](pet::PetRepository) - Pet aggregate CRUD, search, inventory
//! - [`OrderRepository`](order::OrderRepository) - Order reads
//! - [`UserRepository`](user::UserRepository) - Accounts, credentials, batch creation

pub mod order;
pub mod pet;
pub mod user;
