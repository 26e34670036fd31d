//! # petstore-core: Pure Business Logic for the Petstore
//!
//! This crate holds the rules of the store as pure functions with zero I/O
//! dependencies: who may do what, and which order/pet transitions are legal.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Petstore Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 HTTP API (apps/api, axum)                       │   │
//! │  │    /pet, /store/order, /user  →  Principal + request            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ petstore-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │  policy   │  │ transitions │  │validation│  │   │
//! │  │   │ Pet Order │  │ authorize │  │ place/cancel│  │  rules   │  │   │
//! │  │   │ User Role │  │ Decision  │  │ update/del  │  │  checks  │  │   │
//! │  │   └───────────┘  └───────────┘  └─────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          petstore-db (store + transition engine)                │   │
//! │  │     SQLite queries, migrations, atomic units, repositories      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Pet, Order, User, Principal, patches)
//! - [`policy`] - Role-aware authorization (`authorize`)
//! - [`transitions`] - Order/pet transition rules
//! - [`error`] - Domain error types and their stable classification
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use petstore_core::policy::{authorize, Action};
//! use petstore_core::{Principal, Role};
//!
//! let customer = Principal::new(7, Role::Customer);
//!
//! // Customers may cancel their own orders...
//! assert!(authorize(&customer, Action::CancelOrder, Some(7)).is_allowed());
//! // ...but not somebody else's.
//! assert!(!authorize(&customer, Action::CancelOrder, Some(8)).is_allowed());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod policy;
pub mod transitions;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use petstore_core::Pet` instead of
// `use petstore_core::types::Pet`

pub use error::{CoreError, ErrorKind, ValidationError};
pub use policy::{authorize, Action, Decision};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// The only quantity an order may carry.
///
/// ## Business Reason
/// Every pet is a single live animal, so an order reserves exactly one.
pub const ORDER_QUANTITY: i64 = 1;

/// Maximum tags attached to one pet.
pub const MAX_PET_TAGS: usize = 20;

/// Maximum photo URLs attached to one pet.
pub const MAX_PET_PHOTOS: usize = 20;

/// Maximum users accepted by one batch create call.
pub const MAX_BATCH_USERS: usize = 100;
