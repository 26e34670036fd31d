//! # Error Types
//!
//! Domain-specific error types for petstore-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  petstore-core errors (this file)                                      │
//! │  ├── CoreError        - Transition / authorization failures            │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - Stable classification of every failure         │
//! │                                                                         │
//! │  petstore-db errors (separate crate)                                   │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── EngineError      - CoreError ∪ DbError for engine calls           │
//! │                                                                         │
//! │  API errors (in app)                                                   │
//! │  └── ApiError         - `{ "error": ..., "code": ... }` envelope       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError → Client   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (pet id, order id, status)
//! 3. Every variant has exactly one [`ErrorKind`] and one stable code, so the
//!    same precondition violation always surfaces the same way

use serde::Serialize;
use thiserror::Error;

use crate::types::{OrderId, OrderStatus, PetId, PetStatus};

// =============================================================================
// Error Kind
// =============================================================================

/// Caller-facing classification of a failure.
///
/// Clients (HTTP callers, tool wrappers) branch on this; the message is for
/// humans only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Referenced entity is absent.
    NotFound,
    /// Request is malformed or breaks an input rule (e.g. quantity != 1).
    InvalidInput,
    /// Caller has no valid credential.
    Unauthenticated,
    /// Authorization policy denied the action.
    Forbidden,
    /// A precondition on current state does not hold.
    Conflict,
    /// The store could not grant an atomic unit in time. Safe to retry.
    Busy,
    /// Store or infrastructure failure.
    Internal,
}

impl ErrorKind {
    /// Whether a caller may retry the same request unchanged.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Busy)
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the policy and transition rules.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Orders are for exactly one animal.
    #[error("Invalid quantity {requested}: orders must have quantity 1")]
    InvalidQuantity { requested: i64 },

    /// Pet cannot be found.
    #[error("Pet not found: {0}")]
    PetNotFound(PetId),

    /// Pet exists but is not available for ordering.
    ///
    /// ## When This Occurs
    /// - Pet already sold
    /// - Pet pending without a live reservation (only after manual repair)
    #[error("Pet {pet_id} is {status}, not available")]
    PetUnavailable { pet_id: PetId, status: PetStatus },

    /// Another order already holds the pet.
    ///
    /// ## User Workflow
    /// ```text
    /// Caller A: place(pet 1) ──► order 10 placed, pet 1 pending
    /// Caller B: place(pet 1) ──► PetAlreadyReserved(1)
    /// ```
    #[error("Pet {0} already has an active order")]
    PetAlreadyReserved(PetId),

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Order was delivered; nothing may change it any more.
    #[error("Order {0} is delivered and can no longer be changed")]
    OrderTerminal(OrderId),

    /// Only placed orders can be cancelled.
    #[error("Order {order_id} is {status} and cannot be cancelled")]
    OrderNotCancellable {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// Deletion blocked by placed/approved orders.
    #[error("{entity} {id} has {count} active order(s)")]
    HasActiveOrders {
        entity: String,
        id: String,
        count: i64,
    },

    /// The user bought pets; deleting the account would orphan their sale.
    #[error("User {username} has {count} delivered order(s) and cannot be deleted")]
    HasOrderHistory { username: String, count: i64 },

    /// User cannot be found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Authorization policy denied the action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns the stable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidQuantity { .. } | CoreError::Validation(_) => ErrorKind::InvalidInput,
            CoreError::PetNotFound(_) | CoreError::OrderNotFound(_) | CoreError::UserNotFound(_) => {
                ErrorKind::NotFound
            }
            CoreError::PetUnavailable { .. }
            | CoreError::PetAlreadyReserved(_)
            | CoreError::OrderTerminal(_)
            | CoreError::OrderNotCancellable { .. }
            | CoreError::HasActiveOrders { .. }
            | CoreError::HasOrderHistory { .. } => ErrorKind::Conflict,
            CoreError::Forbidden(_) => ErrorKind::Forbidden,
        }
    }

    /// Returns the machine-readable code surfaced to clients.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            CoreError::PetNotFound(_) => "PET_NOT_FOUND",
            CoreError::PetUnavailable { .. } => "PET_UNAVAILABLE",
            CoreError::PetAlreadyReserved(_) => "PET_ALREADY_RESERVED",
            CoreError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            CoreError::OrderTerminal(_) => "ORDER_TERMINAL",
            CoreError::OrderNotCancellable { .. } => "ORDER_NOT_CANCELLABLE",
            CoreError::HasActiveOrders { .. } => "HAS_ACTIVE_ORDERS",
            CoreError::HasOrderHistory { .. } => "HAS_ORDER_HISTORY",
            CoreError::UserNotFound(_) => "USER_NOT_FOUND",
            CoreError::Forbidden(_) => "FORBIDDEN",
            CoreError::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// Creates a HasActiveOrders error.
    pub fn has_active_orders(entity: impl Into<String>, id: impl ToString, count: i64) -> Self {
        CoreError::HasActiveOrders {
            entity: entity.into(),
            id: id.to_string(),
            count,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any store access.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Collection holds too many entries.
    #[error("{field} must have at most {max} entries")]
    TooMany { field: String, max: usize },

    /// Invalid format (e.g., invalid email, invalid URL).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
