//! # Domain Types
//!
//! Core domain types used throughout the petstore.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Pet        │   │     Order       │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  pet_id (FK)    │   │  id             │       │
//! │  │  name           │   │  user_id (FK)   │──►│  username       │       │
//! │  │  category, tags │   │  quantity = 1   │   │  role           │       │
//! │  │  status         │   │  status         │   │  profile        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   PetStatus     │   │  OrderStatus    │   │      Role       │       │
//! │  │  Available      │   │  Placed         │   │  Customer       │       │
//! │  │  Pending        │   │  Approved       │   │  StoreOwner     │       │
//! │  │  Sold           │   │  Delivered      │   │  Admin          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Patches
//! Updates are explicit patch structs. A plain `Option` means "leave alone when
//! absent"; `Option<Option<T>>` on nullable columns separates "leave alone"
//! (`None`) from "clear" (`Some(None)`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

/// Pet identifier.
pub type PetId = i64;
/// Order identifier.
pub type OrderId = i64;
/// User identifier.
pub type UserId = i64;

// =============================================================================
// Pet Status
// =============================================================================

/// Availability of a pet.
///
/// ## Lifecycle
/// ```text
/// Available ──place──► Pending ──deliver──► Sold
///     ▲                   │
///     └──────cancel───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    /// Can be ordered.
    Available,
    /// Held by exactly one placed/approved order.
    Pending,
    /// Delivered to its buyer.
    Sold,
}

impl PetStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [PetStatus; 3] = [PetStatus::Available, PetStatus::Pending, PetStatus::Sold];

    /// Returns the wire/database name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PetStatus::Available => "available",
            PetStatus::Pending => "pending",
            PetStatus::Sold => "sold",
        }
    }
}

impl Default for PetStatus {
    fn default() -> Self {
        PetStatus::Available
    }
}

impl fmt::Display for PetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PetStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(PetStatus::Available),
            "pending" => Ok(PetStatus::Pending),
            "sold" => Ok(PetStatus::Sold),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: PetStatus::ALL.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle status of an order.
///
/// A cancelled order is deleted, so there is no `Cancelled` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Freshly placed; still cancellable.
    Placed,
    /// Accepted by the store.
    Approved,
    /// Handed over. Terminal.
    Delivered,
}

impl OrderStatus {
    /// Returns the wire/database name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Approved => "approved",
            OrderStatus::Delivered => "delivered",
        }
    }

    /// Placed and approved orders hold their pet.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Placed | OrderStatus::Approved)
    }

    /// Delivered orders accept no further changes.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Placed
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Role
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Shopper. Owns its orders and profile.
    Customer,
    /// Runs the shop: pets, orders, inventory.
    StoreOwner,
    /// Everything, including user roles and deletion.
    Admin,
}

impl Role {
    /// Store owners and admins.
    #[inline]
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::StoreOwner | Role::Admin)
    }

    /// Returns the wire/database name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::StoreOwner => "store_owner",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Customer
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "store_owner" => Ok(Role::StoreOwner),
            "admin" => Ok(Role::Admin),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec![
                    "customer".to_string(),
                    "store_owner".to_string(),
                    "admin".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Principal
// =============================================================================

/// The authenticated caller, passed explicitly into every engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Principal { user_id, role }
    }

    /// Whether this principal is the given user.
    #[inline]
    pub fn is(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

// =============================================================================
// Pet
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A pet offered by the store.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: PetId,
    pub name: String,
    pub category: Option<Category>,
    /// Tag set, ordered by name.
    pub tags: Vec<Tag>,
    /// Photo URLs in display order.
    pub photo_urls: Vec<String>,
    pub status: PetStatus,
}

/// Input for creating a pet.
#[derive(Debug, Clone, Default)]
pub struct NewPet {
    pub name: String,
    /// Category name; created on first use.
    pub category: Option<String>,
    /// Tag names; created on first use, duplicates ignored.
    pub tags: Vec<String>,
    pub photo_urls: Vec<String>,
}

/// Administrative edit of a pet. Status is not editable here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetPatch {
    pub name: Option<String>,
    /// `Some(None)` removes the category.
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    /// Replaces the whole tag set.
    pub tags: Option<Vec<String>>,
    /// Replaces the whole photo list.
    pub photo_urls: Option<Vec<String>>,
}

impl PetPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.photo_urls.is_none()
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order reserving one pet for one user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub pet_id: PetId,
    pub user_id: UserId,
    /// Always 1.
    pub quantity: i64,
    #[ts(as = "Option<String>")]
    pub ship_date: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    /// Fulfilment flag, independent of `status`.
    pub complete: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Update applied to an existing order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub complete: Option<bool>,
    /// `Some(None)` clears the ship date.
    #[serde(default, deserialize_with = "double_option")]
    pub ship_date: Option<Option<DateTime<Utc>>>,
}

impl OrderPatch {
    /// Patch that only moves the status.
    pub fn status(status: OrderStatus) -> Self {
        OrderPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.complete.is_none() && self.ship_date.is_none()
    }
}

// =============================================================================
// User
// =============================================================================

/// A store account. Never carries credentials.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// Free-form account status code (1 = active).
    pub user_status: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Input for registering a user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// Only honoured for admin batch creation; defaults to customer.
    pub role: Option<Role>,
}

/// Profile update. `role` requires admin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    pub user_status: Option<i64>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// Result for one entry of a batch user creation.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    Created { user: User },
    /// Username already taken (before or earlier in the same batch).
    Duplicate { username: String },
    Invalid { username: String, reason: String },
}

// =============================================================================
// Inventory
// =============================================================================

/// Pet counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Inventory {
    pub available: i64,
    pub pending: i64,
    pub sold: i64,
}

impl Inventory {
    pub fn add(&mut self, status: PetStatus, count: i64) {
        match status {
            PetStatus::Available => self.available += count,
            PetStatus::Pending => self.pending += count,
            PetStatus::Sold => self.sold += count,
        }
    }

    pub fn total(&self) -> i64 {
        self.available + self.pending + self.sold
    }
}

// =============================================================================
// Serde helpers
// =============================================================================

/// Maps a present field (even `null`) to `Some(..)` so `#[serde(default)]`
/// leaves absent fields as `None`.
///
/// Use as `#[serde(default, deserialize_with = "double_option")]` on an
/// `Option<Option<T>>` field.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// =============================================================================
// Unit Tests
// =============================================================================
