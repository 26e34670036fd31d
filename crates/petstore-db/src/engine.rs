//! # State Transition Engine
//!
//! The only code path that changes `pets.status`, `orders.status`, or
//! creates/deletes orders. Each operation authorizes the principal, opens one
//! atomic unit, re-reads the rows it guards, asks `petstore_core::transitions`
//! what is allowed, and writes the result before committing.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     engine.place_order(principal, pet, 1, ..)          │
//! │                                                                         │
//! │  authorize(PlaceOrder) ── Deny ──► Forbidden                           │
//! │       │                                                                 │
//! │  check_quantity ───────── ≠ 1 ───► InvalidQuantity                     │
//! │       │                                                                 │
//! │  db.atomic()  ─────────── timeout ► Busy (nothing written)             │
//! │       │                                                                 │
//! │  ┌────┴──────────────────── one unit ─────────────────────────────┐    │
//! │  │ read pet status + active order count                           │    │
//! │  │ check_place ──── PetNotFound / PetAlreadyReserved / Unavailable │    │
//! │  │ INSERT order (placed)                                          │    │
//! │  │ UPDATE pet available → pending (compare-and-set)               │    │
//! │  └────┬───────────────────────────────────────────────────────────┘    │
//! │       ▼                                                                 │
//! │  COMMIT ──► Order                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error before the commit drops the unit, which rolls back every write
//! made in it.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{order, pet, user};
use petstore_core::transitions::{
    check_cancel, check_delete, check_delete_user, check_place, check_quantity, plan_update,
};
use petstore_core::{
    authorize, Action, CoreError, ErrorKind, Order, OrderId, OrderPatch, OrderStatus, PetId, PetStatus, Principal,
};

// =============================================================================
// Errors
// =============================================================================

/// Failure of an engine operation: a broken rule or a store failure.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] DbError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Domain(e) => e.kind(),
            EngineError::Store(e) => e.kind(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Domain(e) => e.code(),
            EngineError::Store(e) => e.code(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// A compare-and-set missed: another writer got there first. Retryable.
fn lost_race() -> EngineError {
    EngineError::Store(DbError::Busy { waited_ms: 0 })
}

/// Rows disagree with the pet/order invariants.
fn broken_invariant(message: String) -> EngineError {
    error!(%message, "Store invariant violated");
    EngineError::Store(DbError::Internal(message))
}

// =============================================================================
// Engine
// =============================================================================

/// Executes pet/order state transitions.
///
/// ## Usage
/// ```rust,ignore
/// let engine = TransitionEngine::new(db.clone());
/// let order = engine.place_order(&principal, pet_id, 1, None).await?;
/// engine.update_order(&staff, order.id, &OrderPatch::status(OrderStatus::Delivered)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct TransitionEngine {
    db: Database,
}

impl TransitionEngine {
    pub fn new(db: Database) -> Self {
        TransitionEngine { db }
    }

    /// Places an order for `principal` on an available pet.
    ///
    /// ## Effect
    /// Order `placed` with `complete = false`; pet `available → pending`.
    ///
    /// ## Errors
    /// `Forbidden`, `InvalidQuantity`, `PetNotFound`, `PetAlreadyReserved`,
    /// `PetUnavailable`, `Busy`.
    pub async fn place_order(
        &self,
        principal: &Principal,
        pet_id: PetId,
        quantity: i64,
        ship_date: Option<DateTime<Utc>>,
    ) -> EngineResult<Order> {
        authorize(principal, Action::PlaceOrder, Some(principal.user_id)).into_result()?;
        check_quantity(quantity)?;

        let mut unit = self.db.atomic().await?;
        let conn = unit.conn();

        let status = pet::status(conn, pet_id).await?;
        let active = match status {
            Some(_) => pet::count_active_orders(conn, pet_id).await?,
            None => 0,
        };

        if let Err(e) = check_place(pet_id, status, active) {
            debug!(pet_id, user_id = principal.user_id, error = %e, "Order rejected");
            return Err(e.into());
        }

        let placed = order::insert(conn, pet_id, principal.user_id, ship_date)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { .. } => EngineError::Domain(CoreError::PetAlreadyReserved(pet_id)),
                other => other.into(),
            })?;

        if !pet::set_status(conn, pet_id, PetStatus::Available, PetStatus::Pending).await? {
            return Err(CoreError::PetAlreadyReserved(pet_id).into());
        }

        unit.commit().await?;

        info!(order_id = placed.id, pet_id, user_id = principal.user_id, "Order placed");
        Ok(placed)
    }

    /// Applies a patch to an order.
    ///
    /// Moving to `delivered` sells the pet in the same unit. Delivered
    /// orders refuse every patch.
    ///
    /// ## Errors
    /// `OrderNotFound`, `Forbidden`, `OrderTerminal`, `Busy`.
    pub async fn update_order(&self, principal: &Principal, order_id: OrderId, patch: &OrderPatch) -> EngineResult<Order> {
        let mut unit = self.db.atomic().await?;
        let conn = unit.conn();

        let current = order::get(conn, order_id)
            .await?
            .ok_or(CoreError::OrderNotFound(order_id))?;

        authorize(principal, Action::UpdateOrder, Some(current.user_id)).into_result()?;

        let plan = plan_update(&current, patch)?;

        if let Some(pet_status) = plan.pet_status {
            if !pet::set_status(conn, current.pet_id, PetStatus::Pending, pet_status).await? {
                return Err(broken_invariant(format!(
                    "order {order_id} is {} but pet {} is not pending",
                    current.status, current.pet_id
                )));
            }
        }

        let updated = order::apply_update(conn, order_id, current.status, &plan)
            .await?
            .ok_or_else(lost_race)?;

        unit.commit().await?;

        info!(
            order_id,
            from = %current.status,
            to = %updated.status,
            by = principal.user_id,
            "Order updated"
        );
        Ok(updated)
    }

    /// Cancels a placed order: the order is deleted and its pet released.
    ///
    /// Returns the order as it was before deletion.
    ///
    /// ## Errors
    /// `OrderNotFound`, `Forbidden`, `OrderNotCancellable`, `Busy`.
    pub async fn cancel_order(&self, principal: &Principal, order_id: OrderId) -> EngineResult<Order> {
        let mut unit = self.db.atomic().await?;
        let conn = unit.conn();

        let current = order::get(conn, order_id)
            .await?
            .ok_or(CoreError::OrderNotFound(order_id))?;

        authorize(principal, Action::CancelOrder, Some(current.user_id)).into_result()?;
        check_cancel(&current)?;

        if !order::delete(conn, order_id, OrderStatus::Placed).await? {
            return Err(lost_race());
        }

        if !pet::set_status(conn, current.pet_id, PetStatus::Pending, PetStatus::Available).await? {
            return Err(broken_invariant(format!(
                "cancelled order {order_id} held pet {} which was not pending",
                current.pet_id
            )));
        }

        unit.commit().await?;

        info!(order_id, pet_id = current.pet_id, by = principal.user_id, "Order cancelled");
        Ok(current)
    }

    /// Deletes a pet that has no placed/approved orders.
    ///
    /// Tags, photos and delivered orders go with it.
    ///
    /// ## Errors
    /// `Forbidden`, `PetNotFound`, `HasActiveOrders`, `Busy`.
    pub async fn delete_pet(&self, principal: &Principal, pet_id: PetId) -> EngineResult<()> {
        authorize(principal, Action::DeletePet, None).into_result()?;

        let mut unit = self.db.atomic().await?;
        let conn = unit.conn();

        if pet::status(conn, pet_id).await?.is_none() {
            return Err(CoreError::PetNotFound(pet_id).into());
        }

        let active = pet::count_active_orders(conn, pet_id).await?;
        check_delete("Pet", pet_id, active)?;

        if !pet::delete(conn, pet_id).await? {
            return Err(lost_race());
        }

        unit.commit().await?;

        info!(pet_id, by = principal.user_id, "Pet deleted");
        Ok(())
    }

    /// Deletes a user that has no orders left.
    ///
    /// Delivered orders are what keep their pets `sold`, so a buyer's account
    /// stays as long as any exist.
    ///
    /// ## Errors
    /// `Forbidden`, `UserNotFound`, `HasActiveOrders`, `HasOrderHistory`, `Busy`.
    pub async fn delete_user(&self, principal: &Principal, username: &str) -> EngineResult<()> {
        authorize(principal, Action::DeleteUser, None).into_result()?;

        let mut unit = self.db.atomic().await?;
        let conn = unit.conn();

        let target = user::get_by_username(conn, username)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(username.to_string()))?;

        let active = order::count_active_for_user(conn, target.id).await?;
        let delivered = order::count_delivered_for_user(conn, target.id).await?;
        check_delete_user(username, active, delivered)?;

        if !user::delete(conn, target.id).await? {
            return Err(lost_race());
        }

        unit.commit().await?;

        info!(user_id = target.id, username = %target.username, by = principal.user_id, "User deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
