//! # Order/Pet Transition Rules
//!
//! Pure decision functions for every state change that couples an order to
//! its pet. The store crate reads the current rows inside an atomic unit,
//! asks these functions what is allowed, then writes the result in the same
//! unit.
//!
//! ## Transition Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation      Order                        Pet                        │
//! │  ─────────────  ───────────────────────────  ─────────────────────────  │
//! │  place          (none) ──► placed            available ──► pending      │
//! │  approve        placed ──► approved          pending (unchanged)        │
//! │  deliver        placed|approved ──► delivered pending ──► sold          │
//! │  cancel         placed ──► (deleted)         pending ──► available      │
//! │  delete pet     requires 0 active orders                                │
//! │  delete user    requires 0 orders of any status                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Delivering straight from `placed` is permitted.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::{Order, OrderPatch, OrderStatus, PetId, PetStatus};
use crate::ORDER_QUANTITY;

/// Rejects any quantity other than one.
pub fn check_quantity(quantity: i64) -> CoreResult<()> {
    if quantity != ORDER_QUANTITY {
        return Err(CoreError::InvalidQuantity { requested: quantity });
    }
    Ok(())
}

/// Decides whether a new order may reserve the pet.
///
/// ## Arguments
/// * `pet_status` - Current status, `None` when the pet does not exist
/// * `active_orders` - Placed/approved orders currently on the pet
///
/// A live reservation is reported as [`CoreError::PetAlreadyReserved`] even
/// though the pet is also pending, so the loser of a race always sees the
/// same error.
pub fn check_place(pet_id: PetId, pet_status: Option<PetStatus>, active_orders: i64) -> CoreResult<()> {
    let status = pet_status.ok_or(CoreError::PetNotFound(pet_id))?;

    if active_orders > 0 {
        return Err(CoreError::PetAlreadyReserved(pet_id));
    }

    if status != PetStatus::Available {
        return Err(CoreError::PetUnavailable { pet_id, status });
    }

    Ok(())
}

/// Fully resolved result of applying an [`OrderPatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    pub status: OrderStatus,
    pub complete: bool,
    pub ship_date: Option<DateTime<Utc>>,
    /// New pet status to write in the same unit, if any.
    pub pet_status: Option<PetStatus>,
}

/// Resolves a patch against the current order.
///
/// Delivered orders are terminal: every patch is refused with
/// [`CoreError::OrderTerminal`].
pub fn plan_update(order: &Order, patch: &OrderPatch) -> CoreResult<OrderUpdate> {
    if order.status.is_terminal() {
        return Err(CoreError::OrderTerminal(order.id));
    }

    let status = patch.status.unwrap_or(order.status);
    let pet_status = match status {
        OrderStatus::Delivered => Some(PetStatus::Sold),
        OrderStatus::Placed | OrderStatus::Approved => None,
    };

    Ok(OrderUpdate {
        status,
        complete: patch.complete.unwrap_or(order.complete),
        ship_date: patch.ship_date.unwrap_or(order.ship_date),
        pet_status,
    })
}

/// Only placed orders may be cancelled.
pub fn check_cancel(order: &Order) -> CoreResult<()> {
    if order.status != OrderStatus::Placed {
        return Err(CoreError::OrderNotCancellable {
            order_id: order.id,
            status: order.status,
        });
    }
    Ok(())
}

/// Blocks deletion of a pet or user that still has active orders.
pub fn check_delete(entity: &str, id: impl ToString, active_orders: i64) -> CoreResult<()> {
    if active_orders > 0 {
        return Err(CoreError::has_active_orders(entity, id, active_orders));
    }
    Ok(())
}

/// Blocks deletion of a user that still has orders.
///
/// Active orders hold a pet; delivered orders are the record that makes a
/// pet `sold`. Either kind keeps the account.
pub fn check_delete_user(username: &str, active_orders: i64, delivered_orders: i64) -> CoreResult<()> {
    check_delete("User", username, active_orders)?;
    if delivered_orders > 0 {
        return Err(CoreError::HasOrderHistory {
            username: username.to_string(),
            count: delivered_orders,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
