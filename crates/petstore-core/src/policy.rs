//! # Authorization Policy
//!
//! Pure mapping from (principal, action, resource owner) to allow/deny.
//!
//! ## Rule Table
//! ```text
//! ┌──────────────────────────┬──────────┬─────────────┬───────────┐
//! │ Action                   │ customer │ store_owner │ admin     │
//! ├──────────────────────────┼──────────┼─────────────┼───────────┤
//! │ ViewPet                  │ yes      │ yes         │ yes       │
//! │ ManagePet / DeletePet    │ no       │ yes         │ yes       │
//! │ ViewInventory            │ no       │ yes         │ yes       │
//! │ PlaceOrder               │ for self │ yes         │ yes       │
//! │ ViewOrder / CancelOrder  │ own      │ yes         │ yes       │
//! │ UpdateOrder              │ no       │ yes         │ yes       │
//! │ ListUserOrders           │ own      │ yes         │ yes       │
//! │ ViewUser / UpdateUser    │ own      │ own         │ yes       │
//! │ ChangeUserRole           │ no       │ no          │ yes       │
//! │ DeleteUser / CreateUsers │ no       │ no          │ yes       │
//! └──────────────────────────┴──────────┴─────────────┴───────────┘
//! ```
//!
//! "own" means `resource_owner == principal.user_id`. An owner-scoped action
//! with no owner supplied is denied.

use crate::error::CoreError;
use crate::types::{Principal, Role, UserId};

/// Something a principal may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ViewPet,
    /// Create or edit a pet.
    ManagePet,
    DeletePet,
    ViewInventory,
    PlaceOrder,
    ViewOrder,
    /// Approve, deliver, or otherwise patch an order.
    UpdateOrder,
    CancelOrder,
    ListUserOrders,
    ViewUser,
    UpdateUser,
    ChangeUserRole,
    DeleteUser,
    /// Batch user creation.
    CreateUsers,
}

impl Action {
    fn is_store_action(self) -> bool {
        matches!(
            self,
            Action::ViewPet
                | Action::ManagePet
                | Action::DeletePet
                | Action::ViewInventory
                | Action::PlaceOrder
                | Action::ViewOrder
                | Action::UpdateOrder
                | Action::CancelOrder
                | Action::ListUserOrders
        )
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

impl Decision {
    #[inline]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Converts a denial into [`CoreError::Forbidden`].
    pub fn into_result(self) -> Result<(), CoreError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(CoreError::Forbidden(reason)),
        }
    }
}

/// Decides whether `principal` may perform `action`.
///
/// Total and deterministic: no I/O, no hidden state.
pub fn authorize(principal: &Principal, action: Action, resource_owner: Option<UserId>) -> Decision {
    let owns = resource_owner.is_some_and(|owner| principal.is(owner));

    match principal.role {
        Role::Admin => Decision::Allow,

        Role::StoreOwner => {
            if action.is_store_action() {
                return Decision::Allow;
            }
            match action {
                Action::ViewUser | Action::UpdateUser if owns => Decision::Allow,
                Action::ViewUser | Action::UpdateUser => {
                    deny("store owners may only access their own profile")
                }
                _ => deny("admin role required"),
            }
        }

        Role::Customer => match action {
            Action::ViewPet => Decision::Allow,
            // No owner given means "for myself".
            Action::PlaceOrder if resource_owner.is_none() || owns => Decision::Allow,
            Action::PlaceOrder => deny("customers may only order for themselves"),
            Action::ViewOrder | Action::CancelOrder | Action::ListUserOrders if owns => {
                Decision::Allow
            }
            Action::ViewOrder | Action::CancelOrder | Action::ListUserOrders => {
                deny("order belongs to another user")
            }
            Action::ViewUser | Action::UpdateUser if owns => Decision::Allow,
            Action::ViewUser | Action::UpdateUser => {
                deny("customers may only access their own profile")
            }
            Action::ChangeUserRole | Action::DeleteUser | Action::CreateUsers => {
                deny("admin role required")
            }
            Action::ManagePet | Action::DeletePet | Action::ViewInventory | Action::UpdateOrder => {
                deny("store_owner or admin role required")
            }
        },
    }
}

fn deny(reason: &str) -> Decision {
    Decision::Deny(reason.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
