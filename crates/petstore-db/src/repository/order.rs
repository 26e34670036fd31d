//! # Order Repository
//!
//! Database operations for orders.
//!
//! Reads are exposed through [`OrderRepository`]. Every order write goes
//! through the transition engine, which calls the in-unit functions below
//! so the order row and its pet change together.
//!
//! ## Status Compare-and-Set
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE orders SET status = 'delivered' … WHERE id = ? AND status = ?   │
//! │                                                    ▲                    │
//! │                                  status read earlier in the same unit   │
//! │                                                                         │
//! │  0 rows affected → somebody else moved the order first; the engine      │
//! │  rolls the unit back instead of overwriting their change.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::pet;
use petstore_core::transitions::OrderUpdate;
use petstore_core::{Order, OrderId, OrderStatus, PetId, UserId, ORDER_QUANTITY};

const ORDER_COLUMNS: &str = "id, pet_id, user_id, quantity, ship_date, status, complete, created_at, updated_at";

/// Repository for order reads.
///
/// ## Usage
/// ```rust,ignore
/// let order = db.orders().get_by_id(42).await?;
/// let mine = db.orders().list_for_user(principal.user_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct OrderRepository {
    db: Database,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(db: Database) -> Self {
        OrderRepository { db }
    }

    /// Gets an order by its ID.
    pub async fn get_by_id(&self, id: OrderId) -> DbResult<Option<Order>> {
        let mut conn = self.db.pool().acquire().await?;
        get(&mut conn, id).await
    }

    /// Lists a user's orders, newest first.
    pub async fn list_for_user(&self, user_id: UserId) -> DbResult<Vec<Order>> {
        debug!(user_id, "Listing orders for user");

        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(orders)
    }

    /// Counts placed/approved orders on a pet.
    pub async fn count_active_for_pet(&self, pet_id: PetId) -> DbResult<i64> {
        let mut conn = self.db.pool().acquire().await?;
        pet::count_active_orders(&mut conn, pet_id).await
    }

    /// Counts placed/approved orders held by a user.
    pub async fn count_active_for_user(&self, user_id: UserId) -> DbResult<i64> {
        let mut conn = self.db.pool().acquire().await?;
        count_active_for_user(&mut conn, user_id).await
    }
}

// =============================================================================
// In-unit Operations
// =============================================================================

pub(crate) async fn get(conn: &mut SqliteConnection, id: OrderId) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(order)
}

/// Inserts a fresh `placed` order.
pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    pet_id: PetId,
    user_id: UserId,
    ship_date: Option<DateTime<Utc>>,
) -> DbResult<Order> {
    debug!(pet_id, user_id, "Inserting order");

    let now = Utc::now();
    let order = sqlx::query_as::<_, Order>(&format!(
        r#"
        INSERT INTO orders (pet_id, user_id, quantity, ship_date, status, complete, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(pet_id)
    .bind(user_id)
    .bind(ORDER_QUANTITY)
    .bind(ship_date)
    .bind(OrderStatus::Placed)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(order)
}

/// Writes a resolved update if the order is still in status `from`.
///
/// Returns the new row, or `None` when the compare-and-set missed.
pub(crate) async fn apply_update(
    conn: &mut SqliteConnection,
    id: OrderId,
    from: OrderStatus,
    update: &OrderUpdate,
) -> DbResult<Option<Order>> {
    debug!(order_id = id, %from, to = %update.status, "Updating order");

    let order = sqlx::query_as::<_, Order>(&format!(
        r#"
        UPDATE orders
        SET status = ?3, complete = ?4, ship_date = ?5, updated_at = ?6
        WHERE id = ?1 AND status = ?2
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(from)
    .bind(update.status)
    .bind(update.complete)
    .bind(update.ship_date)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

/// Deletes the order if it is still in status `from`.
pub(crate) async fn delete(conn: &mut SqliteConnection, id: OrderId, from: OrderStatus) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM orders WHERE id = ?1 AND status = ?2")
        .bind(id)
        .bind(from)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub(crate) async fn count_active_for_user(conn: &mut SqliteConnection, user_id: UserId) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = ?1 AND status IN (?2, ?3)")
        .bind(user_id)
        .bind(OrderStatus::Placed)
        .bind(OrderStatus::Approved)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

pub(crate) async fn count_delivered_for_user(conn: &mut SqliteConnection, user_id: UserId) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = ?1 AND status = ?2")
        .bind(user_id)
        .bind(OrderStatus::Delivered)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;
    use petstore_core::{NewPet, NewUser};

    async fn fixture() -> (Database, PetId, UserId) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let pet = db
            .pets()
            .insert(&NewPet {
                name: "Rex".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let user = db
            .users()
            .insert(
                &NewUser {
                    username: "alice".to_string(),
                    password: "unused-here".to_string(),
                    ..Default::default()
                },
                "$argon2id$stub",
            )
            .await
            .unwrap();
        (db, pet.id, user.id)
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let (db, pet_id, user_id) = fixture().await;
        let ship = Utc::now();

        let mut unit = db.atomic().await.unwrap();
        let order = insert(unit.conn(), pet_id, user_id, Some(ship)).await.unwrap();
        unit.commit().await.unwrap();

        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.quantity, 1);
        assert!(!order.complete);

        let fetched = db.orders().get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(fetched.pet_id, pet_id);
        assert_eq!(fetched.ship_date.map(|d| d.timestamp()), Some(ship.timestamp()));
        assert_eq!(db.orders().count_active_for_user(user_id).await.unwrap(), 1);
        assert_eq!(db.orders().count_active_for_pet(pet_id).await.unwrap(), 1);
        assert_eq!(db.orders().list_for_user(user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_active_order_violates_unique_index() {
        let (db, pet_id, user_id) = fixture().await;

        let mut unit = db.atomic().await.unwrap();
        insert(unit.conn(), pet_id, user_id, None).await.unwrap();
        let second = insert(unit.conn(), pet_id, user_id, None).await;

        assert!(matches!(second, Err(crate::DbError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn test_update_and_delete_compare_and_set() {
        let (db, pet_id, user_id) = fixture().await;

        let mut unit = db.atomic().await.unwrap();
        let order = insert(unit.conn(), pet_id, user_id, None).await.unwrap();

        let update = OrderUpdate {
            status: OrderStatus::Approved,
            complete: false,
            ship_date: None,
            pet_status: None,
        };
        let stale = apply_update(unit.conn(), order.id, OrderStatus::Approved, &update)
            .await
            .unwrap();
        assert!(stale.is_none());

        let approved = apply_update(unit.conn(), order.id, OrderStatus::Placed, &update)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.status, OrderStatus::Approved);

        assert!(!delete(unit.conn(), order.id, OrderStatus::Placed).await.unwrap());
        assert!(delete(unit.conn(), order.id, OrderStatus::Approved).await.unwrap());
        assert!(get(unit.conn(), order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_order_with_unknown_pet_is_rejected() {
        let (db, _, user_id) = fixture().await;

        let mut unit = db.atomic().await.unwrap();
        let err = insert(unit.conn(), 999, user_id, None).await.unwrap_err();
        assert!(matches!(err, crate::DbError::ForeignKeyViolation { .. }));
    }
}
