//! # Pet Repository
//!
//! Database operations for pets, their category, tags and photos.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pet Aggregate                                    │
//! │                                                                         │
//! │   categories ◄──── pets ────► pet_tags ────► tags                       │
//! │   (find-or-create)  │          (set)         (find-or-create)           │
//! │                     │                                                   │
//! │                     └──────► pet_photos (ordered by position)           │
//! │                                                                         │
//! │  A Pet is assembled from all four tables; writes touching more than     │
//! │  the pets row run inside one atomic unit.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Writes
//! `pets.status` is only written through [`set_status`], a compare-and-set
//! used by the transition engine. Administrative edits never touch it.

use std::collections::BTreeSet;

use chrono::Utc;
use sqlx::sqlite::{Sqlite, SqliteConnection};
use sqlx::QueryBuilder;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use petstore_core::{Category, Inventory, NewPet, OrderStatus, Pet, PetId, PetPatch, PetStatus, Tag};

/// Repository for pet database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.pets();
///
/// let pet = repo.insert(&NewPet { name: "Rex".into(), ..Default::default() }).await?;
/// let available = repo.find_by_status(&[PetStatus::Available]).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PetRepository {
    db: Database,
}

impl PetRepository {
    /// Creates a new PetRepository.
    pub fn new(db: Database) -> Self {
        PetRepository { db }
    }

    /// Gets a pet by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Pet))` - Pet found
    /// * `Ok(None)` - Pet not found
    pub async fn get_by_id(&self, id: PetId) -> DbResult<Option<Pet>> {
        let mut conn = self.db.pool().acquire().await?;
        load(&mut conn, id).await
    }

    /// Inserts a new pet with status `available`.
    ///
    /// Category and tags are looked up by name and created on first use.
    /// Photos keep their input order.
    pub async fn insert(&self, pet: &NewPet) -> DbResult<Pet> {
        debug!(name = %pet.name, "Inserting pet");

        let mut unit = self.db.atomic().await?;
        let conn = unit.conn();

        let category_id = match &pet.category {
            Some(name) => Some(category_id(conn, name).await?),
            None => None,
        };

        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO pets (name, category_id, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            RETURNING id
            "#,
        )
        .bind(pet.name.trim())
        .bind(category_id)
        .bind(PetStatus::Available)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        replace_tags(conn, id, &pet.tags).await?;
        replace_photos(conn, id, &pet.photo_urls).await?;

        let created = load(conn, id)
            .await?
            .ok_or_else(|| DbError::Internal(format!("pet {id} vanished after insert")))?;

        unit.commit().await?;

        debug!(pet_id = id, "Pet inserted");
        Ok(created)
    }

    /// Applies an administrative edit.
    ///
    /// ## Returns
    /// * `Ok(Some(Pet))` - The pet after the edit
    /// * `Ok(None)` - Pet doesn't exist; nothing was written
    pub async fn update(&self, id: PetId, patch: &PetPatch) -> DbResult<Option<Pet>> {
        debug!(pet_id = id, "Updating pet");

        let mut unit = self.db.atomic().await?;
        let conn = unit.conn();

        let now = Utc::now();
        let result = sqlx::query("UPDATE pets SET updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        if let Some(name) = &patch.name {
            sqlx::query("UPDATE pets SET name = ?2 WHERE id = ?1")
                .bind(id)
                .bind(name.trim())
                .execute(&mut *conn)
                .await?;
        }

        if let Some(category) = &patch.category {
            let category_id = match category {
                Some(name) => Some(category_id(conn, name).await?),
                None => None,
            };
            sqlx::query("UPDATE pets SET category_id = ?2 WHERE id = ?1")
                .bind(id)
                .bind(category_id)
                .execute(&mut *conn)
                .await?;
        }

        if let Some(tags) = &patch.tags {
            replace_tags(conn, id, tags).await?;
        }

        if let Some(urls) = &patch.photo_urls {
            replace_photos(conn, id, urls).await?;
        }

        let updated = load(conn, id).await?;

        unit.commit().await?;
        Ok(updated)
    }

    /// Finds pets whose status is any of `statuses`, ordered by ID.
    pub async fn find_by_status(&self, statuses: &[PetStatus]) -> DbResult<Vec<Pet>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        debug!(?statuses, "Finding pets by status");

        let mut conn = self.db.pool().acquire().await?;

        let mut query = QueryBuilder::<Sqlite>::new("SELECT id FROM pets WHERE status IN (");
        let mut list = query.separated(", ");
        for status in statuses {
            list.push_bind(*status);
        }
        list.push_unseparated(") ORDER BY id");

        let ids: Vec<i64> = query.build_query_scalar().fetch_all(&mut *conn).await?;
        load_many(&mut conn, ids).await
    }

    /// Finds pets carrying any of the given tag names, ordered by ID.
    pub async fn find_by_tags(&self, tags: &[String]) -> DbResult<Vec<Pet>> {
        let names: BTreeSet<&str> = tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
        if names.is_empty() {
            return Ok(Vec::new());
        }

        debug!(tags = ?names, "Finding pets by tags");

        let mut conn = self.db.pool().acquire().await?;

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT DISTINCT pt.pet_id FROM pet_tags pt JOIN tags t ON t.id = pt.tag_id WHERE t.name IN (",
        );
        let mut list = query.separated(", ");
        for name in &names {
            list.push_bind(*name);
        }
        list.push_unseparated(") ORDER BY pt.pet_id");

        let ids: Vec<i64> = query.build_query_scalar().fetch_all(&mut *conn).await?;
        load_many(&mut conn, ids).await
    }

    /// Counts pets per status. All three statuses are always present.
    pub async fn inventory(&self) -> DbResult<Inventory> {
        let rows: Vec<(PetStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM pets GROUP BY status")
                .fetch_all(self.db.pool())
                .await?;

        let mut inventory = Inventory::default();
        for (status, count) in rows {
            inventory.add(status, count);
        }
        Ok(inventory)
    }

    /// Counts placed/approved orders referencing the pet.
    pub async fn count_active_orders(&self, id: PetId) -> DbResult<i64> {
        let mut conn = self.db.pool().acquire().await?;
        count_active_orders(&mut conn, id).await
    }

    /// Counts total pets (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pets")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

// =============================================================================
// In-unit Operations
// =============================================================================
//
// These take a bare connection so the transition engine can combine them
// inside one atomic unit.

#[derive(sqlx::FromRow)]
struct PetRow {
    id: i64,
    name: String,
    status: PetStatus,
    category_id: Option<i64>,
    category_name: Option<String>,
}

/// Loads the full pet aggregate.
pub(crate) async fn load(conn: &mut SqliteConnection, id: PetId) -> DbResult<Option<Pet>> {
    let row: Option<PetRow> = sqlx::query_as(
        r#"
        SELECT p.id, p.name, p.status, c.id AS category_id, c.name AS category_name
        FROM pets p
        LEFT JOIN categories c ON c.id = p.category_id
        WHERE p.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let tags: Vec<Tag> = sqlx::query_as(
        r#"
        SELECT t.id, t.name
        FROM tags t
        JOIN pet_tags pt ON pt.tag_id = t.id
        WHERE pt.pet_id = ?1
        ORDER BY t.name
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let photo_urls: Vec<String> =
        sqlx::query_scalar("SELECT url FROM pet_photos WHERE pet_id = ?1 ORDER BY position")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

    let category = match (row.category_id, row.category_name) {
        (Some(id), Some(name)) => Some(Category { id, name }),
        _ => None,
    };

    Ok(Some(Pet {
        id: row.id,
        name: row.name,
        category,
        tags,
        photo_urls,
        status: row.status,
    }))
}

async fn load_many(conn: &mut SqliteConnection, ids: Vec<i64>) -> DbResult<Vec<Pet>> {
    let mut pets = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(pet) = load(conn, id).await? {
            pets.push(pet);
        }
    }
    Ok(pets)
}

/// Current status, `None` when the pet does not exist.
pub(crate) async fn status(conn: &mut SqliteConnection, id: PetId) -> DbResult<Option<PetStatus>> {
    let status = sqlx::query_scalar("SELECT status FROM pets WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(status)
}

/// Compare-and-set on `pets.status`.
///
/// Returns `false` when the pet was missing or not in `from`.
pub(crate) async fn set_status(
    conn: &mut SqliteConnection,
    id: PetId,
    from: PetStatus,
    to: PetStatus,
) -> DbResult<bool> {
    debug!(pet_id = id, %from, %to, "Setting pet status");

    let result = sqlx::query("UPDATE pets SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2")
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn count_active_orders(conn: &mut SqliteConnection, id: PetId) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE pet_id = ?1 AND status IN (?2, ?3)")
        .bind(id)
        .bind(OrderStatus::Placed)
        .bind(OrderStatus::Approved)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

/// Deletes the pet row; tags, photos and historical orders cascade.
pub(crate) async fn delete(conn: &mut SqliteConnection, id: PetId) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM pets WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

async fn category_id(conn: &mut SqliteConnection, name: &str) -> DbResult<i64> {
    let name = name.trim();

    sqlx::query("INSERT OR IGNORE INTO categories (name) VALUES (?1)")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    let id = sqlx::query_scalar("SELECT id FROM categories WHERE name = ?1")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

async fn replace_tags(conn: &mut SqliteConnection, pet_id: PetId, tags: &[String]) -> DbResult<()> {
    sqlx::query("DELETE FROM pet_tags WHERE pet_id = ?1")
        .bind(pet_id)
        .execute(&mut *conn)
        .await?;

    let names: BTreeSet<&str> = tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();

    for name in names {
        sqlx::query("INSERT OR IGNORE INTO tags (name) VALUES (?1)")
            .bind(name)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO pet_tags (pet_id, tag_id)
            SELECT ?1, id FROM tags WHERE name = ?2
            "#,
        )
        .bind(pet_id)
        .bind(name)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn replace_photos(conn: &mut SqliteConnection, pet_id: PetId, urls: &[String]) -> DbResult<()> {
    sqlx::query("DELETE FROM pet_photos WHERE pet_id = ?1")
        .bind(pet_id)
        .execute(&mut *conn)
        .await?;

    for (position, url) in urls.iter().enumerate() {
        sqlx::query("INSERT INTO pet_photos (pet_id, position, url) VALUES (?1, ?2, ?3)")
            .bind(pet_id)
            .bind(position as i64)
            .bind(url.trim())
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn rex() -> NewPet {
        NewPet {
            name: "Rex".to_string(),
            category: Some("Dogs".to_string()),
            tags: vec!["friendly".to_string(), "big".to_string(), "friendly".to_string()],
            photo_urls: vec![
                "https://img.example.com/rex-2.jpg".to_string(),
                "https://img.example.com/rex-1.jpg".to_string(),
            ],
        }
    }

    #[tokio::test]
    async fn test_insert_assembles_aggregate() {
        let db = db().await;
        let pet = db.pets().insert(&rex()).await.unwrap();

        assert_eq!(pet.name, "Rex");
        assert_eq!(pet.status, PetStatus::Available);
        assert_eq!(pet.category.as_ref().map(|c| c.name.as_str()), Some("Dogs"));
        let tags: Vec<&str> = pet.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tags, vec!["big", "friendly"]);
        assert_eq!(pet.photo_urls[0], "https://img.example.com/rex-2.jpg");

        let fetched = db.pets().get_by_id(pet.id).await.unwrap().unwrap();
        assert_eq!(fetched.tags, pet.tags);
    }

    #[tokio::test]
    async fn test_categories_and_tags_are_shared() {
        let db = db().await;
        let a = db.pets().insert(&rex()).await.unwrap();
        let b = db
            .pets()
            .insert(&NewPet {
                name: "Fido".to_string(),
                ..rex()
            })
            .await
            .unwrap();

        assert_eq!(a.category, b.category);
        assert_eq!(a.tags, b.tags);
    }

    #[tokio::test]
    async fn test_update_patch() {
        let db = db().await;
        let pet = db.pets().insert(&rex()).await.unwrap();

        let patch = PetPatch {
            name: Some("Rex II".to_string()),
            category: Some(None),
            tags: Some(vec!["calm".to_string()]),
            photo_urls: None,
        };
        let updated = db.pets().update(pet.id, &patch).await.unwrap().unwrap();

        assert_eq!(updated.name, "Rex II");
        assert!(updated.category.is_none());
        assert_eq!(updated.tags.len(), 1);
        assert_eq!(updated.photo_urls.len(), 2);
        assert_eq!(updated.status, PetStatus::Available);
    }

    #[tokio::test]
    async fn test_update_missing_pet() {
        let db = db().await;
        let patch = PetPatch {
            name: Some("Ghost".to_string()),
            ..Default::default()
        };
        assert!(db.pets().update(99, &patch).await.unwrap().is_none());
        assert_eq!(db.pets().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_by_status_and_tags() {
        let db = db().await;
        let rex = db.pets().insert(&rex()).await.unwrap();
        let tom = db
            .pets()
            .insert(&NewPet {
                name: "Tom".to_string(),
                category: Some("Cats".to_string()),
                tags: vec!["calm".to_string()],
                photo_urls: vec![],
            })
            .await
            .unwrap();

        {
            let mut unit = db.atomic().await.unwrap();
            assert!(set_status(unit.conn(), tom.id, PetStatus::Available, PetStatus::Pending)
                .await
                .unwrap());
            unit.commit().await.unwrap();
        }

        let available = db.pets().find_by_status(&[PetStatus::Available]).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, rex.id);

        let both = db
            .pets()
            .find_by_status(&[PetStatus::Available, PetStatus::Pending])
            .await
            .unwrap();
        assert_eq!(both.len(), 2);

        let tagged = db
            .pets()
            .find_by_tags(&["calm".to_string(), "big".to_string()])
            .await
            .unwrap();
        assert_eq!(tagged.iter().map(|p| p.id).collect::<Vec<_>>(), vec![rex.id, tom.id]);

        assert!(db.pets().find_by_tags(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_status_is_compare_and_set() {
        let db = db().await;
        let pet = db.pets().insert(&rex()).await.unwrap();

        let mut unit = db.atomic().await.unwrap();
        assert!(!set_status(unit.conn(), pet.id, PetStatus::Pending, PetStatus::Sold)
            .await
            .unwrap());
        assert_eq!(status(unit.conn(), pet.id).await.unwrap(), Some(PetStatus::Available));
        assert_eq!(status(unit.conn(), 404).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_inventory_counts_every_status() {
        let db = db().await;
        db.pets().insert(&rex()).await.unwrap();
        db.pets().insert(&rex()).await.unwrap();

        let inventory = db.pets().inventory().await.unwrap();
        assert_eq!(inventory, Inventory { available: 2, pending: 0, sold: 0 });
    }
}
