//! Menu item model: tree positions wrapping a reference to one leaf.
//!
//! Items form an adjacency-list tree. Root items (no parent) carry the
//! owning menu; nested items may leave `menu_id` empty and inherit it from
//! their root. Siblings sort by `order`, then by insertion sequence.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::NavError;

/// Sort key given to items that do not specify one.
pub const DEFAULT_ORDER: i32 = 999;

/// Discriminant of the leaf a menu item points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafKind {
    Folder,
    Link,
    Page,
}

impl LeafKind {
    /// Stored discriminant.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeafKind::Folder => "folder",
            LeafKind::Link => "link",
            LeafKind::Page => "page",
        }
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeafKind {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(LeafKind::Folder),
            "link" => Ok(LeafKind::Link),
            "page" => Ok(LeafKind::Page),
            other => Err(NavError::UnknownLeafType(other.to_string())),
        }
    }
}

impl TryFrom<String> for LeafKind {
    type Error = NavError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Menu item record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuItem {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Owning menu; always set on root items.
    pub menu_id: Option<Uuid>,

    /// Parent item, `None` for top-level items.
    pub parent_id: Option<Uuid>,

    /// Sort key within siblings (lower first).
    #[sqlx(rename = "sort_order")]
    pub order: i32,

    /// Insertion sequence, breaks ties in `order`.
    pub seq: i64,

    /// Kind of the wrapped leaf.
    #[sqlx(try_from = "String")]
    pub leaf_kind: LeafKind,

    /// Primary key of the wrapped leaf.
    pub leaf_id: Uuid,
}

/// Where a newly created leaf is attached.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Placement {
    /// Menu the item belongs to.
    pub menu_id: Uuid,

    /// Parent item (a folder's item), `None` for top level.
    pub parent_id: Option<Uuid>,

    /// Sort key, defaults to [`DEFAULT_ORDER`].
    pub order: Option<i32>,
}

impl Placement {
    /// Top-level placement in a menu.
    pub fn top(menu_id: Uuid) -> Self {
        Self {
            menu_id,
            parent_id: None,
            order: None,
        }
    }

    /// Placement under a parent item.
    pub fn under(menu_id: Uuid, parent_id: Uuid) -> Self {
        Self {
            menu_id,
            parent_id: Some(parent_id),
            order: None,
        }
    }

    /// Set the sort key.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }
}

const ITEM_COLUMNS: &str = "id, menu_id, parent_id, sort_order, seq, leaf_kind, leaf_id";

impl MenuItem {
    /// Insert the item for a freshly saved leaf.
    ///
    /// Runs on the caller's connection so leaf and item share a transaction.
    pub async fn insert_for_leaf(
        conn: &mut PgConnection,
        kind: LeafKind,
        leaf_id: Uuid,
        placement: Placement,
    ) -> Result<Self> {
        let item = sqlx::query_as::<_, MenuItem>(&format!(
            r#"
            INSERT INTO menu_item (id, menu_id, parent_id, sort_order, leaf_kind, leaf_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(placement.menu_id)
        .bind(placement.parent_id)
        .bind(placement.order.unwrap_or(DEFAULT_ORDER))
        .bind(kind.as_str())
        .bind(leaf_id)
        .fetch_one(conn)
        .await
        .context("failed to create menu item")?;

        Ok(item)
    }

    /// Find a menu item by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let item = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM menu_item WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch menu item by id")?;

        Ok(item)
    }

    /// Find the item wrapping a given leaf.
    pub async fn find_for_leaf(pool: &PgPool, kind: LeafKind, leaf_id: Uuid) -> Result<Option<Self>> {
        let item = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM menu_item WHERE leaf_kind = $1 AND leaf_id = $2"
        ))
        .bind(kind.as_str())
        .bind(leaf_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch menu item for leaf")?;

        Ok(item)
    }

    /// Top-level items of a menu, in render order.
    pub async fn top_level(pool: &PgPool, menu_id: Uuid) -> Result<Vec<Self>> {
        let items = sqlx::query_as::<_, MenuItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM menu_item
            WHERE menu_id = $1 AND parent_id IS NULL
            ORDER BY sort_order ASC, seq ASC
            "#
        ))
        .bind(menu_id)
        .fetch_all(pool)
        .await
        .context("failed to fetch top-level menu items")?;

        Ok(items)
    }

    /// Direct children of an item, in render order.
    pub async fn children(pool: &PgPool, id: Uuid) -> Result<Vec<Self>> {
        let items = sqlx::query_as::<_, MenuItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM menu_item
            WHERE parent_id = $1
            ORDER BY sort_order ASC, seq ASC
            "#
        ))
        .bind(id)
        .fetch_all(pool)
        .await
        .context("failed to fetch menu item children")?;

        Ok(items)
    }

    /// Resolve the menu that owns an item by walking up to its root.
    pub async fn owning_menu_id(pool: &PgPool, id: Uuid) -> Result<Option<Uuid>> {
        let menu_id: Option<Option<Uuid>> = sqlx::query_scalar(
            r#"
            WITH RECURSIVE ancestry AS (
                SELECT id, parent_id, menu_id FROM menu_item WHERE id = $1
                UNION ALL
                SELECT p.id, p.parent_id, p.menu_id
                FROM menu_item p
                JOIN ancestry a ON p.id = a.parent_id
            )
            SELECT menu_id FROM ancestry WHERE parent_id IS NULL LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to resolve owning menu")?;

        Ok(menu_id.flatten())
    }

    /// Move an item under a new parent (or to the top level) with a new sort key.
    pub async fn reposition(
        pool: &PgPool,
        id: Uuid,
        parent_id: Option<Uuid>,
        order: i32,
    ) -> Result<Option<Self>> {
        let item = sqlx::query_as::<_, MenuItem>(&format!(
            r#"
            UPDATE menu_item
            SET parent_id = $1, sort_order = $2
            WHERE id = $3
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(parent_id)
        .bind(order)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to reposition menu item")?;

        Ok(item)
    }

    /// Delete the item wrapping a leaf. Nested items go with it.
    pub async fn delete_for_leaf(
        conn: &mut PgConnection,
        kind: LeafKind,
        leaf_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query("DELETE FROM menu_item WHERE leaf_kind = $1 AND leaf_id = $2")
            .bind(kind.as_str())
            .bind(leaf_id)
            .execute(conn)
            .await
            .context("failed to delete menu item")?;

        Ok(result.rows_affected() > 0)
    }
}
