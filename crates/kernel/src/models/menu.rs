//! Menu model: named navigation containers.
//!
//! The menu name is the external key used by templates and by the
//! navigation cache; the template names the Tera template that wraps the
//! rendered tree.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Template used when a menu does not name one.
pub const DEFAULT_MENU_TEMPLATE: &str = "navigation/menu.html";

/// Menu record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Menu {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Menu name (e.g., "Main", "Footer").
    pub name: String,

    /// Render template identifier.
    pub template: String,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

/// Input for creating a menu.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMenu {
    pub name: String,
    pub template: Option<String>,
}

/// Input for updating a menu.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMenu {
    pub name: Option<String>,
    pub template: Option<String>,
}

impl Menu {
    /// Build an unsaved menu with a fresh ID.
    pub fn new(name: impl Into<String>, template: Option<String>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            template: template.unwrap_or_else(|| DEFAULT_MENU_TEMPLATE.to_string()),
            created: now,
            changed: now,
        }
    }

    /// Create a new menu.
    pub async fn create(pool: &PgPool, input: CreateMenu) -> Result<Self> {
        let menu = Self::new(input.name, input.template);

        let menu = sqlx::query_as::<_, Menu>(
            r#"
            INSERT INTO menu (id, name, template, created, changed)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, template, created, changed
            "#,
        )
        .bind(menu.id)
        .bind(&menu.name)
        .bind(&menu.template)
        .bind(menu.created)
        .bind(menu.changed)
        .fetch_one(pool)
        .await
        .context("failed to create menu")?;

        Ok(menu)
    }

    /// Find a menu by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let menu = sqlx::query_as::<_, Menu>(
            "SELECT id, name, template, created, changed FROM menu WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch menu by id")?;

        Ok(menu)
    }

    /// Find a menu by name.
    ///
    /// Names are not enforced unique; the oldest menu wins.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>> {
        let menu = sqlx::query_as::<_, Menu>(
            r#"
            SELECT id, name, template, created, changed
            FROM menu
            WHERE name = $1
            ORDER BY created ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("failed to fetch menu by name")?;

        Ok(menu)
    }

    /// List all menus ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let menus = sqlx::query_as::<_, Menu>(
            "SELECT id, name, template, created, changed FROM menu ORDER BY name ASC",
        )
        .fetch_all(pool)
        .await
        .context("failed to list menus")?;

        Ok(menus)
    }

    /// Update a menu.
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateMenu) -> Result<Option<Self>> {
        let Some(existing) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let now = chrono::Utc::now().timestamp();

        let name = input.name.unwrap_or(existing.name);
        let template = input.template.unwrap_or(existing.template);

        let updated = sqlx::query_as::<_, Menu>(
            r#"
            UPDATE menu
            SET name = $1, template = $2, changed = $3
            WHERE id = $4
            RETURNING id, name, template, created, changed
            "#,
        )
        .bind(&name)
        .bind(&template)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update menu")?;

        Ok(updated)
    }

    /// Delete a menu. Its menu items are removed by the cascading foreign key.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM menu WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete menu")?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_menu_uses_default_template() {
        let menu = Menu::new("Main", None);
        assert_eq!(menu.name, "Main");
        assert_eq!(menu.template, DEFAULT_MENU_TEMPLATE);
    }

    #[test]
    fn new_menu_keeps_explicit_template() {
        let menu = Menu::new("Footer", Some("navigation/footer.html".to_string()));
        assert_eq!(menu.template, "navigation/footer.html");
    }
}
