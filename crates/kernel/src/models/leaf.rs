//! Menu leaf models: folders, links, and page references.
//!
//! Every leaf owns exactly one [`MenuItem`]. Creating a leaf inserts the
//! leaf row and its item in one transaction; deleting a leaf removes the
//! item (and, for folders, every item nested under it).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::menu_item::{LeafKind, MenuItem, Placement};

/// A folder: a named container for further menu items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuFolder {
    pub id: Uuid,
    pub name: String,
    pub html_class_name: String,
}

/// A terminal link to an arbitrary URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuLink {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub html_class_name: String,
}

/// A reference into the host page tree.
///
/// `depth` is how many levels of the page's descendants are inlined into
/// the menu; zero shows only the page itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuPage {
    pub id: Uuid,
    pub page_id: Uuid,
    pub depth: i32,
    pub html_class_name: String,
}

/// A resolved menu leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Leaf {
    Folder(MenuFolder),
    Link(MenuLink),
    Page(MenuPage),
}

impl Leaf {
    /// Discriminant of this leaf.
    pub fn kind(&self) -> LeafKind {
        match self {
            Leaf::Folder(_) => LeafKind::Folder,
            Leaf::Link(_) => LeafKind::Link,
            Leaf::Page(_) => LeafKind::Page,
        }
    }

    /// Primary key of this leaf.
    pub fn id(&self) -> Uuid {
        match self {
            Leaf::Folder(f) => f.id,
            Leaf::Link(l) => l.id,
            Leaf::Page(p) => p.id,
        }
    }

    /// Load a leaf of the given kind.
    pub async fn load(pool: &PgPool, kind: LeafKind, id: Uuid) -> Result<Option<Self>> {
        let leaf = match kind {
            LeafKind::Folder => MenuFolder::find_by_id(pool, id).await?.map(Leaf::Folder),
            LeafKind::Link => MenuLink::find_by_id(pool, id).await?.map(Leaf::Link),
            LeafKind::Page => MenuPage::find_by_id(pool, id).await?.map(Leaf::Page),
        };
        Ok(leaf)
    }
}

/// Input for creating a folder.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMenuFolder {
    pub name: String,
    pub html_class_name: Option<String>,
}

/// Input for creating a link.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMenuLink {
    pub name: String,
    pub url: String,
    pub html_class_name: Option<String>,
}

/// Input for creating a page reference.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMenuPage {
    pub page_id: Uuid,
    pub depth: Option<i32>,
    pub html_class_name: Option<String>,
}

/// Delete a leaf row together with its menu item.
///
/// The leaf row is deleted first; its trigger removes the item, and the
/// `menu_item` triggers take nested items and their leaves with it.
async fn delete_leaf(pool: &PgPool, kind: LeafKind, table: &str, id: Uuid) -> Result<bool> {
    let mut tx = pool.begin().await.context("failed to start transaction")?;

    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to delete {kind}"))?;

    MenuItem::delete_for_leaf(&mut tx, kind, id).await?;

    tx.commit().await.context("failed to commit transaction")?;

    Ok(result.rows_affected() > 0)
}

impl MenuFolder {
    /// Create a folder and its menu item.
    pub async fn create(
        pool: &PgPool,
        input: CreateMenuFolder,
        placement: Placement,
    ) -> Result<(Self, MenuItem)> {
        let mut tx = pool.begin().await.context("failed to start transaction")?;

        let folder = sqlx::query_as::<_, MenuFolder>(
            r#"
            INSERT INTO menu_folder (id, name, html_class_name)
            VALUES ($1, $2, $3)
            RETURNING id, name, html_class_name
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .bind(input.html_class_name.unwrap_or_default())
        .fetch_one(&mut *tx)
        .await
        .context("failed to create menu folder")?;

        let item = MenuItem::insert_for_leaf(&mut tx, LeafKind::Folder, folder.id, placement).await?;
        tx.commit().await.context("failed to commit transaction")?;

        Ok((folder, item))
    }

    /// Find a folder by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let folder = sqlx::query_as::<_, MenuFolder>(
            "SELECT id, name, html_class_name FROM menu_folder WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch menu folder")?;

        Ok(folder)
    }

    /// Rename a folder or change its class.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        name: Option<String>,
        html_class_name: Option<String>,
    ) -> Result<Option<Self>> {
        let Some(existing) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let folder = sqlx::query_as::<_, MenuFolder>(
            r#"
            UPDATE menu_folder SET name = $1, html_class_name = $2
            WHERE id = $3
            RETURNING id, name, html_class_name
            "#,
        )
        .bind(name.unwrap_or(existing.name))
        .bind(html_class_name.unwrap_or(existing.html_class_name))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update menu folder")?;

        Ok(folder)
    }

    /// Delete a folder and its menu item.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        delete_leaf(pool, LeafKind::Folder, "menu_folder", id).await
    }
}

impl MenuLink {
    /// Create a link and its menu item.
    pub async fn create(
        pool: &PgPool,
        input: CreateMenuLink,
        placement: Placement,
    ) -> Result<(Self, MenuItem)> {
        let mut tx = pool.begin().await.context("failed to start transaction")?;

        let link = sqlx::query_as::<_, MenuLink>(
            r#"
            INSERT INTO menu_link (id, name, url, html_class_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, url, html_class_name
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .bind(&input.url)
        .bind(input.html_class_name.unwrap_or_default())
        .fetch_one(&mut *tx)
        .await
        .context("failed to create menu link")?;

        let item = MenuItem::insert_for_leaf(&mut tx, LeafKind::Link, link.id, placement).await?;
        tx.commit().await.context("failed to commit transaction")?;

        Ok((link, item))
    }

    /// Find a link by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let link = sqlx::query_as::<_, MenuLink>(
            "SELECT id, name, url, html_class_name FROM menu_link WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch menu link")?;

        Ok(link)
    }

    /// Update a link's name, URL, or class.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        name: Option<String>,
        url: Option<String>,
        html_class_name: Option<String>,
    ) -> Result<Option<Self>> {
        let Some(existing) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let link = sqlx::query_as::<_, MenuLink>(
            r#"
            UPDATE menu_link SET name = $1, url = $2, html_class_name = $3
            WHERE id = $4
            RETURNING id, name, url, html_class_name
            "#,
        )
        .bind(name.unwrap_or(existing.name))
        .bind(url.unwrap_or(existing.url))
        .bind(html_class_name.unwrap_or(existing.html_class_name))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update menu link")?;

        Ok(link)
    }

    /// Delete a link and its menu item.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        delete_leaf(pool, LeafKind::Link, "menu_link", id).await
    }
}

impl MenuPage {
    /// Create a page reference and its menu item.
    pub async fn create(
        pool: &PgPool,
        input: CreateMenuPage,
        placement: Placement,
    ) -> Result<(Self, MenuItem)> {
        let depth = input.depth.unwrap_or(0);
        if depth < 0 {
            anyhow::bail!("menu page depth must not be negative (got {depth})");
        }

        let mut tx = pool.begin().await.context("failed to start transaction")?;

        let page = sqlx::query_as::<_, MenuPage>(
            r#"
            INSERT INTO menu_page (id, page_id, depth, html_class_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, page_id, depth, html_class_name
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.page_id)
        .bind(depth)
        .bind(input.html_class_name.unwrap_or_default())
        .fetch_one(&mut *tx)
        .await
        .context("failed to create menu page")?;

        let item = MenuItem::insert_for_leaf(&mut tx, LeafKind::Page, page.id, placement).await?;
        tx.commit().await.context("failed to commit transaction")?;

        Ok((page, item))
    }

    /// Find a page reference by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let page = sqlx::query_as::<_, MenuPage>(
            "SELECT id, page_id, depth, html_class_name FROM menu_page WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch menu page")?;

        Ok(page)
    }

    /// Change the inlined depth or class of a page reference.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        depth: Option<i32>,
        html_class_name: Option<String>,
    ) -> Result<Option<Self>> {
        let Some(existing) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let depth = depth.unwrap_or(existing.depth);
        if depth < 0 {
            anyhow::bail!("menu page depth must not be negative (got {depth})");
        }

        let page = sqlx::query_as::<_, MenuPage>(
            r#"
            UPDATE menu_page SET depth = $1, html_class_name = $2
            WHERE id = $3
            RETURNING id, page_id, depth, html_class_name
            "#,
        )
        .bind(depth)
        .bind(html_class_name.unwrap_or(existing.html_class_name))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update menu page")?;

        Ok(page)
    }

    /// Delete a page reference and its menu item.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        delete_leaf(pool, LeafKind::Page, "menu_page", id).await
    }

    /// Human-readable label, as shown in the admin tree.
    pub fn describe(&self, page_title: &str) -> String {
        let plural = if self.depth == 1 { "" } else { "s" };
        format!(
            "Page: {page_title} (and {} level{plural} of descendants)",
            self.depth
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_ref(depth: i32) -> MenuPage {
        MenuPage {
            id: Uuid::now_v7(),
            page_id: Uuid::now_v7(),
            depth,
            html_class_name: String::new(),
        }
    }

    #[test]
    fn leaf_reports_kind_and_id() {
        let link = MenuLink {
            id: Uuid::now_v7(),
            name: "Careers".to_string(),
            url: "/careers/".to_string(),
            html_class_name: String::new(),
        };
        let id = link.id;
        let leaf = Leaf::Link(link);
        assert_eq!(leaf.kind(), LeafKind::Link);
        assert_eq!(leaf.id(), id);
    }

    #[test]
    fn describe_pluralizes_levels() {
        assert_eq!(
            page_ref(1).describe("About"),
            "Page: About (and 1 level of descendants)"
        );
        assert_eq!(
            page_ref(2).describe("About"),
            "Page: About (and 2 levels of descendants)"
        );
        assert_eq!(
            page_ref(0).describe("About"),
            "Page: About (and 0 levels of descendants)"
        );
    }
}
