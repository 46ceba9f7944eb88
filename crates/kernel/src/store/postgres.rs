//! PostgreSQL implementation of NavigationStore.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::NavigationStore;
use crate::models::{Leaf, LeafKind, Menu, MenuItem, Page};

/// Navigation store backed by the menu tables and the host page tables.
#[derive(Clone)]
pub struct PgNavigationStore {
    pool: PgPool,
}

impl PgNavigationStore {
    /// Create a new store with a database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl NavigationStore for PgNavigationStore {
    async fn menus(&self) -> Result<Vec<Menu>> {
        Menu::list(&self.pool).await
    }

    async fn menu_by_name(&self, name: &str) -> Result<Option<Menu>> {
        Menu::find_by_name(&self.pool, name).await
    }

    async fn menu_by_id(&self, id: Uuid) -> Result<Option<Menu>> {
        Menu::find_by_id(&self.pool, id).await
    }

    async fn top_level_items(&self, menu_id: Uuid) -> Result<Vec<MenuItem>> {
        MenuItem::top_level(&self.pool, menu_id).await
    }

    async fn child_items(&self, item_id: Uuid) -> Result<Vec<MenuItem>> {
        MenuItem::children(&self.pool, item_id).await
    }

    async fn item_for_leaf(&self, kind: LeafKind, leaf_id: Uuid) -> Result<Option<MenuItem>> {
        MenuItem::find_for_leaf(&self.pool, kind, leaf_id).await
    }

    async fn owning_menu(&self, item_id: Uuid) -> Result<Option<Menu>> {
        let Some(menu_id) = MenuItem::owning_menu_id(&self.pool, item_id).await? else {
            return Ok(None);
        };
        Menu::find_by_id(&self.pool, menu_id).await
    }

    async fn leaf(&self, kind: LeafKind, id: Uuid) -> Result<Option<Leaf>> {
        Leaf::load(&self.pool, kind, id).await
    }

    async fn page(&self, id: Uuid) -> Result<Option<Page>> {
        Page::find_by_id(&self.pool, id).await
    }

    async fn page_children(&self, id: Uuid) -> Result<Vec<Page>> {
        Page::children(&self.pool, id).await
    }
}

impl std::fmt::Debug for PgNavigationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgNavigationStore")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}
