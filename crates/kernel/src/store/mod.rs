//! Storage abstraction for the navigation cache.
//!
//! The cache never talks to the database directly: every read made while
//! growing a menu tree goes through [`NavigationStore`]. The PostgreSQL
//! implementation delegates to the models; [`MemoryStore`] keeps everything
//! in process and backs the tests.

mod memory;
mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgNavigationStore;

use crate::models::{Leaf, LeafKind, Menu, MenuItem, Page};

/// Read access to menus, menu items, leaves, and host pages.
#[async_trait]
pub trait NavigationStore: Send + Sync {
    /// All menus, ordered by name.
    async fn menus(&self) -> Result<Vec<Menu>>;

    /// Look up a menu by name.
    async fn menu_by_name(&self, name: &str) -> Result<Option<Menu>>;

    /// Look up a menu by primary key.
    async fn menu_by_id(&self, id: Uuid) -> Result<Option<Menu>>;

    /// Level-0 items of a menu, ordered by `order` then insertion.
    async fn top_level_items(&self, menu_id: Uuid) -> Result<Vec<MenuItem>>;

    /// Direct children of an item, ordered by `order` then insertion.
    async fn child_items(&self, item_id: Uuid) -> Result<Vec<MenuItem>>;

    /// The item wrapping a leaf, if the leaf still exists.
    async fn item_for_leaf(&self, kind: LeafKind, leaf_id: Uuid) -> Result<Option<MenuItem>>;

    /// The menu that owns an item (found through the item's root).
    async fn owning_menu(&self, item_id: Uuid) -> Result<Option<Menu>>;

    /// Resolve a leaf of the given kind.
    async fn leaf(&self, kind: LeafKind, id: Uuid) -> Result<Option<Leaf>>;

    /// Look up a host page.
    async fn page(&self, id: Uuid) -> Result<Option<Page>>;

    /// Direct children of a host page, in tree order.
    async fn page_children(&self, id: Uuid) -> Result<Vec<Page>>;
}
