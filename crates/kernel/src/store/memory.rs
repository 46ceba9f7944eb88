//! In-process navigation store.
//!
//! Holds menus, items, leaves, and host pages in memory with the same
//! ordering and cascading rules as the PostgreSQL schema. Writes mirror the
//! model API (creating a leaf creates its item) but emit no events; callers
//! feed the matching [`NavEvent`](crate::nav::NavEvent) to the cache.

use std::collections::HashMap;

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::NavigationStore;
use crate::models::{
    CreateMenuFolder, CreateMenuLink, CreateMenuPage, DEFAULT_ORDER, Leaf, LeafKind, Menu,
    MenuFolder, MenuItem, MenuLink, MenuPage, Page, Placement, UpdateMenu,
};

#[derive(Default)]
struct State {
    menus: HashMap<Uuid, Menu>,
    items: HashMap<Uuid, MenuItem>,
    folders: HashMap<Uuid, MenuFolder>,
    links: HashMap<Uuid, MenuLink>,
    menu_pages: HashMap<Uuid, MenuPage>,
    pages: HashMap<Uuid, Page>,
    next_seq: i64,
}

impl State {
    fn insert_item(&mut self, kind: LeafKind, leaf_id: Uuid, placement: Placement) -> Result<MenuItem> {
        if !self.menus.contains_key(&placement.menu_id) {
            bail!("menu {} does not exist", placement.menu_id);
        }
        if let Some(parent) = placement.parent_id
            && !self.items.contains_key(&parent)
        {
            bail!("parent menu item {parent} does not exist");
        }

        self.next_seq += 1;
        let item = MenuItem {
            id: Uuid::now_v7(),
            menu_id: Some(placement.menu_id),
            parent_id: placement.parent_id,
            order: placement.order.unwrap_or(DEFAULT_ORDER),
            seq: self.next_seq,
            leaf_kind: kind,
            leaf_id,
        };
        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    fn sorted_items(&self, filter: impl Fn(&MenuItem) -> bool) -> Vec<MenuItem> {
        let mut items: Vec<MenuItem> = self.items.values().filter(|i| filter(i)).cloned().collect();
        items.sort_by_key(|i| (i.order, i.seq));
        items
    }

    /// Remove an item and everything nested under it, leaf rows included.
    fn remove_item_tree(&mut self, id: Uuid) {
        let children: Vec<Uuid> = self
            .items
            .values()
            .filter(|i| i.parent_id == Some(id))
            .map(|i| i.id)
            .collect();
        for child in children {
            self.remove_item_tree(child);
        }
        if let Some(item) = self.items.remove(&id) {
            self.remove_leaf_row(item.leaf_kind, item.leaf_id);
        }
    }

    fn remove_leaf_row(&mut self, kind: LeafKind, id: Uuid) -> bool {
        match kind {
            LeafKind::Folder => self.folders.remove(&id).is_some(),
            LeafKind::Link => self.links.remove(&id).is_some(),
            LeafKind::Page => self.menu_pages.remove(&id).is_some(),
        }
    }

    fn item_for(&self, kind: LeafKind, leaf_id: Uuid) -> Option<Uuid> {
        self.items
            .values()
            .find(|i| i.leaf_kind == kind && i.leaf_id == leaf_id)
            .map(|i| i.id)
    }

    fn leaf_exists(&self, kind: LeafKind, id: Uuid) -> bool {
        match kind {
            LeafKind::Folder => self.folders.contains_key(&id),
            LeafKind::Link => self.links.contains_key(&id),
            LeafKind::Page => self.menu_pages.contains_key(&id),
        }
    }

    fn page_path(&self, parent_id: Option<Uuid>, slug: &str) -> String {
        match parent_id.and_then(|p| self.pages.get(&p)) {
            Some(parent) if !parent.materialized_path.is_empty() => {
                format!("{}/{slug}", parent.materialized_path)
            }
            _ => slug.to_string(),
        }
    }

    /// Recompute materialized paths below a page, collecting every touched ID.
    fn refresh_paths(&mut self, id: Uuid, touched: &mut Vec<Uuid>) {
        let Some(page) = self.pages.get(&id) else {
            return;
        };
        let path = self.page_path(page.parent_id, &page.slug);
        if let Some(page) = self.pages.get_mut(&id) {
            page.materialized_path = path;
        }
        touched.push(id);

        let children: Vec<Uuid> = self
            .pages
            .values()
            .filter(|p| p.parent_id == Some(id))
            .map(|p| p.id)
            .collect();
        for child in children {
            self.refresh_paths(child, touched);
        }
    }
}

/// Navigation store kept entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a menu.
    pub fn create_menu(&self, name: impl Into<String>, template: Option<String>) -> Menu {
        let menu = Menu::new(name, template);
        self.state.write().menus.insert(menu.id, menu.clone());
        menu
    }

    /// Rename a menu or change its template.
    pub fn update_menu(&self, id: Uuid, input: UpdateMenu) -> Result<Menu> {
        let mut state = self.state.write();
        let Some(menu) = state.menus.get_mut(&id) else {
            bail!("menu {id} does not exist");
        };
        if let Some(name) = input.name {
            menu.name = name;
        }
        if let Some(template) = input.template {
            menu.template = template;
        }
        menu.changed = chrono::Utc::now().timestamp();
        Ok(menu.clone())
    }

    /// Delete a menu, every item it owns, and their leaves.
    pub fn delete_menu(&self, id: Uuid) -> Option<Menu> {
        let mut state = self.state.write();
        let menu = state.menus.remove(&id)?;
        let owned: Vec<Uuid> = state
            .items
            .values()
            .filter(|i| i.menu_id == Some(id))
            .map(|i| i.id)
            .collect();
        for item in owned {
            state.remove_item_tree(item);
        }
        Some(menu)
    }

    /// Create a folder and its item.
    pub fn create_folder(
        &self,
        input: CreateMenuFolder,
        placement: Placement,
    ) -> Result<(MenuFolder, MenuItem)> {
        let folder = MenuFolder {
            id: Uuid::now_v7(),
            name: input.name,
            html_class_name: input.html_class_name.unwrap_or_default(),
        };
        let mut state = self.state.write();
        let item = state.insert_item(LeafKind::Folder, folder.id, placement)?;
        state.folders.insert(folder.id, folder.clone());
        Ok((folder, item))
    }

    /// Create a link and its item.
    pub fn create_link(
        &self,
        input: CreateMenuLink,
        placement: Placement,
    ) -> Result<(MenuLink, MenuItem)> {
        let link = MenuLink {
            id: Uuid::now_v7(),
            name: input.name,
            url: input.url,
            html_class_name: input.html_class_name.unwrap_or_default(),
        };
        let mut state = self.state.write();
        let item = state.insert_item(LeafKind::Link, link.id, placement)?;
        state.links.insert(link.id, link.clone());
        Ok((link, item))
    }

    /// Create a page reference and its item.
    pub fn create_menu_page(
        &self,
        input: CreateMenuPage,
        placement: Placement,
    ) -> Result<(MenuPage, MenuItem)> {
        let depth = input.depth.unwrap_or(0);
        if depth < 0 {
            bail!("menu page depth must not be negative (got {depth})");
        }
        let menu_page = MenuPage {
            id: Uuid::now_v7(),
            page_id: input.page_id,
            depth,
            html_class_name: input.html_class_name.unwrap_or_default(),
        };
        let mut state = self.state.write();
        let item = state.insert_item(LeafKind::Page, menu_page.id, placement)?;
        state.menu_pages.insert(menu_page.id, menu_page.clone());
        Ok((menu_page, item))
    }

    /// Replace a stored leaf with a new version of itself.
    ///
    /// Saving never creates a second item for an existing leaf.
    pub fn save_leaf(&self, leaf: Leaf) -> Result<()> {
        let mut state = self.state.write();
        if !state.leaf_exists(leaf.kind(), leaf.id()) {
            bail!("{} {} does not exist", leaf.kind(), leaf.id());
        }
        match leaf {
            Leaf::Folder(f) => {
                state.folders.insert(f.id, f);
            }
            Leaf::Link(l) => {
                state.links.insert(l.id, l);
            }
            Leaf::Page(p) => {
                state.menu_pages.insert(p.id, p);
            }
        }
        Ok(())
    }

    /// Delete a leaf, its item, and every item and leaf nested under it.
    pub fn delete_leaf(&self, kind: LeafKind, id: Uuid) -> bool {
        let mut state = self.state.write();
        let existed = state.remove_leaf_row(kind, id);
        if let Some(item) = state.item_for(kind, id) {
            state.remove_item_tree(item);
        }
        existed
    }

    /// Remove a leaf row but keep its item, leaving a dangling reference.
    ///
    /// Mirrors a leaf deleted behind the navigation layer's back.
    pub fn forget_leaf(&self, kind: LeafKind, id: Uuid) {
        self.state.write().remove_leaf_row(kind, id);
    }

    /// Move an item under a new parent with a new sort key.
    pub fn reposition(&self, id: Uuid, parent_id: Option<Uuid>, order: i32) -> Result<MenuItem> {
        let mut state = self.state.write();
        if let Some(parent) = parent_id
            && !state.items.contains_key(&parent)
        {
            bail!("parent menu item {parent} does not exist");
        }
        let Some(item) = state.items.get_mut(&id) else {
            bail!("menu item {id} does not exist");
        };
        item.parent_id = parent_id;
        item.order = order;
        Ok(item.clone())
    }

    /// Insert or replace a host page.
    pub fn put_page(&self, page: Page) {
        self.state.write().pages.insert(page.id, page);
    }

    /// Remove a host page.
    ///
    /// Page references pointing at it are deleted with their items, as the
    /// `menu_page.page_id` foreign key cascades. Child pages are left in
    /// place; the host owns its own tree.
    pub fn delete_page(&self, id: Uuid) -> Option<Page> {
        let mut state = self.state.write();
        let page = state.pages.remove(&id)?;
        let references: Vec<Uuid> = state
            .menu_pages
            .values()
            .filter(|mp| mp.page_id == id)
            .map(|mp| mp.id)
            .collect();
        for reference in references {
            state.remove_leaf_row(LeafKind::Page, reference);
            if let Some(item) = state.item_for(LeafKind::Page, reference) {
                state.remove_item_tree(item);
            }
        }
        Some(page)
    }

    /// Move a page under a new parent, returning every page whose ancestry changed.
    pub fn move_page(&self, id: Uuid, parent_id: Option<Uuid>) -> Result<Vec<Uuid>> {
        let mut state = self.state.write();
        if let Some(parent) = parent_id
            && !state.pages.contains_key(&parent)
        {
            bail!("parent page {parent} does not exist");
        }
        let Some(page) = state.pages.get_mut(&id) else {
            bail!("page {id} does not exist");
        };
        page.parent_id = parent_id;

        let mut touched = Vec::new();
        state.refresh_paths(id, &mut touched);
        Ok(touched)
    }
}

#[async_trait]
impl NavigationStore for MemoryStore {
    async fn menus(&self) -> Result<Vec<Menu>> {
        let mut menus: Vec<Menu> = self.state.read().menus.values().cloned().collect();
        menus.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(menus)
    }

    async fn menu_by_name(&self, name: &str) -> Result<Option<Menu>> {
        let state = self.state.read();
        let menu = state
            .menus
            .values()
            .filter(|m| m.name == name)
            .min_by_key(|m| (m.created, m.id))
            .cloned();
        Ok(menu)
    }

    async fn menu_by_id(&self, id: Uuid) -> Result<Option<Menu>> {
        Ok(self.state.read().menus.get(&id).cloned())
    }

    async fn top_level_items(&self, menu_id: Uuid) -> Result<Vec<MenuItem>> {
        let state = self.state.read();
        Ok(state.sorted_items(|i| i.menu_id == Some(menu_id) && i.parent_id.is_none()))
    }

    async fn child_items(&self, item_id: Uuid) -> Result<Vec<MenuItem>> {
        let state = self.state.read();
        Ok(state.sorted_items(|i| i.parent_id == Some(item_id)))
    }

    async fn item_for_leaf(&self, kind: LeafKind, leaf_id: Uuid) -> Result<Option<MenuItem>> {
        let state = self.state.read();
        let item = state
            .items
            .values()
            .find(|i| i.leaf_kind == kind && i.leaf_id == leaf_id)
            .cloned();
        Ok(item)
    }

    async fn owning_menu(&self, item_id: Uuid) -> Result<Option<Menu>> {
        let state = self.state.read();
        let mut current = state.items.get(&item_id);
        while let Some(item) = current {
            match item.parent_id {
                Some(parent) => current = state.items.get(&parent),
                None => {
                    return Ok(item.menu_id.and_then(|m| state.menus.get(&m)).cloned());
                }
            }
        }
        Ok(None)
    }

    async fn leaf(&self, kind: LeafKind, id: Uuid) -> Result<Option<Leaf>> {
        let state = self.state.read();
        let leaf = match kind {
            LeafKind::Folder => state.folders.get(&id).cloned().map(Leaf::Folder),
            LeafKind::Link => state.links.get(&id).cloned().map(Leaf::Link),
            LeafKind::Page => state.menu_pages.get(&id).cloned().map(Leaf::Page),
        };
        Ok(leaf)
    }

    async fn page(&self, id: Uuid) -> Result<Option<Page>> {
        Ok(self.state.read().pages.get(&id).cloned())
    }

    async fn page_children(&self, id: Uuid) -> Result<Vec<Page>> {
        let state = self.state.read();
        let mut pages: Vec<Page> = state
            .pages
            .values()
            .filter(|p| p.parent_id == Some(id))
            .cloned()
            .collect();
        pages.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.slug.cmp(&b.slug)));
        Ok(pages)
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("MemoryStore")
            .field("menus", &state.menus.len())
            .field("items", &state.items.len())
            .field("pages", &state.pages.len())
            .finish()
    }
}
