//! Process-wide navigation cache.
//!
//! [`SiteNav`] owns one cached tree per menu, keyed by menu name. It is
//! built once at startup, rebuilt one whole menu at a time on change, and
//! shared through `AppState`. Trees are never patched in place: a recache
//! grows the menu from current storage and swaps it in with a single
//! assignment.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::grow::TreeBuilder;
use super::node::{IdIndex, MenuNav, NavNode, NodeKind};
use crate::error::{NavError, NavResult};
use crate::models::{LeafKind, Menu};
use crate::store::NavigationStore;

/// One cached menu: its container and its grown top-level nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedMenu {
    pub container: MenuNav,
    pub tree: Vec<NavNode>,
}

impl CachedMenu {
    /// Every primary key reachable in the tree, grouped by kind.
    pub fn id_index(&self) -> IdIndex {
        let mut index = IdIndex::new();
        for node in &self.tree {
            node.collect_ids(&mut index);
        }
        index
    }

    /// Primary keys of one kind reachable in the tree.
    pub fn ids_of(&self, kind: NodeKind) -> HashSet<Uuid> {
        self.id_index().remove(&kind).unwrap_or_default()
    }
}

/// The navigation cache.
pub struct SiteNav {
    store: Arc<dyn NavigationStore>,
    menus: RwLock<BTreeMap<String, Arc<CachedMenu>>>,
    shut_down: AtomicBool,
}

impl SiteNav {
    /// Build the cache by growing every persisted menu.
    pub async fn init(store: Arc<dyn NavigationStore>) -> NavResult<Self> {
        let nav = Self {
            store,
            menus: RwLock::new(BTreeMap::new()),
            shut_down: AtomicBool::new(false),
        };

        let menus = nav.store.menus().await?;
        let mut grown = BTreeMap::new();
        for menu in &menus {
            grown.insert(menu.name.clone(), Arc::new(nav.grow(menu).await?));
        }
        *nav.menus.write() = grown;

        info!(menus = menus.len(), "navigation cache built");
        Ok(nav)
    }

    /// The store this cache reads from.
    pub fn store(&self) -> &Arc<dyn NavigationStore> {
        &self.store
    }

    fn ensure_running(&self) -> NavResult<()> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(NavError::ShutDown);
        }
        Ok(())
    }

    async fn grow(&self, menu: &Menu) -> NavResult<CachedMenu> {
        let tree = TreeBuilder::new(self.store.as_ref()).grow_menu(menu).await?;
        Ok(CachedMenu {
            container: MenuNav::for_menu(menu),
            tree,
        })
    }

    /// The cached container and tree of a menu.
    pub fn lookup(&self, name: &str) -> NavResult<Arc<CachedMenu>> {
        self.ensure_running()?;
        self.menus
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| NavError::MenuNotFound(name.to_string()))
    }

    /// Regrow one menu from current storage and replace its cached entry.
    ///
    /// The menu is resolved by name. When the name is no longer persisted
    /// but the entry is cached, the cached primary key is used instead, so
    /// a rename does not lose the entry.
    pub async fn recache(&self, name: &str) -> NavResult<()> {
        self.ensure_running()?;

        let menu = match self.store.menu_by_name(name).await? {
            Some(menu) => menu,
            None => {
                let cached_pk = self.menus.read().get(name).map(|c| c.container.pk);
                let by_pk = match cached_pk {
                    Some(pk) => self.store.menu_by_id(pk).await?,
                    None => None,
                };
                by_pk.ok_or_else(|| NavError::MenuNotFound(name.to_string()))?
            }
        };

        let cached = Arc::new(self.grow(&menu).await?);
        debug!(menu = %name, top_level = cached.tree.len(), "menu recached");
        self.menus.write().insert(name.to_string(), cached);
        Ok(())
    }

    /// Regrow every cached menu.
    ///
    /// A menu that fails to grow keeps its previous tree and does not stop
    /// the others; the first failure is returned once all have been tried.
    pub async fn recache_all(&self) -> NavResult<()> {
        self.ensure_running()?;
        let names = self.names();
        let mut first_error = None;
        for name in &names {
            if let Err(e) = self.recache(name).await {
                error!(menu = %name, error = %e, "menu rebuild failed");
                first_error.get_or_insert(e);
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }
        info!(menus = names.len(), "navigation cache rebuilt");
        Ok(())
    }

    /// For every cached menu, the primary keys of `kind` anywhere in its tree.
    ///
    /// Walks the current trees on every call.
    pub fn items_of_type(&self, kind: LeafKind) -> Vec<(String, HashSet<Uuid>)> {
        let kind = NodeKind::from(kind);
        self.menus
            .read()
            .iter()
            .map(|(name, cached)| (name.clone(), cached.ids_of(kind)))
            .collect()
    }

    /// Names of the cached menus whose trees contain `id` as a `kind` node.
    pub fn menus_containing(&self, kind: LeafKind, id: Uuid) -> Vec<String> {
        self.items_of_type(kind)
            .into_iter()
            .filter(|(_, ids)| ids.contains(&id))
            .map(|(name, _)| name)
            .collect()
    }

    /// Cache key of the entry holding `menu`, falling back to its name.
    pub fn key_for(&self, menu: &Menu) -> String {
        self.menus
            .read()
            .iter()
            .find(|(_, cached)| cached.container.pk == menu.id)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| menu.name.clone())
    }

    /// Drop a cached menu. Returns whether it was cached.
    pub fn evict(&self, name: &str) -> bool {
        let removed = self.menus.write().remove(name).is_some();
        if removed {
            debug!(menu = %name, "menu evicted from navigation cache");
        }
        removed
    }

    /// Names of all cached menus, sorted.
    pub fn names(&self) -> Vec<String> {
        self.menus.read().keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.menus.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.menus.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.menus.read().is_empty()
    }

    /// End the cache's lifecycle: drop every tree and refuse further use.
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        let dropped = std::mem::take(&mut *self.menus.write()).len();
        info!(menus = dropped, "navigation cache shut down");
    }
}

impl std::fmt::Debug for SiteNav {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteNav")
            .field("menus", &self.names())
            .field("shut_down", &self.shut_down.load(Ordering::Relaxed))
            .finish()
    }
}
