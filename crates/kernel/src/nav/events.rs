//! Change propagation.
//!
//! Storage writes are reported to the cache as [`NavEvent`]s. Each handler
//! decides which cached menus may now be stale and rebuilds those. A menu
//! rebuilt without need is acceptable; a stale menu left in place is not.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::site::SiteNav;
use crate::error::{NavError, NavResult};
use crate::models::{LeafKind, PageStatus};

/// A persistence change the navigation cache reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NavEvent {
    /// A folder, link, or page reference was created or updated.
    LeafSaved { kind: LeafKind, id: Uuid },
    /// A folder, link, or page reference was deleted.
    LeafDeleted { kind: LeafKind, id: Uuid },
    /// A menu was created, renamed, or given a new template.
    MenuSaved { id: Uuid, name: String },
    MenuDeleted { name: String },
    /// A menu item was reordered or moved under a new parent.
    MenuItemMoved { item: Uuid },
    /// A host page was deleted. Carries the page's last known state.
    PageDeleted {
        page: Uuid,
        status: PageStatus,
        show_in_nav: bool,
    },
    PageEdited { page: Uuid, created: bool },
    /// A page subtree was relocated; `pages` lists every page whose
    /// ancestry changed.
    PageMoved { pages: Vec<Uuid> },
    /// Explicit rebuild of one menu.
    Recache { name: String },
}

impl NavEvent {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::LeafSaved { .. } => "leaf_saved",
            Self::LeafDeleted { .. } => "leaf_deleted",
            Self::MenuSaved { .. } => "menu_saved",
            Self::MenuDeleted { .. } => "menu_deleted",
            Self::MenuItemMoved { .. } => "menu_item_moved",
            Self::PageDeleted { .. } => "page_deleted",
            Self::PageEdited { .. } => "page_edited",
            Self::PageMoved { .. } => "page_moved",
            Self::Recache { .. } => "recache",
        }
    }
}

impl SiteNav {
    /// Apply one event, returning the names of the menus rebuilt.
    pub async fn handle(&self, event: &NavEvent) -> NavResult<Vec<String>> {
        let recached = match event {
            NavEvent::LeafSaved { kind, id } | NavEvent::LeafDeleted { kind, id } => {
                self.on_leaf_changed(*kind, *id).await?
            }
            NavEvent::MenuSaved { id, name } => self.on_menu_saved(*id, name).await?,
            NavEvent::MenuDeleted { name } => {
                self.evict(name);
                Vec::new()
            }
            NavEvent::MenuItemMoved { item } => self.on_item_moved(*item).await?,
            NavEvent::PageDeleted {
                page,
                status,
                show_in_nav,
            } => self.on_page_deleted(*page, *status, *show_in_nav).await?,
            NavEvent::PageEdited { page, created } => self.on_page_edited(*page, *created).await?,
            NavEvent::PageMoved { pages } => self.on_page_moved(pages).await?,
            NavEvent::Recache { name } => {
                self.recache(name).await?;
                vec![name.clone()]
            }
        };

        debug!(event = event.label(), recached = ?recached, "navigation event handled");
        Ok(recached)
    }

    /// A folder, link, or page reference changed.
    ///
    /// Menus already indexing the leaf are rebuilt, and so is the menu that
    /// owns the leaf's item, which covers a leaf that was just added. Page
    /// references are indexed by host page, not by their own key, so when
    /// their owner cannot be resolved (the row is gone) every menu is
    /// rebuilt.
    pub async fn on_leaf_changed(&self, kind: LeafKind, id: Uuid) -> NavResult<Vec<String>> {
        let mut stale: BTreeSet<String> = match kind {
            LeafKind::Folder | LeafKind::Link => self.menus_containing(kind, id).into_iter().collect(),
            LeafKind::Page => BTreeSet::new(),
        };

        let owner = match self.store().item_for_leaf(kind, id).await? {
            Some(item) => self.store().owning_menu(item.id).await?,
            None => None,
        };
        match owner {
            Some(menu) => {
                stale.insert(self.key_for(&menu));
            }
            None if kind == LeafKind::Page => {
                debug!(%id, "page reference has no owning menu, rebuilding every menu");
                self.recache_all().await?;
                return Ok(self.names());
            }
            None => {}
        }

        self.recache_each(stale).await
    }

    async fn on_menu_saved(&self, id: Uuid, name: &str) -> NavResult<Vec<String>> {
        let renamed: Vec<String> = self
            .names()
            .into_iter()
            .filter(|cached| cached != name)
            .filter(|cached| self.lookup(cached).is_ok_and(|c| c.container.pk == id))
            .collect();
        for old in &renamed {
            debug!(from = %old, to = %name, "menu renamed");
            self.evict(old);
        }

        self.recache(name).await?;
        Ok(vec![name.to_string()])
    }

    async fn on_item_moved(&self, item: Uuid) -> NavResult<Vec<String>> {
        let Some(menu) = self.store().owning_menu(item).await? else {
            warn!(%item, "moved menu item has no owning menu");
            return Ok(Vec::new());
        };
        let name = self.key_for(&menu);
        self.recache(&name).await?;
        Ok(vec![name])
    }

    /// A host page was deleted.
    ///
    /// A page that was never visible in navigation cannot affect any tree,
    /// so nothing is rebuilt for it.
    pub async fn on_page_deleted(
        &self,
        page: Uuid,
        status: PageStatus,
        show_in_nav: bool,
    ) -> NavResult<Vec<String>> {
        if status != PageStatus::Published || !show_in_nav {
            debug!(%page, "deleted page was not in navigation");
            return Ok(Vec::new());
        }
        self.recache_each(self.menus_indexing_pages(&[page])).await
    }

    /// A host page was created or edited.
    ///
    /// A created page cannot be in any tree yet, so menus are matched on its
    /// parent instead. A new page under a parent no menu has indexed is not
    /// picked up.
    pub async fn on_page_edited(&self, page: Uuid, created: bool) -> NavResult<Vec<String>> {
        let checked = if created {
            let stored = self
                .store()
                .page(page)
                .await?
                .ok_or(NavError::MissingPage(page))?;
            match stored.parent_id {
                Some(parent) => parent,
                None => return Ok(Vec::new()),
            }
        } else {
            page
        };
        self.recache_each(self.menus_indexing_pages(&[checked])).await
    }

    /// A page subtree moved; `pages` are the pages whose ancestry changed.
    pub async fn on_page_moved(&self, pages: &[Uuid]) -> NavResult<Vec<String>> {
        self.recache_each(self.menus_indexing_pages(pages)).await
    }

    fn menus_indexing_pages(&self, pages: &[Uuid]) -> BTreeSet<String> {
        let pages: HashSet<Uuid> = pages.iter().copied().collect();
        self.items_of_type(LeafKind::Page)
            .into_iter()
            .filter(|(_, ids)| !ids.is_disjoint(&pages))
            .map(|(name, _)| name)
            .collect()
    }

    async fn recache_each(&self, names: BTreeSet<String>) -> NavResult<Vec<String>> {
        let mut recached = Vec::with_capacity(names.len());
        for name in names {
            self.recache(&name).await?;
            recached.push(name);
        }
        Ok(recached)
    }
}
