//! Tree growth: turning persisted menus into cached navigation trees.
//!
//! Folders recurse into their child items, links are terminal, and page
//! references hand over to page growth, which walks the host page tree
//! for as many levels as the reference allows.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use super::node::{MenuNav, NavNode, PageNav, mark_boundaries};
use crate::error::{NavError, NavResult};
use crate::models::{Leaf, Menu, MenuItem, Page};
use crate::store::NavigationStore;

type GrowFuture<'a, T> = Pin<Box<dyn Future<Output = NavResult<T>> + Send + 'a>>;

/// Grows cached trees by reading through a [`NavigationStore`].
pub struct TreeBuilder<'a> {
    store: &'a dyn NavigationStore,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(store: &'a dyn NavigationStore) -> Self {
        Self { store }
    }

    /// Grow the top-level node list of a menu.
    ///
    /// The first and last top-level nodes are flagged so renderers can
    /// style boundary items.
    pub async fn grow_menu(&self, menu: &Menu) -> NavResult<Vec<NavNode>> {
        let items = self.store.top_level_items(menu.id).await?;
        let mut nodes = Vec::with_capacity(items.len());
        for item in &items {
            nodes.push(self.grow_item(item).await?);
        }
        mark_boundaries(&mut nodes);

        debug!(menu = %menu.name, top_level = nodes.len(), "grew menu tree");
        Ok(nodes)
    }

    /// Grow the subtree rooted at one menu item.
    pub fn grow_item<'b>(&'b self, item: &'b MenuItem) -> GrowFuture<'b, NavNode> {
        Box::pin(async move {
            let leaf = self
                .store
                .leaf(item.leaf_kind, item.leaf_id)
                .await?
                .ok_or(NavError::DanglingReference {
                    kind: item.leaf_kind,
                    id: item.leaf_id,
                })?;
            if leaf.kind() != item.leaf_kind {
                return Err(NavError::TypeIntegrity(format!(
                    "menu item {} expects a {} but resolved a {}",
                    item.id,
                    item.leaf_kind,
                    leaf.kind()
                )));
            }

            match leaf {
                Leaf::Folder(ref folder) => {
                    let mut node = MenuNav::for_folder(folder);
                    let children = self.store.child_items(item.id).await?;
                    for child in &children {
                        node.push(self.grow_item(child).await?)?;
                    }
                    Ok(NavNode::Menu(node))
                }
                Leaf::Link(ref link) => Ok(NavNode::Menu(MenuNav::for_link(link))),
                Leaf::Page(menu_page) => {
                    let page = self
                        .store
                        .page(menu_page.page_id)
                        .await?
                        .ok_or(NavError::MissingPage(menu_page.page_id))?;
                    let depth = u32::try_from(menu_page.depth).map_err(|_| {
                        NavError::TypeIntegrity(format!(
                            "menu page {} has negative depth {}",
                            menu_page.id, menu_page.depth
                        ))
                    })?;
                    let node = self
                        .grow_page(page, menu_page.html_class_name, Some(depth))
                        .await?;
                    Ok(NavNode::Page(node))
                }
            }
        })
    }

    /// Grow a page and its descendants.
    ///
    /// Growth stops at pages without children and when the remaining depth
    /// budget reaches zero. Each level down receives one less level of
    /// budget; an unbounded budget stays unbounded. Only the root page
    /// carries the menu reference's class.
    pub fn grow_page(
        &self,
        page: Page,
        html_class_name: String,
        limit_depth_to: Option<u32>,
    ) -> GrowFuture<'_, PageNav> {
        Box::pin(async move {
            let mut root = PageNav::new(&page, &html_class_name, limit_depth_to);
            if root.limit_depth_to == Some(0) {
                return Ok(root);
            }

            let children = self.store.page_children(page.id).await?;
            let next = limit_depth_to.map(|d| d.saturating_sub(1));
            for child in children {
                let node = self.grow_page(child, String::new(), next).await?;
                root.children.push(NavNode::Page(node));
            }
            Ok(root)
        })
    }
}
