//! Cached navigation nodes.
//!
//! A cached tree is made of two node shapes: [`MenuNav`] mirrors a menu,
//! folder, or link; [`PageNav`] mirrors a host page spliced in by a menu
//! page reference. Nodes hold primary keys only, never model rows, so a
//! tree stays valid after the rows it was grown from change.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NavError, NavResult};
use crate::models::{Leaf, LeafKind, Menu, MenuFolder, MenuLink, Page, PageStatus, Visibility};

/// Kind of a cached node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Menu,
    Folder,
    Link,
    Page,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Menu => "menu",
            NodeKind::Folder => "folder",
            NodeKind::Link => "link",
            NodeKind::Page => "page",
        }
    }
}

impl From<LeafKind> for NodeKind {
    fn from(kind: LeafKind) -> Self {
        match kind {
            LeafKind::Folder => NodeKind::Folder,
            LeafKind::Link => NodeKind::Link,
            LeafKind::Page => NodeKind::Page,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary keys reachable in a tree, grouped by node kind.
pub type IdIndex = HashMap<NodeKind, HashSet<Uuid>>;

/// Ordered-children access shared by every node shape.
pub trait TreeNode {
    /// Stable identity used to look this node up among its siblings.
    fn key(&self) -> String;

    /// Children in render order.
    fn children(&self) -> &[NavNode];

    /// Find a direct child by key.
    fn child(&self, key: &str) -> Option<&NavNode> {
        self.children().iter().find(|c| c.key() == key)
    }

    /// Keys of the children, in order.
    fn keys(&self) -> Vec<String> {
        self.children().iter().map(TreeNode::key).collect()
    }

    /// A node is a leaf iff it has no children.
    fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }
}

/// A cached menu, folder, or link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuNav {
    pub pk: Uuid,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub title: String,
    /// Target URL, links only.
    pub url: Option<String>,
    /// Render template, menus only.
    pub template: Option<String>,
    pub html_class_name: String,
    pub first: bool,
    pub last: bool,
    pub children: Vec<NavNode>,
}

impl MenuNav {
    fn blank(pk: Uuid, kind: NodeKind, title: &str) -> Self {
        Self {
            pk,
            kind,
            title: title.to_string(),
            url: None,
            template: None,
            html_class_name: String::new(),
            first: false,
            last: false,
            children: Vec::new(),
        }
    }

    /// Container node for a whole menu.
    pub fn for_menu(menu: &Menu) -> Self {
        let mut node = Self::blank(menu.id, NodeKind::Menu, &menu.name);
        node.template = Some(menu.template.clone());
        node
    }

    /// Folder node; children are added with [`MenuNav::push`].
    pub fn for_folder(folder: &MenuFolder) -> Self {
        let mut node = Self::blank(folder.id, NodeKind::Folder, &folder.name);
        node.html_class_name = folder.html_class_name.clone();
        node
    }

    /// Terminal link node.
    pub fn for_link(link: &MenuLink) -> Self {
        let mut node = Self::blank(link.id, NodeKind::Link, &link.name);
        node.url = Some(link.url.clone());
        node.html_class_name = link.html_class_name.clone();
        node
    }

    /// Build the node for a folder or link leaf.
    ///
    /// Page references are not menu nodes: they splice in a page tree and
    /// must go through page growth instead.
    pub fn for_leaf(leaf: &Leaf) -> NavResult<Self> {
        match leaf {
            Leaf::Folder(folder) => Ok(Self::for_folder(folder)),
            Leaf::Link(link) => Ok(Self::for_link(link)),
            Leaf::Page(page) => Err(NavError::TypeIntegrity(format!(
                "menu page {} cannot be built as a menu node",
                page.id
            ))),
        }
    }

    /// Append a child. Links are terminal and never take children.
    pub fn push(&mut self, child: NavNode) -> NavResult<()> {
        if self.kind == NodeKind::Link {
            return Err(NavError::TypeIntegrity(format!(
                "link {} cannot contain children",
                self.pk
            )));
        }
        self.children.push(child);
        Ok(())
    }
}

impl TreeNode for MenuNav {
    fn key(&self) -> String {
        self.pk.to_string()
    }

    fn children(&self) -> &[NavNode] {
        &self.children
    }
}

/// A cached host page, storing only what navigation rendering needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNav {
    pub pk: Uuid,
    pub slug: String,
    pub title: String,
    pub status: PageStatus,
    pub visibility: Visibility,
    pub show_in_nav: bool,
    pub show_children: bool,
    pub url: String,
    pub html_class_name: String,
    /// Remaining levels of descendants to include; `None` is unbounded.
    pub limit_depth_to: Option<u32>,
    pub first: bool,
    pub last: bool,
    pub children: Vec<NavNode>,
}

impl PageNav {
    /// Snapshot a page with the class and depth budget inherited from its menu reference.
    pub fn new(page: &Page, html_class_name: &str, limit_depth_to: Option<u32>) -> Self {
        Self {
            pk: page.id,
            slug: page.slug.clone(),
            title: page.nav_title().to_string(),
            status: page.status,
            visibility: page.visibility,
            show_in_nav: page.layout.show_in_nav,
            show_children: page.layout.show_children,
            url: page.url(),
            html_class_name: html_class_name.to_string(),
            limit_depth_to,
            first: false,
            last: false,
            children: Vec::new(),
        }
    }

    /// Publicly visible. Signed-in users still see restricted pages.
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Published and shown in navigation. Nobody sees unpublished pages.
    pub fn is_published(&self) -> bool {
        self.status == PageStatus::Published && self.show_in_nav
    }
}

impl TreeNode for PageNav {
    fn key(&self) -> String {
        self.slug.clone()
    }

    fn children(&self) -> &[NavNode] {
        &self.children
    }
}

/// Any node of a cached tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum NavNode {
    Menu(MenuNav),
    Page(PageNav),
}

impl NavNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            NavNode::Menu(m) => m.kind,
            NavNode::Page(_) => NodeKind::Page,
        }
    }

    pub fn pk(&self) -> Uuid {
        match self {
            NavNode::Menu(m) => m.pk,
            NavNode::Page(p) => p.pk,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            NavNode::Menu(m) => &m.title,
            NavNode::Page(p) => &p.title,
        }
    }

    /// Page slug; menu nodes have none.
    pub fn slug(&self) -> Option<&str> {
        match self {
            NavNode::Menu(_) => None,
            NavNode::Page(p) => Some(&p.slug),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            NavNode::Menu(m) => m.url.as_deref(),
            NavNode::Page(p) => Some(&p.url),
        }
    }

    pub fn html_class_name(&self) -> &str {
        match self {
            NavNode::Menu(m) => &m.html_class_name,
            NavNode::Page(p) => &p.html_class_name,
        }
    }

    pub fn is_first(&self) -> bool {
        match self {
            NavNode::Menu(m) => m.first,
            NavNode::Page(p) => p.first,
        }
    }

    pub fn is_last(&self) -> bool {
        match self {
            NavNode::Menu(m) => m.last,
            NavNode::Page(p) => p.last,
        }
    }

    pub(crate) fn set_first(&mut self, first: bool) {
        match self {
            NavNode::Menu(m) => m.first = first,
            NavNode::Page(p) => p.first = first,
        }
    }

    pub(crate) fn set_last(&mut self, last: bool) {
        match self {
            NavNode::Menu(m) => m.last = last,
            NavNode::Page(p) => p.last = last,
        }
    }

    /// Depth-first walk adding `(kind, pk)` of this node and every descendant.
    pub fn collect_ids(&self, acc: &mut IdIndex) {
        acc.entry(self.kind()).or_default().insert(self.pk());
        for child in self.children() {
            child.collect_ids(acc);
        }
    }
}

impl TreeNode for NavNode {
    fn key(&self) -> String {
        match self {
            NavNode::Menu(m) => m.key(),
            NavNode::Page(p) => p.key(),
        }
    }

    fn children(&self) -> &[NavNode] {
        match self {
            NavNode::Menu(m) => m.children(),
            NavNode::Page(p) => p.children(),
        }
    }
}

/// Flag the first and last nodes of a sibling list.
pub fn mark_boundaries(nodes: &mut [NavNode]) {
    if let Some(first) = nodes.first_mut() {
        first.set_first(true);
    }
    if let Some(last) = nodes.last_mut() {
        last.set_last(true);
    }
}
