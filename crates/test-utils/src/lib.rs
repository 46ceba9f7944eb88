//! Navigation test utilities.
//!
//! Helpers for integration testing: host page fixtures, an in-memory site
//! with menu builders, and assertion utilities for cached trees and
//! rendered HTML.

#![allow(clippy::expect_used)]

use std::sync::Arc;

use navigation_kernel::models::{
    CreateMenuFolder, CreateMenuLink, CreateMenuPage, Menu, MenuFolder, MenuItem, MenuLink,
    MenuPage, Page, PageLayout, PageStatus, Placement, Visibility,
};
use navigation_kernel::nav::SiteNav;
use navigation_kernel::store::MemoryStore;
use uuid::Uuid;

/// Create a published, public test page at the site root.
pub fn test_page(slug: &str) -> TestPage {
    TestPage {
        id: Uuid::now_v7(),
        parent: None,
        slug: slug.to_string(),
        title: title_case(slug),
        status: PageStatus::Published,
        visibility: Visibility::Public,
        sort_order: 0,
        layout: PageLayout::default(),
    }
}

fn title_case(slug: &str) -> String {
    let mut chars = slug.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A host page builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestPage {
    pub id: Uuid,
    parent: Option<(Uuid, String)>,
    pub slug: String,
    pub title: String,
    pub status: PageStatus,
    pub visibility: Visibility,
    pub sort_order: i32,
    pub layout: PageLayout,
}

impl TestPage {
    /// Place under a parent page.
    pub fn under(mut self, parent: &Page) -> Self {
        self.parent = Some((parent.id, parent.materialized_path.clone()));
        self
    }

    /// Set a title.
    pub fn titled(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Set as draft.
    pub fn draft(mut self) -> Self {
        self.status = PageStatus::Draft;
        self
    }

    /// Hide from navigation.
    pub fn hidden(mut self) -> Self {
        self.layout.show_in_nav = false;
        self
    }

    /// Restrict to signed-in viewers.
    pub fn restricted(mut self) -> Self {
        self.visibility = Visibility::Restricted;
        self
    }

    /// Do not render children in navigation.
    pub fn without_children(mut self) -> Self {
        self.layout.show_children = false;
        self
    }

    /// Set the sort order among siblings.
    pub fn order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Override the navigation label.
    pub fn nav_name(mut self, name: &str) -> Self {
        self.layout.nav_name_override = Some(name.to_string());
        self
    }

    /// Build the page model.
    pub fn build(self) -> Page {
        let (parent_id, materialized_path) = match self.parent {
            Some((id, path)) if !path.is_empty() => (Some(id), format!("{path}/{}", self.slug)),
            Some((id, _)) => (Some(id), self.slug.clone()),
            None => (None, self.slug.clone()),
        };
        Page {
            id: self.id,
            parent_id,
            slug: self.slug,
            title: self.title,
            status: self.status,
            visibility: self.visibility,
            materialized_path,
            sort_order: self.sort_order,
            layout: self.layout,
        }
    }
}

/// An in-memory site: host pages and menus backed by a [`MemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct TestSite {
    pub store: Arc<MemoryStore>,
}

impl TestSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the navigation cache over the current state.
    pub async fn nav(&self) -> SiteNav {
        SiteNav::init(self.store.clone())
            .await
            .expect("navigation cache should build")
    }

    /// Store a host page.
    pub fn page(&self, page: TestPage) -> Page {
        let page = page.build();
        self.store.put_page(page.clone());
        page
    }

    /// Create a menu with the default template.
    pub fn menu(&self, name: &str) -> Menu {
        self.store.create_menu(name, None)
    }

    /// Add a folder.
    pub fn folder(&self, name: &str, placement: Placement) -> (MenuFolder, MenuItem) {
        self.store
            .create_folder(
                CreateMenuFolder {
                    name: name.to_string(),
                    html_class_name: None,
                },
                placement,
            )
            .expect("folder should be created")
    }

    /// Add a link.
    pub fn link(&self, name: &str, url: &str, placement: Placement) -> (MenuLink, MenuItem) {
        self.store
            .create_link(
                CreateMenuLink {
                    name: name.to_string(),
                    url: url.to_string(),
                    html_class_name: None,
                },
                placement,
            )
            .expect("link should be created")
    }

    /// Add a reference to a host page, growing `depth` levels below it.
    pub fn page_ref(&self, page: &Page, depth: i32, placement: Placement) -> (MenuPage, MenuItem) {
        self.store
            .create_menu_page(
                CreateMenuPage {
                    page_id: page.id,
                    depth: Some(depth),
                    html_class_name: None,
                },
                placement,
            )
            .expect("page reference should be created")
    }
}

/// Assertion helpers for rendered navigation.
pub mod assert {
    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that `first` appears before `second`.
    pub fn appears_before(haystack: &str, first: &str, second: &str) {
        let a = haystack.find(first);
        let b = haystack.find(second);
        assert!(
            matches!((a, b), (Some(a), Some(b)) if a < b),
            "Expected '{first}' before '{second}'\nActual: {haystack}"
        );
    }
}
