//! Database models for menus, menu items, leaves, and host pages.

pub mod leaf;
pub mod menu;
pub mod menu_item;
pub mod page;

pub use leaf::{CreateMenuFolder, CreateMenuLink, CreateMenuPage, Leaf, MenuFolder, MenuLink, MenuPage};
pub use menu::{CreateMenu, DEFAULT_MENU_TEMPLATE, Menu, UpdateMenu};
pub use menu_item::{DEFAULT_ORDER, LeafKind, MenuItem, Placement};
pub use page::{Page, PageLayout, PageStatus, Visibility};
