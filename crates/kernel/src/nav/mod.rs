//! Navigation cache: cached menu trees, their growth, invalidation, and
//! rendering.

pub mod broadcast;
pub mod events;
pub mod grow;
pub mod node;
pub mod render;
pub mod site;

pub use broadcast::{DEFAULT_EVENT_CHANNEL, EventBroadcaster};
pub use events::NavEvent;
pub use grow::TreeBuilder;
pub use node::{IdIndex, MenuNav, NavNode, NodeKind, PageNav, TreeNode};
pub use render::{NavRenderer, RenderNode, RenderOptions};
pub use site::{CachedMenu, SiteNav};
