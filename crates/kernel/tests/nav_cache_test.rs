#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Navigation cache tests.
//!
//! Growth, lookup, and rebuild behaviour of the cached menu forest.

use navigation_kernel::NavError;
use navigation_kernel::models::{LeafKind, Placement};
use navigation_kernel::nav::{NavNode, NodeKind, TreeNode};
use navigation_test_utils::{TestSite, test_page};

#[tokio::test]
async fn test_main_about_careers_scenario() {
    let site = TestSite::new();
    let main = site.menu("Main");
    let (_, about) = site.folder("About", Placement::top(main.id).with_order(1));
    site.link(
        "Careers",
        "/careers/",
        Placement::under(main.id, about.id).with_order(1),
    );

    let nav = site.nav().await;
    nav.recache("Main").await.unwrap();
    let cached = nav.lookup("Main").unwrap();

    assert_eq!(cached.tree.len(), 1);
    let about = &cached.tree[0];
    assert_eq!(about.kind(), NodeKind::Folder);
    assert_eq!(about.title(), "About");
    assert!(!about.is_leaf());

    assert_eq!(about.children().len(), 1);
    let careers = &about.children()[0];
    assert_eq!(careers.kind(), NodeKind::Link);
    assert_eq!(careers.url(), Some("/careers/"));
    assert!(careers.is_leaf());
}

#[tokio::test]
async fn test_top_level_count_and_boundaries() {
    let site = TestSite::new();
    let main = site.menu("Main");
    // Inserted out of order; ties in `order` keep insertion order.
    site.link("Contact", "/contact/", Placement::top(main.id).with_order(5));
    site.link("Home", "/", Placement::top(main.id).with_order(1));
    site.link("Blog", "/blog/", Placement::top(main.id).with_order(3));
    site.link("News", "/news/", Placement::top(main.id).with_order(3));

    let nav = site.nav().await;
    nav.recache("Main").await.unwrap();
    let cached = nav.lookup("Main").unwrap();

    let titles: Vec<&str> = cached.tree.iter().map(NavNode::title).collect();
    assert_eq!(titles, vec!["Home", "Blog", "News", "Contact"]);

    let first: Vec<bool> = cached.tree.iter().map(NavNode::is_first).collect();
    let last: Vec<bool> = cached.tree.iter().map(NavNode::is_last).collect();
    assert_eq!(first, vec![true, false, false, false]);
    assert_eq!(last, vec![false, false, false, true]);
}

#[tokio::test]
async fn test_default_order_sorts_after_explicit_orders() {
    let site = TestSite::new();
    let main = site.menu("Main");
    site.link("Unordered", "/u/", Placement::top(main.id));
    site.link("Ordered", "/o/", Placement::top(main.id).with_order(10));

    let nav = site.nav().await;
    let cached = nav.lookup("Main").unwrap();
    assert_eq!(cached.tree[0].title(), "Ordered");
    assert_eq!(cached.tree[1].title(), "Unordered");
}

#[tokio::test]
async fn test_page_depth_stops_at_limit() {
    let site = TestSite::new();
    let about = site.page(test_page("about"));
    let team = site.page(test_page("team").under(&about));
    let leads = site.page(test_page("leads").under(&team));
    let board = site.page(test_page("board").under(&leads));
    let main = site.menu("Main");
    site.page_ref(&about, 2, Placement::top(main.id));

    let nav = site.nav().await;
    let cached = nav.lookup("Main").unwrap();
    let root = &cached.tree[0];

    let leads_node = root.child("team").unwrap().child("leads").unwrap();
    assert!(leads_node.is_leaf());

    let pages = nav
        .items_of_type(LeafKind::Page)
        .into_iter()
        .find(|(name, _)| name == "Main")
        .map(|(_, ids)| ids)
        .unwrap();
    assert!(pages.contains(&about.id));
    assert!(pages.contains(&team.id));
    assert!(pages.contains(&leads.id));
    assert!(!pages.contains(&board.id));
}

#[tokio::test]
async fn test_page_children_follow_sort_order() {
    let site = TestSite::new();
    let about = site.page(test_page("about"));
    site.page(test_page("zeta").under(&about).order(1));
    site.page(test_page("alpha").under(&about).order(2));
    site.page(test_page("beta").under(&about).order(2));
    let main = site.menu("Main");
    site.page_ref(&about, 1, Placement::top(main.id));

    let nav = site.nav().await;
    let cached = nav.lookup("Main").unwrap();
    assert_eq!(cached.tree[0].keys(), vec!["zeta", "alpha", "beta"]);
}

#[tokio::test]
async fn test_page_nodes_carry_nav_title_and_url() {
    let site = TestSite::new();
    let about = site.page(test_page("about").nav_name("Who we are"));
    let main = site.menu("Main");
    site.page_ref(&about, 0, Placement::top(main.id));

    let nav = site.nav().await;
    let cached = nav.lookup("Main").unwrap();
    let NavNode::Page(node) = &cached.tree[0] else {
        panic!("expected a page node");
    };
    assert_eq!(node.title, "Who we are");
    assert_eq!(node.url, "/about/");
    assert_eq!(node.slug, "about");
    assert_eq!(node.pk, about.id);
}

#[tokio::test]
async fn test_recache_all_is_idempotent() {
    let site = TestSite::new();
    let about = site.page(test_page("about"));
    site.page(test_page("team").under(&about));
    let main = site.menu("Main");
    site.page_ref(&about, 3, Placement::top(main.id));
    let footer = site.menu("Footer");
    site.link("Privacy", "/privacy/", Placement::top(footer.id));

    let nav = site.nav().await;
    nav.recache_all().await.unwrap();
    let once: Vec<_> = nav.names().iter().map(|n| nav.lookup(n).unwrap()).collect();
    nav.recache_all().await.unwrap();
    let twice: Vec<_> = nav.names().iter().map(|n| nav.lookup(n).unwrap()).collect();

    assert_eq!(once.len(), 2);
    for (a, b) in once.iter().zip(&twice) {
        assert_eq!(**a, **b);
    }
}

#[tokio::test]
async fn test_cached_trees_serialize_for_the_api() {
    let site = TestSite::new();
    let main = site.menu("Main");
    let (_, about) = site.folder("About", Placement::top(main.id));
    site.link("Careers", "/careers/", Placement::under(main.id, about.id));

    let nav = site.nav().await;
    let json = serde_json::to_value(nav.lookup("Main").unwrap().as_ref()).unwrap();

    assert_eq!(json["container"]["title"], "Main");
    assert_eq!(json["tree"][0]["type"], "folder");
    assert_eq!(json["tree"][0]["children"][0]["type"], "link");
    assert_eq!(json["tree"][0]["children"][0]["url"], "/careers/");
}

#[tokio::test]
async fn test_lookup_unknown_menu() {
    let site = TestSite::new();
    let nav = site.nav().await;
    assert!(matches!(nav.lookup("Main"), Err(NavError::MenuNotFound(_))));
}

#[tokio::test]
async fn test_shutdown_ends_lifecycle() {
    let site = TestSite::new();
    site.menu("Main");
    let nav = site.nav().await;
    assert_eq!(nav.len(), 1);

    nav.shutdown();
    assert!(nav.is_empty());
    assert!(matches!(nav.lookup("Main"), Err(NavError::ShutDown)));
    assert!(matches!(nav.recache_all().await, Err(NavError::ShutDown)));
}
