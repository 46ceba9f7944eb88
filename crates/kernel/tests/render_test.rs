#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Navigation rendering tests.
//!
//! Renders cached menus from an in-memory site and checks the open and
//! active path, visibility rules, and template resolution.

use navigation_kernel::NavError;
use navigation_kernel::models::Placement;
use navigation_kernel::nav::{NavRenderer, RenderOptions};
use navigation_test_utils::{TestSite, assert, test_page};

fn anonymous() -> RenderOptions {
    RenderOptions::default()
}

fn signed_in() -> RenderOptions {
    RenderOptions {
        authenticated: true,
    }
}

async fn company_site() -> TestSite {
    let site = TestSite::new();
    let about = site.page(test_page("about"));
    site.page(test_page("team").under(&about).order(1));
    site.page(test_page("history").under(&about).order(2));
    site.page(test_page("internal").under(&about).order(3).restricted());
    site.page(test_page("wip").under(&about).order(4).draft());
    site.page(test_page("legal").under(&about).order(5).hidden());

    let main = site.menu("Main");
    site.link("Home", "/", Placement::top(main.id).with_order(1));
    site.page_ref(&about, 1, Placement::top(main.id).with_order(2));
    site
}

#[tokio::test]
async fn test_render_marks_open_path() {
    let site = company_site().await;
    let nav = site.nav().await;
    let renderer = NavRenderer::empty().unwrap();

    let nodes = renderer.annotate(&nav.lookup("Main").unwrap(), "/about/team/", anonymous());
    let about = &nodes[1];
    assert!(about.open);
    assert!(!about.active);
    let team = &about.children[0];
    assert!(team.open && team.active);
    assert!(!about.children[1].open);
}

#[tokio::test]
async fn test_render_hides_unpublished_and_restricted() {
    let site = company_site().await;
    let nav = site.nav().await;
    let renderer = NavRenderer::empty().unwrap();

    let html = renderer.render(&nav, "Main", "/", anonymous()).unwrap();
    assert::contains(&html, ">Team</a>");
    assert::contains(&html, ">History</a>");
    assert::not_contains(&html, "Internal");
    assert::not_contains(&html, "Wip");
    assert::not_contains(&html, "Legal");

    let html = renderer.render(&nav, "Main", "/", signed_in()).unwrap();
    assert::contains(&html, ">Internal</a>");
    assert::not_contains(&html, "Wip");
}

#[tokio::test]
async fn test_render_recomputes_boundaries_for_visible_siblings() {
    let site = company_site().await;
    let nav = site.nav().await;
    let renderer = NavRenderer::empty().unwrap();

    let nodes = renderer.annotate(&nav.lookup("Main").unwrap(), "/", anonymous());
    let children = &nodes[1].children;
    assert_eq!(children.len(), 2);
    assert!(children[0].first && !children[0].last);
    assert!(!children[1].first && children[1].last);
}

#[tokio::test]
async fn test_render_respects_show_children() {
    let site = TestSite::new();
    let blog = site.page(test_page("blog").without_children());
    site.page(test_page("first-post").under(&blog));
    let main = site.menu("Main");
    site.page_ref(&blog, 1, Placement::top(main.id));

    let nav = site.nav().await;
    let renderer = NavRenderer::empty().unwrap();
    let html = renderer.render(&nav, "Main", "/blog/", anonymous()).unwrap();
    assert::contains(&html, ">Blog</a>");
    assert::not_contains(&html, "First-post");
}

#[tokio::test]
async fn test_render_with_prefix() {
    let site = company_site().await;
    let nav = site.nav().await;
    let renderer = NavRenderer::with_tera(tera::Tera::default(), Some("en".to_string())).unwrap();

    let nodes = renderer.annotate(&nav.lookup("Main").unwrap(), "/en/about/history/", anonymous());
    assert!(nodes[1].open);
    assert!(nodes[1].children[1].active);
}

#[tokio::test]
async fn test_render_order_matches_tree() {
    let site = company_site().await;
    let nav = site.nav().await;
    let renderer = NavRenderer::empty().unwrap();

    let html = renderer.render(&nav, "Main", "/", anonymous()).unwrap();
    assert::appears_before(&html, ">Home</a>", ">About</a>");
    assert::appears_before(&html, ">Team</a>", ">History</a>");
}

#[tokio::test]
async fn test_render_unknown_menu_is_not_found() {
    let site = company_site().await;
    let nav = site.nav().await;
    let renderer = NavRenderer::empty().unwrap();

    let err = renderer.render(&nav, "Sidebar", "/", anonymous()).unwrap_err();
    assert!(matches!(err, NavError::MenuNotFound(_)));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_render_uses_menu_template_from_directory() {
    let dir = std::env::temp_dir().join(format!("nav-templates-{}", uuid::Uuid::now_v7()));
    std::fs::create_dir_all(dir.join("navigation")).unwrap();
    std::fs::write(
        dir.join("navigation/node--main--link.html"),
        "<li class=\"main-link\">{{ node.title }}</li>",
    )
    .unwrap();

    let site = company_site().await;
    let nav = site.nav().await;
    let renderer = NavRenderer::new(&dir, None).unwrap();
    let html = renderer.render(&nav, "Main", "/", anonymous()).unwrap();

    assert::contains(&html, "<li class=\"main-link\">Home</li>");
    assert::contains(&html, "nav-item--page");

    std::fs::remove_dir_all(&dir).unwrap();
}
