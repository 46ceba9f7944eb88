//! Navigation rendering with Tera templates.
//!
//! The renderer walks a cached tree against the request path, marking each
//! node open or active, and produces nested HTML through per-menu template
//! suggestions.

use std::path::Path;

use anyhow::{Context, Result};
use dashmap::DashMap;
use serde::Serialize;
use tera::Tera;
use tracing::{debug, warn};

use super::node::{NavNode, NodeKind};
use super::site::{CachedMenu, SiteNav};
use crate::error::NavResult;
use crate::models::DEFAULT_MENU_TEMPLATE;

/// Fallback node template, always registered.
pub const DEFAULT_NODE_TEMPLATE: &str = "navigation/node.html";

const BUILTIN_TEMPLATES: [(&str, &str); 2] = [
    (
        DEFAULT_MENU_TEMPLATE,
        include_str!("../../templates/navigation/menu.html"),
    ),
    (
        DEFAULT_NODE_TEMPLATE,
        include_str!("../../templates/navigation/node.html"),
    ),
];

/// Per-request rendering options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Whether the viewer is signed in. Restricted pages render only for
    /// authenticated viewers.
    pub authenticated: bool,
}

/// A node as handed to templates: visible, annotated against the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub title: String,
    pub url: Option<String>,
    pub slug: Option<String>,
    pub html_class_name: String,
    pub first: bool,
    pub last: bool,
    /// On the path to the current request.
    pub open: bool,
    /// The node the current request resolves to.
    pub active: bool,
    pub children: Vec<RenderNode>,
}

/// Renders cached navigation trees to HTML.
pub struct NavRenderer {
    tera: Tera,
    path_prefix: Option<String>,
    /// Cache mapping suggestion lists to resolved template names.
    suggestion_cache: DashMap<String, String>,
}

impl NavRenderer {
    /// Load templates from `template_dir` and register the built-in defaults
    /// for any the directory does not provide.
    ///
    /// A missing directory is not an error; only the defaults are used.
    pub fn new(template_dir: &Path, path_prefix: Option<String>) -> Result<Self> {
        let tera = if template_dir.is_dir() {
            let pattern = template_dir.join("**/*.html");
            let pattern_str = pattern
                .to_str()
                .context("invalid template directory path")?;
            Tera::new(pattern_str).context("failed to initialize Tera templates")?
        } else {
            debug!(dir = %template_dir.display(), "template directory missing, using defaults");
            Tera::default()
        };
        Self::with_tera(tera, path_prefix)
    }

    /// Wrap an existing Tera instance.
    pub fn with_tera(mut tera: Tera, path_prefix: Option<String>) -> Result<Self> {
        for (name, source) in BUILTIN_TEMPLATES {
            if tera.get_template(name).is_err() {
                tera.add_raw_template(name, source)
                    .with_context(|| format!("failed to register {name}"))?;
            }
        }

        let template_names: Vec<_> = tera.get_template_names().collect();
        debug!(count = template_names.len(), "loaded navigation templates");

        let path_prefix = path_prefix
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty());
        Ok(Self {
            tera,
            path_prefix,
            suggestion_cache: DashMap::new(),
        })
    }

    /// Renderer with only the built-in templates.
    pub fn empty() -> Result<Self> {
        Self::with_tera(Tera::default(), None)
    }

    pub fn path_prefix(&self) -> Option<&str> {
        self.path_prefix.as_deref()
    }

    /// Render a cached menu for a request path.
    pub fn render(
        &self,
        nav: &SiteNav,
        menu: &str,
        request_path: &str,
        options: RenderOptions,
    ) -> NavResult<String> {
        let cached = nav.lookup(menu)?;
        self.render_menu(menu, &cached, request_path, options)
    }

    /// Render an already looked-up menu.
    pub fn render_menu(
        &self,
        menu: &str,
        cached: &CachedMenu,
        request_path: &str,
        options: RenderOptions,
    ) -> NavResult<String> {
        let machine_name = machine_name(menu);
        let nodes = self.annotate(cached, request_path, options);
        let items = self.render_nodes(&machine_name, &nodes)?;

        let template = match cached.container.template.as_deref() {
            Some(name) if self.tera.get_template(name).is_ok() => name,
            Some(name) => {
                warn!(menu = %menu, template = %name, "menu template not found, using default");
                DEFAULT_MENU_TEMPLATE
            }
            None => DEFAULT_MENU_TEMPLATE,
        };

        let mut context = tera::Context::new();
        context.insert("menu", &cached.container);
        context.insert("machine_name", &machine_name);
        context.insert("items", &items);
        Ok(self.tera.render(template, &context)?)
    }

    /// The visible part of a cached tree, marked open and active against
    /// `request_path`.
    pub fn annotate(
        &self,
        cached: &CachedMenu,
        request_path: &str,
        options: RenderOptions,
    ) -> Vec<RenderNode> {
        let segments = self.segments(request_path);
        let request = segments.join("/");
        annotate_level(&cached.tree, Some(segments.as_slice()), &request, options)
    }

    /// Split a request path into slug segments, dropping the configured
    /// prefix segment when it leads the path.
    fn segments<'p>(&self, request_path: &'p str) -> Vec<&'p str> {
        let mut segments: Vec<&str> = request_path.split('/').filter(|s| !s.is_empty()).collect();
        if let Some(prefix) = &self.path_prefix
            && segments.first() == Some(&prefix.as_str())
        {
            segments.remove(0);
        }
        segments
    }

    fn render_nodes(&self, menu: &str, nodes: &[RenderNode]) -> NavResult<String> {
        let mut html = String::new();
        for node in nodes {
            let children = self.render_nodes(menu, &node.children)?;
            let template = self
                .resolve_template(&node_suggestions(menu, node.kind))
                .unwrap_or_else(|| DEFAULT_NODE_TEMPLATE.to_string());

            let mut context = tera::Context::new();
            context.insert("node", node);
            context.insert("children", &children);
            context.insert("menu", menu);
            html.push_str(&self.tera.render(&template, &context)?);
        }
        Ok(html)
    }

    /// Resolve the best template from a list of suggestions.
    ///
    /// Templates are tried in order; the first one that exists is returned.
    pub fn resolve_template(&self, suggestions: &[String]) -> Option<String> {
        let cache_key = suggestions.join("|");
        if let Some(cached) = self.suggestion_cache.get(&cache_key) {
            return Some(cached.clone());
        }

        for suggestion in suggestions {
            let template_name = format!("{suggestion}.html");
            if self.tera.get_template(&template_name).is_ok() {
                self.suggestion_cache.insert(cache_key, template_name.clone());
                return Some(template_name);
            }
        }
        None
    }
}

/// Template suggestions for a node, most specific first.
pub fn node_suggestions(menu: &str, kind: NodeKind) -> Vec<String> {
    vec![
        format!("navigation/node--{menu}--{kind}"),
        format!("navigation/node--{menu}"),
        format!("navigation/node--{kind}"),
        "navigation/node".to_string(),
    ]
}

/// Template-safe form of a menu name: lowercase, runs of other characters
/// collapsed to `-`.
pub fn machine_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Annotate one sibling list.
///
/// `remaining` is the unconsumed request path, or `None` below a node that
/// is off the request path (nothing there can be open).
fn annotate_level(
    nodes: &[NavNode],
    remaining: Option<&[&str]>,
    request: &str,
    options: RenderOptions,
) -> Vec<RenderNode> {
    let mut out: Vec<RenderNode> = nodes
        .iter()
        .filter_map(|node| annotate_node(node, remaining, request, options))
        .collect();

    let len = out.len();
    for (i, node) in out.iter_mut().enumerate() {
        node.first = i == 0;
        node.last = i + 1 == len;
    }
    out
}

fn annotate_node(
    node: &NavNode,
    remaining: Option<&[&str]>,
    request: &str,
    options: RenderOptions,
) -> Option<RenderNode> {
    match node {
        NavNode::Menu(menu) => {
            let (open, active, below) = match menu.kind {
                NodeKind::Link => {
                    let hit = menu
                        .url
                        .as_deref()
                        .is_some_and(|url| url.trim_matches('/') == request);
                    (hit, hit, None)
                }
                _ => (true, false, remaining),
            };
            Some(RenderNode {
                kind: menu.kind,
                title: menu.title.clone(),
                url: menu.url.clone(),
                slug: None,
                html_class_name: menu.html_class_name.clone(),
                first: false,
                last: false,
                open,
                active,
                children: annotate_level(&menu.children, below, request, options),
            })
        }
        NavNode::Page(page) => {
            if !page.is_published() || (!page.is_public() && !options.authenticated) {
                return None;
            }
            let below = remaining.and_then(|segments| match segments.split_first() {
                Some((head, rest)) if *head == page.slug => Some(rest),
                _ => None,
            });
            let open = below.is_some();
            let active = below.is_some_and(|rest| rest.is_empty());
            let children = if page.show_children {
                annotate_level(&page.children, below, request, options)
            } else {
                Vec::new()
            };
            Some(RenderNode {
                kind: NodeKind::Page,
                title: page.title.clone(),
                url: Some(page.url.clone()),
                slug: Some(page.slug.clone()),
                html_class_name: page.html_class_name.clone(),
                first: false,
                last: false,
                open,
                active,
                children,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::{Menu, MenuFolder, MenuLink, Page, PageLayout, PageStatus, Visibility};
    use crate::nav::node::{MenuNav, PageNav};

    fn page_nav(slug: &str, path: &str, children: Vec<NavNode>) -> NavNode {
        let page = Page {
            id: Uuid::now_v7(),
            parent_id: None,
            slug: slug.to_string(),
            title: slug.to_string(),
            status: PageStatus::Published,
            visibility: Visibility::Public,
            materialized_path: path.to_string(),
            sort_order: 0,
            layout: PageLayout::default(),
        };
        let mut node = PageNav::new(&page, "", None);
        node.children = children;
        NavNode::Page(node)
    }

    fn cached(tree: Vec<NavNode>) -> CachedMenu {
        CachedMenu {
            container: MenuNav::for_menu(&Menu::new("Main", None)),
            tree,
        }
    }

    fn link(name: &str, url: &str) -> NavNode {
        NavNode::Menu(MenuNav::for_link(&MenuLink {
            id: Uuid::now_v7(),
            name: name.to_string(),
            url: url.to_string(),
            html_class_name: String::new(),
        }))
    }

    fn about_tree() -> CachedMenu {
        cached(vec![
            page_nav(
                "about",
                "about",
                vec![
                    page_nav("team", "about/team", vec![]),
                    page_nav("history", "about/history", vec![]),
                ],
            ),
            page_nav("blog", "blog", vec![]),
        ])
    }

    #[test]
    fn machine_names_are_template_safe() {
        assert_eq!(machine_name("Main"), "main");
        assert_eq!(machine_name("Footer Links!"), "footer-links");
        assert_eq!(machine_name("--a  b--"), "a-b");
    }

    #[test]
    fn suggestions_go_from_specific_to_generic() {
        let suggestions = node_suggestions("main", NodeKind::Page);
        assert_eq!(
            suggestions,
            vec![
                "navigation/node--main--page",
                "navigation/node--main",
                "navigation/node--page",
                "navigation/node",
            ]
        );
    }

    #[test]
    fn open_path_follows_slug_segments() {
        let renderer = NavRenderer::empty().unwrap();
        let nodes = renderer.annotate(&about_tree(), "/about/team/", RenderOptions::default());

        let about = &nodes[0];
        assert!(about.open);
        assert!(!about.active);
        assert!(about.children[0].open && about.children[0].active);
        assert!(!about.children[1].open);
        assert!(!nodes[1].open);
    }

    #[test]
    fn fully_consumed_path_marks_active() {
        let renderer = NavRenderer::empty().unwrap();
        let nodes = renderer.annotate(&about_tree(), "/about", RenderOptions::default());
        assert!(nodes[0].active);
        assert!(!nodes[0].children[0].open);
    }

    #[test]
    fn prefix_segment_is_stripped() {
        let renderer = NavRenderer::with_tera(Tera::default(), Some("/en/".to_string())).unwrap();
        assert_eq!(renderer.path_prefix(), Some("en"));

        let nodes = renderer.annotate(&about_tree(), "/en/blog/", RenderOptions::default());
        assert!(nodes[1].active);

        let unprefixed = renderer.annotate(&about_tree(), "/blog/", RenderOptions::default());
        assert!(unprefixed[1].active);
    }

    #[test]
    fn folders_are_open_and_pass_the_path_through() {
        let mut folder = MenuNav::for_folder(&MenuFolder {
            id: Uuid::now_v7(),
            name: "Company".to_string(),
            html_class_name: String::new(),
        });
        folder.push(page_nav("about", "about", vec![])).unwrap();

        let renderer = NavRenderer::empty().unwrap();
        let nodes = renderer.annotate(
            &cached(vec![NavNode::Menu(folder)]),
            "/about/",
            RenderOptions::default(),
        );
        assert!(nodes[0].open);
        assert!(!nodes[0].active);
        assert!(nodes[0].children[0].active);
    }

    #[test]
    fn links_are_active_on_their_url() {
        let renderer = NavRenderer::empty().unwrap();
        let tree = cached(vec![link("Careers", "/careers/"), link("Home", "/")]);

        let nodes = renderer.annotate(&tree, "/careers", RenderOptions::default());
        assert!(nodes[0].active);
        assert!(!nodes[1].active);
    }

    #[test]
    fn hidden_and_restricted_pages_are_filtered() {
        let mut tree = about_tree();
        if let NavNode::Page(about) = &mut tree.tree[0] {
            if let NavNode::Page(team) = &mut about.children[0] {
                team.visibility = Visibility::Restricted;
            }
            if let NavNode::Page(history) = &mut about.children[1] {
                history.status = PageStatus::Draft;
            }
        }

        let renderer = NavRenderer::empty().unwrap();
        let anonymous = renderer.annotate(&tree, "/", RenderOptions::default());
        assert!(anonymous[0].children.is_empty());

        let signed_in = renderer.annotate(&tree, "/", RenderOptions { authenticated: true });
        assert_eq!(signed_in[0].children.len(), 1);
        assert_eq!(signed_in[0].children[0].title, "team");
        assert!(signed_in[0].children[0].first && signed_in[0].children[0].last);
    }

    #[test]
    fn show_children_false_hides_descendants() {
        let mut tree = about_tree();
        if let NavNode::Page(about) = &mut tree.tree[0] {
            about.show_children = false;
        }
        let renderer = NavRenderer::empty().unwrap();
        let nodes = renderer.annotate(&tree, "/about/team/", RenderOptions::default());
        assert!(nodes[0].children.is_empty());
    }

    #[test]
    fn renders_nested_html_with_defaults() {
        let renderer = NavRenderer::empty().unwrap();
        let html = renderer
            .render_menu("Main", &about_tree(), "/about/team/", RenderOptions::default())
            .unwrap();

        assert!(html.starts_with("<ul class=\"menu menu--main\">"));
        assert!(html.contains("nav-item--page first open"));
        assert!(html.contains(">team</a>"));
        assert!(html.contains("aria-current=\"page\""));
        assert_eq!(html.matches("<li").count(), 4);
    }

    #[test]
    fn menu_specific_node_template_wins() {
        let mut tera = Tera::default();
        tera.add_raw_template("navigation/node--main--page.html", "[{{ node.title }}]{{ children | safe }}")
            .unwrap();
        let renderer = NavRenderer::with_tera(tera, None).unwrap();

        let html = renderer
            .render_menu("Main", &about_tree(), "/", RenderOptions::default())
            .unwrap();
        assert!(html.contains("[about][team][history]"));
        assert!(html.contains("[blog]"));
    }

    #[test]
    fn unknown_menu_template_falls_back_to_default() {
        let renderer = NavRenderer::empty().unwrap();
        let mut tree = about_tree();
        tree.container.template = Some("navigation/missing.html".to_string());

        let html = renderer
            .render_menu("Main", &tree, "/", RenderOptions::default())
            .unwrap();
        assert!(html.starts_with("<ul class=\"menu menu--main\">"));
    }

    #[test]
    fn missing_template_dir_uses_defaults() {
        let renderer = NavRenderer::new(Path::new("/nonexistent/templates"), None).unwrap();
        assert!(
            renderer
                .resolve_template(&["navigation/node".to_string()])
                .is_some()
        );
    }
}
