//! Host CMS pages, as consumed by the navigation tree.
//!
//! Pages live in the host's own tables; this module only reads them. A
//! page's layout decides whether it shows in navigation at all and whether
//! its children are listed beneath it.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Publication status of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Draft,
    Published,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Draft => "draft",
            PageStatus::Published => "published",
        }
    }
}

impl FromStr for PageStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(PageStatus::Draft),
            "published" => Ok(PageStatus::Published),
            other => anyhow::bail!("unknown page status: {other}"),
        }
    }
}

impl TryFrom<String> for PageStatus {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may see a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Restricted,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Restricted => "restricted",
        }
    }
}

impl FromStr for Visibility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "public" => Ok(Visibility::Public),
            "restricted" => Ok(Visibility::Restricted),
            other => anyhow::bail!("unknown page visibility: {other}"),
        }
    }
}

impl TryFrom<String> for Visibility {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Navigation-relevant layout settings of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PageLayout {
    pub show_in_nav: bool,
    pub show_children: bool,
    pub nav_name_override: Option<String>,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            show_in_nav: true,
            show_children: true,
            nav_name_override: None,
        }
    }
}

/// A host CMS page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Page {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub slug: String,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub status: PageStatus,
    #[sqlx(try_from = "String")]
    pub visibility: Visibility,
    /// Slash-joined slugs of the page and its ancestors, e.g. `about/team`.
    pub materialized_path: String,
    pub sort_order: i32,
    #[sqlx(flatten)]
    pub layout: PageLayout,
}

const PAGE_SELECT: &str = r#"
    SELECT p.id, p.parent_id, p.slug, p.title, p.status, p.visibility,
           p.materialized_path, p.sort_order,
           COALESCE(l.show_in_nav, TRUE) AS show_in_nav,
           COALESCE(l.show_children, TRUE) AS show_children,
           l.nav_name_override
    FROM page p
    LEFT JOIN page_layout l ON l.page_id = p.id
"#;

impl Page {
    /// Canonical URL, derived from the materialized path without route resolution.
    pub fn url(&self) -> String {
        let path = self.materialized_path.trim_matches('/');
        if path.is_empty() {
            "/".to_string()
        } else {
            format!("/{path}/")
        }
    }

    /// Title to show in navigation: the layout override when set.
    pub fn nav_title(&self) -> &str {
        match self.layout.nav_name_override.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.title,
        }
    }

    /// Find a page by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let page = sqlx::query_as::<_, Page>(&format!("{PAGE_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch page")?;

        Ok(page)
    }

    /// Direct children of a page, in tree order.
    pub async fn children(pool: &PgPool, id: Uuid) -> Result<Vec<Self>> {
        let pages = sqlx::query_as::<_, Page>(&format!(
            "{PAGE_SELECT} WHERE p.parent_id = $1 ORDER BY p.sort_order ASC, p.slug ASC"
        ))
        .bind(id)
        .fetch_all(pool)
        .await
        .context("failed to fetch page children")?;

        Ok(pages)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn page(path: &str) -> Page {
        Page {
            id: Uuid::now_v7(),
            parent_id: None,
            slug: path.rsplit('/').next().unwrap_or_default().to_string(),
            title: "About us".to_string(),
            status: PageStatus::Published,
            visibility: Visibility::Public,
            materialized_path: path.to_string(),
            sort_order: 0,
            layout: PageLayout::default(),
        }
    }

    #[test]
    fn url_wraps_materialized_path() {
        assert_eq!(page("about/team").url(), "/about/team/");
        assert_eq!(page("").url(), "/");
    }

    #[test]
    fn nav_title_prefers_non_empty_override() {
        let mut p = page("about");
        assert_eq!(p.nav_title(), "About us");
        p.layout.nav_name_override = Some(String::new());
        assert_eq!(p.nav_title(), "About us");
        p.layout.nav_name_override = Some("About".to_string());
        assert_eq!(p.nav_title(), "About");
    }

    #[test]
    fn status_and_visibility_parse() {
        assert_eq!("published".parse::<PageStatus>().unwrap(), PageStatus::Published);
        assert_eq!("restricted".parse::<Visibility>().unwrap(), Visibility::Restricted);
        assert!("archived".parse::<PageStatus>().is_err());
    }
}
