//! Navigation routes.
//!
//! Rendered menus for page templates, the cached tree as JSON, and the
//! admin rebuild action.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{Html, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::nav::{CachedMenu, NavEvent, RenderOptions};
use crate::state::AppState;

/// Header set by the fronting auth layer for signed-in viewers.
pub const AUTHENTICATED_USER_HEADER: &str = "x-authenticated-user";

/// Create the navigation router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/nav/{name}", get(render_menu))
        .route("/api/nav", get(list_menus))
        .route("/api/nav/{name}", get(get_menu))
        .route("/admin/nav/rebuild", post(rebuild_all))
        .route("/admin/nav/{name}/rebuild", post(rebuild_menu))
}

#[derive(Debug, Deserialize)]
struct RenderQuery {
    /// Request path to match against; defaults to the site root.
    #[serde(default = "root_path")]
    path: String,
}

fn root_path() -> String {
    "/".to_string()
}

#[derive(Debug, Serialize)]
struct RebuildResponse {
    rebuilt: Vec<String>,
    /// Whether the rebuild was announced to the other workers.
    broadcast: bool,
}

fn render_options(headers: &HeaderMap) -> RenderOptions {
    RenderOptions {
        authenticated: headers
            .get(AUTHENTICATED_USER_HEADER)
            .is_some_and(|v| !v.is_empty()),
    }
}

/// Render a menu as an HTML fragment.
async fn render_menu(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<RenderQuery>,
    headers: HeaderMap,
) -> AppResult<Html<String>> {
    let html = state.renderer().render(
        state.site_nav(),
        &name,
        &query.path,
        render_options(&headers),
    )?;
    Ok(Html(html))
}

/// Names of the cached menus.
async fn list_menus(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.site_nav().names())
}

/// The cached tree of one menu.
async fn get_menu(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<CachedMenu>> {
    let cached = state.site_nav().lookup(&name)?;
    Ok(Json(cached.as_ref().clone()))
}

/// Rebuild one menu here and on every other worker.
async fn rebuild_menu(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<RebuildResponse>> {
    state.site_nav().recache(&name).await?;
    info!(menu = %name, "navigation rebuilt on request");

    let broadcast = announce(&state, vec![name.clone()]).await;
    Ok(Json(RebuildResponse {
        rebuilt: vec![name],
        broadcast,
    }))
}

/// Rebuild every cached menu here and on every other worker.
async fn rebuild_all(State(state): State<AppState>) -> AppResult<Json<RebuildResponse>> {
    state.site_nav().recache_all().await?;
    let rebuilt = state.site_nav().names();
    info!(menus = rebuilt.len(), "navigation rebuilt on request");

    let broadcast = announce(&state, rebuilt.clone()).await;
    Ok(Json(RebuildResponse { rebuilt, broadcast }))
}

/// Publish a recache for each menu. A failed publish leaves the local
/// rebuild in place and is only logged.
async fn announce(state: &AppState, names: Vec<String>) -> bool {
    for name in names {
        if let Err(e) = state.broadcaster().publish(&NavEvent::Recache { name }).await {
            warn!(error = %e, "failed to broadcast navigation rebuild");
            return false;
        }
    }
    true
}
