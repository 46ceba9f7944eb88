//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use redis::Client as RedisClient;
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::nav::{EventBroadcaster, NavRenderer, SiteNav};
use crate::store::PgNavigationStore;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Redis client for event fan-out.
    redis: RedisClient,

    /// Navigation cache.
    site_nav: Arc<SiteNav>,

    /// Navigation renderer.
    renderer: Arc<NavRenderer>,

    /// Publishes navigation events to every worker process.
    broadcaster: EventBroadcaster,
}

impl AppState {
    /// Create new application state with database connections.
    ///
    /// Builds the navigation cache from the database before returning.
    pub async fn new(config: &Config) -> Result<Self> {
        // Create PostgreSQL pool
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        // Run migrations
        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;

        // Create Redis client
        let redis = RedisClient::open(config.redis_url.as_str())
            .context("failed to create Redis client")?;

        // Test Redis connection
        let mut conn = redis
            .get_multiplexed_async_connection()
            .await
            .context("failed to connect to Redis")?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .context("Redis PING failed")?;

        let store = Arc::new(PgNavigationStore::new(db.clone()));
        let site_nav = Arc::new(
            SiteNav::init(store)
                .await
                .context("failed to build navigation cache")?,
        );
        info!(menus = site_nav.len(), "navigation cache ready");

        let renderer = Arc::new(
            NavRenderer::new(&config.templates_dir, config.nav_path_prefix.clone())
                .context("failed to load navigation templates")?,
        );

        let broadcaster = EventBroadcaster::new(redis.clone(), config.nav_event_channel.clone());

        Ok(Self::from_parts(db, redis, site_nav, renderer, broadcaster))
    }

    /// Assemble state from already constructed parts.
    pub fn from_parts(
        db: PgPool,
        redis: RedisClient,
        site_nav: Arc<SiteNav>,
        renderer: Arc<NavRenderer>,
        broadcaster: EventBroadcaster,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                db,
                redis,
                site_nav,
                renderer,
                broadcaster,
            }),
        }
    }

    /// Get the database pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Get the Redis client.
    pub fn redis(&self) -> &RedisClient {
        &self.inner.redis
    }

    /// Get the navigation cache.
    pub fn site_nav(&self) -> &Arc<SiteNav> {
        &self.inner.site_nav
    }

    /// Get the navigation renderer.
    pub fn renderer(&self) -> &Arc<NavRenderer> {
        &self.inner.renderer
    }

    /// Get the navigation event broadcaster.
    pub fn broadcaster(&self) -> &EventBroadcaster {
        &self.inner.broadcaster
    }

    /// Check if PostgreSQL is healthy.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }

    /// Check if Redis is healthy.
    pub async fn redis_healthy(&self) -> bool {
        let Ok(mut conn) = self.inner.redis.get_multiplexed_async_connection().await else {
            return false;
        };

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}
