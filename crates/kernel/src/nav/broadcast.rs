//! Event fan-out across worker processes.
//!
//! Every process holds its own [`SiteNav`], so an event raised in one
//! process is published to a Redis channel and applied by a subscriber task
//! in every process, including the publisher.

use std::sync::Arc;

use anyhow::{Context, Result};
use redis::AsyncCommands;
use redis::Client as RedisClient;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use super::events::NavEvent;
use super::site::SiteNav;

/// Default pub/sub channel for navigation events.
pub const DEFAULT_EVENT_CHANNEL: &str = "navigation:events";

/// Publishes and consumes [`NavEvent`]s over Redis pub/sub.
#[derive(Clone)]
pub struct EventBroadcaster {
    redis: RedisClient,
    channel: String,
}

impl EventBroadcaster {
    pub fn new(redis: RedisClient, channel: impl Into<String>) -> Self {
        Self {
            redis,
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Publish an event to every subscribed process.
    pub async fn publish(&self, event: &NavEvent) -> Result<()> {
        let payload = serde_json::to_string(event).context("failed to encode navigation event")?;
        let mut conn = self
            .redis
            .get_multiplexed_async_connection()
            .await
            .context("failed to get Redis connection")?;
        conn.publish::<_, _, ()>(&self.channel, payload)
            .await
            .context("failed to publish navigation event")?;

        debug!(channel = %self.channel, event = event.label(), "navigation event published");
        Ok(())
    }

    /// Subscribe to the channel and apply each event to `nav`.
    ///
    /// The subscription is established before this returns; the spawned
    /// task runs until the connection closes.
    pub async fn subscribe(&self, nav: Arc<SiteNav>) -> Result<JoinHandle<()>> {
        let mut pubsub = self
            .redis
            .get_async_pubsub()
            .await
            .context("failed to open Redis pub/sub connection")?;
        pubsub
            .subscribe(&self.channel)
            .await
            .with_context(|| format!("failed to subscribe to {}", self.channel))?;
        info!(channel = %self.channel, "subscribed to navigation events");

        let channel = self.channel.clone();
        let handle = tokio::spawn(async move {
            let mut messages = std::pin::pin!(pubsub.on_message());
            while let Some(msg) = messages.next().await {
                match msg.get_payload::<String>() {
                    Ok(payload) => dispatch(&nav, &payload).await,
                    Err(e) => warn!(error = %e, "unreadable navigation event payload"),
                }
            }
            warn!(channel = %channel, "navigation event subscription closed");
        });
        Ok(handle)
    }
}

/// Decode one payload and apply it.
///
/// Malformed payloads are skipped. A failed rebuild is logged and not
/// retried; the next event touching the same menu rebuilds it again.
pub async fn dispatch(nav: &SiteNav, payload: &str) {
    let event: NavEvent = match serde_json::from_str(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, payload = %payload, "skipping malformed navigation event");
            return;
        }
    };

    if let Err(e) = nav.handle(&event).await {
        error!(error = %e, event = event.label(), "navigation rebuild failed");
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("channel", &self.channel)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{CreateMenuLink, Placement};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn dispatch_applies_decoded_events() {
        let store = Arc::new(MemoryStore::new());
        let main = store.create_menu("Main", None);
        let nav = SiteNav::init(store.clone()).await.unwrap();
        store
            .create_link(
                CreateMenuLink {
                    name: "Home".to_string(),
                    url: "/".to_string(),
                    html_class_name: None,
                },
                Placement::top(main.id),
            )
            .unwrap();

        dispatch(&nav, r#"{"event":"recache","name":"Main"}"#).await;
        assert_eq!(nav.lookup("Main").unwrap().tree.len(), 1);
    }

    #[tokio::test]
    async fn dispatch_skips_malformed_payloads() {
        let store = Arc::new(MemoryStore::new());
        store.create_menu("Main", None);
        let nav = SiteNav::init(store).await.unwrap();

        dispatch(&nav, "not json").await;
        dispatch(&nav, r#"{"event":"unknown"}"#).await;
        assert!(nav.contains("Main"));
    }

    #[tokio::test]
    async fn dispatch_survives_failed_rebuilds() {
        let store = Arc::new(MemoryStore::new());
        let nav = SiteNav::init(store).await.unwrap();

        dispatch(&nav, r#"{"event":"recache","name":"Missing"}"#).await;
        assert!(nav.is_empty());
    }

    #[test]
    fn broadcaster_keeps_its_channel() {
        let client = RedisClient::open("redis://127.0.0.1:6379").unwrap();
        let broadcaster = EventBroadcaster::new(client, DEFAULT_EVENT_CHANNEL);
        assert_eq!(broadcaster.channel(), "navigation:events");
    }
}
