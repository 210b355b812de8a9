use super::driver::ChannelHandle;
use crate::session::store::{StoreError, CHANNEL_MOUNT};
use crate::session::SessionStore;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

struct Mounted {
    handle: ChannelHandle,
    last_seen: Instant,
}

/// Live channels keyed by mount id. A session holds at most one mount id.
///
/// The messages page polls its channel every few seconds; a channel that
/// stops being polled (tab closed without the unmount beacon, session
/// cleared elsewhere) is reaped by [`ChannelRegistry::reap_idle`].
pub struct ChannelRegistry {
    channels: DashMap<Uuid, Mounted>,
    origin: String,
}

impl ChannelRegistry {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            channels: DashMap::new(),
            origin: origin.into(),
        }
    }

    pub fn mount(&self) -> ChannelHandle {
        let handle = ChannelHandle::mount(&self.origin);
        self.channels.insert(
            handle.id(),
            Mounted {
                handle: handle.clone(),
                last_seen: Instant::now(),
            },
        );
        metrics::gauge!("seller_realtime_channels").set(self.channels.len() as f64);
        handle
    }

    pub fn get(&self, id: &Uuid) -> Option<ChannelHandle> {
        self.channels.get(id).map(|entry| entry.handle.clone())
    }

    /// Record that the owning page is still polling.
    pub fn touch(&self, id: &Uuid) {
        if let Some(mut entry) = self.channels.get_mut(id) {
            entry.last_seen = Instant::now();
        }
    }

    pub fn unmount(&self, id: &Uuid) {
        if let Some((_, mounted)) = self.channels.remove(id) {
            mounted.handle.unmount();
            tracing::debug!(mount_id = %id, "Realtime channel unmounted");
        }
        metrics::gauge!("seller_realtime_channels").set(self.channels.len() as f64);
    }

    /// Unmount every channel not touched within `max_idle`. Returns how many
    /// were reaped.
    pub fn reap_idle(&self, max_idle: Duration) -> usize {
        self.reap_idle_at(Instant::now(), max_idle)
    }

    fn reap_idle_at(&self, now: Instant, max_idle: Duration) -> usize {
        let idle: Vec<Uuid> = self
            .channels
            .iter()
            .filter(|entry| now.saturating_duration_since(entry.last_seen) > max_idle)
            .map(|entry| *entry.key())
            .collect();

        for id in &idle {
            tracing::info!(mount_id = %id, "Reaping idle realtime channel");
            self.unmount(id);
        }
        idle.len()
    }

    /// Periodically reap channels idle for longer than `max_idle`.
    pub fn spawn_reaper(self: Arc<Self>, every: Duration, max_idle: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let reaped = self.reap_idle(max_idle);
                if reaped > 0 {
                    tracing::debug!(reaped, remaining = self.len(), "Idle channel sweep");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Mount a fresh channel for the session, tearing down the one it
    /// already had.
    pub async fn mount_for<S: SessionStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<ChannelHandle, StoreError> {
        self.unmount_for(store).await?;
        let handle = self.mount();
        store.insert(CHANNEL_MOUNT, handle.id().to_string()).await?;
        Ok(handle)
    }

    /// The session's live channel, if it has one.
    pub async fn current_for<S: SessionStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<Option<ChannelHandle>, StoreError> {
        Ok(mount_id(store).await?.and_then(|id| self.get(&id)))
    }

    pub async fn unmount_for<S: SessionStore + ?Sized>(&self, store: &S) -> Result<(), StoreError> {
        if let Some(id) = mount_id(store).await? {
            self.unmount(&id);
        }
        store.remove(CHANNEL_MOUNT).await
    }
}

async fn mount_id<S: SessionStore + ?Sized>(store: &S) -> Result<Option<Uuid>, StoreError> {
    Ok(store
        .get(CHANNEL_MOUNT)
        .await?
        .and_then(|raw| Uuid::parse_str(&raw).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryStore, SessionManager};

    // Nothing listens on port 9, so channels settle as disconnected.
    const ORIGIN: &str = "http://127.0.0.1:9";

    #[tokio::test]
    async fn remount_replaces_the_previous_channel() {
        let registry = ChannelRegistry::new(ORIGIN);
        let store = MemoryStore::new();

        let first = registry.mount_for(&store).await.unwrap();
        let second = registry.mount_for(&store).await.unwrap();

        assert!(first.is_unmounted());
        assert!(!second.is_unmounted());
        assert_eq!(registry.len(), 1);
        assert_eq!(
            store.get(CHANNEL_MOUNT).await.unwrap(),
            Some(second.id().to_string())
        );
    }

    #[tokio::test]
    async fn unmount_for_clears_the_session_key() {
        let registry = ChannelRegistry::new(ORIGIN);
        let store = MemoryStore::new();

        let handle = registry.mount_for(&store).await.unwrap();
        registry.unmount_for(&store).await.unwrap();

        assert!(handle.is_unmounted());
        assert!(registry.is_empty());
        assert_eq!(store.get(CHANNEL_MOUNT).await.unwrap(), None);
        assert!(registry.current_for(&store).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn channel_orphaned_by_logout_is_reaped_once_idle() {
        let registry = ChannelRegistry::new(ORIGIN);
        let store = MemoryStore::new();

        let handle = registry.mount_for(&store).await.unwrap();
        SessionManager::new(store.clone()).logout().await.unwrap();
        assert!(registry.current_for(&store).await.unwrap().is_none());

        let later = Instant::now() + Duration::from_secs(120);
        assert_eq!(registry.reap_idle_at(later, Duration::from_secs(60)), 1);
        assert!(registry.is_empty());
        assert!(handle.is_unmounted());
    }

    #[tokio::test]
    async fn polled_channels_survive_the_sweep() {
        let registry = ChannelRegistry::new(ORIGIN);
        let store = MemoryStore::new();

        let handle = registry.mount_for(&store).await.unwrap();
        registry.touch(&handle.id());

        assert_eq!(registry.reap_idle(Duration::from_secs(60)), 0);
        assert_eq!(registry.len(), 1);
        assert!(!handle.is_unmounted());
    }

    #[tokio::test(start_paused = true)]
    async fn reaper_task_unmounts_idle_channels() {
        let registry = Arc::new(ChannelRegistry::new(ORIGIN));
        let handle = registry.mount();

        let reaper = registry
            .clone()
            .spawn_reaper(Duration::from_secs(10), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(45)).await;

        assert!(registry.is_empty());
        assert!(handle.is_unmounted());
        reaper.abort();
    }

    #[tokio::test]
    async fn unmount_without_a_channel_is_harmless() {
        let registry = ChannelRegistry::new(ORIGIN);
        let store = MemoryStore::new();
        registry.unmount_for(&store).await.unwrap();
        assert!(registry.is_empty());
    }
}
