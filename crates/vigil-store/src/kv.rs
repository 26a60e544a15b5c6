use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};
use vigil_core::VigilResult;

/// Key-value half of the coordination store.
///
/// Values expire after their TTL; `get` on an expired key behaves as if
/// the key were never written. Writes are last-writer-wins — callers
/// serialize writes to the same key themselves.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> VigilResult<()>;
    async fn get(&self, key: &str) -> VigilResult<Option<String>>;
    /// Refresh the retention window of an existing key.
    async fn expire(&self, key: &str, ttl: Duration) -> VigilResult<()>;
}

/// Pub/sub half of the coordination store.
///
/// Fan-out, at-most-once in practice: a published message reaches the
/// subscribers that are listening at that moment, and correctness must
/// never depend on a message being received.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, channel: &str, payload: String) -> VigilResult<()>;
    async fn subscribe(&self, channel: &str) -> VigilResult<Subscription>;
}

/// A bounded-poll handle onto one channel.
pub struct Subscription {
    rx: broadcast::Receiver<String>,
}

impl Subscription {
    /// Wait up to `timeout` for the next message. Returns `None` on
    /// timeout; lagged messages are skipped rather than surfaced as
    /// errors (loss is tolerated by the protocol).
    pub async fn recv(&mut self, timeout: Duration) -> Option<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Ok(msg)) => return Some(msg),
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
                Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => return None,
            }
        }
    }
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-memory [`KvStore`] + [`MessageBus`], the default backend.
///
/// TTLs are enforced lazily on read. Channels are created on first
/// publish or subscribe; a publish with no subscribers is dropped,
/// matching the protocol's delivery assumptions.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
    channel_capacity: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            channels: Mutex::new(HashMap::new()),
            channel_capacity: 256,
        }
    }

    async fn sender(&self, channel: &str) -> broadcast::Sender<String> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.channel_capacity).0)
            .clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> VigilResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> VigilResult<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> VigilResult<()> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Instant::now() + ttl;
        }
        Ok(())
    }
}

#[async_trait]
impl MessageBus for MemoryStore {
    async fn publish(&self, channel: &str, payload: String) -> VigilResult<()> {
        let sender = self.sender(channel).await;
        // No receivers means the message is dropped; that is fine here.
        let _ = sender.send(payload);
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> VigilResult<Subscription> {
        let sender = self.sender(channel).await;
        Ok(Subscription {
            rx: sender.subscribe(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_round_trip() {
        let store = MemoryStore::new();
        store
            .set("task:1", "{}".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("task:1").await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn get_unknown_key_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_key_reads_as_absent() {
        let store = MemoryStore::new();
        store
            .set("ephemeral", "x".to_string(), Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.get("ephemeral").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expire_refreshes_ttl() {
        let store = MemoryStore::new();
        store
            .set("k", "v".to_string(), Duration::from_millis(20))
            .await
            .unwrap();
        store.expire("k", Duration::from_secs(60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("security:tasks").await.unwrap();
        store
            .publish("security:tasks", "hello".to_string())
            .await
            .unwrap();
        let msg = sub.recv(Duration::from_millis(200)).await;
        assert_eq!(msg.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped() {
        let store = MemoryStore::new();
        store
            .publish("nobody:listening", "lost".to_string())
            .await
            .unwrap();
        // Subscribing afterwards must not replay the message.
        let mut sub = store.subscribe("nobody:listening").await.unwrap();
        assert!(sub.recv(Duration::from_millis(50)).await.is_none());
    }

    #[tokio::test]
    async fn recv_times_out() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("quiet").await.unwrap();
        let start = std::time::Instant::now();
        assert!(sub.recv(Duration::from_millis(50)).await.is_none());
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[tokio::test]
    async fn fan_out_to_multiple_subscribers() {
        let store = MemoryStore::new();
        let mut a = store.subscribe("shared").await.unwrap();
        let mut b = store.subscribe("shared").await.unwrap();
        store.publish("shared", "msg".to_string()).await.unwrap();
        assert_eq!(a.recv(Duration::from_millis(200)).await.as_deref(), Some("msg"));
        assert_eq!(b.recv(Duration::from_millis(200)).await.as_deref(), Some("msg"));
    }
}
