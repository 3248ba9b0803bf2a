use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Notify;
use uuid::Uuid;

/// Errors that can occur when admitting a connection
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Connection limit of {0} reached")]
    AtCapacity(usize),
}

struct ConnectionEntry {
    last_activity: Instant,
    shutdown: Arc<Notify>,
}

/// Handle held by a session for the lifetime of its connection
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: Uuid,
    shutdown: Arc<Notify>,
}

impl ConnectionHandle {
    /// Resolves when the registry asks this session to close
    pub async fn closed(&self) {
        self.shutdown.notified().await
    }
}

/// Bounded set of live chat connections
///
/// Idle detection is pure logic over timestamps; `sweep` removes idle
/// connections and wakes their sessions so they can close.
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<Uuid, ConnectionEntry>>,
    max_connections: usize,
    idle_timeout: Duration,
}

impl ConnectionRegistry {
    pub fn new(max_connections: usize, idle_timeout: Duration) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            max_connections,
            idle_timeout,
        }
    }

    /// Admit a new connection
    pub fn register(&self, now: Instant) -> Result<ConnectionHandle, RegistryError> {
        let mut connections = self.connections.lock();
        if connections.len() >= self.max_connections {
            return Err(RegistryError::AtCapacity(self.max_connections));
        }

        let id = Uuid::new_v4();
        let shutdown = Arc::new(Notify::new());
        connections.insert(
            id,
            ConnectionEntry {
                last_activity: now,
                shutdown: shutdown.clone(),
            },
        );

        Ok(ConnectionHandle { id, shutdown })
    }

    /// Record activity on a connection
    pub fn touch(&self, id: &Uuid, now: Instant) {
        if let Some(entry) = self.connections.lock().get_mut(id) {
            entry.last_activity = now;
        }
    }

    /// Forget a connection; returns whether it was registered
    pub fn release(&self, id: &Uuid) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Connections idle for at least the timeout as of `now`
    pub fn idle_connections(&self, now: Instant) -> Vec<Uuid> {
        self.connections
            .lock()
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.last_activity) >= self.idle_timeout)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Remove idle connections and signal their sessions to close
    pub fn sweep(&self, now: Instant) -> Vec<Uuid> {
        let idle = self.idle_connections(now);
        if idle.is_empty() {
            return idle;
        }

        let mut connections = self.connections.lock();
        for id in &idle {
            if let Some(entry) = connections.remove(id) {
                // notify_one stores a permit, so a session not yet waiting still sees it
                entry.shutdown.notify_one();
            }
        }
        drop(connections);

        tracing::info!("Closed {} idle connections", idle.len());
        idle
    }

    pub fn active(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_limit() {
        let registry = ConnectionRegistry::new(2, Duration::from_secs(60));
        let now = Instant::now();

        let a = registry.register(now).unwrap();
        registry.register(now).unwrap();
        assert_eq!(registry.register(now).unwrap_err(), RegistryError::AtCapacity(2));

        assert!(registry.release(&a.id));
        assert!(!registry.release(&a.id));
        assert!(registry.register(now).is_ok());
    }

    #[test]
    fn test_idle_detection() {
        let registry = ConnectionRegistry::new(10, Duration::from_secs(1800));
        let start = Instant::now();

        let quiet = registry.register(start).unwrap();
        let busy = registry.register(start).unwrap();
        registry.touch(&busy.id, start + Duration::from_secs(1000));

        let later = start + Duration::from_secs(1800);
        assert_eq!(registry.idle_connections(later), vec![quiet.id]);
        assert!(registry.idle_connections(start + Duration::from_secs(1799)).is_empty());
    }

    #[tokio::test]
    async fn test_sweep_signals_session() {
        let registry = ConnectionRegistry::new(10, Duration::from_secs(5));
        let start = Instant::now();
        let handle = registry.register(start).unwrap();

        let swept = registry.sweep(start + Duration::from_secs(5));
        assert_eq!(swept, vec![handle.id]);
        assert_eq!(registry.active(), 0);

        tokio::time::timeout(Duration::from_secs(1), handle.closed())
            .await
            .expect("session should be signalled");
    }
}
