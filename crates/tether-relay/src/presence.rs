//! Presence registry: who is online and how to reach them.
//!
//! Exactly one entry per online friend code; absence means offline. The lock
//! is a plain `std::sync::RwLock` and no guard ever lives across an await.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::time::Instant;

use tether_core::{CooldownCategory, FriendCode};

use crate::config::RelayConfig;
use crate::transport::ConnectionHandle;

/// A single online client.
#[derive(Clone)]
pub struct Presence {
    pub code: FriendCode,
    pub connection: ConnectionHandle,
    pub connected_at: Instant,
    /// When the client last sent a cooldown-bearing action.
    pub last_action: Option<Instant>,
}

impl fmt::Debug for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presence")
            .field("code", &self.code)
            .field("connected_at", &self.connected_at)
            .field("last_action", &self.last_action)
            .finish_non_exhaustive()
    }
}

/// Registry of online clients.
pub struct PresenceRegistry {
    presences: RwLock<HashMap<FriendCode, Presence>>,
    config: RelayConfig,
}

impl PresenceRegistry {
    /// Create an empty registry.
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            presences: RwLock::new(HashMap::new()),
            config: config.clone(),
        }
    }

    // A poisoned map is still a consistent map: every critical section is a
    // single insert, remove or field store.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<FriendCode, Presence>> {
        self.presences.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<FriendCode, Presence>> {
        self.presences.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a connection. Returns `true` if it replaced an existing one.
    pub fn add(&self, code: FriendCode, connection: ConnectionHandle) -> bool {
        let presence = Presence {
            code: code.clone(),
            connection,
            connected_at: Instant::now(),
            last_action: None,
        };

        let replaced = self.write().insert(code.clone(), presence).is_some();
        if replaced {
            tracing::warn!(%code, "presence already registered, replacing with newer connection");
        }
        replaced
    }

    /// Unregister a client.
    pub fn remove(&self, code: &FriendCode) -> Option<Presence> {
        let removed = self.write().remove(code);
        if removed.is_none() {
            tracing::warn!(%code, "removing presence that was not registered");
        }
        removed
    }

    /// The client's connection, if online.
    pub fn try_get(&self, code: &FriendCode) -> Option<ConnectionHandle> {
        self.read().get(code).map(|p| p.connection.clone())
    }

    /// Snapshot of the client's presence, if online.
    pub fn presence(&self, code: &FriendCode) -> Option<Presence> {
        self.read().get(code).cloned()
    }

    pub fn is_online(&self, code: &FriendCode) -> bool {
        self.read().contains_key(code)
    }

    pub fn online_count(&self) -> usize {
        self.read().len()
    }

    pub fn online_codes(&self) -> Vec<FriendCode> {
        self.read().keys().cloned().collect()
    }

    /// Stamp the client's last action time with now.
    pub fn touch(&self, code: &FriendCode) {
        if let Some(presence) = self.write().get_mut(code) {
            presence.last_action = Some(Instant::now());
        }
    }

    /// Whether the client is still inside its cooldown for `category`.
    ///
    /// Unknown clients and clients that never acted are not exceeding.
    pub fn is_exceeding_cooldown(&self, code: &FriendCode, category: CooldownCategory) -> bool {
        let cooldown = self.config.cooldown(category);

        let last = self.read().get(code).and_then(|p| p.last_action);
        match last {
            Some(last) => last.elapsed() < cooldown,
            None => false,
        }
    }
}

impl fmt::Debug for PresenceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenceRegistry")
            .field("online", &self.online_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::pair;
    use std::sync::Arc;
    use std::time::Duration;

    fn code(s: &str) -> FriendCode {
        FriendCode::new(s).unwrap()
    }

    fn handle() -> ConnectionHandle {
        pair(1).0.into_handle()
    }

    #[test]
    fn test_add_remove() {
        let registry = PresenceRegistry::new(&RelayConfig::default());
        let alice = code("ALICE");

        assert!(!registry.is_online(&alice));
        assert!(!registry.add(alice.clone(), handle()));
        assert!(registry.is_online(&alice));
        assert_eq!(registry.online_count(), 1);
        assert_eq!(registry.online_codes(), vec![alice.clone()]);

        assert!(registry.remove(&alice).is_some());
        assert!(registry.try_get(&alice).is_none());
        assert!(registry.remove(&alice).is_none());
    }

    #[test]
    fn test_newer_connection_wins() {
        let registry = PresenceRegistry::new(&RelayConfig::default());
        let alice = code("ALICE");
        let first = handle();
        let second = handle();

        registry.add(alice.clone(), first.clone());
        assert!(registry.add(alice.clone(), second.clone()));
        assert_eq!(registry.online_count(), 1);

        let current = registry.try_get(&alice).unwrap();
        assert!(Arc::ptr_eq(&current, &second));
        assert!(!Arc::ptr_eq(&current, &first));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_by_category() {
        let registry = PresenceRegistry::new(&RelayConfig::default());
        let alice = code("ALICE");
        registry.add(alice.clone(), handle());

        // Never acted.
        assert!(!registry.is_exceeding_cooldown(&alice, CooldownCategory::InGame));

        registry.touch(&alice);
        assert!(registry.is_exceeding_cooldown(&alice, CooldownCategory::InGame));
        assert!(registry.is_exceeding_cooldown(&alice, CooldownCategory::OutOfGame));

        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(registry.is_exceeding_cooldown(&alice, CooldownCategory::InGame));
        assert!(!registry.is_exceeding_cooldown(&alice, CooldownCategory::OutOfGame));

        tokio::time::advance(Duration::from_millis(800)).await;
        assert!(!registry.is_exceeding_cooldown(&alice, CooldownCategory::InGame));
    }

    #[test]
    fn test_unknown_code_is_not_exceeding() {
        let registry = PresenceRegistry::new(&RelayConfig::default());
        registry.touch(&code("GHOST"));
        assert!(!registry.is_exceeding_cooldown(&code("GHOST"), CooldownCategory::InGame));
    }

    #[test]
    fn test_concurrent_connect_disconnect() {
        let registry = Arc::new(PresenceRegistry::new(&RelayConfig::default()));

        let threads: Vec<_> = (0..8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let c = code(&format!("U{t}-{i}"));
                        registry.add(c.clone(), handle());
                        if i % 2 == 0 {
                            registry.remove(&c);
                        }
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(registry.online_count(), 8 * 50);
    }
}
