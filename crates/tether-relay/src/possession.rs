//! Possession broker: exclusive two-party control sessions.
//!
//! A ghost takes control of a host. Each friend code is in at most one
//! session, either as ghost or as host, and a session is registered under
//! both codes or neither.
//!
//! ## Control updates
//!
//! Camera and movement frames from the ghost go onto a bounded broadcast
//! channel and a single pump task per session forwards them to the host in
//! submission order. When the host falls behind, the oldest frames are
//! dropped; only the latest control state matters.
//!
//! ## Lifecycle
//!
//! ```text
//!        begin (granted)           host acks
//!   Free ───────────────▶ pending ───────────▶ Ghost / Host
//!    ▲                       │                     │
//!    └── refusal | timeout ◀─┘                     │
//!    └────────── end | disconnect | desync ◀───────┘
//! ```
//!
//! A pending session reserves both codes so no other begin can claim them,
//! but both still report [`PossessionState::Free`] and control updates are
//! refused until the host has acknowledged.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;

use tether_core::{ActionResult, ActionResultEc, FriendCode};
use tether_perms::{PermissionSet, PrimaryPermissions};

use crate::config::RelayConfig;
use crate::gate::Authorizer;
use crate::messages::{ForwardedCall, PossessionUpdate};
use crate::relay::forward;

/// A friend code's role in possession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PossessionState {
    Free,
    Ghost,
    Host,
}

/// Snapshot of an active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub ghost: FriendCode,
    pub host: FriendCode,
    pub started_at: Instant,
}

#[derive(Debug)]
struct PossessionSession {
    id: u64,
    ghost: FriendCode,
    host: FriendCode,
    started_at: Instant,
    updates: broadcast::Sender<PossessionUpdate>,
    /// Set once the host acknowledged the begin call.
    active: AtomicBool,
}

impl PossessionSession {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            ghost: self.ghost.clone(),
            host: self.host.clone(),
            started_at: self.started_at,
        }
    }

    fn counterpart(&self, code: &FriendCode) -> &FriendCode {
        if &self.ghost == code {
            &self.host
        } else {
            &self.ghost
        }
    }
}

type SessionMap = HashMap<FriendCode, Arc<PossessionSession>>;

struct BrokerInner {
    sessions: RwLock<SessionMap>,
    authorizer: Authorizer,
    forward_timeout: Duration,
    queue_capacity: usize,
    next_id: AtomicU64,
}

/// Brokers possession sessions between online friends.
#[derive(Clone)]
pub struct PossessionBroker {
    inner: Arc<BrokerInner>,
}

impl PossessionBroker {
    pub fn new(authorizer: Authorizer, config: &RelayConfig) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                sessions: RwLock::new(HashMap::new()),
                authorizer,
                forward_timeout: config.forward_timeout,
                queue_capacity: config.possession_queue_capacity.max(1),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Start a session in which `ghost` controls `host`.
    ///
    /// Both codes are reserved for the handshake, but the session only
    /// becomes visible once the host acknowledges the begin call.
    pub async fn begin(&self, ghost: &FriendCode, host: &FriendCode) -> ActionResult {
        let inner = &self.inner;

        let busy = ghost == host || {
            let sessions = inner.read();
            sessions.contains_key(ghost) || sessions.contains_key(host)
        };
        if busy {
            return ActionResult::code(ActionResultEc::AlreadyBeingPossessedOrPossessing);
        }

        let required = PermissionSet::primary(PrimaryPermissions::POSSESSION);
        let connection = match inner.authorizer.authorize(ghost, host, &required).await {
            Ok(connection) => connection,
            Err(reason) => return ActionResult::code(reason.into()),
        };

        let (id, updates) = {
            let mut sessions = inner.write();
            if sessions.contains_key(ghost) || sessions.contains_key(host) {
                return ActionResult::code(ActionResultEc::AlreadyBeingPossessedOrPossessing);
            }

            let (tx, rx) = broadcast::channel(inner.queue_capacity);
            let session = Arc::new(PossessionSession {
                id: inner.next_id.fetch_add(1, Ordering::Relaxed),
                ghost: ghost.clone(),
                host: host.clone(),
                started_at: Instant::now(),
                updates: tx,
                active: AtomicBool::new(false),
            });
            sessions.insert(ghost.clone(), Arc::clone(&session));
            sessions.insert(host.clone(), Arc::clone(&session));
            (session.id, rx)
        };

        let call = ForwardedCall::PossessionBegin {
            ghost: ghost.clone(),
        };
        let result = forward(&connection, call, inner.forward_timeout).await;

        if !result.is_success() {
            inner.remove(host, Some(id));
            tracing::debug!(%ghost, %host, code = ?result.code, "host refused possession");
            if result.code == ActionResultEc::TargetTimeout {
                // The host may have started anyway.
                inner.notify_end(host.clone(), ghost.clone());
            }
            return result;
        }

        if !inner.activate(id, ghost) {
            // Ended by a disconnect while the host was answering.
            return ActionResult::code(ActionResultEc::PossessionDesynchronization);
        }

        tokio::spawn(pump(
            Arc::downgrade(&self.inner),
            id,
            ghost.clone(),
            host.clone(),
            updates,
        ));
        tracing::info!(%ghost, %host, "possession started");
        result
    }

    /// Queue a control update from `sender`.
    ///
    /// Only the ghost of an active session may send updates. Anyone else is
    /// out of sync: they get `PossessionDesynchronization` and any session
    /// they belong to is ended. Updates sent while the host has not yet
    /// acknowledged are refused the same way, but leave the handshake alone.
    pub fn update(&self, sender: &FriendCode, update: PossessionUpdate) -> ActionResult {
        let session = self.inner.read().get(sender).cloned();

        match session {
            Some(session) if !session.is_active() => {
                tracing::debug!(%sender, "possession control update during handshake");
                return ActionResult::code(ActionResultEc::PossessionDesynchronization);
            }
            Some(session) if &session.ghost == sender => {
                if session.updates.send(update).is_ok() {
                    return ActionResult::success();
                }
                tracing::warn!(ghost = %sender, "possession pump is gone");
            }
            Some(_) => {
                tracing::warn!(host = %sender, "host sent a possession control update");
            }
            None => {
                tracing::warn!(%sender, "possession control update without a session");
                return ActionResult::code(ActionResultEc::PossessionDesynchronization);
            }
        }

        self.end(sender);
        ActionResult::code(ActionResultEc::PossessionDesynchronization)
    }

    /// End whatever session `code` is in and notify the other party.
    ///
    /// Returns `false` if there was no session.
    pub fn end(&self, code: &FriendCode) -> bool {
        self.inner.end(code, None)
    }

    pub fn state_of(&self, code: &FriendCode) -> PossessionState {
        match self.inner.read().get(code) {
            Some(session) if !session.is_active() => PossessionState::Free,
            None => PossessionState::Free,
            Some(session) if &session.ghost == code => PossessionState::Ghost,
            Some(_) => PossessionState::Host,
        }
    }

    pub fn session_of(&self, code: &FriendCode) -> Option<SessionInfo> {
        self.inner
            .read()
            .get(code)
            .filter(|s| s.is_active())
            .map(|s| s.info())
    }

    /// Whether `code` is in a session or in the middle of starting one.
    pub fn is_engaged(&self, code: &FriendCode) -> bool {
        self.inner.read().contains_key(code)
    }

    /// Every active session, once each.
    pub fn active_sessions(&self) -> Vec<SessionInfo> {
        self.inner
            .read()
            .iter()
            .filter(|(code, session)| *code == &session.ghost && session.is_active())
            .map(|(_, session)| session.info())
            .collect()
    }
}

impl std::fmt::Debug for PossessionBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PossessionBroker")
            .field("sessions", &(self.inner.read().len() / 2))
            .finish_non_exhaustive()
    }
}

impl BrokerInner {
    fn read(&self) -> RwLockReadGuard<'_, SessionMap> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionMap> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_active(&self, id: u64, code: &FriendCode) -> bool {
        self.read()
            .get(code)
            .is_some_and(|s| s.id == id && s.is_active())
    }

    /// Promote a pending session once its host acknowledged. Fails if the
    /// session was ended in the meantime.
    fn activate(&self, id: u64, code: &FriendCode) -> bool {
        let sessions = self.write();
        match sessions.get(code) {
            Some(session) if session.id == id => {
                session.active.store(true, Ordering::Release);
                true
            }
            _ => false,
        }
    }

    /// Remove the session `code` is in, both keys at once.
    ///
    /// With `id` set, only that session is removed.
    fn remove(&self, code: &FriendCode, id: Option<u64>) -> Option<Arc<PossessionSession>> {
        let mut sessions = self.write();
        let session = sessions.get(code)?;
        if id.is_some_and(|id| id != session.id) {
            return None;
        }
        let session = Arc::clone(session);
        sessions.remove(&session.ghost);
        sessions.remove(&session.host);
        Some(session)
    }

    fn end(&self, code: &FriendCode, id: Option<u64>) -> bool {
        let Some(session) = self.remove(code, id) else {
            if id.is_none() {
                tracing::warn!(%code, "no possession session to end");
            }
            return false;
        };

        tracing::info!(
            ghost = %session.ghost,
            host = %session.host,
            by = %code,
            "possession ended"
        );
        self.notify_end(session.counterpart(code).clone(), code.clone());
        true
    }

    /// End a session whose host stopped cooperating. Both sides are told, so
    /// neither client is left holding session state.
    fn fail(&self, id: u64, ghost: &FriendCode, host: &FriendCode, code: ActionResultEc) {
        if self.remove(host, Some(id)).is_none() {
            return;
        }
        tracing::warn!(%ghost, %host, ?code, "host dropped out of possession");
        self.notify_end(ghost.clone(), host.clone());
        self.notify_end(host.clone(), ghost.clone());
    }

    /// Tell `to` that the session with `by` is over. Best effort.
    ///
    /// Delivery runs on the current tokio runtime; without one it is skipped.
    fn notify_end(&self, to: FriendCode, by: FriendCode) {
        let Some(connection) = self.authorizer.presence().try_get(&to) else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(%to, %by, "no runtime to deliver possession end");
            return;
        };
        let timeout = self.forward_timeout;
        runtime.spawn(async move {
            let result = forward(&connection, ForwardedCall::PossessionEnd { by }, timeout).await;
            tracing::debug!(%to, code = ?result.code, "possession end delivered");
        });
    }
}

/// Forward one session's control frames to its host until the session ends.
async fn pump(
    broker: Weak<BrokerInner>,
    id: u64,
    ghost: FriendCode,
    host: FriendCode,
    mut updates: broadcast::Receiver<PossessionUpdate>,
) {
    loop {
        let update = match updates.recv().await {
            Ok(update) => update,
            Err(RecvError::Lagged(dropped)) => {
                tracing::warn!(%ghost, %host, dropped, "host is lagging, frames dropped");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let Some(broker) = broker.upgrade() else {
            break;
        };
        if !broker.is_active(id, &ghost) {
            break;
        }

        let Some(connection) = broker.authorizer.presence().try_get(&host) else {
            broker.fail(id, &ghost, &host, ActionResultEc::TargetOffline);
            break;
        };

        let call = update.into_call(ghost.clone());
        let result = forward(&connection, call, broker.forward_timeout).await;
        match result.code {
            ActionResultEc::Success => {}
            ActionResultEc::TargetTimeout => {
                tracing::debug!(%ghost, %host, "possession frame timed out");
            }
            // Desync, refusal, or a dead connection: the host is no longer ours.
            code => {
                broker.fail(id, &ghost, &host, code);
                break;
            }
        }
    }
}
