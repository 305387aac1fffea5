//! The Hub: one process-wide relay between friends.
//!
//! The Hub owns the presence registry, the relay, the possession broker and
//! the permission store, and is the only thing transports talk to.

use std::sync::Arc;

use tether_core::{ActionResponse, ActionResponseEc, ActionResult, FriendCode};
use tether_perms::{ActionRequirements, PermissionSet, RawPermissions, UserPermissions};
use tether_relay::{
    ActionRelay, ActionRequest, Authorizer, CameraFrame, ConnectionHandle, ForwardedCall,
    MovementFrame, PossessionBroker, PossessionUpdate, PresenceRegistry,
};
use tether_store::{PermissionStore, UpsertResult};

use crate::config::HubConfig;
use crate::error::{HubError, Result};

/// One friend as seen from an account's friend list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendView {
    pub code: FriendCode,
    /// What the account grants this friend beyond its globals.
    pub overrides: RawPermissions,
    pub online: bool,
}

/// An account's globals and friend list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountView {
    pub code: FriendCode,
    pub global: PermissionSet,
    /// Sorted by friend code.
    pub friends: Vec<FriendView>,
}

/// The main Hub struct.
///
/// Provides a unified API for:
/// - Presence events from the transport
/// - Relaying one-shot actions
/// - Possession sessions
/// - Managing accounts and friend lists
pub struct Hub<S: PermissionStore + 'static> {
    /// The permission store.
    store: Arc<S>,
    /// Who is online.
    presence: Arc<PresenceRegistry>,
    /// One-shot actions.
    relay: ActionRelay,
    /// Ghost/host sessions.
    possession: PossessionBroker,
    /// Configuration.
    config: HubConfig,
}

impl<S: PermissionStore + 'static> Hub<S> {
    /// Create a new hub instance.
    pub fn new(store: S, config: HubConfig) -> Self {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create a hub over a store that is also used elsewhere.
    pub fn with_shared_store(store: Arc<S>, config: HubConfig) -> Self {
        let presence = Arc::new(PresenceRegistry::new(&config.relay));
        let authorizer = Authorizer::new(presence.clone(), store.clone());
        Self {
            relay: ActionRelay::new(authorizer.clone(), config.relay.forward_timeout),
            possession: PossessionBroker::new(authorizer, &config.relay),
            store,
            presence,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub fn possession(&self) -> &PossessionBroker {
        &self.possession
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Presence
    // ─────────────────────────────────────────────────────────────────────────

    /// A client connected.
    ///
    /// A newer connection replaces an older one. Any possession session the
    /// older connection was in is ended, since its client state is gone.
    ///
    /// Ending a session notifies the other party from a task spawned on the
    /// current tokio runtime, so call this from within one.
    pub fn on_connect(&self, code: FriendCode, connection: ConnectionHandle) {
        tracing::info!(%code, "client connected");
        let replaced = self.presence.add(code.clone(), connection);
        if replaced && self.possession.is_engaged(&code) {
            self.possession.end(&code);
        }
    }

    /// A client disconnected. Ends its possession session, if any, including
    /// one whose handshake is still in flight.
    pub fn on_disconnect(&self, code: &FriendCode) {
        if self.possession.is_engaged(code) {
            self.possession.end(code);
        }
        self.presence.remove(code);
        tracing::info!(%code, "client disconnected");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────────

    /// Relay an action from `sender` to the request's targets.
    pub async fn handle_action(
        &self,
        sender: &FriendCode,
        request: ActionRequest,
    ) -> ActionResponse {
        if let Some(code) = self.check_request(sender, &request) {
            tracing::debug!(%sender, kind = ?request.kind, ?code, "action request rejected");
            return ActionResponse::rejected(code);
        }

        self.presence.touch(sender);

        let required = request.kind.minimum_permissions().union(&request.required);
        let call = ForwardedCall::Action {
            sender: sender.clone(),
            kind: request.kind,
            payload: request.payload,
        };
        self.relay
            .relay(sender, &request.targets, call, required)
            .await
    }

    /// Relay an action that is still in wire form.
    pub async fn handle_action_bytes(&self, sender: &FriendCode, bytes: &[u8]) -> ActionResponse {
        if !self.presence.is_online(sender) {
            return ActionResponse::rejected(ActionResponseEc::SenderNotConnected);
        }
        match ActionRequest::from_bytes(bytes) {
            Ok(request) => self.handle_action(sender, request).await,
            Err(e) => {
                tracing::debug!(%sender, error = %e, "undecodable action request");
                ActionResponse::rejected(ActionResponseEc::BadDataInRequest)
            }
        }
    }

    /// Request-level checks, in order. `None` means the relay may run.
    fn check_request(
        &self,
        sender: &FriendCode,
        request: &ActionRequest,
    ) -> Option<ActionResponseEc> {
        if !self.presence.is_online(sender) {
            return Some(ActionResponseEc::SenderNotConnected);
        }

        let targets = &request.targets;
        if targets.is_empty()
            || targets.len() > self.config.max_targets
            || !targets.iter().all(FriendCode::is_well_formed)
        {
            return Some(ActionResponseEc::BadDataInRequest);
        }

        if request.payload.len() > self.config.max_payload_bytes {
            return Some(ActionResponseEc::BadDataInRequest);
        }

        if self
            .presence
            .is_exceeding_cooldown(sender, request.kind.category())
        {
            return Some(ActionResponseEc::TooManyRequests);
        }

        None
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Possession
    // ─────────────────────────────────────────────────────────────────────────

    /// Start possessing `host`.
    pub async fn begin_possession(&self, ghost: &FriendCode, host: &FriendCode) -> ActionResponse {
        if !self.presence.is_online(ghost) {
            return ActionResponse::rejected(ActionResponseEc::SenderNotConnected);
        }
        if !host.is_well_formed() {
            return ActionResponse::rejected(ActionResponseEc::BadDataInRequest);
        }

        let result = self.possession.begin(ghost, host).await;
        ActionResponse::success([(host.clone(), result)].into_iter().collect())
    }

    pub fn possession_camera(&self, ghost: &FriendCode, frame: CameraFrame) -> ActionResult {
        self.possession.update(ghost, PossessionUpdate::Camera(frame))
    }

    pub fn possession_movement(&self, ghost: &FriendCode, frame: MovementFrame) -> ActionResult {
        self.possession.update(ghost, PossessionUpdate::Movement(frame))
    }

    /// End the session `code` is in, from either side.
    pub fn end_possession(&self, code: &FriendCode) -> bool {
        self.possession.end(code)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accounts and Friends
    // ─────────────────────────────────────────────────────────────────────────

    /// An account's globals and friends, with who is online.
    pub async fn get_account(&self, code: &FriendCode) -> Result<AccountView> {
        let global = self
            .store
            .get_global(code)
            .await?
            .ok_or_else(|| HubError::UnknownAccount(code.clone()))?;

        let mut friends: Vec<FriendView> = self
            .store
            .get_permissions(code)
            .await?
            .into_values()
            .map(|edge| FriendView {
                online: self.presence.is_online(&edge.friend),
                code: edge.friend,
                overrides: edge.overrides,
            })
            .collect();
        friends.sort_by(|a, b| a.code.cmp(&b.code));

        Ok(AccountView {
            code: code.clone(),
            global,
            friends,
        })
    }

    /// Create an account or replace its globals.
    pub async fn update_global_permissions(
        &self,
        code: &FriendCode,
        global: PermissionSet,
    ) -> Result<()> {
        self.store.set_global(code, &global).await?;
        Ok(())
    }

    /// `owner` adds `friend`, granting only its globals to start with.
    pub async fn add_friend(
        &self,
        owner: &FriendCode,
        friend: &FriendCode,
    ) -> Result<UserPermissions> {
        if !friend.is_well_formed() {
            return Err(HubError::InvalidFriendCode(friend.to_string()));
        }
        if owner == friend {
            return Err(HubError::InvalidOperation(
                "cannot add yourself as a friend".into(),
            ));
        }
        self.require_account(owner).await?;

        if self.store.get_user_permissions(owner, friend).await?.is_some() {
            return Err(HubError::AlreadyFriends {
                owner: owner.clone(),
                friend: friend.clone(),
            });
        }

        let edge = UserPermissions::new(owner.clone(), friend.clone());
        self.store.upsert_permissions(&edge).await?;
        tracing::debug!(%owner, %friend, "friend added");
        Ok(edge)
    }

    /// Replace the overrides on an existing edge.
    pub async fn update_friend(&self, edge: &UserPermissions) -> Result<()> {
        if self
            .store
            .get_user_permissions(&edge.owner, &edge.friend)
            .await?
            .is_none()
        {
            return Err(HubError::NotFriends {
                owner: edge.owner.clone(),
                friend: edge.friend.clone(),
            });
        }

        match self.store.upsert_permissions(edge).await? {
            UpsertResult::Updated => Ok(()),
            // Removed concurrently; do not resurrect it.
            UpsertResult::Inserted => {
                self.store
                    .remove_permissions(&edge.owner, &edge.friend)
                    .await?;
                Err(HubError::NotFriends {
                    owner: edge.owner.clone(),
                    friend: edge.friend.clone(),
                })
            }
        }
    }

    /// `owner` removes `friend`. Returns whether the edge existed.
    pub async fn remove_friend(&self, owner: &FriendCode, friend: &FriendCode) -> Result<bool> {
        Ok(self.store.remove_permissions(owner, friend).await?)
    }

    async fn require_account(&self, code: &FriendCode) -> Result<()> {
        match self.store.get_global(code).await? {
            Some(_) => Ok(()),
            None => Err(HubError::UnknownAccount(code.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{ActionKind, ActionResultEc};
    use tether_perms::{PrimaryPermissions, SpeakPermissions};
    use tether_relay::pair;
    use tether_store::MemoryPermissionStore;

    fn code(s: &str) -> FriendCode {
        FriendCode::new(s).unwrap()
    }

    fn hub() -> Hub<MemoryPermissionStore> {
        Hub::new(MemoryPermissionStore::new(), HubConfig::default())
    }

    fn connect(hub: &Hub<MemoryPermissionStore>, who: &FriendCode) {
        let (conn, peer) = pair(16);
        peer.serve(|_| ActionResult::success());
        hub.on_connect(who.clone(), conn.into_handle());
    }

    fn speak(targets: Vec<FriendCode>) -> ActionRequest {
        ActionRequest::new(ActionKind::Speak, targets, &b"/say hi"[..])
            .with_required(PermissionSet::speak(SpeakPermissions::SAY))
    }

    #[tokio::test]
    async fn test_sender_must_be_online() {
        let hub = hub();
        let response = hub.handle_action(&code("A"), speak(vec![code("B")])).await;
        assert_eq!(response.code, ActionResponseEc::SenderNotConnected);
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn test_bad_target_lists() {
        let hub = Hub::new(
            MemoryPermissionStore::new(),
            HubConfig {
                max_targets: 2,
                ..HubConfig::default()
            },
        );
        let a = code("A");
        connect(&hub, &a);

        let empty = hub.handle_action(&a, speak(vec![])).await;
        assert_eq!(empty.code, ActionResponseEc::BadDataInRequest);

        let many = hub
            .handle_action(&a, speak(vec![code("B"), code("C"), code("D")]))
            .await;
        assert_eq!(many.code, ActionResponseEc::BadDataInRequest);

        // A code that skipped validation on the way in.
        let raw: FriendCode = serde_json::from_str("\"\"").unwrap();
        let malformed = hub.handle_action(&a, speak(vec![raw])).await;
        assert_eq!(malformed.code, ActionResponseEc::BadDataInRequest);
    }

    #[tokio::test]
    async fn test_oversized_payload() {
        let hub = Hub::new(
            MemoryPermissionStore::new(),
            HubConfig {
                max_payload_bytes: 4,
                ..HubConfig::default()
            },
        );
        let a = code("A");
        connect(&hub, &a);

        let request = ActionRequest::new(ActionKind::Emote, vec![code("B")], vec![0u8; 5]);
        let response = hub.handle_action(&a, request).await;
        assert_eq!(response.code, ActionResponseEc::BadDataInRequest);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_rejects_second_request() {
        let hub = hub();
        let a = code("A");
        connect(&hub, &a);

        let first = hub.handle_action(&a, speak(vec![code("B")])).await;
        assert_eq!(first.code, ActionResponseEc::Success);
        assert_eq!(first.code_for(&code("B")), Some(ActionResultEc::TargetOffline));

        let second = hub.handle_action(&a, speak(vec![code("B")])).await;
        assert_eq!(second.code, ActionResponseEc::TooManyRequests);

        // Out-of-game actions have their own, shorter cooldown.
        tokio::time::advance(std::time::Duration::from_millis(300)).await;
        let out_of_game =
            ActionRequest::new(ActionKind::Moodles, vec![code("B")], Vec::<u8>::new());
        assert_eq!(
            hub.handle_action(&a, out_of_game).await.code,
            ActionResponseEc::Success
        );
    }

    #[tokio::test]
    async fn test_kind_floor_is_always_required() {
        let hub = hub();
        let (a, b) = (code("A"), code("B"));
        connect(&hub, &a);
        connect(&hub, &b);

        // B grants A every speak channel but not the SPEAK feature itself.
        hub.update_global_permissions(&b, PermissionSet::speak(SpeakPermissions::all()))
            .await
            .unwrap();
        hub.update_global_permissions(&a, PermissionSet::NONE)
            .await
            .unwrap();
        hub.add_friend(&b, &a).await.unwrap();

        let response = hub.handle_action(&a, speak(vec![b.clone()])).await;
        assert_eq!(
            response.code_for(&b),
            Some(ActionResultEc::TargetHasNotGrantedSenderPermissions)
        );
    }

    #[tokio::test]
    async fn test_friend_management() {
        let hub = hub();
        let (a, b) = (code("A"), code("B"));

        assert!(matches!(
            hub.add_friend(&a, &b).await,
            Err(HubError::UnknownAccount(_))
        ));

        hub.update_global_permissions(&a, PermissionSet::primary(PrimaryPermissions::EMOTE))
            .await
            .unwrap();
        hub.add_friend(&a, &b).await.unwrap();
        assert!(matches!(
            hub.add_friend(&a, &b).await,
            Err(HubError::AlreadyFriends { .. })
        ));
        assert!(matches!(
            hub.add_friend(&a, &a).await,
            Err(HubError::InvalidOperation(_))
        ));

        let edge = UserPermissions::new(a.clone(), b.clone())
            .with_overrides(RawPermissions::default().deny_primary(PrimaryPermissions::EMOTE));
        hub.update_friend(&edge).await.unwrap();

        connect(&hub, &b);
        let view = hub.get_account(&a).await.unwrap();
        assert_eq!(view.global, PermissionSet::primary(PrimaryPermissions::EMOTE));
        assert_eq!(
            view.friends,
            vec![FriendView {
                code: b.clone(),
                overrides: edge.overrides,
                online: true,
            }]
        );

        assert!(hub.remove_friend(&a, &b).await.unwrap());
        assert!(!hub.remove_friend(&a, &b).await.unwrap());
        assert!(matches!(
            hub.update_friend(&edge).await,
            Err(HubError::NotFriends { .. })
        ));
        assert!(hub.get_account(&a).await.unwrap().friends.is_empty());
    }

    #[tokio::test]
    async fn test_add_friend_rejects_malformed_code() {
        let hub = hub();
        let a = code("A");
        hub.update_global_permissions(&a, PermissionSet::NONE)
            .await
            .unwrap();

        let empty: FriendCode = serde_json::from_str("\"\"").unwrap();
        assert!(matches!(
            hub.add_friend(&a, &empty).await,
            Err(HubError::InvalidFriendCode(_))
        ));
        assert!(hub.get_account(&a).await.unwrap().friends.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_during_handshake_cancels_possession() {
        let hub = hub();
        let (ghost, host) = (code("GHOST"), code("HOST"));
        hub.update_global_permissions(&host, PermissionSet::primary(PrimaryPermissions::POSSESSION))
            .await
            .unwrap();
        hub.add_friend(&host, &ghost).await.unwrap();
        connect(&hub, &ghost);
        let (conn, mut host_client) = pair(16);
        hub.on_connect(host.clone(), conn.into_handle());

        let (response, ()) = tokio::join!(hub.begin_possession(&ghost, &host), async {
            let handshake = host_client.recv().await.unwrap().unwrap();
            hub.on_disconnect(&ghost);
            handshake.respond(ActionResult::success()).unwrap();
        });

        assert_eq!(
            response.code_for(&host),
            Some(ActionResultEc::PossessionDesynchronization)
        );
        assert!(!hub.possession().is_engaged(&host));
        let incoming = host_client.recv().await.unwrap().unwrap();
        assert_eq!(incoming.call, ForwardedCall::PossessionEnd { by: ghost.clone() });
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_bad_data() {
        let hub = hub();
        let a = code("A");
        assert_eq!(
            hub.handle_action_bytes(&a, &[1, 2, 3]).await.code,
            ActionResponseEc::SenderNotConnected
        );
        connect(&hub, &a);
        assert_eq!(
            hub.handle_action_bytes(&a, &[0xff, 0x01]).await.code,
            ActionResponseEc::BadDataInRequest
        );
    }
}
