//! The hub over a SQLite store, with plain in-memory clients.

use std::time::Duration;

use tempfile::TempDir;
use tether::relay::{pair, ForwardedCall};
use tether::store::SqlitePermissionStore;
use tether::{
    ActionKind, ActionRequest, ActionResponseEc, ActionResult, ActionResultEc, FriendCode, Hub,
    HubConfig, PermissionSet, PrimaryPermissions, RawPermissions, UserPermissions,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn code(s: &str) -> FriendCode {
    FriendCode::new(s).unwrap()
}

fn connect_accepting(hub: &Hub<SqlitePermissionStore>, who: &FriendCode) {
    let (connection, peer) = pair(16);
    hub.on_connect(who.clone(), connection.into_handle());
    peer.serve(|_| ActionResult::success());
}

async fn seed(hub: &Hub<SqlitePermissionStore>, alice: &FriendCode, bob: &FriendCode) {
    hub.update_global_permissions(bob, PermissionSet::primary(PrimaryPermissions::EMOTE))
        .await
        .unwrap();
    hub.update_global_permissions(alice, PermissionSet::NONE)
        .await
        .unwrap();
    hub.add_friend(bob, alice).await.unwrap();
    hub.add_friend(alice, bob).await.unwrap();
}

#[tokio::test]
async fn test_grants_survive_reopen() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tether.db");
    let (alice, bob) = (code("ALICE"), code("BOB"));

    {
        let hub = Hub::new(SqlitePermissionStore::open(&path).unwrap(), HubConfig::default());
        seed(&hub, &alice, &bob).await;
        let edge = UserPermissions::new(bob.clone(), alice.clone())
            .with_overrides(RawPermissions::default().allow_primary(PrimaryPermissions::HYPNOSIS));
        hub.update_friend(&edge).await.unwrap();
    }

    let hub = Hub::new(SqlitePermissionStore::open(&path).unwrap(), HubConfig::default());
    connect_accepting(&hub, &alice);
    connect_accepting(&hub, &bob);

    let view = hub.get_account(&bob).await.unwrap();
    assert_eq!(view.friends.len(), 1);
    assert_eq!(view.friends[0].code, alice);
    assert!(view.friends[0].online);

    let hypnosis = ActionRequest::new(ActionKind::Hypnosis, vec![bob.clone()], &b"spiral"[..]);
    let response = hub.handle_action(&alice, hypnosis).await;
    assert_eq!(response.code_for(&bob), Some(ActionResultEc::Success));

    // Alice grants Bob nothing.
    let hypnosis = ActionRequest::new(ActionKind::Hypnosis, vec![alice.clone()], &b"spiral"[..]);
    let response = hub.handle_action(&bob, hypnosis).await;
    assert_eq!(
        response.code_for(&alice),
        Some(ActionResultEc::TargetHasNotGrantedSenderPermissions)
    );
}

#[tokio::test]
async fn test_removing_a_friend_revokes_access() {
    init_tracing();
    let hub = Hub::new(SqlitePermissionStore::open_memory().unwrap(), HubConfig::default());
    let (alice, bob) = (code("ALICE"), code("BOB"));
    seed(&hub, &alice, &bob).await;
    connect_accepting(&hub, &alice);
    connect_accepting(&hub, &bob);

    assert!(hub.remove_friend(&bob, &alice).await.unwrap());

    let emote = ActionRequest::new(ActionKind::Emote, vec![bob.clone()], &b"/wave"[..]);
    let response = hub.handle_action(&alice, emote).await;
    assert_eq!(response.code_for(&bob), Some(ActionResultEc::TargetNotFriends));
}

#[tokio::test]
async fn test_wire_requests_are_decoded_and_checked() {
    init_tracing();
    let hub = Hub::new(SqlitePermissionStore::open_memory().unwrap(), HubConfig::default());
    let (alice, bob) = (code("ALICE"), code("BOB"));
    seed(&hub, &alice, &bob).await;

    let (connection, mut bob_client) = pair(16);
    hub.on_connect(bob.clone(), connection.into_handle());
    connect_accepting(&hub, &alice);

    let bytes = ActionRequest::new(ActionKind::Emote, vec![bob.clone()], &b"/bow"[..])
        .to_bytes()
        .unwrap();
    let (response, ()) = tokio::join!(hub.handle_action_bytes(&alice, &bytes), async {
        let incoming = bob_client.recv().await.unwrap().unwrap();
        assert_eq!(
            incoming.call,
            ForwardedCall::Action {
                sender: alice.clone(),
                kind: ActionKind::Emote,
                payload: b"/bow".to_vec().into(),
            }
        );
        incoming.respond(ActionResult::success()).unwrap();
    });
    assert_eq!(response.code_for(&bob), Some(ActionResultEc::Success));

    let garbage = hub.handle_action_bytes(&alice, b"\xff\x00not cbor").await;
    assert_eq!(garbage.code, ActionResponseEc::BadDataInRequest);
    assert!(garbage.results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_sender_cooldown_applies_per_category() {
    init_tracing();
    let hub = Hub::new(SqlitePermissionStore::open_memory().unwrap(), HubConfig::default());
    let (alice, bob) = (code("ALICE"), code("BOB"));
    seed(&hub, &alice, &bob).await;
    connect_accepting(&hub, &alice);
    connect_accepting(&hub, &bob);

    let emote = || ActionRequest::new(ActionKind::Emote, vec![bob.clone()], &b"/wave"[..]);
    let moodles = || ActionRequest::new(ActionKind::Moodles, vec![bob.clone()], &b"{}"[..]);

    assert_eq!(hub.handle_action(&alice, emote()).await.code, ActionResponseEc::Success);
    assert_eq!(
        hub.handle_action(&alice, emote()).await.code,
        ActionResponseEc::TooManyRequests
    );

    tokio::time::advance(Duration::from_millis(300)).await;
    // Out-of-game cooldown has passed; the in-game one has not.
    assert_eq!(hub.handle_action(&alice, moodles()).await.code, ActionResponseEc::Success);
    assert_eq!(
        hub.handle_action(&alice, emote()).await.code,
        ActionResponseEc::TooManyRequests
    );

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(hub.handle_action(&alice, emote()).await.code, ActionResponseEc::Success);
}

#[tokio::test]
async fn test_offline_sender_is_rejected_before_anything_else() {
    init_tracing();
    let hub = Hub::new(SqlitePermissionStore::open_memory().unwrap(), HubConfig::default());
    let (alice, bob) = (code("ALICE"), code("BOB"));
    seed(&hub, &alice, &bob).await;

    let response = hub
        .handle_action(&alice, ActionRequest::new(ActionKind::Emote, vec![], Vec::<u8>::new()))
        .await;
    assert_eq!(response.code, ActionResponseEc::SenderNotConnected);
}

#[tokio::test]
async fn test_config_file_drives_limits() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tether.json");
    std::fs::write(&path, r#"{ "max_targets": 1, "max_payload_bytes": 4 }"#).unwrap();

    let config = HubConfig::from_json_file(&path).unwrap();
    let hub = Hub::new(SqlitePermissionStore::open_memory().unwrap(), config);
    let (alice, bob) = (code("ALICE"), code("BOB"));
    seed(&hub, &alice, &bob).await;
    connect_accepting(&hub, &alice);

    let two_targets =
        ActionRequest::new(ActionKind::Emote, vec![bob.clone(), code("CAROL")], &b"/a"[..]);
    assert_eq!(
        hub.handle_action(&alice, two_targets).await.code,
        ActionResponseEc::BadDataInRequest
    );

    let too_big = ActionRequest::new(ActionKind::Emote, vec![bob.clone()], &b"/dance"[..]);
    assert_eq!(
        hub.handle_action(&alice, too_big).await.code,
        ActionResponseEc::BadDataInRequest
    );
}
