//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use tether::{Hub, HubConfig};
use tether_core::FriendCode;
use tether_perms::{PermissionSet, RawPermissions, UserPermissions};
use tether_relay::pair;
use tether_store::MemoryPermissionStore;

use crate::peers::{Behavior, ScriptedPeer};

/// Install a test-friendly tracing subscriber. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A hub over a memory store, plus helpers to populate it.
pub struct TestFixture {
    pub hub: Hub<MemoryPermissionStore>,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    pub fn with_config(config: HubConfig) -> Self {
        Self {
            hub: Hub::new(MemoryPermissionStore::new(), config),
        }
    }

    /// Create an account with the given globals.
    pub async fn account(&self, name: &str, global: PermissionSet) -> FriendCode {
        let code = FriendCode::new(name).expect("fixture account names are valid friend codes");
        self.hub
            .update_global_permissions(&code, global)
            .await
            .expect("memory store does not fail");
        code
    }

    /// `grantor` adds `grantee` with the given overrides.
    pub async fn befriend(
        &self,
        grantor: &FriendCode,
        grantee: &FriendCode,
        overrides: RawPermissions,
    ) {
        self.hub
            .add_friend(grantor, grantee)
            .await
            .expect("grantor must be an account and not yet friends");
        let edge = UserPermissions::new(grantor.clone(), grantee.clone()).with_overrides(overrides);
        self.hub
            .update_friend(&edge)
            .await
            .expect("edge was just created");
    }

    /// Connect a scripted client for `code`.
    pub fn connect(&self, code: &FriendCode, behavior: Behavior) -> ScriptedPeer {
        let (connection, peer) = pair(64);
        self.hub.on_connect(code.clone(), connection.into_handle());
        ScriptedPeer::spawn(peer, behavior)
    }

    pub fn disconnect(&self, code: &FriendCode) {
        self.hub.on_disconnect(code);
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A fixture with `count` accounts (`P0`, `P1`, ...) who have all added each
/// other, every one with `global` as its defaults.
pub async fn multi_party_fixture(
    count: usize,
    global: PermissionSet,
) -> (TestFixture, Vec<FriendCode>) {
    let fixture = TestFixture::new();
    let mut parties = Vec::with_capacity(count);
    for i in 0..count {
        parties.push(fixture.account(&format!("P{i}"), global).await);
    }

    for grantor in &parties {
        for grantee in &parties {
            if grantor != grantee {
                fixture
                    .befriend(grantor, grantee, RawPermissions::default())
                    .await;
            }
        }
    }

    (fixture, parties)
}
