//! Action relay: authorize and forward one call to many targets.
//!
//! Every distinct target gets its own task. A slow or dead target costs at
//! most one forward timeout and never delays its siblings. Once per-target
//! work has started nothing is returned as an error; every outcome is a code
//! in the response map.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::task::JoinSet;

use tether_core::{ActionResponse, ActionResult, ActionResultEc, FriendCode};
use tether_perms::PermissionSet;

use crate::gate::Authorizer;
use crate::messages::ForwardedCall;
use crate::transport::ConnectionHandle;

/// Forward a call with a deadline, folding every failure into a code.
pub async fn forward(
    connection: &ConnectionHandle,
    call: ForwardedCall,
    timeout: Duration,
) -> ActionResult {
    match tokio::time::timeout(timeout, connection.call(call)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "forwarded call failed");
            ActionResult::code(ActionResultEc::Unknown)
        }
        Err(_) => ActionResult::code(ActionResultEc::TargetTimeout),
    }
}

/// Fans a call out to its targets.
#[derive(Debug, Clone)]
pub struct ActionRelay {
    authorizer: Authorizer,
    forward_timeout: Duration,
}

impl ActionRelay {
    pub fn new(authorizer: Authorizer, forward_timeout: Duration) -> Self {
        Self {
            authorizer,
            forward_timeout,
        }
    }

    pub fn forward_timeout(&self) -> Duration {
        self.forward_timeout
    }

    /// Authorize and deliver `call` to every target, waiting for all of them.
    pub async fn relay(
        &self,
        sender: &FriendCode,
        targets: &[FriendCode],
        call: ForwardedCall,
        required: PermissionSet,
    ) -> ActionResponse {
        let mut seen = HashSet::with_capacity(targets.len());
        let targets: Vec<FriendCode> = targets
            .iter()
            .filter(|t| seen.insert(*t))
            .cloned()
            .collect();

        // A branch that never reports back (panicked) keeps this entry.
        let mut results: HashMap<FriendCode, ActionResult> = targets
            .iter()
            .map(|t| (t.clone(), ActionResult::code(ActionResultEc::Unknown)))
            .collect();

        let mut branches = JoinSet::new();
        for target in targets {
            let authorizer = self.authorizer.clone();
            let sender = sender.clone();
            let call = call.clone();
            let timeout = self.forward_timeout;

            branches.spawn(async move {
                let result = match authorizer.authorize(&sender, &target, &required).await {
                    Ok(connection) => forward(&connection, call, timeout).await,
                    Err(reason) => ActionResult::code(reason.into()),
                };
                tracing::debug!(%sender, %target, code = ?result.code, "relayed");
                (target, result)
            });
        }

        while let Some(joined) = branches.join_next().await {
            match joined {
                Ok((target, result)) => {
                    results.insert(target, result);
                }
                Err(e) => {
                    tracing::warn!(%sender, error = %e, "relay branch did not complete");
                }
            }
        }

        ActionResponse::success(results)
    }
}
