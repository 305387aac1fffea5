//! Scripted clients that sit at the far end of an in-memory connection.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use tether_core::{ActionResult, ActionResultEc};
use tether_relay::{ForwardedCall, MemoryPeer};

/// How a scripted client answers calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    /// Reply `Success` to everything.
    Accept,
    /// Reply with this result to everything.
    Reply(ActionResult),
    /// Take calls and never answer them.
    Hang,
    /// Drop calls without answering, as a crashed client would.
    Fail,
    /// Accept session begin and end, reject every control frame as out of sync.
    Desync,
}

/// A client driven by a [`Behavior`], recording every call it sees.
///
/// Dropping it closes the connection.
#[derive(Debug)]
pub struct ScriptedPeer {
    calls: mpsc::UnboundedReceiver<ForwardedCall>,
    task: JoinHandle<()>,
}

impl ScriptedPeer {
    pub fn spawn(mut peer: MemoryPeer, behavior: Behavior) -> Self {
        let (tx, calls) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Some(incoming) = peer.recv().await {
                let Ok(incoming) = incoming else {
                    continue;
                };
                let _ = tx.send(incoming.call.clone());

                let reply = match &behavior {
                    Behavior::Accept => ActionResult::success(),
                    Behavior::Reply(result) => result.clone(),
                    Behavior::Hang => {
                        held.push(incoming);
                        continue;
                    }
                    Behavior::Fail => continue,
                    Behavior::Desync => match incoming.call {
                        ForwardedCall::PossessionCamera { .. }
                        | ForwardedCall::PossessionMovement { .. } => {
                            ActionResult::code(ActionResultEc::PossessionDesynchronization)
                        }
                        _ => ActionResult::success(),
                    },
                };
                let _ = incoming.respond(reply);
            }
        });

        Self { calls, task }
    }

    /// Wait for the next call this client received.
    pub async fn next_call(&mut self) -> Option<ForwardedCall> {
        self.calls.recv().await
    }

    /// The next call, if one has already arrived.
    pub fn try_next_call(&mut self) -> Option<ForwardedCall> {
        self.calls.try_recv().ok()
    }

    /// Every call received so far that has not been read yet.
    pub fn drain(&mut self) -> Vec<ForwardedCall> {
        std::iter::from_fn(|| self.try_next_call()).collect()
    }
}

impl Drop for ScriptedPeer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
