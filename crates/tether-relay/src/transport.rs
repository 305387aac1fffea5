//! Connection abstraction for forwarding calls to targets.
//!
//! The RPC layer is assumed to provide ordered, unary request/response calls
//! per connection. Implementations may use gRPC, WebSockets, or anything else
//! with those semantics.

use std::sync::Arc;

use async_trait::async_trait;
use tether_core::ActionResult;

use crate::error::Result;
use crate::messages::ForwardedCall;

/// One live client connection.
///
/// Implementations must be thread-safe (Send + Sync). Calls issued on the same
/// connection are delivered in submission order.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Deliver a call and wait for the client's reply.
    ///
    /// Has no deadline of its own; the relay applies one.
    async fn call(&self, call: ForwardedCall) -> Result<ActionResult>;
}

/// Shared handle to a connection, as held by the presence registry.
pub type ConnectionHandle = Arc<dyn Connection>;

/// An in-memory connection for testing.
///
/// Uses channels to simulate a client at the other end. Every call and reply
/// goes through the wire codec.
pub mod memory {
    use super::*;
    use tokio::sync::{mpsc, oneshot};

    use crate::error::RelayError;

    /// Call envelope for internal routing.
    #[derive(Debug)]
    struct Envelope {
        call: Vec<u8>,
        reply: oneshot::Sender<Vec<u8>>,
    }

    /// Create a connected pair: the relay side and the client side.
    pub fn pair(capacity: usize) -> (MemoryConnection, MemoryPeer) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (MemoryConnection { sender: tx }, MemoryPeer { receiver: rx })
    }

    /// Relay side of an in-memory connection.
    #[derive(Debug, Clone)]
    pub struct MemoryConnection {
        sender: mpsc::Sender<Envelope>,
    }

    impl MemoryConnection {
        /// Wrap into a handle for the presence registry.
        pub fn into_handle(self) -> ConnectionHandle {
            Arc::new(self)
        }
    }

    #[async_trait]
    impl Connection for MemoryConnection {
        async fn call(&self, call: ForwardedCall) -> Result<ActionResult> {
            let (reply_tx, reply_rx) = oneshot::channel();
            let envelope = Envelope {
                call: call.to_bytes()?,
                reply: reply_tx,
            };

            self.sender
                .send(envelope)
                .await
                .map_err(|_| RelayError::PeerClosed)?;

            let reply = reply_rx.await.map_err(|_| RelayError::PeerClosed)?;
            Ok(tether_core::decode(&reply)?)
        }
    }

    /// Client side of an in-memory connection.
    #[derive(Debug)]
    pub struct MemoryPeer {
        receiver: mpsc::Receiver<Envelope>,
    }

    /// A call received by a [`MemoryPeer`], waiting for its reply.
    #[derive(Debug)]
    pub struct IncomingCall {
        pub call: ForwardedCall,
        reply: oneshot::Sender<Vec<u8>>,
    }

    impl IncomingCall {
        /// Send the reply back to the relay.
        pub fn respond(self, result: ActionResult) -> Result<()> {
            let bytes = tether_core::encode(&result)?;
            self.respond_raw(bytes)
        }

        /// Send arbitrary bytes back, bypassing the encoder.
        pub fn respond_raw(self, bytes: Vec<u8>) -> Result<()> {
            self.reply.send(bytes).map_err(|_| {
                RelayError::TransportError("caller stopped waiting for the reply".into())
            })
        }
    }

    impl MemoryPeer {
        /// Receive the next call.
        ///
        /// Returns `None` once every `MemoryConnection` clone is dropped.
        pub async fn recv(&mut self) -> Option<Result<IncomingCall>> {
            let envelope = self.receiver.recv().await?;
            Some(
                ForwardedCall::from_bytes(&envelope.call)
                    .map(|call| IncomingCall {
                        call,
                        reply: envelope.reply,
                    })
                    .map_err(RelayError::from),
            )
        }

        /// Answer every call with `handler` until the connection closes.
        pub fn serve<F>(mut self, mut handler: F) -> tokio::task::JoinHandle<()>
        where
            F: FnMut(&ForwardedCall) -> ActionResult + Send + 'static,
        {
            tokio::spawn(async move {
                while let Some(incoming) = self.recv().await {
                    let Ok(incoming) = incoming else {
                        continue;
                    };
                    let result = handler(&incoming.call);
                    // The relay may have given up already.
                    let _ = incoming.respond(result);
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::pair;
    use super::*;
    use crate::error::RelayError;
    use tether_core::{ActionKind, ActionResultEc, FriendCode};

    fn action_call() -> ForwardedCall {
        ForwardedCall::Action {
            sender: FriendCode::new("SENDER").unwrap(),
            kind: ActionKind::Emote,
            payload: bytes::Bytes::from_static(b"wave"),
        }
    }

    #[tokio::test]
    async fn test_memory_connection_call_reply() {
        let (conn, mut peer) = pair(8);

        let client = tokio::spawn(async move {
            let incoming = peer.recv().await.unwrap().unwrap();
            assert_eq!(incoming.call, action_call());
            incoming
                .respond(ActionResult::success_with(&b"done"[..]))
                .unwrap();
        });

        let result = conn.call(action_call()).await.unwrap();
        assert!(result.is_success());
        assert_eq!(result.value.as_deref(), Some(&b"done"[..]));
        client.await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_connection_preserves_order() {
        let (conn, peer) = pair(8);
        let (seen_tx, mut seen_rx) = tokio::sync::mpsc::unbounded_channel();
        peer.serve(move |call| {
            let _ = seen_tx.send(call.clone());
            ActionResult::success()
        });

        let ghost = FriendCode::new("GHOST").unwrap();
        for i in 0..5 {
            let frame = crate::messages::CameraFrame {
                zoom: i as f32,
                ..Default::default()
            };
            conn.call(ForwardedCall::PossessionCamera {
                ghost: ghost.clone(),
                frame,
            })
            .await
            .unwrap();
        }

        for i in 0..5 {
            match seen_rx.recv().await.unwrap() {
                ForwardedCall::PossessionCamera { frame, .. } => assert_eq!(frame.zoom, i as f32),
                other => panic!("unexpected call: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_dropped_peer_is_closed() {
        let (conn, peer) = pair(8);
        drop(peer);
        let err = conn.call(action_call()).await.unwrap_err();
        assert!(matches!(err, RelayError::PeerClosed));
    }

    #[tokio::test]
    async fn test_unanswered_call_is_closed() {
        let (conn, mut peer) = pair(8);
        tokio::spawn(async move {
            // Receive and drop without replying.
            let _ = peer.recv().await;
        });
        let err = conn.call(action_call()).await.unwrap_err();
        assert!(matches!(err, RelayError::PeerClosed));
    }

    #[tokio::test]
    async fn test_garbage_reply_is_codec_error() {
        let (conn, mut peer) = pair(8);
        tokio::spawn(async move {
            let incoming = peer.recv().await.unwrap().unwrap();
            incoming.respond_raw(vec![0xff, 0xff]).unwrap();
        });
        let err = conn.call(action_call()).await.unwrap_err();
        assert!(matches!(err, RelayError::Codec(_)));
    }

    #[tokio::test]
    async fn test_handle_is_object_safe() {
        let (conn, peer) = pair(1);
        peer.serve(|_| ActionResultEc::PossessionDesynchronization.into());
        let handle: ConnectionHandle = conn.into_handle();
        let result = handle.call(action_call()).await.unwrap();
        assert_eq!(result.code, ActionResultEc::PossessionDesynchronization);
    }
}
