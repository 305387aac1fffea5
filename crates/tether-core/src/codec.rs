//! CBOR wire codec.
//!
//! Every message that crosses a connection is encoded with ciborium. The
//! relay treats any failure here as a transport fault for that target.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CoreError, Result};

/// Message size limits.
pub mod limits {
    /// Max targets named by one action request.
    pub const MAX_TARGETS: usize = 64;
    /// Max opaque payload bytes carried by one action request.
    pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;
    /// Max length of a friend code in bytes.
    pub const MAX_FRIEND_CODE_LEN: usize = 64;
}

/// Encode a value to CBOR bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(buf)
}

/// Decode a value from CBOR bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
}
