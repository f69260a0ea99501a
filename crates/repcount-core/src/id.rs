//! Identity types
//!
//! Sessions are keyed by an identifier supplied by the transport layer.
//! It is never derived from the address or identity of a live connection
//! object, so a reconnecting client can be addressed deterministically.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Client identity - stable key of one counting session
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        ClientId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        ClientId::new(id)
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        ClientId(id)
    }
}

impl From<u64> for ClientId {
    fn from(id: u64) -> Self {
        ClientId(format!("{:016x}", id))
    }
}

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Client({})", self.0)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
