use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::events;
use crate::messaging::{MessagingError, MessagingResult};

/// Kinds of user lifecycle events this service reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserEventKind {
    Created,
    Updated,
    Deleted,
}

impl UserEventKind {
    pub const ALL: [UserEventKind; 3] = [Self::Created, Self::Updated, Self::Deleted];

    pub fn routing_key(self) -> &'static str {
        match self {
            Self::Created => events::USER_CREATED,
            Self::Updated => events::USER_UPDATED,
            Self::Deleted => events::USER_DELETED,
        }
    }

    /// `None` for routing keys this service does not handle
    pub fn from_routing_key(routing_key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.routing_key() == routing_key)
    }
}

impl fmt::Display for UserEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.routing_key())
    }
}

/// User lifecycle event produced by the user service
///
/// Timestamps are opaque strings; only the one matching the event kind is
/// populated, the others arrive empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserEvent {
    pub user_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub deleted_at: String,
}

impl UserEvent {
    pub fn new(user_id: i64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    /// Decode a JSON message body
    pub fn from_bytes(body: &[u8]) -> MessagingResult<Self> {
        serde_json::from_slice(body).map_err(|e| MessagingError::decode(e.to_string()))
    }

    pub fn to_bytes(&self) -> MessagingResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| MessagingError::serialization(e.to_string()))
    }
}
