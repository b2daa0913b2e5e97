//! Conversation messages
//!
//! A message is one turn of the conversation. Roles are free-form labels;
//! the constants below are the ones the assistant itself writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ROLE_USER: &str = "user";
pub const ROLE_AGENT: &str = "agent";
pub const ROLE_SYSTEM: &str = "system";

/// One conversational turn as stored in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Monotonic id assigned by the store
    pub id: i64,
    /// Write time, assigned by the store
    pub timestamp: DateTime<Utc>,
    pub role: String,
    pub text: String,
}

impl Message {
    pub fn is_system(&self) -> bool {
        self.role == ROLE_SYSTEM
    }
}
