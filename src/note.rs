use serde::{Deserialize, Serialize};

/// A piece of knowledge the agent filed under a topic.
///
/// Topics are not unique: saving twice under one topic keeps both entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub topic: String,
    pub content: String,
}
