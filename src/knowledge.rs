//! Knowledge base and contextual prompts
//!
//! Cached documents are rendered into one text block and appended to the
//! log as a `system` message. When building a prompt, the most recent such
//! message is prepended, followed by the recent non-system conversation.

use chrono::Utc;

use crate::Result;
use crate::document::Document;
use crate::message::ROLE_SYSTEM;
use crate::source::PreloadEntry;
use crate::storage::SqliteStore;

/// Prefix that marks a system message as the knowledge base
pub const KNOWLEDGE_BASE_MARKER: &str = "KNOWLEDGE BASE:";

/// How far back `build_context` looks for the knowledge base message
pub const KNOWLEDGE_SCAN_LIMIT: usize = 1000;

const RULE: &str = "================================================================================";

/// Render documents into a single knowledge base block.
///
/// Pages in `failures` that carry an error get an `ERROR LOADING PAGE`
/// section so the agent knows they exist but could not be read.
pub fn render_knowledge_base(documents: &[Document], failures: &[PreloadEntry]) -> String {
    let mut out = String::new();
    out.push_str(KNOWLEDGE_BASE_MARKER);
    out.push('\n');
    out.push_str(&format!("Generated on: {}\n", Utc::now().format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("Total pages: {}\n", documents.len()));
    let failed: Vec<_> = failures.iter().filter(|e| e.error.is_some()).collect();
    if !failed.is_empty() {
        out.push_str(&format!("Failed pages: {}\n", failed.len()));
    }
    out.push_str(RULE);
    out.push('\n');

    for doc in documents {
        out.push('\n');
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!("PAGE: {}\nPAGE ID: {}\n", doc.title, doc.external_id));
        out.push_str(RULE);
        out.push_str("\n\n");
        out.push_str(&doc.content);
        out.push_str("\n\n");
        out.push_str(&"-".repeat(RULE.len()));
        out.push('\n');
    }

    for entry in failed {
        out.push('\n');
        out.push_str(RULE);
        out.push_str("\nERROR LOADING PAGE\n");
        out.push_str(&format!("PAGE ID: {}\nTITLE: {}\n", entry.external_id, entry.title));
        out.push_str(&format!("ERROR: {}\n", entry.error.as_deref().unwrap_or_default()));
        out.push_str(RULE);
        out.push('\n');
    }
    out
}

/// Append the rendered knowledge base to the log as a system message.
///
/// Returns the number of characters stored.
pub fn inject_knowledge_base(
    store: &SqliteStore,
    documents: &[Document],
    failures: &[PreloadEntry],
) -> Result<usize> {
    let text = render_knowledge_base(documents, failures);
    store.append_message(ROLE_SYSTEM, &text)?;
    Ok(text.chars().count())
}

/// Build the prompt for the next agent turn.
///
/// The knowledge base is the most recent system message carrying the marker
/// among the last `KNOWLEDGE_SCAN_LIMIT` messages. Conversation history is
/// the last `history_limit` messages with system messages left out.
pub fn build_context(store: &SqliteStore, user_message: &str, history_limit: usize) -> Result<String> {
    // Newest first: a re-injected knowledge base replaces older ones
    // instead of the oldest in the window winning.
    let knowledge = store
        .get_recent_history(KNOWLEDGE_SCAN_LIMIT)?
        .into_iter()
        .rev()
        .find(|m| m.is_system() && m.text.contains(KNOWLEDGE_BASE_MARKER))
        .map(|m| m.text)
        .unwrap_or_default();

    let history: Vec<String> = store
        .get_recent_history(history_limit)?
        .into_iter()
        .filter(|m| !m.is_system())
        .map(|m| format!("{}: {}", m.role, m.text))
        .collect();

    Ok(format!(
        "{}\n\nConversation history:\n{}\nUser: {}",
        knowledge,
        history.join("\n"),
        user_message
    ))
}
