//! Database schema definitions

/// SQL to create the messages table
pub const CREATE_MESSAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    role TEXT NOT NULL,
    message TEXT NOT NULL
)
"#;

/// SQL to create the facts table
pub const CREATE_FACTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS facts (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

/// SQL to create the documents table
/// `timestamp` is the last content change; `created_at` never moves after insert
pub const CREATE_DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    last_accessed TEXT NOT NULL
)
"#;

/// SQL to create the notes table (topic knowledge saved by the agent)
pub const CREATE_NOTES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    topic TEXT NOT NULL,
    content TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_documents_external_id ON documents(external_id)",
    "CREATE INDEX IF NOT EXISTS idx_documents_title ON documents(title)",
    "CREATE INDEX IF NOT EXISTS idx_documents_timestamp ON documents(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_documents_last_accessed ON documents(last_accessed)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_MESSAGES_TABLE,
        CREATE_FACTS_TABLE,
        CREATE_DOCUMENTS_TABLE,
        CREATE_NOTES_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
