use std::path::{Path, PathBuf};

use crate::{OutputMode, Settings, emit_success};
use archivist::config::{self, ArchivistConfig};
use archivist::source::{self, DirectorySource};
use archivist::storage::{BackupManager, SqliteStore};
use archivist::ui::{self, Icons, theme};
use archivist::knowledge;
use archivist::Document;
use owo_colors::OwoColorize;

fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
    Ok(SqliteStore::open(&settings.database)?)
}

/// Every cached document, most recently accessed first
fn cached_documents(store: &SqliteStore) -> anyhow::Result<Vec<Document>> {
    let mut documents = Vec::new();
    for summary in store.list_documents()? {
        if let Some(doc) = store.get_document(&summary.external_id)? {
            documents.push(doc);
        }
    }
    Ok(documents)
}

fn print_knowledge_loaded(documents: usize, chars: usize) {
    println!(
        "{} Loaded {} document(s) into memory ({} characters)",
        Icons::BRAIN,
        documents,
        chars
    );
}

fn backup_manager(settings: &Settings) -> BackupManager {
    BackupManager::new(&settings.database, &settings.backup_dir)
}

pub fn run_init(output_mode: OutputMode, settings: &Settings, force: bool) -> anyhow::Result<()> {
    let starter = ArchivistConfig {
        database: Some(settings.database.display().to_string()),
        pages_dir: Some("pages".to_string()),
        ..settings.config.clone()
    };
    config::write_config(&settings.config_path, &starter, force)?;
    open_store(settings)?;

    if output_mode.is_human() {
        ui::success(&format!("Wrote {}", settings.config_path.display()));
        ui::info("Database", &settings.database.display().to_string());
    }
    emit_success(
        output_mode,
        "init",
        serde_json::json!({
            "config": settings.config_path,
            "database": settings.database,
        }),
    )
}

pub fn run_log(output_mode: OutputMode, settings: &Settings, role: &str, text: &str) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    store.append_message(role, text)?;

    if output_mode.is_human() {
        ui::success(&format!("Logged {} message", role));
    }
    emit_success(output_mode, "log", serde_json::json!({ "role": role, "length": text.len() }))
}

pub fn run_history(output_mode: OutputMode, settings: &Settings, limit: usize) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let history = store.get_recent_history(limit)?;

    if output_mode.is_human() {
        if history.is_empty() {
            println!("{} No messages yet.", Icons::INFO);
        }
        for message in &history {
            ui::message_line(message);
        }
    }
    emit_success(output_mode, "history", serde_json::to_value(&history)?)
}

pub fn run_fact_set(output_mode: OutputMode, settings: &Settings, key: &str, value: &str) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    store.set_fact(key, value)?;

    if output_mode.is_human() {
        ui::success(&format!("{} = {}", key, value));
    }
    emit_success(output_mode, "fact.set", serde_json::json!({ "key": key, "value": value }))
}

pub fn run_fact_get(output_mode: OutputMode, settings: &Settings, key: &str) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let value = store.get_fact(key)?;

    if output_mode.is_human() {
        match &value {
            Some(v) => println!("{}", v),
            None => ui::warn(&format!("No fact named '{}'", key)),
        }
    }
    emit_success(output_mode, "fact.get", serde_json::json!({ "key": key, "value": value }))
}

pub fn run_fact_list(output_mode: OutputMode, settings: &Settings) -> anyhow::Result<()> {
    let store = open_store(settings)?;

    if output_mode.is_human() {
        let facts = store.list_facts()?;
        if facts.is_empty() {
            println!("{} No facts stored.", Icons::INFO);
        } else {
            println!("{}", ui::facts_table(&facts));
        }
        return Ok(());
    }
    emit_success(output_mode, "fact.list", serde_json::to_value(store.get_all_facts()?)?)
}

pub fn run_note_save(output_mode: OutputMode, settings: &Settings, topic: &str, content: &str) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let id = store.save_note(topic, content)?;

    if output_mode.is_human() {
        ui::success(&format!("Saved note under topic '{}'", topic));
    }
    emit_success(output_mode, "note.save", serde_json::json!({ "id": id, "topic": topic }))
}

pub fn run_note_search(output_mode: OutputMode, settings: &Settings, query: &str, limit: usize) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let notes = store.search_notes(query, limit)?;

    if output_mode.is_human() {
        if notes.is_empty() {
            println!("{} No notes found.", Icons::CROSS);
        }
        for note in &notes {
            println!("{} {}", Icons::PAGE, note.topic.bold());
            println!("  {}", note.content);
        }
    }
    emit_success(output_mode, "note.search", serde_json::to_value(&notes)?)
}

pub fn run_ingest(
    output_mode: OutputMode,
    settings: &Settings,
    id: &str,
    title: &str,
    file: &Path,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)?;
    let store = open_store(settings)?;
    let outcome = store.upsert_document(id, title, &content)?;

    if output_mode.is_human() {
        ui::outcome_line(id, title, outcome);
    }
    emit_success(output_mode, "ingest", serde_json::json!({ "id": id, "outcome": outcome }))
}

pub fn run_preload(
    output_mode: OutputMode,
    settings: &Settings,
    pages_dir: Option<PathBuf>,
    inject: bool,
) -> anyhow::Result<()> {
    let pages = &settings.config.pages;
    if pages.is_empty() {
        anyhow::bail!("no pages configured in {}", settings.config_path.display());
    }

    let pages_dir = pages_dir
        .or_else(|| settings.config.pages_dir.as_ref().map(PathBuf::from))
        .ok_or_else(|| anyhow::anyhow!("no pages directory given (set pages_dir or pass --pages-dir)"))?;
    let pages_source = DirectorySource::new(pages_dir).with_titles(pages);
    let store = open_store(settings)?;

    let progress = output_mode.is_human().then(|| ui::PreloadProgress::new(pages.len()));
    let report = source::preload(&store, &pages_source, pages, |entry| {
        if let Some(p) = &progress {
            p.page_done(entry);
        }
    })?;
    if let Some(p) = &progress {
        p.finish();
    }

    if output_mode.is_human() {
        ui::header(&format!("Preloaded {} pages from {}", pages.len(), pages_source.dir().display()));
        for entry in &report.entries {
            match (&entry.outcome, &entry.error) {
                (Some(outcome), _) => ui::outcome_line(&entry.external_id, &entry.title, *outcome),
                (None, Some(err)) => ui::error(&format!("{} ({}): {}", entry.title, entry.external_id, err)),
                (None, None) => {}
            }
        }
        if report.failures() > 0 {
            ui::warn(&format!("{} page(s) failed to load", report.failures()));
        }
    }

    let knowledge_chars = if inject {
        let documents = cached_documents(&store)?;
        let chars = knowledge::inject_knowledge_base(&store, &documents, &report.entries)?;
        if output_mode.is_human() {
            print_knowledge_loaded(documents.len(), chars);
        }
        Some(chars)
    } else {
        None
    };

    emit_success(
        output_mode,
        "preload",
        serde_json::json!({
            "entries": report.entries,
            "knowledge_characters": knowledge_chars,
        }),
    )
}

pub fn run_search(output_mode: OutputMode, settings: &Settings, query: &str, limit: usize) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let hits = store.search_documents(query, limit)?;

    if output_mode.is_human() {
        println!("{} Searching for: '{}' (limit: {})", Icons::SEARCH, query, limit);
        if hits.is_empty() {
            println!("{} No documents found.", Icons::CROSS);
        }
        for hit in &hits {
            println!("{} {} {}", Icons::PAGE, hit.title.bold(), ui::dim(&hit.external_id));
            println!("  {}", ui::output::preview(&hit.content, 500));
        }
    }
    emit_success(output_mode, "search", serde_json::to_value(&hits)?)
}

pub fn run_show(output_mode: OutputMode, settings: &Settings, id: &str) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let Some(document) = store.get_document(id)? else {
        anyhow::bail!("no cached document with id '{}'", id);
    };

    if output_mode.is_human() {
        ui::header(&document.title);
        ui::summary_row("ID", &document.external_id);
        ui::summary_row("Hash", &document.content_hash);
        ui::summary_row("Created", &document.created_at.to_rfc3339());
        ui::summary_row("Updated", &document.updated_at.to_rfc3339());
        ui::section("Content");
        println!("{}", document.content);
    }
    emit_success(output_mode, "show", serde_json::to_value(&document)?)
}

pub fn run_list(output_mode: OutputMode, settings: &Settings) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let documents = store.list_documents()?;

    if output_mode.is_human() {
        if documents.is_empty() {
            println!("{} No documents cached.", Icons::INFO);
        } else {
            println!("{}", ui::documents_table(&documents));
        }
    }
    emit_success(output_mode, "list", serde_json::to_value(&documents)?)
}

pub fn run_delete(output_mode: OutputMode, settings: &Settings, id: &str) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let removed = store.delete_document(id)?;

    if output_mode.is_human() {
        if removed {
            println!("{} Deleted {}", Icons::DEL, id);
        } else {
            ui::warn(&format!("No cached document with id '{}'", id));
        }
    }
    emit_success(output_mode, "delete", serde_json::json!({ "id": id, "removed": removed }))
}

pub fn run_knowledge(output_mode: OutputMode, settings: &Settings) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let documents = cached_documents(&store)?;
    let chars = knowledge::inject_knowledge_base(&store, &documents, &[])?;

    if output_mode.is_human() {
        print_knowledge_loaded(documents.len(), chars);
    }
    emit_success(
        output_mode,
        "knowledge",
        serde_json::json!({ "documents": documents.len(), "characters": chars }),
    )
}

pub fn run_context(output_mode: OutputMode, settings: &Settings, message: &str, limit: usize) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let prompt = knowledge::build_context(&store, message, limit)?;

    if output_mode.is_human() {
        println!("{}", prompt);
    }
    emit_success(output_mode, "context", serde_json::json!({ "prompt": prompt }))
}

pub fn run_backup(output_mode: OutputMode, settings: &Settings, name: Option<&str>) -> anyhow::Result<()> {
    // Opening first makes sure there is a store file to copy
    open_store(settings)?;
    let path = backup_manager(settings).backup(name)?;

    if output_mode.is_human() {
        println!("{} Store backed up to: {}", Icons::SAVE, path.display().style(theme().info.clone()));
    }
    emit_success(output_mode, "backup", serde_json::json!({ "path": path }))
}

pub fn run_backups(output_mode: OutputMode, settings: &Settings) -> anyhow::Result<()> {
    let backups = backup_manager(settings).list_backups()?;

    if output_mode.is_human() {
        if backups.is_empty() {
            println!("{} No backups in {}", Icons::INFO, settings.backup_dir.display());
        }
        for path in &backups {
            println!("  {}", path.display());
        }
    }
    emit_success(output_mode, "backups", serde_json::json!({ "backups": backups }))
}

pub fn run_restore(output_mode: OutputMode, settings: &Settings, path: &Path) -> anyhow::Result<()> {
    backup_manager(settings).restore(path)?;

    if output_mode.is_human() {
        println!("{} Store restored from: {}", Icons::RESTORE, path.display());
    }
    emit_success(output_mode, "restore", serde_json::json!({ "path": path }))
}

pub fn run_stats(output_mode: OutputMode, settings: &Settings) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let stats = store.stats()?;

    if output_mode.is_human() {
        ui::header(&format!("Archivist Statistics ({})", settings.database.display()));
        println!("{}", ui::stats_table(&stats));
        return Ok(());
    }
    emit_success(
        output_mode,
        "stats",
        serde_json::json!({
            "messages": stats.messages,
            "facts": stats.facts,
            "documents": stats.documents,
            "notes": stats.notes,
            "size_mib": stats.size_mib(),
        }),
    )
}

pub fn run_clear(output_mode: OutputMode, settings: &Settings, documents: bool, yes: bool) -> anyhow::Result<()> {
    let what = if documents { "all cached documents" } else { "all messages and facts" };
    if !yes {
        anyhow::bail!("refusing to delete {} without --yes", what);
    }

    let store = open_store(settings)?;
    if documents {
        store.clear_documents()?;
    } else {
        store.clear()?;
    }

    if output_mode.is_human() {
        ui::success(&format!("Deleted {}", what));
    }
    emit_success(output_mode, "clear", serde_json::json!({ "documents": documents }))
}
