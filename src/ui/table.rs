use tabled::{settings::Style, Table, Tabled};

use crate::document::DocumentSummary;
use crate::fact::Fact;
use crate::storage::StoreStats;

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct DocumentRow {
    #[tabled(rename = "ID")]
    external_id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Last accessed")]
    last_accessed: String,
}

#[derive(Tabled)]
struct FactRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn stats_table(stats: &StoreStats) -> String {
    let rows = vec![
        MetricRow { metric: "Messages", value: stats.messages.to_string() },
        MetricRow { metric: "Facts", value: stats.facts.to_string() },
        MetricRow { metric: "Documents", value: stats.documents.to_string() },
        MetricRow { metric: "Notes", value: stats.notes.to_string() },
        MetricRow { metric: "Size", value: format!("{:.2} MiB", stats.size_mib()) },
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn documents_table(documents: &[DocumentSummary]) -> String {
    if documents.is_empty() {
        return String::new();
    }

    let rows = documents.iter().map(|d| DocumentRow {
        external_id: d.external_id.clone(),
        title: d.title.clone(),
        created: d.created_at.format(TIME_FORMAT).to_string(),
        last_accessed: d.last_accessed_at.format(TIME_FORMAT).to_string(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn facts_table(facts: &[Fact]) -> String {
    if facts.is_empty() {
        return String::new();
    }

    let rows = facts.iter().map(|f| FactRow {
        key: f.key.clone(),
        value: f.value.clone(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}
