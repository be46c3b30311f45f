use std::collections::BTreeSet;

use anyhow::Context;
use chron_config::ChronConfig;
use chron_core::AuditRow;
use chron_dataverse::DataverseClient;
use chron_timeline::{
    RecordContext, SortDirection, TimelineController, TimelineFilter, apply_filter, field_options,
    format_audit_value, selected_fields_summary, sort_rows,
};
use serde::Serialize;

use crate::cli::{GlobalFlags, HistoryArgs, OutputFormat};
use crate::output::{output, print_table};

const TABLE_HEADERS: [&str; 6] = ["operation", "changed on", "changed by", "field", "old value", "new value"];

#[derive(Debug, Serialize)]
struct HistoryResponse {
    record_id: String,
    entity: Option<String>,
    pages: u32,
    has_more: bool,
    fields: String,
    field_options: Vec<String>,
    total_rows: usize,
    rows: Vec<AuditRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Handle `chron history`.
pub async fn handle(args: &HistoryArgs, config: &ChronConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut timeline = config.timeline.clone();
    if let Some(page_size) = args.page_size {
        timeline.page_size = page_size;
    }
    timeline.validate()?;

    let client = DataverseClient::from_config(&config.dataverse)
        .context("failed to create dataverse client")?;
    let controller = TimelineController::new(client, timeline);

    let context = RecordContext {
        bound_value: Some(args.record_id.clone()),
        context_entity_id: None,
        entity_type: args.entity.clone(),
    };
    let record_id = context
        .record_id()
        .context("record id is empty")?;

    let mut snapshot = controller.update_view(&context).await;
    let mut pages = 1;
    while pages < args.pages && snapshot.error.is_none() && controller.has_more() {
        controller.load_more().await;
        snapshot = controller.snapshot();
        pages += 1;
    }

    if let Some(error) = &snapshot.error {
        if snapshot.rows.is_empty() {
            anyhow::bail!("failed to load audit history: {error}");
        }
        tracing::warn!(%error, pages, "audit history incomplete");
    }

    let total_rows = snapshot.rows.len();
    let options = field_options(&snapshot.rows);
    let filter = TimelineFilter {
        fields: args.fields.iter().cloned().collect::<BTreeSet<_>>(),
        from: args.from,
        to: args.to,
    };
    let mut rows = apply_filter(&snapshot.rows, &filter);
    if let Some(column) = args.sort {
        let direction = if args.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        sort_rows(&mut rows, column, direction);
    }

    if flags.format == OutputFormat::Table {
        print_table(&TABLE_HEADERS, &table_rows(&rows));
        if !flags.quiet {
            eprintln!(
                "{} of {total_rows} entries, fields: {}{}",
                rows.len(),
                selected_fields_summary(&options, &filter.fields),
                if controller.has_more() { " (more available, raise --pages)" } else { "" }
            );
        }
        return Ok(());
    }

    output(
        &HistoryResponse {
            record_id,
            entity: context.entity_type().map(ToString::to_string),
            pages,
            has_more: controller.has_more(),
            fields: selected_fields_summary(&options, &filter.fields),
            field_options: options,
            total_rows,
            rows,
            error: snapshot.error,
        },
        flags.format,
    )
}

/// One table line per change line; operation, date and user only on the
/// first line of each entry.
fn table_rows(rows: &[AuditRow]) -> Vec<Vec<String>> {
    let mut lines: Vec<Vec<String>> = Vec::new();
    for row in rows {
        let head = [row.operation.clone(), row.created_on.clone(), row.user.clone()];
        if row.changes.is_empty() {
            lines.push(head.into_iter().chain([String::new(), String::new(), String::new()]).collect());
            continue;
        }
        for (index, change) in row.changes.iter().enumerate() {
            let mut line: Vec<String> = if index == 0 {
                head.to_vec()
            } else {
                vec![String::new(); 3]
            };
            line.push(change.field.clone());
            line.push(format_audit_value(&change.old_value));
            line.push(format_audit_value(&change.new_value));
            lines.push(line);
        }
    }
    lines
}
