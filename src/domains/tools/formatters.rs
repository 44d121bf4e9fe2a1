//! Response formatters.
//!
//! Project upstream JSON into short summaries for tool results. Formatting
//! never fails: missing fields render as `N/A` and unexpected shapes fall back
//! to a generic line.

use serde_json::Value;

use crate::domains::operations::{EntityKind, OperationKind, OperationSpec};

const MISSING: &str = "N/A";
const NOTE_PREVIEW_CHARS: usize = 100;

/// Summarize an upstream payload for `operation`.
pub fn format(operation: &OperationSpec, payload: &Value) -> String {
    let data = payload.get("data").unwrap_or(payload);
    let entity = operation.entity;
    let label = entity.title();

    match operation.kind {
        OperationKind::List | OperationKind::Search => {
            format_list(entity, data, payload.get("meta"))
        }
        OperationKind::Get => format!("{label} details:\n{}", item_line(entity, data)),
        OperationKind::Create => format!("{label} created: {}", item_line(entity, data)),
        OperationKind::Update => format!("{label} updated: {}", item_line(entity, data)),
        OperationKind::Delete => {
            let detail = payload
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| data.get("id").map(render))
                .unwrap_or_else(|| "ok".to_string());
            format!("{label} deleted: {detail}")
        }
    }
}

fn format_list(entity: EntityKind, data: &Value, meta: Option<&Value>) -> String {
    let items = data.as_array().map(Vec::as_slice).unwrap_or_default();

    let mut out = if items.is_empty() {
        format!("No {} found.", entity.plural())
    } else {
        let lines: Vec<String> = items
            .iter()
            .map(|item| format!("- {}", item_line(entity, item)))
            .collect();
        format!("Found {} {}:\n{}", items.len(), entity.plural(), lines.join("\n"))
    };

    if let Some(meta) = meta.filter(|m| m.is_object()) {
        out.push_str(&format!(
            "\nPage {} of {} ({} total)",
            field(meta, "current_page"),
            field(meta, "last_page"),
            field(meta, "total")
        ));
    }
    out
}

/// One-line summary of a single record.
fn item_line(entity: EntityKind, item: &Value) -> String {
    let id = field(item, "id");
    match entity {
        EntityKind::Deal => format!(
            "#{} {} | status: {} | value: {} | stage: {}",
            id,
            field(item, "title"),
            deal_status_label(item.get("status")),
            field(item, "value"),
            field(item, "stage_id")
        ),
        EntityKind::Person => format!(
            "#{} {} | email: {} | phone: {}",
            id,
            field(item, "name"),
            field(item, "email"),
            field(item, "phone")
        ),
        EntityKind::Company => format!(
            "#{} {} | email: {} | phone: {}",
            id,
            field(item, "name"),
            field(item, "email"),
            field(item, "phone")
        ),
        EntityKind::Activity => format!(
            "#{} {} | status: {} | start: {}",
            id,
            first_field(item, &["title", "name"]),
            activity_status_label(item.get("status")),
            field(item, "start_at")
        ),
        EntityKind::Note => {
            let text = first_field(item, &["text", "content"]);
            format!("#{} {}", id, truncate(&text, NOTE_PREVIEW_CHARS))
        }
        EntityKind::Stage => format!(
            "#{} {} | pipeline: {}",
            id,
            field(item, "name"),
            field(item, "pipeline_id")
        ),
        _ => format!("#{} {}", id, first_field(item, &["name", "title"])),
    }
}

/// Label for a deal status code.
pub fn deal_status_label(status: Option<&Value>) -> &'static str {
    match status.and_then(Value::as_i64) {
        Some(1) => "open",
        Some(2) => "won",
        Some(3) => "lost",
        _ => "unknown",
    }
}

/// Label for an activity status code.
pub fn activity_status_label(status: Option<&Value>) -> &'static str {
    match status.and_then(Value::as_i64) {
        Some(0) => "open",
        Some(2) => "completed",
        Some(4) => "no-show",
        _ => "unknown",
    }
}

fn field(item: &Value, key: &str) -> String {
    item.get(key).map(render).unwrap_or_else(|| MISSING.to_string())
}

fn first_field(item: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .find(|value| !value.is_null())
        .map(render)
        .unwrap_or_else(|| MISSING.to_string())
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => MISSING.to_string(),
        Value::String(s) if s.trim().is_empty() => MISSING.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
