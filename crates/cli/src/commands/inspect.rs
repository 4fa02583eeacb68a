//! Schema, model and health inspection commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, FieldSchema, ModelInfo};
use crate::output::{color_status, format_bytes, print_json, print_warning, OutputFormat};

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Allowed")]
    allowed: String,
    #[tabled(rename = "Default")]
    default: String,
}

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Human-readable domain of a field
fn allowed_values(field: &FieldSchema) -> String {
    if let Some(options) = &field.options {
        return options.iter().map(render_value).collect::<Vec<_>>().join(", ");
    }
    match (field.min, field.max) {
        (Some(min), Some(max)) => format!("{}..={}", min, max),
        (Some(min), None) => format!(">= {}", min),
        _ => "any".to_string(),
    }
}

fn default_value(field: &FieldSchema) -> String {
    match (&field.default, &field.options) {
        (Some(default), _) => default.to_string(),
        (None, Some(options)) => options.first().map(render_value).unwrap_or_default(),
        (None, None) => String::new(),
    }
}

/// List the record fields the server accepts
pub async fn show_fields(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let fields: Vec<FieldSchema> = client.get("api/v1/schema").await?;

    match format {
        OutputFormat::Json => print_json(&fields)?,
        OutputFormat::Table => {
            let rows: Vec<FieldRow> = fields
                .iter()
                .map(|f| FieldRow {
                    name: f.name.clone(),
                    label: f.label.clone(),
                    kind: f.kind.clone(),
                    allowed: allowed_values(f),
                    default: default_value(f),
                })
                .collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} fields", fields.len());
        }
    }

    Ok(())
}

/// Show the model the server resolved at startup
pub async fn show_model(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info: ModelInfo = client.get("api/v1/model").await?;

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Table => {
            println!("{}", "Loaded Model".bold());
            println!("{}", "=".repeat(50));
            println!("Path:       {}", info.path.cyan());
            println!("Format:     {}", info.format);
            println!("Checksum:   {}", info.checksum);
            println!("Size:       {}", format_bytes(info.size_bytes));
            println!("Loaded At:  {}", format_timestamp(info.loaded_at));
            if !info.placeholders.is_empty() {
                println!();
                print_warning("Model was loaded with placeholders for missing types:");
                for symbol in &info.placeholders {
                    println!("  - {}", symbol);
                }
            }
        }
    }

    Ok(())
}

/// Show server health
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("{}", "Server Health".bold());
            println!("{}", "=".repeat(50));
            println!("Status: {}", color_status(&health.status));
            println!();

            let mut rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(&component.status),
                    message: component.message.clone().unwrap_or_default(),
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}

/// Format a unix timestamp for display
fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(value: serde_json::Value) -> FieldSchema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_allowed_values() {
        let age = field(json!({"name":"Age","label":"Age","column":1,"kind":"numeric","min":18,"max":60,"default":30}));
        assert_eq!(allowed_values(&age), "18..=60");
        assert_eq!(default_value(&age), "30");

        let rate = field(json!({"name":"DailyRate","label":"Daily Rate","column":1,"kind":"numeric","min":0,"max":null,"default":800}));
        assert_eq!(allowed_values(&rate), ">= 0");

        let overtime = field(json!({"name":"OverTime","label":"OverTime","column":3,"kind":"categorical","options":["Yes","No"]}));
        assert_eq!(allowed_values(&overtime), "Yes, No");
        assert_eq!(default_value(&overtime), "Yes");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
    }
}
