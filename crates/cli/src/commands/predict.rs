//! Prediction command

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tabled::Tabled;
use thiserror::Error;

use crate::client::{ApiClient, PredictResponse};
use crate::output::{color_decision, print_json, OutputFormat};

/// Malformed `--set` argument
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    #[error("expected FIELD=VALUE, got '{0}'")]
    MissingEquals(String),

    #[error("field name is empty in '{0}'")]
    EmptyField(String),
}

/// Parse `Field=Value`. Only the first `=` separates; the value may contain more.
pub fn parse_assignment(raw: &str) -> Result<(String, String), AssignmentError> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| AssignmentError::MissingEquals(raw.to_string()))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(AssignmentError::EmptyField(raw.to_string()));
    }
    Ok((field.to_string(), value.to_string()))
}

/// Request body: file contents first, then `--set` assignments on top
pub fn build_request(
    file: Option<&Path>,
    assignments: &[(String, String)],
) -> Result<serde_json::Map<String, serde_json::Value>> {
    let mut body = match file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            match serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
            {
                serde_json::Value::Object(map) => map,
                _ => anyhow::bail!("{} must contain a JSON object", path.display()),
            }
        }
        None => serde_json::Map::new(),
    };

    for (field, value) in assignments {
        body.insert(field.clone(), serde_json::Value::String(value.clone()));
    }
    Ok(body)
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Submit one employee record and print the decision
pub async fn predict(
    client: &ApiClient,
    file: Option<&Path>,
    assignments: &[(String, String)],
    format: OutputFormat,
) -> Result<()> {
    let body = build_request(file, assignments)?;
    let result: PredictResponse = client.post("api/v1/predict", &body).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_prediction(&result),
    }

    Ok(())
}

fn print_prediction(result: &PredictResponse) {
    println!("{}", "Attrition Prediction".bold());
    println!("{}", "=".repeat(50));
    println!("Decision:             {}", color_decision(&result.decision));
    println!("Leave Probability:    {}", result.probability);
    println!("Model Version:        {}", result.model_version);
    println!();

    let message = if result.severity == "error" {
        result.message.red()
    } else {
        result.message.green()
    };
    println!("{}", message);
    println!();

    println!("{}", "Model Input Data".bold());
    let rows: Vec<RecordRow> = result
        .record
        .iter()
        .map(|(field, value)| RecordRow {
            field: field.clone(),
            value: match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        })
        .collect();

    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);
}
