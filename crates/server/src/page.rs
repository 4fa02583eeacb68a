//! Server-rendered prediction form
//!
//! The page is rebuilt on every request from the field schema: a three
//! column grid of widgets, an optional result banner, and the submitted
//! record echoed back as a table.

use attrition_lib::predictor::Severity;
use attrition_lib::record::{FieldKind, FieldSpec, FIELDS};
use attrition_lib::{EmployeeRecord, ModelInfo};
use std::collections::HashMap;

const FORM_COLUMNS: u8 = 3;

const STYLE: &str = "\
body{font-family:sans-serif;margin:2rem auto;max-width:72rem;color:#222}\
.grid{display:grid;grid-template-columns:repeat(3,1fr);gap:1.5rem}\
label{display:block;font-size:.9rem;margin-top:.75rem}\
input,select{width:100%;padding:.3rem;box-sizing:border-box}\
button{margin-top:1.5rem;padding:.6rem 1.2rem;font-size:1rem}\
.banner{margin:1.5rem 0;padding:1rem;border-radius:.4rem}\
.success{background:#e6f4ea;color:#1e4620}\
.error{background:#fdecea;color:#611a15}\
table{border-collapse:collapse;font-size:.85rem}\
td,th{border:1px solid #ccc;padding:.25rem .5rem;text-align:left}\
footer{margin-top:2rem;font-size:.8rem;color:#666}";

/// Result message shown above the record echo
#[derive(Debug, Clone)]
pub struct Banner {
    pub severity: Severity,
    pub message: String,
}

impl Banner {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// Widget values in schema order, as the user last saw them
#[derive(Debug, Clone)]
pub struct FormValues(Vec<String>);

impl FormValues {
    pub fn from_record(record: &EmployeeRecord) -> Self {
        Self(record.iter().map(|(_, value)| value.to_string()).collect())
    }

    /// Raw submitted strings; fields missing from the submission show their default
    pub fn from_submission(submitted: &HashMap<String, String>) -> Self {
        Self(
            FIELDS
                .iter()
                .map(|spec| match submitted.get(spec.name) {
                    Some(raw) => raw.clone(),
                    None => spec.default_value().to_string(),
                })
                .collect(),
        )
    }

    fn get(&self, index: usize) -> &str {
        self.0.get(index).map(String::as_str).unwrap_or_default()
    }
}

/// Everything needed to render one page
pub struct FormPage<'a> {
    pub title: &'a str,
    pub values: FormValues,
    pub banner: Option<Banner>,
    pub echo: Option<&'a EmployeeRecord>,
    pub model: &'a ModelInfo,
}

impl<'a> FormPage<'a> {
    /// Empty form with every widget at its default
    pub fn blank(title: &'a str, model: &'a ModelInfo) -> Self {
        Self {
            title,
            values: FormValues::from_record(&EmployeeRecord::defaults()),
            banner: None,
            echo: None,
            model,
        }
    }

    pub fn render(&self) -> String {
        let title = escape_html(self.title);
        let mut html = String::with_capacity(16 * 1024);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{}</title>\n<style>{}</style>\n", title, STYLE));
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("<h1>{} App</h1>\n", title));
        html.push_str(
            "<p>This app predicts whether an employee is likely to <strong>leave \
             (Attrition = Yes)</strong> or <strong>stay (Attrition = No)</strong> based on \
             their work-related information.</p>\n",
        );

        html.push_str("<h2>Enter Employee Details</h2>\n");
        html.push_str("<form method=\"post\" action=\"/predict\">\n<div class=\"grid\">\n");
        for column in 1..=FORM_COLUMNS {
            html.push_str("<div class=\"column\">\n");
            for (index, spec) in FIELDS.iter().enumerate() {
                if spec.column == column {
                    html.push_str(&render_widget(spec, self.values.get(index)));
                }
            }
            html.push_str("</div>\n");
        }
        html.push_str("</div>\n<button type=\"submit\">Predict Attrition</button>\n</form>\n");

        if let Some(banner) = &self.banner {
            html.push_str(&format!(
                "<div class=\"banner {}\" role=\"status\">{}</div>\n",
                banner.severity.css_class(),
                escape_html(&banner.message)
            ));
        }

        if let Some(record) = self.echo {
            html.push_str("<hr>\n<h3>Model Input Data</h3>\n");
            html.push_str(&render_echo(record));
        }

        html.push_str(&render_footer(self.model));
        html.push_str("</body>\n</html>\n");
        html
    }
}

fn render_widget(spec: &FieldSpec, current: &str) -> String {
    let name = spec.name;
    let label = escape_html(spec.label);

    match spec.kind {
        FieldKind::Numeric { min, max, .. } => {
            let max_attr = max.map(|m| format!(" max=\"{}\"", m)).unwrap_or_default();
            format!(
                "<label for=\"{name}\">{label}</label>\n\
                 <input type=\"number\" id=\"{name}\" name=\"{name}\" step=\"1\" min=\"{min}\"{max_attr} value=\"{value}\">\n",
                value = escape_html(current),
            )
        }
        FieldKind::Ordinal { options } => {
            let options: Vec<String> = options.iter().map(|o| o.to_string()).collect();
            render_select(name, &label, options.iter().map(String::as_str), current)
        }
        FieldKind::Categorical { options } => {
            render_select(name, &label, options.iter().copied(), current)
        }
    }
}

fn render_select<'o>(
    name: &str,
    label: &str,
    options: impl Iterator<Item = &'o str>,
    current: &str,
) -> String {
    let mut html = format!(
        "<label for=\"{name}\">{label}</label>\n<select id=\"{name}\" name=\"{name}\">\n"
    );
    for option in options {
        let selected = if option == current { " selected" } else { "" };
        let option = escape_html(option);
        html.push_str(&format!(
            "<option value=\"{option}\"{selected}>{option}</option>\n"
        ));
    }
    html.push_str("</select>\n");
    html
}

/// One-row table with a column per field, in schema order
fn render_echo(record: &EmployeeRecord) -> String {
    let mut header = String::new();
    let mut row = String::new();
    for (spec, value) in record.iter() {
        header.push_str(&format!("<th>{}</th>", spec.name));
        row.push_str(&format!("<td>{}</td>", escape_html(&value.to_string())));
    }
    format!(
        "<div class=\"echo\"><table>\n<tr>{}</tr>\n<tr>{}</tr>\n</table></div>\n",
        header, row
    )
}

fn render_footer(model: &ModelInfo) -> String {
    let file = model
        .path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut footer = format!(
        "<footer>Model: {} ({}, {})",
        escape_html(&file),
        model.format,
        model.version()
    );
    if model.is_shimmed() {
        footer.push_str(&format!(
            " &middot; loaded with placeholders for {}",
            escape_html(&model.placeholders.join(", "))
        ));
    }
    footer.push_str("</footer>\n");
    footer
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
