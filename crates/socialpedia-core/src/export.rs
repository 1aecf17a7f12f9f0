use crate::{models::Record, Error, Result};
use serde_json::{json, Value};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Attribute the ranking engine adds to every result
const SIMILARITY_FIELD: &str = "similarity";

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            "md" | "markdown" => Some(ExportFormat::Markdown),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        }
    }
}

/// Renders ranked records for whoever asked for them
pub struct Exporter;

impl Exporter {
    /// Render in the given format
    pub fn render(records: &[Record], format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => Self::to_json(records),
            ExportFormat::Csv => Ok(Self::to_csv(records)),
            ExportFormat::Markdown => Ok(Self::to_markdown(records)),
        }
    }

    /// Write to a file, format picked from the extension
    pub fn export_to_file<P: AsRef<Path>>(records: &[Record], path: P) -> Result<()> {
        let path = path.as_ref();

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ExportFormat::from_extension)
            .ok_or_else(|| {
                Error::ExportError(
                    "Could not determine export format from extension. Use .json, .csv, or .md"
                        .to_string(),
                )
            })?;

        Self::export_to_file_with_format(records, path, format)
    }

    pub fn export_to_file_with_format<P: AsRef<Path>>(
        records: &[Record],
        path: P,
        format: ExportFormat,
    ) -> Result<()> {
        let content = Self::render(records, format)?;

        let mut file = File::create(path)
            .map_err(|e| Error::ExportError(format!("Failed to create file: {}", e)))?;

        file.write_all(content.as_bytes())
            .map_err(|e| Error::ExportError(format!("Failed to write file: {}", e)))?;

        Ok(())
    }

    /// `{"results": [...]}`, the payload shape search clients consume
    pub fn to_json(records: &[Record]) -> Result<String> {
        let payload = json!({ "results": records });
        serde_json::to_string_pretty(&payload)
            .map_err(|e| Error::ExportError(format!("Failed to serialize JSON: {}", e)))
    }

    /// One column per attribute seen in any record, similarity first
    pub fn to_csv(records: &[Record]) -> String {
        let columns = Self::columns(records);
        let mut output = String::new();

        let header: Vec<String> = columns.iter().map(|c| Self::escape_csv(c)).collect();
        output.push_str(&header.join(","));
        output.push('\n');

        for record in records {
            let row: Vec<String> = columns
                .iter()
                .map(|c| {
                    record
                        .get(c)
                        .map(|v| Self::escape_csv(&Self::cell(v)))
                        .unwrap_or_default()
                })
                .collect();
            output.push_str(&row.join(","));
            output.push('\n');
        }

        output
    }

    pub fn to_markdown(records: &[Record]) -> String {
        let mut output = String::new();

        output.push_str("# Search Results\n\n");
        output.push_str(&format!("Total matches: {}\n\n", records.len()));
        output.push_str("---\n\n");

        for (rank, record) in records.iter().enumerate() {
            output.push_str(&format!("## {}. {}\n\n", rank + 1, Self::label(record)));

            if let Some(similarity) = record.get(SIMILARITY_FIELD).and_then(Value::as_f64) {
                output.push_str(&format!("**Similarity:** {:.3}\n\n", similarity));
            }

            output.push_str("| Field | Value |\n");
            output.push_str("|-------|-------|\n");
            for (field, value) in record.iter() {
                if field == SIMILARITY_FIELD {
                    continue;
                }
                let text = Self::cell(value).replace('|', "\\|").replace('\n', " ");
                if !text.is_empty() {
                    output.push_str(&format!("| {} | {} |\n", field, text));
                }
            }

            output.push_str("\n---\n\n");
        }

        output
    }

    fn columns(records: &[Record]) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        if records.iter().any(|r| r.contains(SIMILARITY_FIELD)) {
            columns.push(SIMILARITY_FIELD.to_string());
        }

        for record in records {
            for field in record.fields() {
                if !columns.iter().any(|c| c == field) {
                    columns.push(field.clone());
                }
            }
        }

        columns
    }

    /// Short human label: title, then full name, then id
    fn label(record: &Record) -> String {
        if let Some(title) = record.get_str("title").filter(|t| !t.trim().is_empty()) {
            return title.trim().to_string();
        }

        let name: Vec<&str> = ["firstName", "lastName"]
            .iter()
            .filter_map(|f| record.get_str(f))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if !name.is_empty() {
            return name.join(" ");
        }

        record
            .get("_id")
            .map(Self::cell)
            .unwrap_or_else(|| "Untitled".to_string())
    }

    fn cell(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Escape CSV special characters
    fn escape_csv(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}
