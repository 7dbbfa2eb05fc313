//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use quarry_domain::{PropertyValue, Resource};
use quarry_miner::{ErrorReport, IndexResult, Outcome};
use serde_json::{json, Map, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an extracted resource graph.
    pub fn format_resource(&self, resource: &Resource) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&resource_json(resource))?),
            OutputFormat::Table => Ok(self.format_resource_table(resource)),
            OutputFormat::Quiet => Ok(resource
                .flatten()
                .iter()
                .map(|r| r.identifier().to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_resource_table(&self, resource: &Resource) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Resource", "Property", "Value"]);

        for row in resource.flatten() {
            for (property, values) in row.properties() {
                for value in values {
                    builder.push_record([
                        row.identifier().to_string(),
                        property.to_string(),
                        display_value(value),
                    ]);
                }
            }
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format the results of an index run.
    pub fn format_index_results(&self, results: &[IndexResult]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let entries: Vec<Value> = results
                    .iter()
                    .map(|entry| {
                        let mut object = json!({ "path": entry.path.display().to_string() });
                        match &entry.result {
                            Ok(Outcome::Stored { content_id, resources }) => {
                                object["status"] = json!("stored");
                                object["content_id"] = json!(content_id);
                                object["resources"] = json!(resources);
                            }
                            Ok(Outcome::Empty) => object["status"] = json!("empty"),
                            Ok(Outcome::Unsupported { mimetype }) => {
                                object["status"] = json!("unsupported");
                                object["mimetype"] = json!(mimetype);
                            }
                            Err(e) => {
                                object["status"] = json!("failed");
                                object["error"] = json!(e.to_string());
                            }
                        }
                        object
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&entries)?)
            }
            OutputFormat::Table => {
                if results.is_empty() {
                    return Ok(self.colorize("No files indexed.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["File", "Status", "Detail"]);
                for entry in results {
                    let (status, detail) = match &entry.result {
                        Ok(Outcome::Stored { content_id, resources }) => (
                            "stored".to_string(),
                            format!("{} ({} resource(s))", content_id, resources),
                        ),
                        Ok(Outcome::Empty) => ("empty".to_string(), String::new()),
                        Ok(Outcome::Unsupported { mimetype }) => {
                            ("unsupported".to_string(), mimetype.clone())
                        }
                        Err(e) => (self.colorize("failed", "red"), e.to_string()),
                    };
                    builder.push_record([entry.path.display().to_string(), status, detail]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
            OutputFormat::Quiet => Ok(results
                .iter()
                .filter_map(|entry| match &entry.result {
                    Ok(Outcome::Stored { content_id, .. }) => Some(content_id.clone()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format recorded extraction failures.
    pub fn format_reports(&self, reports: &[ErrorReport]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
            OutputFormat::Quiet => Ok(reports
                .iter()
                .map(|r| r.path.display().to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if reports.is_empty() {
                    return Ok(self.colorize("No reports found", "yellow"));
                }

                let blocks: Vec<String> = reports
                    .iter()
                    .map(|report| {
                        format!(
                            "{}\n  URI: {}\n  Message: {}\n  Recorded: {}",
                            self.colorize(&report.path.display().to_string(), "cyan"),
                            report.uri,
                            report.message,
                            report.recorded_at
                        )
                    })
                    .collect();
                Ok(blocks.join("\n\n"))
            }
        }
    }

    /// Format the one-line index status.
    pub fn format_status(&self, resources: usize, failures: usize) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "resources": resources,
                "recorded_failures": failures,
            }))?),
            OutputFormat::Quiet => Ok(resources.to_string()),
            OutputFormat::Table => Ok(self.info(&format!(
                "{} resource(s) indexed, {} recorded failure(s)",
                resources, failures
            ))),
        }
    }

    /// Format per-type resource counts.
    pub fn format_type_counts(&self, counts: &[(String, usize)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let map: Map<String, Value> = counts
                    .iter()
                    .map(|(rdf_type, count)| (rdf_type.clone(), json!(count)))
                    .collect();
                Ok(serde_json::to_string_pretty(&map)?)
            }
            OutputFormat::Quiet => Ok(counts
                .iter()
                .map(|(rdf_type, count)| format!("{} {}", rdf_type, count))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if counts.is_empty() {
                    return Ok(self.colorize("No resources indexed.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Type", "Count"]);
                for (rdf_type, count) in counts {
                    builder.push_record([rdf_type.clone(), count.to_string()]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Nested JSON rendering: `{"id": ..., "<property>": [values]}`.
fn resource_json(resource: &Resource) -> Value {
    let mut object = Map::new();
    object.insert("id".to_string(), json!(resource.identifier()));
    for (property, values) in resource.properties() {
        let values: Vec<Value> = values.iter().map(value_json).collect();
        object.insert(property.to_string(), Value::Array(values));
    }
    Value::Object(object)
}

fn value_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Uri(s) | PropertyValue::String(s) | PropertyValue::DateTime(s) => json!(s),
        PropertyValue::Int(i) => json!(i),
        PropertyValue::Double(d) => json!(d),
        PropertyValue::Bool(b) => json!(b),
        PropertyValue::Resource(r) => resource_json(r),
    }
}

fn display_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Uri(s) => format!("<{}>", s),
        PropertyValue::String(s) | PropertyValue::DateTime(s) => s.clone(),
        PropertyValue::Int(i) => i.to_string(),
        PropertyValue::Double(d) => d.to_string(),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Resource(r) => format!("<{}>", r.identifier()),
    }
}
