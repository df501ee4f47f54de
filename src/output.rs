//! Rendering of command results as text or JSON.

use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

use crate::models::{OutputFormat, SavedQuery, WorkItemViewModel};

/// Fields already shown elsewhere in the text layout.
const HIDDEN_FIELDS: [&str; 2] = ["System.Title", "System.Description"];

#[derive(Serialize)]
struct WorkItemSummary<'a> {
    id: &'a str,
    title: Option<&'a str>,
}

#[derive(Serialize)]
struct SettingEntry<'a> {
    key: &'a str,
    value: &'a str,
    source: &'a str,
}

/// Writer that formats output according to the specified format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, value)?;
        writeln!(self.writer)
    }

    /// One line per work item, or the full record when `details` is set.
    pub fn write_work_items(
        &mut self,
        items: &[WorkItemViewModel],
        details: bool,
    ) -> io::Result<()> {
        match self.format {
            OutputFormat::Json if details => self.write_json(items),
            OutputFormat::Json => {
                let summaries: Vec<_> = items
                    .iter()
                    .map(|item| WorkItemSummary {
                        id: &item.id,
                        title: item.title.as_deref(),
                    })
                    .collect();
                self.write_json(&summaries)
            }
            OutputFormat::Text if items.is_empty() => writeln!(self.writer, "No work items found"),
            OutputFormat::Text => {
                for item in items {
                    if details {
                        self.write_work_item_text(item)?;
                        writeln!(self.writer)?;
                    } else {
                        writeln!(self.writer, "{}", item.list_item())?;
                    }
                }
                Ok(())
            }
        }
    }

    pub fn write_work_item(&mut self, item: &WorkItemViewModel) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.write_json(item),
            OutputFormat::Text => self.write_work_item_text(item),
        }
    }

    fn write_work_item_text(&mut self, item: &WorkItemViewModel) -> io::Result<()> {
        writeln!(self.writer, "{}", item.list_item())?;

        for (name, value) in item
            .fields
            .iter()
            .filter(|(name, _)| !HIDDEN_FIELDS.contains(&name.as_str()))
        {
            writeln!(self.writer, "  {}: {}", name, display_value(value))?;
        }

        if let Some(description) = item.description().filter(|d| !d.is_empty()) {
            writeln!(self.writer, "  Description:")?;
            for line in description.lines() {
                writeln!(self.writer, "    {line}")?;
            }
        }
        Ok(())
    }

    pub fn write_saved_queries(&mut self, queries: &[SavedQuery]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.write_json(queries),
            OutputFormat::Text if queries.is_empty() => {
                writeln!(self.writer, "No saved queries")
            }
            OutputFormat::Text => {
                for query in queries {
                    writeln!(self.writer, "{}", query.name)?;
                    writeln!(self.writer, "  {}", query.query_text)?;
                }
                Ok(())
            }
        }
    }

    /// Settings as (key, value, source) rows.
    pub fn write_settings(&mut self, settings: &[(&str, String, &str)]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let entries: Vec<_> = settings
                    .iter()
                    .map(|(key, value, source)| SettingEntry {
                        key,
                        value,
                        source,
                    })
                    .collect();
                self.write_json(&entries)
            }
            OutputFormat::Text => {
                let width = settings.iter().map(|(key, _, _)| key.len()).max().unwrap_or(0);
                for (key, value, source) in settings {
                    writeln!(self.writer, "{key:<width$}  {value}  ({source})")?;
                }
                Ok(())
            }
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("displayName").and_then(Value::as_str) {
            // Identity fields such as System.AssignedTo
            Some(name) => name.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}
