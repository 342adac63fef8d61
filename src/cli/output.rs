//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::error::Result;
use crate::pipeline::StageState;
use crate::stack::{StackEvent, StackStatus, StatusCode, UpsertOutcome};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Action state row for table display.
#[derive(Tabled)]
struct ActionStateRow {
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Revision")]
    revision: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Returns true if the formatter emits JSON.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Formats the result of an upsert.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn format_upsert(
        &self,
        stack: &str,
        outcome: UpsertOutcome,
        events: &[StackEvent],
    ) -> Result<String> {
        let output = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&UpsertJson {
                stack,
                outcome,
                events,
            })?,
            OutputFormat::Text => {
                let detail = match outcome {
                    UpsertOutcome::Created => "created".green(),
                    UpsertOutcome::Updated => "updated".yellow(),
                    UpsertOutcome::Unchanged => "unchanged".dimmed(),
                };
                format!("{} Stack {stack}: {detail}\n", "✓".green())
            }
        };
        Ok(output)
    }

    /// Formats a resolved stack status.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn format_status(&self, stack: &str, status: &StackStatus) -> Result<String> {
        let output = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&StatusJson {
                stack,
                exists: !status.is_absent(),
                status: status.code(),
            })?,
            OutputFormat::Text => match status {
                StackStatus::Absent => format!("Stack {stack}: {}\n", "absent".dimmed()),
                StackStatus::Terminal(code) => {
                    format!("Stack {stack}: {}\n", Self::format_status_code(code))
                }
            },
        };
        Ok(output)
    }

    /// Formats a pipeline source revision.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn format_revision(&self, pipeline: &str, revision: &str) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "pipeline": pipeline, "revision": revision });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Text => Ok(format!("{revision}\n")),
        }
    }

    /// Formats pipeline stage states.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn format_stages(&self, pipeline: &str, stages: &[StageState]) -> Result<String> {
        let output = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(stages)?,
            OutputFormat::Text => {
                let mut output = String::new();
                let _ = write!(output, "\nPipeline: {pipeline}\n\n");

                let rows: Vec<ActionStateRow> = stages
                    .iter()
                    .flat_map(|stage| {
                        stage.action_states.iter().map(move |action| ActionStateRow {
                            stage: stage.stage_name.clone(),
                            action: action.action_name.clone(),
                            status: action
                                .latest_status
                                .clone()
                                .unwrap_or_else(|| String::from("-")),
                            revision: Self::truncate(action.revision_id().unwrap_or("-"), 16),
                        })
                    })
                    .collect();

                if rows.is_empty() {
                    output.push_str("   No stages reported.\n");
                } else {
                    output.push_str(&Table::new(rows).to_string());
                    output.push('\n');
                }

                output
            }
        };
        Ok(output)
    }

    /// Formats a status code with color.
    fn format_status_code(code: &StatusCode) -> String {
        let raw = code.as_str();
        if raw.ends_with("_FAILED") || raw.contains("ROLLBACK") {
            raw.red().to_string()
        } else if code.is_transitional() {
            raw.yellow().to_string()
        } else {
            raw.green().to_string()
        }
    }

    /// Truncates a string to a maximum length.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let head: String = s.chars().take(max_len - 3).collect();
            format!("{head}...")
        }
    }
}

// JSON serialization helpers

#[derive(Serialize)]
struct UpsertJson<'a> {
    stack: &'a str,
    outcome: UpsertOutcome,
    events: &'a [StackEvent],
}

#[derive(Serialize)]
struct StatusJson<'a> {
    stack: &'a str,
    exists: bool,
    status: Option<&'a StatusCode>,
}
