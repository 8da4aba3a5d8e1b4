//! Rendering of calculator reports for the terminal.

use std::fmt::Write as _;

use clap::ValueEnum;
use gtm_core::CalculatorId;
use gtm_core::export::{self, ExportError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub label: &'static str,
    pub value: String,
}

impl From<(&'static str, String)> for ReportRow {
    fn from((label, value): (&'static str, String)) -> Self {
        Self { label, value }
    }
}

/// One calculator's state as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalcReport {
    pub calculator: CalculatorId,
    pub title: &'static str,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<&'static str>,
    pub inputs: Vec<ReportRow>,
    pub results: Vec<ReportRow>,
    /// Raw metric values.
    pub metrics: serde_json::Value,
}

impl CalcReport {
    pub fn render(
        &self,
        format: OutputFormat,
    ) -> Result<String, RenderError> {
        match format {
            OutputFormat::Text => Ok(self.to_text()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)? + "\n"),
            OutputFormat::Csv => Ok(export::rows_to_csv(&self.csv_rows())?),
        }
    }

    fn csv_rows(&self) -> Vec<(&'static str, String)> {
        self.inputs
            .iter()
            .chain(&self.results)
            .map(|row| (row.label, row.value.clone()))
            .collect()
    }

    fn to_text(&self) -> String {
        let width = self
            .inputs
            .iter()
            .chain(&self.results)
            .map(|row| row.label.len())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out, "{}", "=".repeat(self.title.len()));
        for row in &self.inputs {
            let _ = writeln!(out, "  {:<width$}  {}", row.label, row.value);
        }
        out.push('\n');
        for row in &self.results {
            let _ = writeln!(out, "  {:<width$}  {}", row.label, row.value);
        }
        out.push('\n');
        let _ = writeln!(out, "{}", self.summary);
        out
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] ExportError),
}
