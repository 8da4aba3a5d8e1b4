//! CSV export of a calculator's inputs and derived metrics.
//!
//! The file has a `Metric,Value` header followed by one row per input field
//! and one row per derived value, using the labels and formatted values
//! shown on screen.

use std::io;

use thiserror::Error;

use crate::calculations::{Calculator, CalculatorInput, OutcomeOf, Row};

pub const HEADER: [&str; 2] = ["Metric", "Value"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Writes the header and `rows` to `writer`.
pub fn write_rows<W: io::Write>(
    writer: W,
    rows: &[Row],
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;
    for (label, value) in rows {
        csv.write_record([*label, value.as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Renders `rows` as a CSV document.
pub fn rows_to_csv(rows: &[Row]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_rows(&mut buffer, rows)?;
    Ok(String::from_utf8(buffer)?)
}

/// Input rows followed by metric rows.
pub fn export_rows<C: Calculator>(
    calculator: &C,
    input: &C::Input,
    outcome: &OutcomeOf<C>,
) -> Vec<Row> {
    let mut rows = input.rows();
    rows.extend(calculator.metric_rows(outcome));
    rows
}

/// Renders a calculator's current state as CSV.
pub fn export_csv<C: Calculator>(
    calculator: &C,
    input: &C::Input,
    outcome: &OutcomeOf<C>,
) -> Result<String, ExportError> {
    rows_to_csv(&export_rows(calculator, input, outcome))
}
