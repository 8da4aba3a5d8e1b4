//! Batch evaluation of calculator scenarios from CSV.
//!
//! ## CSV Format
//!
//! One scenario per row. The header names input keys of the chosen
//! calculator (see `gtm360 fields <calculator>`); column order does not
//! matter and columns may be omitted. Every cell goes through the same
//! coercion as an interactive edit: an empty or unparseable cell takes the
//! field default.
//!
//! ```csv
//! opportunities,deal_value,win_rate,sales_cycle_days
//! 50,25000,20,90
//! 120,"$8,000",15,45
//! ```
//!
//! For `revenue_maturity` the `answer` column may repeat; answers apply in
//! column order.
//!
//! ## Result format
//!
//! `Scenario`, then the label of every input and result row, then `Summary`.

use std::io;
use std::path::Path;

use gtm_core::calculations::{Calculator, CalculatorInput, Row};
use gtm_core::export;
use gtm_core::input::InputError;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioLoadError {
    /// The CSV is structurally invalid.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    /// A header does not name an input of the calculator.
    #[error("unknown column '{column}' on row {row}")]
    UnknownColumn { column: String, row: usize },

    #[error("cannot read scenario file: {0}")]
    Io(#[from] io::Error),
}

/// One evaluated scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResult {
    /// 1-based row number in the source file.
    pub row: usize,
    pub rows: Vec<Row>,
    pub summary: String,
}

/// Parses CSV text into inputs for `C`, in file order.
///
/// # Errors
///
/// * [`ScenarioLoadError::Parse`] if the CSV is structurally invalid.
/// * [`ScenarioLoadError::UnknownColumn`] if a header is not an input key.
pub fn load_from_str<C: Calculator>(input: &str) -> Result<Vec<C::Input>, ScenarioLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());
    let headers = reader.headers()?.clone();

    reader
        .records()
        .enumerate()
        .map(|(idx, record)| {
            let record = record?;
            let row = idx + 1;
            let mut scenario = C::Input::default();
            for (column, raw) in headers.iter().zip(record.iter()) {
                scenario.set_field(column, raw).map_err(|error| match error {
                    InputError::UnknownField(column) => {
                        ScenarioLoadError::UnknownColumn { column, row }
                    }
                })?;
            }
            Ok(scenario.sanitized())
        })
        .collect()
}

/// Reads a file from disk and delegates to [`load_from_str`].
pub fn load_from_file<C: Calculator>(path: &Path) -> Result<Vec<C::Input>, ScenarioLoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str::<C>(&contents)
}

/// Computes every scenario.
pub fn evaluate<C: Calculator>(
    calculator: C,
    scenarios: &[C::Input],
) -> Vec<ScenarioResult> {
    scenarios
        .iter()
        .enumerate()
        .map(|(idx, input)| {
            let outcome = calculator.compute(input);
            debug!(calculator = %calculator.id(), row = idx + 1, "evaluated scenario");
            ScenarioResult {
                row: idx + 1,
                rows: export::export_rows(&calculator, input, &outcome),
                summary: calculator.summary(&outcome),
            }
        })
        .collect()
}

/// Writes one CSV line per result. The header comes from the first result's
/// labels, which are the same for every scenario of a calculator.
pub fn write_results<W: io::Write>(
    writer: W,
    results: &[ScenarioResult],
) -> Result<(), ScenarioLoadError> {
    let mut csv = csv::Writer::from_writer(writer);
    let Some(first) = results.first() else {
        csv.write_record(["Scenario", "Summary"])?;
        csv.flush()?;
        return Ok(());
    };

    let mut header = vec!["Scenario"];
    header.extend(first.rows.iter().map(|(label, _)| *label));
    header.push("Summary");
    csv.write_record(&header)?;

    for result in results {
        let mut record = vec![result.row.to_string()];
        record.extend(result.rows.iter().map(|(_, value)| value.clone()));
        record.push(result.summary.clone());
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Loads, evaluates and renders `path` in one step.
pub fn run_file<C: Calculator>(
    calculator: C,
    path: &Path,
) -> Result<String, ScenarioLoadError> {
    let scenarios = load_from_file::<C>(path)?;
    let results = evaluate(calculator, &scenarios);
    let mut buffer = Vec::new();
    write_results(&mut buffer, &results)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use gtm_core::calculations::{
        CriterionLevel, IcpCalculator, MaturityCalculator, RuleOf40Calculator, VelocityCalculator,
        VelocityInput,
    };
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    #[test]
    fn full_header_parses_every_field() {
        let csv = "opportunities,deal_value,win_rate,sales_cycle_days\n120,8000,15,45\n";

        let scenarios = load_from_str::<VelocityCalculator>(csv).unwrap();

        assert_eq!(
            scenarios,
            vec![VelocityInput {
                opportunities: dec!(120),
                deal_value: dec!(8000),
                win_rate: dec!(15),
                sales_cycle_days: dec!(45),
            }]
        );
    }

    #[test]
    fn missing_columns_take_defaults() {
        let csv = "win_rate\n30\n";

        let scenarios = load_from_str::<VelocityCalculator>(csv).unwrap();

        assert_eq!(scenarios[0].win_rate, dec!(30));
        assert_eq!(scenarios[0].deal_value, VelocityInput::default().deal_value);
    }

    #[test]
    fn empty_and_garbage_cells_take_defaults() {
        let csv = "deal_value,win_rate\n,lots\n";

        let scenarios = load_from_str::<VelocityCalculator>(csv).unwrap();

        assert_eq!(scenarios[0], VelocityInput::default());
    }

    #[test]
    fn quoted_currency_values_are_accepted() {
        let csv = "deal_value\n\"$8,000\"\n";

        let scenarios = load_from_str::<VelocityCalculator>(csv).unwrap();

        assert_eq!(scenarios[0].deal_value, dec!(8000));
    }

    #[test]
    fn column_order_does_not_matter() {
        let csv = "profit_margin,growth_rate\n50,-20\n";

        let scenarios = load_from_str::<RuleOf40Calculator>(csv).unwrap();

        assert_eq!(scenarios[0].growth_rate, dec!(-20));
        assert_eq!(scenarios[0].profit_margin, dec!(50));
    }

    #[test]
    fn icp_levels_parse_by_name() {
        let csv = "budget,authority,need,timeline,tech_fit\nfull,partial,full,none,partial\n";

        let scenarios = load_from_str::<IcpCalculator>(csv).unwrap();

        assert_eq!(scenarios[0].budget, CriterionLevel::Full);
        assert_eq!(scenarios[0].authority, CriterionLevel::Partial);
        assert_eq!(scenarios[0].timeline, CriterionLevel::None);
    }

    #[test]
    fn repeated_answer_columns_apply_in_order() {
        let csv = "answer,answer,answer\n0,1,2\n";

        let scenarios = load_from_str::<MaturityCalculator>(csv).unwrap();

        assert_eq!(scenarios[0].answers, vec![0, 1, 2]);
    }

    #[test]
    fn unknown_column_reports_row() {
        let csv = "win_rate,burn_multiple\n20,2\n";

        let result = load_from_str::<VelocityCalculator>(csv);

        match result {
            Err(ScenarioLoadError::UnknownColumn { column, row }) => {
                assert_eq!(column, "burn_multiple");
                assert_eq!(row, 1);
            }
            other => panic!("expected UnknownColumn, got {other:?}"),
        }
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let csv = "win_rate,deal_value\n20\n";

        let result = load_from_str::<VelocityCalculator>(csv);

        assert!(matches!(result, Err(ScenarioLoadError::Parse(_))));
    }

    #[test]
    fn header_only_yields_no_scenarios() {
        let scenarios = load_from_str::<VelocityCalculator>("win_rate\n").unwrap();

        assert!(scenarios.is_empty());
    }

    // -----------------------------------------------------------------------
    // Evaluation and output
    // -----------------------------------------------------------------------

    #[test]
    fn results_have_header_and_one_line_per_scenario() {
        let scenarios = load_from_str::<RuleOf40Calculator>(
            "growth_rate,profit_margin\n30,15\n-20,50\n",
        )
        .unwrap();
        let results = evaluate(RuleOf40Calculator, &scenarios);

        let mut buffer = Vec::new();
        write_results(&mut buffer, &results).unwrap();

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "Scenario,Revenue Growth Rate (%),Profit Margin (%),Rule of 40 Score,Assessment,Outlook,Summary\n\
             1,30%,15%,45,Distressed / Efficient,Valuation Premium likely.,Rule of 40 Score: 45\n\
             2,-20%,50%,30,Burn Problem,Efficiency drag on valuation.,Rule of 40 Score: 30\n"
        );
    }

    #[test]
    fn no_results_still_writes_header() {
        let mut buffer = Vec::new();

        write_results(&mut buffer, &[]).unwrap();

        assert_eq!(String::from_utf8(buffer).unwrap(), "Scenario,Summary\n");
    }
}
