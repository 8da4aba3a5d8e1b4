mod calculator_id;
mod lead;

pub use calculator_id::CalculatorId;
pub use lead::{ContactRequest, FormId, LeadField, LeadSubmission, LeadValue, SubmissionStatus};
