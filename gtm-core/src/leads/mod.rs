pub mod capture;
pub mod submitter;

pub use capture::{LeadCapture, is_valid_email};
pub use submitter::{DryRunSubmitter, LeadSubmitter, SubmissionError};
