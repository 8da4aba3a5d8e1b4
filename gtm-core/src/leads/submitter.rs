use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::models::LeadSubmission;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("a submission is already in flight")]
    InFlight,

    #[error("invalid email address '{0}'")]
    InvalidEmail(String),

    #[error("no CRM form configured for '{0}'")]
    UnknownForm(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("submission rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SubmissionError {
    /// Whether the same submission may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InFlight | Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidEmail(_) | Self::UnknownForm(_) | Self::Configuration(_) => false,
        }
    }
}

/// Sends one lead to a CRM. Implementations perform at most one outbound
/// request per call and never retry on their own.
#[async_trait]
pub trait LeadSubmitter: Send + Sync {
    async fn submit(
        &self,
        submission: &LeadSubmission,
    ) -> Result<(), SubmissionError>;
}

/// Logs the submission instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunSubmitter;

#[async_trait]
impl LeadSubmitter for DryRunSubmitter {
    async fn submit(
        &self,
        submission: &LeadSubmission,
    ) -> Result<(), SubmissionError> {
        let fields: Vec<String> = submission
            .fields
            .iter()
            .map(|field| format!("{}={}", field.name, field.value))
            .collect();
        info!(form = %submission.form, ?fields, "dry run: lead not sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        let error = SubmissionError::Rejected {
            status: 503,
            body: String::new(),
        };
        assert!(error.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        let error = SubmissionError::Rejected {
            status: 400,
            body: "INVALID_EMAIL".to_string(),
        };
        assert!(!error.is_retryable());
        assert!(!SubmissionError::UnknownForm("contact".to_string()).is_retryable());
    }
}
