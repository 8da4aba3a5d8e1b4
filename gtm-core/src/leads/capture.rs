//! Submission status machine shared by every lead form.
//!
//! ```text
//! Idle ──submit──▶ Submitting ──▶ Success
//!                      │
//!                      └────────▶ Error ──submit──▶ Submitting ...
//! ```
//!
//! Any state other than `Submitting` accepts a new submit; nothing is retried
//! automatically.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::sync::watch;
use tracing::{info, warn};

use super::submitter::{LeadSubmitter, SubmissionError};
use crate::models::{LeadSubmission, SubmissionStatus};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// Returns true if `email` looks like a deliverable address.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email.trim())
}

/// Wraps a [`LeadSubmitter`] with an observable status.
///
/// Methods take `&self`, so the owner can keep editing calculator inputs
/// while a submission is awaited.
pub struct LeadCapture {
    submitter: Arc<dyn LeadSubmitter>,
    status: watch::Sender<SubmissionStatus>,
}

/// Returns the status to `Idle` if a submission future is dropped before it
/// resolves, so an abandoned request does not lock the form.
struct InFlight<'a> {
    status: &'a watch::Sender<SubmissionStatus>,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(
        mut self,
        next: SubmissionStatus,
    ) {
        self.settled = true;
        self.status.send_replace(next);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.status.send_replace(SubmissionStatus::Idle);
        }
    }
}

impl LeadCapture {
    pub fn new(submitter: Arc<dyn LeadSubmitter>) -> Self {
        let (status, _) = watch::channel(SubmissionStatus::Idle);
        Self { submitter, status }
    }

    /// Current status.
    pub fn status(&self) -> SubmissionStatus {
        self.status.borrow().clone()
    }

    /// Receiver that observes every status transition.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionStatus> {
        self.status.subscribe()
    }

    /// Returns the form to `Idle` unless a submission is in flight.
    pub fn reset(&self) {
        self.status.send_if_modified(|status| {
            if status.is_in_flight() || *status == SubmissionStatus::Idle {
                false
            } else {
                *status = SubmissionStatus::Idle;
                true
            }
        });
    }

    /// Sends `submission` once.
    ///
    /// # Errors
    /// * [`SubmissionError::InFlight`] if another submission has not resolved;
    ///   the status is left untouched.
    /// * [`SubmissionError::InvalidEmail`] if an `email` field is present and
    ///   malformed; nothing is sent.
    /// * Whatever the underlying submitter returns.
    ///
    /// Every error except `InFlight` leaves the status at `Error`, from which
    /// a new call is accepted.
    pub async fn submit(
        &self,
        submission: &LeadSubmission,
    ) -> Result<(), SubmissionError> {
        let claimed = self.status.send_if_modified(|status| {
            if status.is_in_flight() {
                false
            } else {
                *status = SubmissionStatus::Submitting;
                true
            }
        });
        if !claimed {
            warn!(form = %submission.form, "submission ignored, another is in flight");
            return Err(SubmissionError::InFlight);
        }
        let in_flight = InFlight {
            status: &self.status,
            settled: false,
        };

        if let Some(email) = submission.field("email") {
            let email = email.to_string();
            if !is_valid_email(&email) {
                let error = SubmissionError::InvalidEmail(email);
                in_flight.settle(SubmissionStatus::Error {
                    message: error.to_string(),
                });
                return Err(error);
            }
        }

        match self.submitter.submit(submission).await {
            Ok(()) => {
                info!(form = %submission.form, "lead submitted");
                in_flight.settle(SubmissionStatus::Success);
                Ok(())
            }
            Err(error) => {
                warn!(form = %submission.form, %error, "lead submission failed");
                in_flight.settle(SubmissionStatus::Error {
                    message: error.to_string(),
                });
                Err(error)
            }
        }
    }
}
