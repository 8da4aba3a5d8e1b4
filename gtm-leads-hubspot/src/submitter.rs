use std::time::Duration;

use async_trait::async_trait;
use gtm_core::config::LeadsConfig;
use gtm_core::leads::{LeadSubmitter, SubmissionError};
use gtm_core::{FormId, LeadSubmission};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::payload::{FormContext, FormPayload};

/// Longest response body kept in a [`SubmissionError::Rejected`].
const MAX_ERROR_BODY: usize = 512;

/// [`LeadSubmitter`] that posts to HubSpot's forms API.
///
/// Sends exactly one request per call; retrying is left to the caller.
pub struct HubSpotSubmitter {
    client: Client,
    config: LeadsConfig,
}

impl HubSpotSubmitter {
    pub fn new(config: LeadsConfig) -> Result<Self, SubmissionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                SubmissionError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client, config })
    }

    /// URL for `form`, or `None` if no GUID is configured for it.
    pub fn endpoint_for(
        &self,
        form: FormId,
    ) -> Option<String> {
        let guid = self.config.form_guid(form)?;
        Some(format!(
            "{}/{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.portal_id,
            guid
        ))
    }

    fn context(&self) -> FormContext {
        FormContext {
            page_uri: self.config.page_uri.clone(),
            page_name: self.config.page_name.clone(),
        }
    }
}

fn truncate(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &body[..end])
}

#[async_trait]
impl LeadSubmitter for HubSpotSubmitter {
    async fn submit(
        &self,
        submission: &LeadSubmission,
    ) -> Result<(), SubmissionError> {
        let url = self
            .endpoint_for(submission.form)
            .ok_or_else(|| SubmissionError::UnknownForm(submission.form.to_string()))?;
        let payload = FormPayload::new(submission, self.context());

        debug!(form = %submission.form, %url, fields = payload.fields.len(), "posting lead");
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            info!(form = %submission.form, status = status.as_u16(), "lead accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(form = %submission.form, status = status.as_u16(), "lead rejected");
        Err(SubmissionError::Rejected {
            status: status.as_u16(),
            body: truncate(body),
        })
    }
}
