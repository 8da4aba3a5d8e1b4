//! Lead submission to HubSpot's hosted form API.
//!
//! Each [`gtm_core::FormId`] is mapped to a form GUID through
//! [`gtm_core::config::LeadsConfig`]; the request is a single unauthenticated
//! POST to `{endpoint}/{portal_id}/{form_guid}`.

mod payload;
mod submitter;

pub use payload::{FormContext, FormField, FormPayload};
pub use submitter::HubSpotSubmitter;
