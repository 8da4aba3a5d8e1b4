use gtm_core::LeadSubmission;
use serde::Serialize;

/// Request body accepted by the forms integration endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormPayload {
    pub fields: Vec<FormField>,
    pub context: FormContext,
}

/// The endpoint accepts only string values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormContext {
    pub page_uri: String,
    pub page_name: String,
}

impl FormPayload {
    pub fn new(
        submission: &LeadSubmission,
        context: FormContext,
    ) -> Self {
        let fields = submission
            .fields
            .iter()
            .map(|field| FormField {
                name: field.name.clone(),
                value: field.value.to_string(),
            })
            .collect();
        Self { fields, context }
    }
}
