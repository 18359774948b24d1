mod row;
pub mod schema;

use std::fmt;

use serde_json::{Map, Value};

pub use row::{format_timestamp, sheet_row};
pub use schema::{Violation, describe, validate};

/// Discriminant carried in `formType`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FormKind {
    Registration,
    Submission,
}

impl FormKind {
    pub fn parse(value: Option<&Value>) -> Option<Self> {
        match value.and_then(Value::as_str) {
            Some("registration") => Some(FormKind::Registration),
            Some("submission") => Some(FormKind::Submission),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Registration => "registration",
            FormKind::Submission => "submission",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub organization_name: String,
    pub team_name: String,
    pub team_size: String,
    pub country: String,
    pub linkedin_url: Option<String>,
    pub theme_chosen: String,
    pub idea_title: String,
    pub idea_description: String,
    pub consent: bool,
    pub recaptcha_token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionForm {
    pub full_name: String,
    pub email: String,
    pub team_name: String,
    pub theme_chosen: String,
    pub idea_title: String,
    pub idea_description: String,
    pub problem_challenge: String,
    pub target_audience: String,
    pub uploaded_files: Vec<String>,
    pub additional_comments: Option<String>,
    pub consent: bool,
    pub recaptcha_token: String,
}

/// A validated payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionRequest {
    Registration(RegistrationForm),
    Submission(SubmissionForm),
}

/// Reasons a raw payload could not become a `SubmissionRequest`.
#[derive(Debug, Clone, PartialEq)]
pub enum FormRejection {
    UnknownFormType,
    Invalid(Vec<Violation>),
}

impl FormRejection {
    pub fn message(&self) -> String {
        match self {
            FormRejection::UnknownFormType => {
                "formType must be either 'registration' or 'submission'".to_string()
            }
            FormRejection::Invalid(violations) => describe(violations),
        }
    }
}

/// Text as written to the sheet: strings verbatim, other scalars stringified.
fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn optional_text_of(value: Option<&Value>) -> Option<String> {
    Some(text_of(value)).filter(|text| !text.trim().is_empty())
}

impl SubmissionRequest {
    /// Select the variant, validate every field, then build the typed form.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, FormRejection> {
        let kind = FormKind::parse(payload.get("formType")).ok_or(FormRejection::UnknownFormType)?;

        let violations = validate(kind, payload);
        if !violations.is_empty() {
            return Err(FormRejection::Invalid(violations));
        }

        let field = |name: &str| text_of(payload.get(name));
        let consent = payload
            .get("consent")
            .and_then(Value::as_bool)
            .unwrap_or_default();

        Ok(match kind {
            FormKind::Registration => SubmissionRequest::Registration(RegistrationForm {
                full_name: field("fullName"),
                email: field("email"),
                organization_name: field("organizationName"),
                team_name: field("teamName"),
                team_size: field("teamSize"),
                country: field("country"),
                linkedin_url: optional_text_of(payload.get("linkedinUrl")),
                theme_chosen: field("themeChosen"),
                idea_title: field("ideaTitle"),
                idea_description: field("ideaDescription"),
                consent,
                recaptcha_token: field("recaptchaToken"),
            }),
            FormKind::Submission => SubmissionRequest::Submission(SubmissionForm {
                full_name: field("fullName"),
                email: field("email"),
                team_name: field("teamName"),
                theme_chosen: field("themeChosen"),
                idea_title: field("ideaTitle"),
                idea_description: field("ideaDescription"),
                problem_challenge: field("problemChallenge"),
                target_audience: field("targetAudience"),
                uploaded_files: payload
                    .get("uploadedFiles")
                    .and_then(Value::as_array)
                    .map(|files| files.iter().map(|file| text_of(Some(file))).collect())
                    .unwrap_or_default(),
                additional_comments: optional_text_of(payload.get("additionalComments")),
                consent,
                recaptcha_token: field("recaptchaToken"),
            }),
        })
    }

    pub fn kind(&self) -> FormKind {
        match self {
            SubmissionRequest::Registration(_) => FormKind::Registration,
            SubmissionRequest::Submission(_) => FormKind::Submission,
        }
    }

    pub fn recaptcha_token(&self) -> &str {
        match self {
            SubmissionRequest::Registration(form) => &form.recaptcha_token,
            SubmissionRequest::Submission(form) => &form.recaptcha_token,
        }
    }
}
