use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;

use super::{RegistrationForm, SubmissionForm, SubmissionRequest, schema::fields_for};

const TIMESTAMP_FORMAT: &str = "%d %B %Y, %I:%M:%S %p";
const FILE_SEPARATOR: &str = "; ";

/// `09 September 2025, 03:45:30 PM`
pub fn format_timestamp(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format(TIMESTAMP_FORMAT).to_string()
}

fn text(value: &str) -> Value {
    Value::String(value.to_string())
}

fn optional(value: &Option<String>) -> Value {
    text(value.as_deref().unwrap_or_default())
}

fn registration_cells(form: &RegistrationForm) -> Vec<Value> {
    vec![
        text(&form.full_name),
        text(&form.email),
        text(&form.organization_name),
        text(&form.team_name),
        text(&form.team_size),
        text(&form.country),
        optional(&form.linkedin_url),
        text(&form.theme_chosen),
        text(&form.idea_title),
        text(&form.idea_description),
        Value::Bool(form.consent),
    ]
}

fn submission_cells(form: &SubmissionForm) -> Vec<Value> {
    vec![
        text(&form.full_name),
        text(&form.email),
        text(&form.team_name),
        text(&form.theme_chosen),
        text(&form.idea_title),
        text(&form.idea_description),
        text(&form.problem_challenge),
        text(&form.target_audience),
        Value::String(form.uploaded_files.join(FILE_SEPARATOR)),
        optional(&form.additional_comments),
        Value::Bool(form.consent),
    ]
}

/// The single row appended for `request`, ending with the timestamp column.
pub fn sheet_row(request: &SubmissionRequest, timestamp: String) -> Vec<Value> {
    let mut row = match request {
        SubmissionRequest::Registration(form) => registration_cells(form),
        SubmissionRequest::Submission(form) => submission_cells(form),
    };
    debug_assert_eq!(
        row.len(),
        fields_for(request.kind()).iter().filter(|f| f.recorded).count()
    );
    row.push(Value::String(timestamp));
    row
}
