use serde_json::{Map, Value};

use super::FormKind;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FieldKind {
    Text,
    Boolean,
    List,
}

/// One column of a form variant.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Whether the field is written to the spreadsheet row.
    pub recorded: bool,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Text,
        required: true,
        recorded: true,
    }
}

const fn optional_text(name: &'static str) -> FieldSpec {
    FieldSpec {
        required: false,
        ..text(name)
    }
}

const CONSENT: FieldSpec = FieldSpec {
    name: "consent",
    kind: FieldKind::Boolean,
    required: true,
    recorded: true,
};

const RECAPTCHA_TOKEN: FieldSpec = FieldSpec {
    recorded: false,
    ..text("recaptchaToken")
};

pub const REGISTRATION_FIELDS: &[FieldSpec] = &[
    text("fullName"),
    text("email"),
    text("organizationName"),
    text("teamName"),
    text("teamSize"),
    text("country"),
    optional_text("linkedinUrl"),
    text("themeChosen"),
    text("ideaTitle"),
    text("ideaDescription"),
    CONSENT,
    RECAPTCHA_TOKEN,
];

pub const SUBMISSION_FIELDS: &[FieldSpec] = &[
    text("fullName"),
    text("email"),
    text("teamName"),
    text("themeChosen"),
    text("ideaTitle"),
    text("ideaDescription"),
    text("problemChallenge"),
    text("targetAudience"),
    FieldSpec {
        name: "uploadedFiles",
        kind: FieldKind::List,
        required: true,
        recorded: true,
    },
    optional_text("additionalComments"),
    CONSENT,
    RECAPTCHA_TOKEN,
];

pub fn fields_for(kind: FormKind) -> &'static [FieldSpec] {
    match kind {
        FormKind::Registration => REGISTRATION_FIELDS,
        FormKind::Submission => SUBMISSION_FIELDS,
    }
}

/// A single reason a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Missing(&'static str),
    InvalidEmail,
    ConsentNotBoolean,
    NoUploadedFiles,
}

fn is_missing(spec: &FieldSpec, value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) if spec.kind == FieldKind::Text => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Check required fields, then the semantic rules, against the raw payload.
pub fn validate(kind: FormKind, payload: &Map<String, Value>) -> Vec<Violation> {
    let mut violations: Vec<Violation> = fields_for(kind)
        .iter()
        .filter(|spec| spec.required && is_missing(spec, payload.get(spec.name)))
        .map(|spec| Violation::Missing(spec.name))
        .collect();

    let email_ok = payload
        .get("email")
        .and_then(Value::as_str)
        .is_some_and(|email| email.contains('@'));
    if !email_ok {
        violations.push(Violation::InvalidEmail);
    }

    if !payload.get("consent").is_some_and(Value::is_boolean) {
        violations.push(Violation::ConsentNotBoolean);
    }

    if kind == FormKind::Submission {
        let has_files = payload
            .get("uploadedFiles")
            .and_then(Value::as_array)
            .is_some_and(|files| !files.is_empty());
        if !has_files {
            violations.push(Violation::NoUploadedFiles);
        }
    }

    violations
}

/// Render violations as one user-facing message.
pub fn describe(violations: &[Violation]) -> String {
    let missing: Vec<String> = violations
        .iter()
        .filter_map(|violation| match violation {
            Violation::Missing(name) => Some(title_case(name)),
            _ => None,
        })
        .collect();

    let mut sentences = Vec::new();
    if !missing.is_empty() {
        sentences.push(format!("Missing required fields: {}.", missing.join(", ")));
    }
    for violation in violations {
        match violation {
            Violation::Missing(_) => {}
            Violation::InvalidEmail => {
                sentences.push("Please provide a valid email address.".to_string())
            }
            Violation::ConsentNotBoolean => {
                sentences.push("Consent must be a boolean value.".to_string())
            }
            Violation::NoUploadedFiles => {
                sentences.push("At least one uploaded file is required.".to_string())
            }
        }
    }
    sentences.join(" ")
}

/// `teamName` -> `Team Name`
pub fn title_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 4);
    for (index, ch) in field.chars().enumerate() {
        if index == 0 {
            out.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            out.push(' ');
            out.push(ch);
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn registration() -> Map<String, Value> {
        payload(json!({
            "formType": "registration",
            "fullName": "Asha Rao",
            "email": "asha@example.org",
            "organizationName": "Acme",
            "teamName": "Identity Crew",
            "teamSize": "4",
            "country": "India",
            "themeChosen": "Inclusion",
            "ideaTitle": "Offline enrolment",
            "ideaDescription": "Kiosk mode",
            "consent": true,
            "recaptchaToken": "tok"
        }))
    }

    #[test]
    fn each_variant_requires_eleven_fields() {
        for kind in [FormKind::Registration, FormKind::Submission] {
            assert_eq!(fields_for(kind).iter().filter(|f| f.required).count(), 11);
        }
    }

    #[test]
    fn complete_registration_has_no_violations() {
        assert!(validate(FormKind::Registration, &registration()).is_empty());
    }

    #[test]
    fn blank_and_absent_fields_are_missing() {
        let mut form = registration();
        form.remove("teamName");
        form.insert("country".into(), json!("   "));
        form.insert("ideaTitle".into(), Value::Null);

        let violations = validate(FormKind::Registration, &form);
        assert_eq!(
            violations,
            vec![
                Violation::Missing("teamName"),
                Violation::Missing("country"),
                Violation::Missing("ideaTitle"),
            ]
        );
        assert_eq!(
            describe(&violations),
            "Missing required fields: Team Name, Country, Idea Title."
        );
    }

    #[test]
    fn optional_linkedin_url_may_be_absent() {
        let form = registration();
        assert!(!form.contains_key("linkedinUrl"));
        assert!(validate(FormKind::Registration, &form).is_empty());
    }

    #[test]
    fn email_without_at_sign_is_invalid() {
        let mut form = registration();
        form.insert("email".into(), json!("asha.example.org"));
        assert_eq!(validate(FormKind::Registration, &form), vec![Violation::InvalidEmail]);
    }

    #[test]
    fn string_consent_is_rejected() {
        let mut form = registration();
        form.insert("consent".into(), json!("true"));
        assert_eq!(
            validate(FormKind::Registration, &form),
            vec![Violation::ConsentNotBoolean]
        );
    }

    #[test]
    fn submission_needs_files_and_messages_combine() {
        let form = payload(json!({
            "fullName": "Asha Rao",
            "email": "nope",
            "teamName": "Identity Crew",
            "themeChosen": "Inclusion",
            "ideaTitle": "Offline enrolment",
            "ideaDescription": "Kiosk mode",
            "problemChallenge": "Connectivity",
            "targetAudience": "Rural residents",
            "uploadedFiles": [],
            "consent": true,
            "recaptchaToken": "tok"
        }));
        let violations = validate(FormKind::Submission, &form);
        assert_eq!(
            violations,
            vec![Violation::InvalidEmail, Violation::NoUploadedFiles]
        );
        assert_eq!(
            describe(&violations),
            "Please provide a valid email address. At least one uploaded file is required."
        );
    }

    #[test]
    fn title_case_splits_camel_case() {
        assert_eq!(title_case("teamName"), "Team Name");
        assert_eq!(title_case("recaptchaToken"), "Recaptcha Token");
        assert_eq!(title_case("email"), "Email");
        assert_eq!(title_case("linkedinUrl"), "Linkedin Url");
    }
}
