use crate::output::CliError;
use helpdesk_core::ErrorCode;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 4000;
pub const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
    pub suggestion: String,
}

impl ValidationError {
    pub fn new(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            field,
            value: value.into(),
            reason: reason.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn to_cli_error(&self) -> CliError {
        CliError::with_details(
            format!("invalid {} '{}': {}", self.field, preview(&self.value), self.reason),
            self.suggestion.clone(),
            ErrorCode::InvalidInput.code(),
        )
    }
}

/// First 40 characters of `value`, for error messages.
fn preview(value: &str) -> String {
    let mut chars = value.chars();
    let head: String = chars.by_ref().take(40).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

pub fn validate_title(s: &str) -> Result<(), ValidationError> {
    if s.trim() != s {
        return Err(ValidationError::new(
            "title",
            s,
            "must not start or end with whitespace",
            "trim leading/trailing whitespace from --title",
        ));
    }
    if s.is_empty() {
        return Err(ValidationError::new(
            "title",
            s,
            "must not be empty",
            "provide a non-empty --title",
        ));
    }
    if s.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::new(
            "title",
            s,
            format!("must be <= {MAX_TITLE_LEN} characters"),
            "shorten the title",
        ));
    }
    if s.chars().any(char::is_control) {
        return Err(ValidationError::new(
            "title",
            s,
            "must not contain control characters",
            "remove control characters from the title",
        ));
    }
    Ok(())
}

pub fn validate_description(s: &str) -> Result<(), ValidationError> {
    if s.trim().is_empty() {
        return Err(ValidationError::new(
            "description",
            s,
            "must not be empty",
            "describe the problem with --description",
        ));
    }
    if s.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::new(
            "description",
            s,
            format!("must be <= {MAX_DESCRIPTION_LEN} characters"),
            "shorten the description",
        ));
    }
    Ok(())
}

pub fn validate_username(s: &str) -> Result<(), ValidationError> {
    if s.is_empty() {
        return Err(ValidationError::new(
            "username",
            s,
            "must not be empty",
            "choose a username",
        ));
    }
    if s.chars().count() > MAX_USERNAME_LEN {
        return Err(ValidationError::new(
            "username",
            s,
            format!("must be <= {MAX_USERNAME_LEN} characters"),
            "choose a shorter username",
        ));
    }
    if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::new(
            "username",
            s,
            "must not contain whitespace or control characters",
            "use letters, digits, '-', '_' or '.'",
        ));
    }
    Ok(())
}
