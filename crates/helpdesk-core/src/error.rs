use std::fmt;

use crate::model::{Role, Status, TicketId};

/// Machine-readable error codes for scripted callers and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    SeedInvalid,
    TicketNotFound,
    IllegalTransition,
    Unauthorized,
    InvalidInput,
    InvalidEnumValue,
    UnknownUser,
    NotAuthenticated,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::SeedInvalid => "E1002",
            Self::TicketNotFound => "E2001",
            Self::IllegalTransition => "E2002",
            Self::Unauthorized => "E2003",
            Self::InvalidInput => "E2004",
            Self::InvalidEnumValue => "E2005",
            Self::UnknownUser => "E3001",
            Self::NotAuthenticated => "E3002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::SeedInvalid => "Seed data is inconsistent",
            Self::TicketNotFound => "Ticket not found",
            Self::IllegalTransition => "Illegal status transition",
            Self::Unauthorized => "Action not permitted for this user",
            Self::InvalidInput => "Invalid input",
            Self::InvalidEnumValue => "Invalid status/type/role value",
            Self::UnknownUser => "Unknown user",
            Self::NotAuthenticated => "Not logged in",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint for the person at the terminal.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .helpdesk/config.toml and retry."),
            Self::SeedInvalid => Some("Check ids, roles and assignees in the seed file."),
            Self::TicketNotFound => Some("List visible tickets with `hd list`."),
            Self::IllegalTransition => {
                Some("Technicians move tickets assigned -> in_progress -> resolved.")
            }
            Self::Unauthorized => Some("Log in as a user with the required role."),
            Self::InvalidInput => None,
            Self::InvalidEnumValue => Some("Use one of the documented status/type/role values."),
            Self::UnknownUser => Some("List known users with `hd users`, or register."),
            Self::NotAuthenticated => Some("Run `login <username>` first."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors produced by the transition/visibility engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("ticket '{id}' not found")]
    TicketNotFound { id: TicketId },

    #[error("{role} may not move a ticket from {from} to {to}")]
    IllegalTransition { role: Role, from: Status, to: Status },

    #[error("'{actor}' is not permitted to {action}")]
    Unauthorized {
        actor: String,
        action: &'static str,
    },

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

impl EngineError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::TicketNotFound { .. } => ErrorCode::TicketNotFound,
            Self::IllegalTransition { .. } => ErrorCode::IllegalTransition,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::InvalidInput { .. } => ErrorCode::InvalidInput,
        }
    }
}

/// Errors produced by the session reducer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("no user named '{username}'")]
    UnknownUser { username: String },

    #[error("this action requires a logged-in user")]
    NotAuthenticated,
}

impl SessionError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Engine(inner) => inner.code(),
            Self::UnknownUser { .. } => ErrorCode::UnknownUser,
            Self::NotAuthenticated => ErrorCode::NotAuthenticated,
        }
    }

    /// Remediation text for display; falls back to the code's summary.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.code();
        code.hint().unwrap_or_else(|| code.message()).to_string()
    }
}
