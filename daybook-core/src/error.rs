//! Error types for daybook.

use thiserror::Error;

/// Errors that can occur while loading and scheduling calendar data.
#[derive(Error, Debug)]
pub enum DaybookError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Authentication failed: {0}")]
    Unauthenticated(String),

    #[error("Missing calendar access scope: {0}")]
    InsufficientScope(String),

    #[error("Fetch failed: {0}")]
    Transient(String),

    #[error("Invalid date for '{field}': {value:?}. Expected an ISO-8601 date-time")]
    MalformedDate { field: String, value: String },

    #[error("Source '{0}' is not available on this platform")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DaybookError {
    /// Permission problems degrade to an empty result instead of an error banner.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, DaybookError::PermissionDenied(_))
    }

    /// Whether signing in again is the way out of this error.
    pub fn needs_reauthentication(&self) -> bool {
        matches!(
            self,
            DaybookError::Unauthenticated(_) | DaybookError::InsufficientScope(_)
        )
    }

    /// Message shown to the user for a foreground load failure.
    pub fn user_message(&self) -> String {
        match self {
            DaybookError::Unauthenticated(_) => {
                "Your calendar session has expired. Please sign out and sign in again.".into()
            }
            DaybookError::InsufficientScope(_) => {
                "Calendar access permission is missing. Please sign out and sign in again to grant full access.".into()
            }
            DaybookError::PermissionDenied(_) => String::new(),
            _ => "Failed to load calendar events.".into(),
        }
    }
}

/// Result type alias for daybook operations.
pub type DaybookResult<T> = Result<T, DaybookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_has_no_user_message() {
        let err = DaybookError::PermissionDenied("calendar".into());
        assert!(err.is_permission_denied());
        assert!(err.user_message().is_empty());
    }

    #[test]
    fn test_auth_errors_prompt_sign_in() {
        let expired = DaybookError::Unauthenticated("401".into());
        let scope = DaybookError::InsufficientScope("calendar.readonly".into());

        assert!(expired.needs_reauthentication());
        assert!(scope.needs_reauthentication());
        assert!(expired.user_message().contains("sign in again"));
        assert!(scope.user_message().contains("permission"));
    }

    #[test]
    fn test_malformed_date_names_the_field() {
        let err = DaybookError::MalformedDate {
            field: "startDate".into(),
            value: "yesterday".into(),
        };
        assert!(err.to_string().contains("startDate"));
        assert!(err.to_string().contains("yesterday"));
    }
}
