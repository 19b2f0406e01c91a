//! Error taxonomy of the shell.
//!
//! Validation problems are never errors here: the validator returns them as
//! [`FieldErrors`] data and the form controller stores them in its state.

use thiserror::Error;

use crate::models::FieldErrors;

/// Failures of the identity provider (sign-in popup / token endpoint).
///
/// Surfaced to the caller that started the sign-in; never changes the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The user dismissed the interactive sign-in before it completed.
    #[error("sign-in was cancelled by the user")]
    PopupClosed,

    /// The provider could not be reached.
    #[error("identity provider unreachable: {0}")]
    NetworkFailure(String),

    /// The provider answered but refused the credential.
    #[error("identity provider rejected the sign-in: {0}")]
    ProviderRejected(String),
}

/// Classified failures of the API Client Adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Token missing, invalid or expired. Forces a sign-out.
    #[error("unauthorized")]
    Unauthorized,

    /// The server rejected the payload with per-field detail.
    #[error("payload rejected for {} field(s)", .0.len())]
    ValidationRejected(FieldErrors),

    /// Transport failure, including timeouts.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// Any other non-success answer.
    #[error("server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// The form values do not fit the endpoint's payload type. Nothing was sent.
    #[error("payload does not match the endpoint: {0}")]
    InvalidPayload(String),
}

/// Top-level (non field) failures recorded by the form controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("you must be signed in to submit this form")]
    NotAuthenticated,

    #[error("your session has expired, please sign in again")]
    SessionExpired,

    #[error("submission failed, please try again")]
    Submission,
}

/// Structural problems in a form definition, detected when the form is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("field `{0}` is declared more than once")]
    DuplicateField(String),

    #[error("default value given for undeclared field `{0}`")]
    UndeclaredDefault(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_messages_are_user_facing() {
        let mut fields = FieldErrors::new();
        fields.insert("url".to_string(), "taken".to_string());
        assert_eq!(
            ApiError::ValidationRejected(fields).to_string(),
            "payload rejected for 1 field(s)"
        );
        assert_eq!(
            ApiError::ServerError { status: 503, message: "down".into() }.to_string(),
            "server error (503): down"
        );
    }
}
