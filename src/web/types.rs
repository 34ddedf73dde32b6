//! The validated data types the submission endpoint works with, their parsing and tests.

use derive_more::Deref;
use serde::Serialize;

// ###################################
// ->   STRUCTS
// ###################################

/// Validated and normalized (trimmed, lowercase) email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidEmail(String);

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ValidEmail {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref().trim();

        if value.is_empty() {
            return Err(DataParsingError::EmailEmpty);
        }

        if !value.contains('@') {
            return Err(DataParsingError::EmailInvalid);
        }

        Ok(ValidEmail(value.to_lowercase()))
    }
}

/// Best effort address of the client that made the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deref)]
pub struct ClientIp(String);

impl ClientIp {
    /// Used when no proxy header tells us where the request came from.
    pub const UNKNOWN: &'static str = "unknown";

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }
}

impl AsRef<str> for ClientIp {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientIp {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Response body of a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub message: &'static str,
    pub email: String,
}

impl SubmissionResponse {
    pub fn registered(email: String) -> Self {
        Self {
            success: true,
            message: "Email registered successfully",
            email,
        }
    }
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("missing email")]
    EmailEmpty,
    #[error("email invalid")]
    EmailInvalid,
}
