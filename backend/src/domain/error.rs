//! Transport-agnostic failures.
//!
//! Each service reports its own named outcomes (`AlreadyPending`,
//! `ItemNotFound`, ...) and converts them into [`Error`] at the adapter
//! boundary. Adapters only look at the [`ErrorCode`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Failure category, serialized in snake case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    /// No acting user was given.
    Unauthorized,
    /// The acting user does not own the resource.
    Forbidden,
    NotFound,
    /// Duplicate share, pending request, or an already answered request.
    Conflict,
    /// The store is unreachable. Every write is keyed or toggled, so the
    /// same call may be retried.
    ServiceUnavailable,
    InternalError,
}

impl ErrorCode {
    /// Message used when a caller supplies a blank one.
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid request",
            Self::Unauthorized => "viewer required",
            Self::Forbidden => "not permitted",
            Self::NotFound => "not found",
            Self::Conflict => "conflicts with current state",
            Self::ServiceUnavailable => "store unavailable",
            Self::InternalError => "internal error",
        }
    }

    /// Whether details must stay out of client responses.
    pub const fn is_internal(self) -> bool {
        matches!(self, Self::InternalError)
    }

    /// Whether repeating the identical call may succeed.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::ServiceUnavailable)
    }
}

/// Returned by [`Error::try_new`] and by deserialization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    #[error("error message must not be empty")]
    EmptyMessage,
}

/// A code, a non-blank message, and optional JSON details.
///
/// ```
/// use curation::domain::{Error, ErrorCode};
/// use serde_json::json;
///
/// let err = Error::conflict("already shared").with_details(json!({ "sharedItemId": "s-1" }));
/// assert_eq!(err.code(), ErrorCode::Conflict);
/// assert_eq!(err.details(), Some(&json!({ "sharedItemId": "s-1" })));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
}

macro_rules! code_constructors {
    ($($name:ident => $code:ident),+ $(,)?) => {
        $(
            #[doc = concat!("An [`ErrorCode::", stringify!($code), "`] error.")]
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new(ErrorCode::$code, message)
            }
        )+
    };
}

impl Error {
    /// Build an error; a blank message becomes the code's default message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::try_new(code, message).unwrap_or_else(|_| Self {
            code,
            message: code.default_message().to_owned(),
            details: None,
        })
    }

    /// Build an error, rejecting a blank message.
    pub fn try_new(code: ErrorCode, message: impl Into<String>) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            details: None,
        })
    }

    code_constructors! {
        invalid_request => InvalidRequest,
        unauthorized => Unauthorized,
        forbidden => Forbidden,
        not_found => NotFound,
        conflict => Conflict,
        service_unavailable => ServiceUnavailable,
        internal => InternalError,
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(dto: ErrorDto) -> Result<Self, Self::Error> {
        let error = Self::try_new(dto.code, dto.message)?;
        Ok(match dto.details {
            Some(details) => error.with_details(details),
            None => error,
        })
    }
}

#[cfg(test)]
mod tests;
