use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use strum_macros::AsRefStr;

use super::types::DataParsingError;
use crate::store::StoreError;

pub type WebResult<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("request method is not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("unsupported content type: {0:?}")]
    UnsupportedContentType(Option<String>),
    #[error("failed to extract the request body: {0}")]
    MalformedBody(String),
    #[error("the email is already registered")]
    EmailAlreadyRegistered,

    #[error("data parsing error: {0}")]
    DataParsing(#[from] DataParsingError),
    #[error("submission store error: {0}")]
    Store(#[from] StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use ClientError::*;

        match self {
            Error::MethodNotAllowed(_) => (StatusCode::METHOD_NOT_ALLOWED, MethodNotAllowed),
            Error::UnsupportedContentType(_) => (StatusCode::BAD_REQUEST, UnsupportedContentType),
            Error::DataParsing(_) => (StatusCode::BAD_REQUEST, InvalidEmail),
            Error::EmailAlreadyRegistered => (StatusCode::CONFLICT, EmailAlreadyRegistered),
            Error::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, FailedToSave),
            Error::MalformedBody(_) | Error::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ServiceError)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// The errors a caller gets to see. Carries no detail about the underlying failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("Method not allowed")]
    MethodNotAllowed,
    #[display("Unsupported content type")]
    UnsupportedContentType,
    #[display("Valid email address is required")]
    InvalidEmail,
    #[display("Email already registered")]
    EmailAlreadyRegistered,
    #[display("Failed to save email")]
    FailedToSave,
    #[display("Internal server error")]
    ServiceError,
}

impl ClientError {
    /// An optional human readable message sent next to the error.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            ClientError::EmailAlreadyRegistered => Some("This email is already on our list!"),
            _ => None,
        }
    }

    pub fn body(&self) -> ClientErrorBody {
        ClientErrorBody {
            error: self.to_string(),
            message: self.message(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClientErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}
