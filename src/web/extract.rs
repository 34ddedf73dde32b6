//! Request extractors for the submission endpoint.

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap, HeaderValue},
    Form, Json,
};
use serde_json::Value;
use tracing::debug;

use super::{types::ClientIp, Error};

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
const REAL_IP_HEADER: &str = "x-real-ip";
const EMAIL_FIELD: &str = "email";

/// The request body encodings the submission endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    FormEncoded,
    Json,
    Unsupported,
}

impl ContentKind {
    /// Matches on a substring of the `Content-Type` value, so parameters like `charset` don't matter.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|val| val.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.contains("application/x-www-form-urlencoded") {
            Self::FormEncoded
        } else if content_type.contains("application/json") {
            Self::Json
        } else {
            Self::Unsupported
        }
    }

    fn canonical_mime(self) -> Option<&'static str> {
        match self {
            Self::FormEncoded => Some("application/x-www-form-urlencoded"),
            Self::Json => Some("application/json"),
            Self::Unsupported => None,
        }
    }
}

/// The raw, not yet validated `email` from either a form-encoded or a JSON body.
#[derive(Debug)]
pub struct SubmissionBody(pub String);

impl<S> FromRequest<S> for SubmissionBody
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(mut req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let kind = ContentKind::from_headers(req.headers());
        // The inner extractors are stricter about the header than the substring match above.
        if let Some(canonical) = kind.canonical_mime() {
            req.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(canonical));
        }

        let email = match kind {
            ContentKind::FormEncoded => {
                let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                    .await
                    .map_err(|er| Error::MalformedBody(er.body_text()))?;
                email_from_form(pairs)
            }
            ContentKind::Json => {
                let Json(body) = Json::<Value>::from_request(req, state)
                    .await
                    .map_err(|er| Error::MalformedBody(er.body_text()))?;
                email_from_json(&body)?
            }
            ContentKind::Unsupported => {
                let content_type = req
                    .headers()
                    .get(CONTENT_TYPE)
                    .map(|val| String::from_utf8_lossy(val.as_bytes()).into_owned());
                return Err(Error::UnsupportedContentType(content_type));
            }
        };

        Ok(SubmissionBody(email))
    }
}

/// The first `email` field of the form, repeated fields are ignored.
fn email_from_form(pairs: Vec<(String, String)>) -> String {
    pairs
        .into_iter()
        .find_map(|(key, value)| (key == EMAIL_FIELD).then_some(value))
        .unwrap_or_default()
}

/// The `email` member of a JSON body.
///
/// A body that is not an object has no `email`. A missing member and the falsy values
/// (`null`, `false`, `0`, `""`) all count as an empty email. Any other non-string value,
/// or a `null` body, can't be read as an email at all.
fn email_from_json(body: &Value) -> Result<String, Error> {
    if body.is_null() {
        return Err(Error::MalformedBody("the body is `null`".to_string()));
    }

    match body.get(EMAIL_FIELD) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(String::new()),
        Some(Value::Number(num)) if num.as_f64() == Some(0.0) => Ok(String::new()),
        Some(Value::String(email)) => Ok(email.clone()),
        Some(other) => Err(Error::MalformedBody(format!(
            "`email` is not a string: {other}"
        ))),
    }
}

impl ClientIp {
    /// First entry of `x-forwarded-for`, then `x-real-ip`, then `"unknown"`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        header_str(headers, FORWARDED_FOR_HEADER)
            .and_then(|forwarded| forwarded.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .or_else(|| header_str(headers, REAL_IP_HEADER))
            .map(ClientIp::from)
            .unwrap_or_else(ClientIp::unknown)
    }
}

/// A trimmed, non-empty header value.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|val| val.to_str().ok())
        .map(str::trim)
        .filter(|val| !val.is_empty())
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let client_ip = ClientIp::from_headers(&parts.headers);
        debug!("{:<20} - {}", "ClientIp", client_ip.as_str());
        Ok(client_ip)
    }
}
