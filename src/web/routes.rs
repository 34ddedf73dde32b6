//! Contains all the routes that this application can handle.

use axum::{
    extract::State,
    http::{Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use crate::{
    store::{InsertOutcome, NewSubmission},
    web::{
        extract::SubmissionBody,
        types::{ClientIp, SubmissionResponse, ValidEmail},
        Error, WebResult,
    },
    AppState,
};

pub const SUBMIT_EMAIL_PATH: &str = "/submit-email";

/// All the routes of the server
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            SUBMIT_EMAIL_PATH,
            post(submit_email)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .with_state(app_state)
        .route("/health-check", get(health_check))
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// CORS preflight, the CORS headers themselves are added by a layer in `serve`.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed(method: Method) -> Error {
    Error::MethodNotAllowed(method.to_string())
}

#[tracing::instrument(
    name = "Saving new email submission",
    skip_all,
    fields(client_ip = %client_ip.as_str())
)]
async fn submit_email(
    State(app_state): State<AppState>,
    client_ip: ClientIp,
    SubmissionBody(email): SubmissionBody,
) -> WebResult<Json<SubmissionResponse>> {
    let email = ValidEmail::parse(email)?;
    let submission = NewSubmission::new(email, client_ip);

    match app_state.store.insert_submission(&submission).await? {
        InsertOutcome::Inserted(stored) => {
            info!("{:<20} - {}", "REGISTERED", stored.email);
            Ok(Json(SubmissionResponse::registered(stored.email)))
        }
        InsertOutcome::Conflict => Err(Error::EmailAlreadyRegistered),
    }
}
