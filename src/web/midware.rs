use std::{any::Any, sync::Arc};

use axum::{
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;
use uuid::Uuid;

use crate::web::{log, ClientError, Error, REQUEST_ID_HEADER};

/// Turns a `web::Error` stored in the response extensions into the JSON error body the client sees.
/// Server errors get logged with their full detail, the client only gets the generic message.
pub async fn response_mapper(
    req_method: Method,
    uri: Uri,
    headers: HeaderMap,
    resp: Response,
) -> Response {
    let uuid = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|id| id.to_str().ok())
        .and_then(|id| Uuid::parse_str(id).ok())
        .unwrap_or_else(Uuid::new_v4);

    let web_error = resp.extensions().get::<Arc<Error>>().map(Arc::as_ref);
    let client_status_and_error = web_error.map(Error::status_code_and_client_error);

    if let (Some(er), Some((status, _))) = (web_error, &client_status_and_error) {
        if status.is_server_error() {
            error!("SERVER ERROR: {er} ID: {uuid}");
        }
    }

    let err_resp = client_status_and_error
        .map(|(status, cl_err)| (status, Json(cl_err.body())).into_response());

    log::log_request(
        uuid,
        &req_method,
        &uri,
        resp.status(),
        web_error,
        client_status_and_error,
    );

    err_resp.unwrap_or(resp)
}

/// Answers a panicking handler with the generic 500 body.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!("UNEXPECTED ERROR: handler panicked: {detail}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ClientError::ServiceError.body()),
    )
        .into_response()
}
