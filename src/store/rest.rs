use reqwest::{header::ACCEPT, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::{
    InsertOutcome, NewSubmission, Result, StoreError, StoredSubmission, SUBMISSIONS_TABLE,
    UNIQUE_VIOLATION_CODE,
};

/// Asks PostgREST to answer with the single inserted row instead of an array.
const SINGLE_OBJECT_MIME: &str = "application/vnd.pgrst.object+json";

/// A client for a PostgREST endpoint, such as the one Supabase exposes under `/rest/v1`.
#[derive(Debug, Clone)]
pub struct RestStore {
    http_client: Client,
    table_url: reqwest::Url,
    service_key: SecretString,
}

impl RestStore {
    pub fn new<S: AsRef<str>>(url: S, service_key: SecretString) -> Result<Self> {
        let table_url = table_url(url.as_ref())?;

        let http_client = Client::builder().build()?;

        Ok(RestStore {
            http_client,
            table_url,
            service_key,
        })
    }

    pub async fn insert_submission(&self, submission: &NewSubmission) -> Result<InsertOutcome> {
        let service_key = self.service_key.expose_secret();

        let resp = self
            .http_client
            .post(self.table_url.clone())
            .header("apikey", service_key)
            .bearer_auth(service_key)
            .header("Prefer", "return=representation")
            .header(ACCEPT, SINGLE_OBJECT_MIME)
            .json(submission)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            let stored: StoredSubmission = resp.json().await?;
            return Ok(InsertOutcome::Inserted(stored));
        }

        let body = resp.bytes().await?;
        let error = serde_json::from_slice::<PostgrestError>(&body).unwrap_or_else(|_| {
            PostgrestError {
                code: None,
                message: String::from_utf8_lossy(&body).into_owned(),
            }
        });
        debug!(
            "{:<20} - insert rejected: {status} {error:?}",
            "RestStore"
        );

        if is_unique_violation(status, &error) {
            return Ok(InsertOutcome::Conflict);
        }

        Err(StoreError::Rejected {
            status: status.as_u16(),
            code: error.code,
            message: error.message,
        })
    }
}

/// The error body PostgREST returns for a failed request.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    #[serde(default)]
    message: String,
}

/// The base url is treated as a directory, so a path prefix like `http://host/proxy` is kept.
fn table_url(base: &str) -> Result<reqwest::Url> {
    let mut url =
        reqwest::Url::parse(base).map_err(|e| StoreError::UrlParsing(e.to_string()))?;
    if !url.path().ends_with('/') {
        let dir_path = format!("{}/", url.path());
        url.set_path(&dir_path);
    }

    url.join(&format!("rest/v1/{SUBMISSIONS_TABLE}"))
        .map_err(|e| StoreError::UrlParsing(e.to_string()))
}

fn is_unique_violation(status: StatusCode, error: &PostgrestError) -> bool {
    status == StatusCode::CONFLICT && error.code.as_deref() == Some(UNIQUE_VIOLATION_CODE)
}
