//! Persistence of email submissions.
//!
//! The store is an external collaborator exposing a single insert with a uniqueness constraint on `email`.
//! Two backends are supported, both reporting a duplicate email as `InsertOutcome::Conflict`
//! instead of an error, so callers never inspect backend specific error codes.

mod postgres;
mod rest;

pub use postgres::PgStore;
pub use rest::RestStore;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::StoreConfig,
    web::types::{ClientIp, ValidEmail},
};

/// The table every backend inserts into.
pub const SUBMISSIONS_TABLE: &str = "email_submissions";

/// SQLSTATE of a `unique_violation`.
const UNIQUE_VIOLATION_CODE: &str = "23505";

// ###################################
// ->   STRUCTS
// ###################################

/// A validated submission that is ready to be inserted.
#[derive(Debug, Clone, Serialize)]
pub struct NewSubmission {
    pub email: ValidEmail,
    pub ip_address: ClientIp,
}

impl NewSubmission {
    pub fn new(email: ValidEmail, ip_address: ClientIp) -> Self {
        Self { email, ip_address }
    }
}

/// The row handed back by the store after a successful insert.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, sqlx::FromRow)]
pub struct StoredSubmission {
    pub email: String,
    pub ip_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(StoredSubmission),
    /// The email is already present in the store.
    Conflict,
}

#[derive(Debug, Clone)]
pub enum SubmissionStore {
    Rest(RestStore),
    Postgres(PgStore),
}

impl SubmissionStore {
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        let store = match config {
            StoreConfig::Rest(rest_config) => {
                info!("{:<20} - Using the REST submission store", "SubmissionStore");
                Self::Rest(RestStore::new(&rest_config.url, rest_config.service_key.clone())?)
            }
            StoreConfig::Postgres(db_config) => {
                info!(
                    "{:<20} - Using the Postgres submission store",
                    "SubmissionStore"
                );
                let store = PgStore::init(db_config).await?;
                if db_config.run_migrations {
                    store.migrate().await?;
                }
                Self::Postgres(store)
            }
        };

        Ok(store)
    }

    /// Inserts the submission and returns the stored row, or `InsertOutcome::Conflict` if the email
    /// is already registered.
    pub async fn insert_submission(&self, submission: &NewSubmission) -> Result<InsertOutcome> {
        match self {
            Self::Rest(store) => store.insert_submission(submission).await,
            Self::Postgres(store) => store.insert_submission(submission).await,
        }
    }
}

// ###################################
// ->   ERROR
// ###################################
pub type Result<T> = core::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to parse the store url: {0}")]
    UrlParsing(String),
    #[error("failed to create db pool: {0}")]
    FailToCreatePool(String),
    #[error("store rejected the insert with status {status}: {message} (code: {code:?})")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("sqlx migration error: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),
}
