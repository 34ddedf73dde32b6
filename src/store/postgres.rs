use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use super::{
    InsertOutcome, NewSubmission, Result, StoreError, StoredSubmission, UNIQUE_VIOLATION_CODE,
};
use crate::config::DbConfig;

#[derive(Clone, Debug)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn init(db_config: &DbConfig) -> Result<Self> {
        info!("{:<20} - Initializing the DB pool", "PgStore");
        let max_cons = if cfg!(test) { 1 } else { 5 };

        let db_pool = PgPoolOptions::new()
            .max_connections(max_cons)
            .acquire_timeout(Duration::from_millis(500))
            .connect_with(db_config.connection_options())
            .await
            .map_err(|er| StoreError::FailToCreatePool(er.to_string()))?;

        Ok(Self { db: db_pool })
    }

    /// Creates the `email_submissions` table if it doesn't exist yet.
    pub async fn migrate(&self) -> Result<()> {
        info!("{:<20} - Running migrations", "PgStore");
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }

    pub async fn insert_submission(&self, submission: &NewSubmission) -> Result<InsertOutcome> {
        let query_result = sqlx::query_as::<_, StoredSubmission>(
            r#"
            INSERT INTO email_submissions (email, ip_address)
            VALUES ($1, $2)
            RETURNING email, ip_address
        "#,
        )
        .bind(submission.email.as_ref())
        .bind(submission.ip_address.as_ref())
        .fetch_one(&self.db)
        .await;

        match query_result {
            Ok(stored) => Ok(InsertOutcome::Inserted(stored)),
            Err(error) if is_unique_violation(&error) => Ok(InsertOutcome::Conflict),
            Err(error) => Err(error.into()),
        }
    }
}

/// Checks whether the query failed because the email was already in the table.
fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(er) => er.code().as_deref() == Some(UNIQUE_VIOLATION_CODE),
        _ => false,
    }
}
