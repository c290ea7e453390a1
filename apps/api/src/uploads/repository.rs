use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::upload::{UploadStatus, UploadedResume};

/// Persistence for upload records.
#[async_trait]
pub trait UploadRepository: Send + Sync {
    /// Inserts a new record in `pending`.
    async fn create(
        &self,
        id: Uuid,
        user_id: Uuid,
        file_key: &str,
        original_filename: &str,
    ) -> Result<UploadedResume, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<UploadedResume>, AppError>;

    async fn get_for_user(&self, id: Uuid, user_id: Uuid)
        -> Result<Option<UploadedResume>, AppError>;

    /// Moves the record to `to` only if it is currently in one of `to`'s
    /// predecessors, writing `results` when given. Returns whether the row changed.
    async fn transition(
        &self,
        id: Uuid,
        to: UploadStatus,
        results: Option<Value>,
    ) -> Result<bool, AppError>;
}

pub struct PgUploadRepository {
    pool: PgPool,
}

impl PgUploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UploadRepository for PgUploadRepository {
    async fn create(
        &self,
        id: Uuid,
        user_id: Uuid,
        file_key: &str,
        original_filename: &str,
    ) -> Result<UploadedResume, AppError> {
        Ok(sqlx::query_as::<_, UploadedResume>(
            r#"
            INSERT INTO uploaded_resumes (id, user_id, file_key, original_filename, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(file_key)
        .bind(original_filename)
        .bind(UploadStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<UploadedResume>, AppError> {
        Ok(
            sqlx::query_as::<_, UploadedResume>("SELECT * FROM uploaded_resumes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn get_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<UploadedResume>, AppError> {
        Ok(sqlx::query_as::<_, UploadedResume>(
            "SELECT * FROM uploaded_resumes WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn transition(
        &self,
        id: Uuid,
        to: UploadStatus,
        results: Option<Value>,
    ) -> Result<bool, AppError> {
        let from: Vec<&str> = to.predecessors().iter().map(UploadStatus::as_str).collect();
        let result = sqlx::query(
            r#"
            UPDATE uploaded_resumes
            SET status = $2,
                analysis_results = COALESCE($3, analysis_results),
                updated_at = now()
            WHERE id = $1 AND status = ANY($4)
            "#,
        )
        .bind(id)
        .bind(to.as_str())
        .bind(results)
        .bind(&from)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    /// Applies the same guarded-transition rule as the SQL `WHERE status = ANY(..)`.
    #[derive(Default)]
    pub struct MemoryUploadRepository {
        pub records: Mutex<HashMap<Uuid, UploadedResume>>,
        /// When set, every `transition` call fails.
        pub fail_writes: Mutex<bool>,
        /// When set, every `create` call fails.
        pub fail_creates: Mutex<bool>,
    }

    impl MemoryUploadRepository {
        pub fn status_of(&self, id: Uuid) -> Option<UploadStatus> {
            self.records.lock().unwrap().get(&id).map(|r| r.status)
        }

        pub fn results_of(&self, id: Uuid) -> Option<Value> {
            self.records
                .lock()
                .unwrap()
                .get(&id)
                .and_then(|r| r.analysis_results.clone())
        }
    }

    #[async_trait]
    impl UploadRepository for MemoryUploadRepository {
        async fn create(
            &self,
            id: Uuid,
            user_id: Uuid,
            file_key: &str,
            original_filename: &str,
        ) -> Result<UploadedResume, AppError> {
            if *self.fail_creates.lock().unwrap() {
                return Err(AppError::Internal(anyhow::anyhow!("datastore unavailable")));
            }
            let record = UploadedResume {
                id,
                user_id,
                file_key: file_key.to_string(),
                original_filename: original_filename.to_string(),
                status: UploadStatus::Pending,
                analysis_results: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            self.records.lock().unwrap().insert(id, record.clone());
            Ok(record)
        }

        async fn get(&self, id: Uuid) -> Result<Option<UploadedResume>, AppError> {
            Ok(self.records.lock().unwrap().get(&id).cloned())
        }

        async fn get_for_user(
            &self,
            id: Uuid,
            user_id: Uuid,
        ) -> Result<Option<UploadedResume>, AppError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .get(&id)
                .filter(|r| r.user_id == user_id)
                .cloned())
        }

        async fn transition(
            &self,
            id: Uuid,
            to: UploadStatus,
            results: Option<Value>,
        ) -> Result<bool, AppError> {
            if *self.fail_writes.lock().unwrap() {
                return Err(AppError::Internal(anyhow::anyhow!("datastore unavailable")));
            }
            let mut records = self.records.lock().unwrap();
            match records.get_mut(&id) {
                Some(record) if record.status.can_transition_to(to) => {
                    record.status = to;
                    if results.is_some() {
                        record.analysis_results = results;
                    }
                    record.updated_at = Utc::now();
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }
}
