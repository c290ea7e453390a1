//! Persistence for the resume aggregate.
//!
//! Create and update run inside one transaction each: either the resume and all of
//! its sections are written, or nothing is.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ContactInfoRow, EducationRow, ResumeRow, SkillRow, WorkExperienceRow};
use crate::resumes::analytics::ResumeCounts;
use crate::resumes::payload::{
    ContactInfoPayload, EducationPayload, NewResume, ResumeChanges, SkillPayload,
    WorkExperiencePayload,
};
use crate::resumes::ResumeAggregate;

/// Every lookup is scoped to the owner: another user's id behaves exactly like a
/// missing id.
#[async_trait]
pub trait ResumeRepository: Send + Sync {
    /// All of a user's resumes, most recently updated first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ResumeAggregate>, AppError>;

    async fn get_for_user(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ResumeAggregate>, AppError>;

    /// The bare resume row without its sections.
    async fn find_row_for_user(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ResumeRow>, AppError>;

    async fn create(&self, user_id: Uuid, new: NewResume) -> Result<ResumeAggregate, AppError>;

    /// Applies validated changes. Sections present in `changes` are replaced
    /// wholesale, so their row ids change on every update.
    async fn update(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
        changes: ResumeChanges,
    ) -> Result<ResumeAggregate, AppError>;

    /// Deletes a resume and every section under it. Returns false when no resume
    /// with that id belongs to the user.
    async fn delete(&self, resume_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    /// Per-resume child counts for the analytics endpoint.
    async fn counts_for_user(&self, user_id: Uuid) -> Result<Vec<ResumeCounts>, AppError>;
}

pub struct PgResumeRepository {
    pool: PgPool,
}

impl PgResumeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeRepository for PgResumeRepository {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ResumeAggregate>, AppError> {
        let resumes = sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        load_aggregates(&mut conn, resumes).await
    }

    async fn get_for_user(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ResumeAggregate>, AppError> {
        let Some(resume) = self.find_row_for_user(resume_id, user_id).await? else {
            return Ok(None);
        };
        let mut conn = self.pool.acquire().await?;
        Ok(load_aggregates(&mut conn, vec![resume]).await?.pop())
    }

    async fn find_row_for_user(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ResumeRow>, AppError> {
        Ok(sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE id = $1 AND user_id = $2",
        )
        .bind(resume_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create(&self, user_id: Uuid, new: NewResume) -> Result<ResumeAggregate, AppError> {
        let mut tx = self.pool.begin().await?;

        let resume = sqlx::query_as::<_, ResumeRow>(
            "INSERT INTO resumes (id, user_id, title) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&new.title)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(contact) = &new.contact_info {
            upsert_contact_info(&mut tx, resume.id, contact).await?;
        }
        insert_work_experiences(&mut tx, resume.id, &new.work_experiences).await?;
        insert_education_entries(&mut tx, resume.id, &new.education_entries).await?;
        insert_skills(&mut tx, resume.id, &new.skills).await?;

        let aggregate = load_aggregates(&mut tx, vec![resume]).await?.pop();
        tx.commit().await?;

        let aggregate = aggregate.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("created resume vanished before commit"))
        })?;
        info!(
            resume_id = %aggregate.id,
            user_id = %user_id,
            work_experiences = aggregate.work_experiences.len(),
            skills = aggregate.skills.len(),
            "Created resume"
        );
        Ok(aggregate)
    }

    async fn update(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
        changes: ResumeChanges,
    ) -> Result<ResumeAggregate, AppError> {
        let mut tx = self.pool.begin().await?;

        let resume = sqlx::query_as::<_, ResumeRow>(
            r#"
            UPDATE resumes
            SET title = COALESCE($3, title), updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(resume_id)
        .bind(user_id)
        .bind(changes.title.as_deref())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;

        if let Some(contact) = &changes.contact_info {
            upsert_contact_info(&mut tx, resume.id, contact).await?;
        }
        if let Some(entries) = &changes.work_experiences {
            sqlx::query("DELETE FROM work_experiences WHERE resume_id = $1")
                .bind(resume.id)
                .execute(&mut *tx)
                .await?;
            insert_work_experiences(&mut tx, resume.id, entries).await?;
        }
        if let Some(entries) = &changes.education_entries {
            sqlx::query("DELETE FROM education_entries WHERE resume_id = $1")
                .bind(resume.id)
                .execute(&mut *tx)
                .await?;
            insert_education_entries(&mut tx, resume.id, entries).await?;
        }
        if let Some(skills) = &changes.skills {
            sqlx::query("DELETE FROM skills WHERE resume_id = $1")
                .bind(resume.id)
                .execute(&mut *tx)
                .await?;
            insert_skills(&mut tx, resume.id, skills).await?;
        }

        let aggregate = load_aggregates(&mut tx, vec![resume]).await?.pop();
        tx.commit().await?;

        info!(resume_id = %resume_id, user_id = %user_id, "Updated resume");
        aggregate.ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
    }

    async fn delete(&self, resume_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        // Children go with it through `ON DELETE CASCADE`.
        let result = sqlx::query("DELETE FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(resume_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            info!(resume_id = %resume_id, user_id = %user_id, "Deleted resume");
        }
        Ok(result.rows_affected() > 0)
    }

    async fn counts_for_user(&self, user_id: Uuid) -> Result<Vec<ResumeCounts>, AppError> {
        Ok(sqlx::query_as::<_, ResumeCounts>(
            r#"
            SELECT r.id, r.title, r.updated_at,
                   (SELECT COUNT(*) FROM work_experiences w WHERE w.resume_id = r.id) AS work_experiences,
                   (SELECT COUNT(*) FROM education_entries e WHERE e.resume_id = r.id) AS education_entries,
                   (SELECT COUNT(*) FROM skills s WHERE s.resume_id = r.id) AS skills
            FROM resumes r
            WHERE r.user_id = $1
            ORDER BY r.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

async fn upsert_contact_info(
    conn: &mut PgConnection,
    resume_id: Uuid,
    contact: &ContactInfoPayload,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO contact_infos (id, resume_id, full_name, phone, email, location)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (resume_id) DO UPDATE
        SET full_name = EXCLUDED.full_name,
            phone = EXCLUDED.phone,
            email = EXCLUDED.email,
            location = EXCLUDED.location,
            updated_at = now()
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(resume_id)
    .bind(&contact.full_name)
    .bind(&contact.phone)
    .bind(&contact.email)
    .bind(&contact.location)
    .execute(conn)
    .await?;
    Ok(())
}

async fn insert_work_experiences(
    conn: &mut PgConnection,
    resume_id: Uuid,
    entries: &[WorkExperiencePayload],
) -> Result<(), AppError> {
    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO work_experiences (id, resume_id, company, role, start_date, end_date, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(resume_id)
        .bind(&entry.company)
        .bind(&entry.role)
        .bind(entry.start_date)
        .bind(entry.end_date)
        .bind(&entry.description)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_education_entries(
    conn: &mut PgConnection,
    resume_id: Uuid,
    entries: &[EducationPayload],
) -> Result<(), AppError> {
    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO education_entries (id, resume_id, institution, degree, graduation_date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(resume_id)
        .bind(&entry.institution)
        .bind(&entry.degree)
        .bind(entry.graduation_date)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_skills(
    conn: &mut PgConnection,
    resume_id: Uuid,
    skills: &[SkillPayload],
) -> Result<(), AppError> {
    for skill in skills {
        sqlx::query("INSERT INTO skills (id, resume_id, name, category) VALUES ($1, $2, $3, $4)")
            .bind(Uuid::new_v4())
            .bind(resume_id)
            .bind(&skill.name)
            .bind(skill.category.as_str())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Loads every section for the given resumes with one query per section,
/// preserving the order of `resumes`.
async fn load_aggregates(
    conn: &mut PgConnection,
    resumes: Vec<ResumeRow>,
) -> Result<Vec<ResumeAggregate>, AppError> {
    if resumes.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = resumes.iter().map(|r| r.id).collect();

    let contacts = sqlx::query_as::<_, ContactInfoRow>(
        "SELECT * FROM contact_infos WHERE resume_id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;
    let work = sqlx::query_as::<_, WorkExperienceRow>(
        "SELECT * FROM work_experiences WHERE resume_id = ANY($1) ORDER BY start_date DESC, created_at",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;
    let education = sqlx::query_as::<_, EducationRow>(
        "SELECT * FROM education_entries WHERE resume_id = ANY($1) ORDER BY graduation_date DESC, created_at",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;
    let skills = sqlx::query_as::<_, SkillRow>(
        "SELECT * FROM skills WHERE resume_id = ANY($1) ORDER BY category, name",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut contacts: HashMap<Uuid, ContactInfoRow> =
        contacts.into_iter().map(|c| (c.resume_id, c)).collect();
    let mut work = group_by_resume(work, |w| w.resume_id);
    let mut education = group_by_resume(education, |e| e.resume_id);
    let mut skills = group_by_resume(skills, |s| s.resume_id);

    Ok(resumes
        .into_iter()
        .map(|resume| {
            let id = resume.id;
            ResumeAggregate::assemble(
                resume,
                contacts.remove(&id),
                work.remove(&id).unwrap_or_default(),
                education.remove(&id).unwrap_or_default(),
                skills.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}

/// Buckets rows by parent id, keeping the query's ordering inside each bucket.
fn group_by_resume<T>(rows: Vec<T>, key: impl Fn(&T) -> Uuid) -> HashMap<Uuid, Vec<T>> {
    let mut grouped: HashMap<Uuid, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(key(&row)).or_default().push(row);
    }
    grouped
}


#[cfg(test)]
mod tests {
    use super::fakes::MemoryResumeRepository;
    use super::*;
    use crate::resumes::payload::ResumePayload;
    use serde_json::json;

    fn new_resume(value: serde_json::Value) -> NewResume {
        serde_json::from_value::<ResumePayload>(value)
            .unwrap()
            .into_new_resume()
            .unwrap()
    }

    #[test]
    fn test_group_by_resume_preserves_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let rows = vec![(a, 1), (b, 2), (a, 3), (a, 4)];
        let grouped = group_by_resume(rows, |(id, _)| *id);
        let a_values: Vec<_> = grouped[&a].iter().map(|(_, v)| *v).collect();
        assert_eq!(a_values, [1, 3, 4]);
        assert_eq!(grouped[&b].len(), 1);
    }

    #[tokio::test]
    async fn test_skill_names_are_unique_per_resume() {
        let repo = MemoryResumeRepository::default();
        let user_id = Uuid::new_v4();
        let resume = repo
            .create(user_id, new_resume(json!({"title": "CV", "skills": [{"name": "Rust"}]})))
            .await
            .unwrap();

        // Validation rejects duplicates up front; this is what the table itself enforces.
        let duplicated = ResumeChanges {
            skills: Some(vec![
                SkillPayload {
                    name: "Go".to_string(),
                    category: Default::default(),
                },
                SkillPayload {
                    name: "Go".to_string(),
                    category: Default::default(),
                },
            ]),
            ..Default::default()
        };
        let err = repo.update(resume.id, user_id, duplicated).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFields(ref f) if f.contains("skills")));

        // The failed update changed nothing.
        let skills: Vec<_> = repo
            .stored(resume.id)
            .unwrap()
            .skills
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(skills, ["Rust"]);

        // The same name on a different resume is fine.
        assert!(repo
            .create(user_id, new_resume(json!({"title": "CV 2", "skills": [{"name": "Rust"}]})))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_delete_is_scoped_to_owner() {
        let repo = MemoryResumeRepository::default();
        let owner = Uuid::new_v4();
        let resume = repo
            .create(owner, new_resume(json!({"title": "CV"})))
            .await
            .unwrap();

        assert!(!repo.delete(resume.id, Uuid::new_v4()).await.unwrap());
        assert!(repo.stored(resume.id).is_some());
        assert!(repo.delete(resume.id, owner).await.unwrap());
        assert!(repo.stored(resume.id).is_none());
        assert!(!repo.delete(resume.id, owner).await.unwrap());
    }
}
