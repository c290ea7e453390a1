//! Per-user totals over the resume aggregate.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;

/// One resume with the size of each of its sections.
#[derive(Debug, Clone, FromRow)]
pub struct ResumeCounts {
    pub id: Uuid,
    pub title: String,
    pub updated_at: DateTime<Utc>,
    pub work_experiences: i64,
    pub education_entries: i64,
    pub skills: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentResume {
    pub id: Uuid,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub total_resumes: i64,
    pub total_work_experiences: i64,
    pub total_education_entries: i64,
    pub total_skills: i64,
    pub most_recent_resume: Option<RecentResume>,
}

pub fn summarize(rows: &[ResumeCounts]) -> AnalyticsReport {
    let most_recent_resume = rows
        .iter()
        .max_by_key(|r| r.updated_at)
        .map(|r| RecentResume {
            id: r.id,
            title: r.title.clone(),
            updated_at: r.updated_at,
        });

    AnalyticsReport {
        total_resumes: rows.len() as i64,
        total_work_experiences: rows.iter().map(|r| r.work_experiences).sum(),
        total_education_entries: rows.iter().map(|r| r.education_entries).sum(),
        total_skills: rows.iter().map(|r| r.skills).sum(),
        most_recent_resume,
    }
}

/// GET /analytics/
pub async fn handle_analytics(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<AnalyticsReport>, AppError> {
    let rows = state.resumes.counts_for_user(user.id).await?;
    Ok(Json(summarize(&rows)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn counts(title: &str, age_days: i64, work: i64, edu: i64, skills: i64) -> ResumeCounts {
        ResumeCounts {
            id: Uuid::new_v4(),
            title: title.to_string(),
            updated_at: Utc::now() - Duration::days(age_days),
            work_experiences: work,
            education_entries: edu,
            skills,
        }
    }

    #[test]
    fn test_empty_user_has_zero_totals_and_no_recent_resume() {
        let report = summarize(&[]);
        assert_eq!(report, AnalyticsReport::default());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["most_recent_resume"].is_null());
        assert_eq!(json["total_resumes"], 0);
    }

    #[test]
    fn test_totals_sum_every_section() {
        let rows = vec![
            counts("Backend", 10, 3, 1, 8),
            counts("Frontend", 2, 2, 1, 5),
            counts("Draft", 30, 0, 0, 0),
        ];
        let report = summarize(&rows);
        assert_eq!(report.total_resumes, 3);
        assert_eq!(report.total_work_experiences, 5);
        assert_eq!(report.total_education_entries, 2);
        assert_eq!(report.total_skills, 13);
        assert_eq!(report.most_recent_resume.unwrap().title, "Frontend");
    }
}
