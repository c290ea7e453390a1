//! Resume aggregate: a resume plus the contact info, work history, education
//! and skills that exist only in relation to it.

pub mod analytics;
pub mod handlers;
pub mod payload;
pub mod repository;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::resume::{ContactInfoRow, EducationRow, ResumeRow, SkillRow, WorkExperienceRow};
use crate::permissions::Owned;

#[derive(Debug, Clone, Serialize)]
pub struct WorkExperienceView {
    #[serde(flatten)]
    pub entry: WorkExperienceRow,
    pub is_current: bool,
}

impl From<WorkExperienceRow> for WorkExperienceView {
    fn from(entry: WorkExperienceRow) -> Self {
        let is_current = entry.is_current();
        Self { entry, is_current }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillView {
    #[serde(flatten)]
    pub skill: SkillRow,
    pub category_display: &'static str,
}

impl From<SkillRow> for SkillView {
    fn from(skill: SkillRow) -> Self {
        let category_display = skill.category.display();
        Self {
            skill,
            category_display,
        }
    }
}

/// The fully populated resume returned by every resume endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeAggregate {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub title: String,
    pub contact_info: Option<ContactInfoRow>,
    /// Newest start date first.
    pub work_experiences: Vec<WorkExperienceView>,
    /// Newest graduation first.
    pub education_entries: Vec<EducationRow>,
    /// By category, then name.
    pub skills: Vec<SkillView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeAggregate {
    pub fn assemble(
        resume: ResumeRow,
        contact_info: Option<ContactInfoRow>,
        work_experiences: Vec<WorkExperienceRow>,
        education_entries: Vec<EducationRow>,
        skills: Vec<SkillRow>,
    ) -> Self {
        Self {
            id: resume.id,
            user_id: resume.user_id,
            title: resume.title,
            contact_info,
            work_experiences: work_experiences.into_iter().map(Into::into).collect(),
            education_entries,
            skills: skills.into_iter().map(Into::into).collect(),
            created_at: resume.created_at,
            updated_at: resume.updated_at,
        }
    }
}

impl Owned for ResumeAggregate {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// Body of `GET /resumes/{id}/export/`.
#[derive(Debug, Serialize)]
pub struct ResumeExport {
    pub export_date: DateTime<Utc>,
    pub user: String,
    pub resume_data: ResumeAggregate,
}
