use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::UnknownVariant;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ContactInfoRow {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub resume_id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub location: String,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkExperienceRow {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub resume_id: Uuid,
    pub company: String,
    pub role: String,
    pub start_date: NaiveDate,
    /// `None` means the position is current.
    pub end_date: Option<NaiveDate>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkExperienceRow {
    pub fn is_current(&self) -> bool {
        self.end_date.is_none()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EducationRow {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub resume_id: Uuid,
    pub institution: String,
    pub degree: String,
    pub graduation_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    #[default]
    Technical,
    Soft,
    Language,
    Other,
}

impl SkillCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::Technical => "technical",
            SkillCategory::Soft => "soft",
            SkillCategory::Language => "language",
            SkillCategory::Other => "other",
        }
    }

    /// Human-readable label shown next to the stored value.
    pub fn display(&self) -> &'static str {
        match self {
            SkillCategory::Technical => "Technical",
            SkillCategory::Soft => "Soft",
            SkillCategory::Language => "Language",
            SkillCategory::Other => "Other",
        }
    }
}

impl TryFrom<String> for SkillCategory {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "technical" => Ok(SkillCategory::Technical),
            "soft" => Ok(SkillCategory::Soft),
            "language" => Ok(SkillCategory::Language),
            "other" => Ok(SkillCategory::Other),
            _ => Err(UnknownVariant {
                kind: "skill category",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SkillRow {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub resume_id: Uuid,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub category: SkillCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
