//! Request payloads for the resume endpoints and their validation.
//!
//! Validation normalizes (trims) every string and collects all field errors
//! before returning, so clients see every problem in one round trip.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::{AppError, FieldErrors};
use crate::models::resume::SkillCategory;
use crate::validation::{self, REQUIRED};

const MAX_TITLE_LEN: usize = 200;
const MAX_NAME_LEN: usize = 200;
const MAX_PHONE_LEN: usize = 20;
const MAX_SKILL_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResumePayload {
    pub title: Option<String>,
    pub contact_info: Option<ContactInfoPayload>,
    pub work_experiences: Option<Vec<WorkExperiencePayload>>,
    pub education_entries: Option<Vec<EducationPayload>>,
    pub skills: Option<Vec<SkillPayload>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactInfoPayload {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkExperiencePayload {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EducationPayload {
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub degree: String,
    pub graduation_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkillPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: SkillCategory,
}

/// A validated create request.
#[derive(Debug, Clone)]
pub struct NewResume {
    pub title: String,
    pub contact_info: Option<ContactInfoPayload>,
    pub work_experiences: Vec<WorkExperiencePayload>,
    pub education_entries: Vec<EducationPayload>,
    pub skills: Vec<SkillPayload>,
}

/// A validated update request.
///
/// Each child section is `Some` only when the payload carried a non-empty list;
/// that section is then deleted and recreated wholesale. `None` leaves it untouched.
/// Two concurrent updates of the same section race: the last commit wins and the
/// other writer's rows are lost.
#[derive(Debug, Clone, Default)]
pub struct ResumeChanges {
    pub title: Option<String>,
    pub contact_info: Option<ContactInfoPayload>,
    pub work_experiences: Option<Vec<WorkExperiencePayload>>,
    pub education_entries: Option<Vec<EducationPayload>>,
    pub skills: Option<Vec<SkillPayload>>,
}

impl ResumePayload {
    pub fn into_new_resume(self) -> Result<NewResume, AppError> {
        let mut errors = FieldErrors::new();
        let title = match &self.title {
            Some(title) => validation::required_text(&mut errors, "title", title, MAX_TITLE_LEN),
            None => {
                errors.add("title", REQUIRED);
                String::new()
            }
        };
        let sections = self.validate_sections(&mut errors);
        errors.into_result()?;

        Ok(NewResume {
            title,
            contact_info: sections.contact_info,
            work_experiences: sections.work_experiences.unwrap_or_default(),
            education_entries: sections.education_entries.unwrap_or_default(),
            skills: sections.skills.unwrap_or_default(),
        })
    }

    /// `partial` is PATCH semantics: the title may be omitted.
    pub fn into_changes(self, partial: bool) -> Result<ResumeChanges, AppError> {
        let mut errors = FieldErrors::new();
        let title = match &self.title {
            Some(title) => Some(validation::required_text(
                &mut errors,
                "title",
                title,
                MAX_TITLE_LEN,
            )),
            None if partial => None,
            None => {
                errors.add("title", REQUIRED);
                None
            }
        };
        let sections = self.validate_sections(&mut errors);
        errors.into_result()?;

        Ok(ResumeChanges {
            title,
            contact_info: sections.contact_info,
            work_experiences: non_empty(sections.work_experiences),
            education_entries: non_empty(sections.education_entries),
            skills: non_empty(sections.skills),
        })
    }

    fn validate_sections(&self, errors: &mut FieldErrors) -> Sections {
        let contact_info = self
            .contact_info
            .as_ref()
            .map(|c| validate_contact(errors, c));
        let work_experiences = self.work_experiences.as_ref().map(|list| {
            list.iter()
                .enumerate()
                .map(|(i, w)| validate_work(errors, i, w))
                .collect()
        });
        let education_entries = self.education_entries.as_ref().map(|list| {
            list.iter()
                .enumerate()
                .map(|(i, e)| validate_education(errors, i, e))
                .collect()
        });
        let skills = self
            .skills
            .as_ref()
            .map(|list| validate_skills(errors, list));

        Sections {
            contact_info,
            work_experiences,
            education_entries,
            skills,
        }
    }
}

struct Sections {
    contact_info: Option<ContactInfoPayload>,
    work_experiences: Option<Vec<WorkExperiencePayload>>,
    education_entries: Option<Vec<EducationPayload>>,
    skills: Option<Vec<SkillPayload>>,
}

fn non_empty<T>(list: Option<Vec<T>>) -> Option<Vec<T>> {
    list.filter(|items| !items.is_empty())
}

fn validate_contact(errors: &mut FieldErrors, c: &ContactInfoPayload) -> ContactInfoPayload {
    ContactInfoPayload {
        full_name: validation::required_text(
            errors,
            "contact_info.full_name",
            &c.full_name,
            MAX_NAME_LEN,
        ),
        phone: validation::optional_text(errors, "contact_info.phone", &c.phone, MAX_PHONE_LEN),
        email: validation::email(errors, "contact_info.email", &c.email),
        location: validation::optional_text(
            errors,
            "contact_info.location",
            &c.location,
            MAX_NAME_LEN,
        ),
    }
}

fn validate_work(
    errors: &mut FieldErrors,
    index: usize,
    w: &WorkExperiencePayload,
) -> WorkExperiencePayload {
    let path = |field: &str| format!("work_experiences[{index}].{field}");
    WorkExperiencePayload {
        company: validation::required_text(errors, &path("company"), &w.company, MAX_NAME_LEN),
        role: validation::required_text(errors, &path("role"), &w.role, MAX_NAME_LEN),
        start_date: w.start_date,
        end_date: w.end_date,
        description: validation::required_text(
            errors,
            &path("description"),
            &w.description,
            usize::MAX,
        ),
    }
}

fn validate_education(
    errors: &mut FieldErrors,
    index: usize,
    e: &EducationPayload,
) -> EducationPayload {
    let path = |field: &str| format!("education_entries[{index}].{field}");
    EducationPayload {
        institution: validation::required_text(
            errors,
            &path("institution"),
            &e.institution,
            MAX_NAME_LEN,
        ),
        degree: validation::required_text(errors, &path("degree"), &e.degree, MAX_NAME_LEN),
        graduation_date: e.graduation_date,
    }
}

/// Skill names must be unique within one resume.
fn validate_skills(errors: &mut FieldErrors, skills: &[SkillPayload]) -> Vec<SkillPayload> {
    let mut seen = HashSet::new();
    skills
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let field = format!("skills[{i}].name");
            let name = validation::required_text(errors, &field, &s.name, MAX_SKILL_NAME_LEN);
            if !name.is_empty() && !seen.insert(name.clone()) {
                errors.add(field, format!("Duplicate skill name '{name}' in this resume."));
            }
            SkillPayload {
                name,
                category: s.category,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> ResumePayload {
        serde_json::from_value(value).unwrap()
    }

    fn field_errors(err: AppError) -> FieldErrors {
        match err {
            AppError::InvalidFields(fields) => fields,
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[test]
    fn test_create_keeps_every_work_experience() {
        let new = payload(json!({
            "title": "Platform Engineer",
            "contact_info": {"full_name": "John Doe", "email": "john@example.com"},
            "work_experiences": [
                {"company": "Acme", "role": "SRE", "start_date": "2019-02-01",
                 "end_date": "2021-03-31", "description": "Ran on-call for 40 services"},
                {"company": "Globex", "role": "Staff Engineer", "start_date": "2021-04-01",
                 "description": "Own the deploy pipeline"},
                {"company": "Initech", "role": "Intern", "start_date": "2018-06-01",
                 "end_date": "2018-09-01", "description": "TPS reports"}
            ],
            "skills": [{"name": "Rust"}, {"name": "Leadership", "category": "soft"}]
        }))
        .into_new_resume()
        .unwrap();

        assert_eq!(new.title, "Platform Engineer");
        assert_eq!(new.work_experiences.len(), 3);
        assert!(new.work_experiences[1].end_date.is_none());
        assert_eq!(new.skills[0].category, SkillCategory::Technical);
        assert_eq!(new.skills[1].category, SkillCategory::Soft);
        assert!(new.education_entries.is_empty());
    }

    #[test]
    fn test_create_requires_title() {
        let fields = field_errors(payload(json!({})).into_new_resume().unwrap_err());
        assert_eq!(fields.get("title").unwrap(), [REQUIRED.to_string()]);
    }

    #[test]
    fn test_nested_errors_are_reported_by_path() {
        let fields = field_errors(
            payload(json!({
                "title": "CV",
                "contact_info": {"full_name": "", "email": "not-an-email"},
                "work_experiences": [
                    {"company": "Acme", "role": "Dev", "start_date": "2020-01-01", "description": "x"},
                    {"company": " ", "role": "Dev", "start_date": "2020-01-01", "description": "x"}
                ],
                "education_entries": [
                    {"institution": "MIT", "degree": "", "graduation_date": "2018-06-01"}
                ]
            }))
            .into_new_resume()
            .unwrap_err(),
        );

        assert!(fields.contains("contact_info.full_name"));
        assert!(fields.contains("contact_info.email"));
        assert!(fields.contains("work_experiences[1].company"));
        assert!(!fields.contains("work_experiences[0].company"));
        assert!(fields.contains("education_entries[0].degree"));
    }

    #[test]
    fn test_duplicate_skill_names_are_rejected() {
        let fields = field_errors(
            payload(json!({
                "title": "CV",
                "skills": [{"name": "Rust"}, {"name": "Go"}, {"name": " Rust "}]
            }))
            .into_new_resume()
            .unwrap_err(),
        );
        assert!(fields.contains("skills[2].name"));
        assert!(!fields.contains("skills[0].name"));
    }

    #[test]
    fn test_update_with_skills_replaces_section() {
        let changes = payload(json!({
            "title": "CV v2",
            "skills": [{"name": "Kubernetes"}, {"name": "Terraform"}]
        }))
        .into_changes(false)
        .unwrap();

        let skills = changes.skills.expect("skills section should be replaced");
        let names: Vec<_> = skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Kubernetes", "Terraform"]);
        assert!(changes.work_experiences.is_none());
    }

    #[test]
    fn test_update_with_empty_or_absent_lists_leaves_sections_untouched() {
        let changes = payload(json!({"title": "CV", "skills": [], "education_entries": []}))
            .into_changes(false)
            .unwrap();
        assert!(changes.skills.is_none());
        assert!(changes.education_entries.is_none());
        assert!(changes.work_experiences.is_none());
        assert!(changes.contact_info.is_none());
    }

    #[test]
    fn test_put_requires_title_but_patch_does_not() {
        let put = payload(json!({"skills": [{"name": "SQL"}]})).into_changes(false);
        assert!(field_errors(put.unwrap_err()).contains("title"));

        let patch = payload(json!({"skills": [{"name": "SQL"}]}))
            .into_changes(true)
            .unwrap();
        assert!(patch.title.is_none());
        assert_eq!(patch.skills.unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_skill_category_fails_to_deserialize() {
        let result: Result<ResumePayload, _> = serde_json::from_value(json!({
            "title": "CV",
            "skills": [{"name": "Rust", "category": "hobby"}]
        }));
        assert!(result.is_err());
    }
}
