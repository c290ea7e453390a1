//! Per-request authorization policies.
//!
//! Handlers compose these explicitly: authentication comes from the `AuthUser`
//! extractor, then one or more of the checks below run before any side effect.
//! Every failure is a bare 403 that says nothing about whether the object exists.

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::models::upload::UploadedResume;
use crate::models::user::User;

pub const PREMIUM_REQUIRED: &str = "Premium subscription required to access this feature.";
const NOT_OWNER: &str = "You do not have permission to perform this action.";

/// Whether the request only reads state or mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Anything owned by exactly one user. Child rows are owned through their resume,
/// so the resume aggregate implements this rather than the rows themselves.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for ResumeRow {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for UploadedResume {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// Premium gate.
pub fn require_premium(user: &User) -> Result<(), AppError> {
    if user.is_premium() {
        Ok(())
    } else {
        Err(AppError::Forbidden(PREMIUM_REQUIRED.to_string()))
    }
}

/// Ownership check.
pub fn check_ownership(user: &User, object: &impl Owned) -> Result<(), AppError> {
    if object.owner_id() == user.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(NOT_OWNER.to_string()))
    }
}

/// Reads are open to the owner; writes additionally need the premium tier.
pub fn premium_or_read_only(
    user: &User,
    access: Access,
    object: &impl Owned,
) -> Result<(), AppError> {
    if access == Access::Write {
        require_premium(user)?;
    }
    check_ownership(user, object)
}
