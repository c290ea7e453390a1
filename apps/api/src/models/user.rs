use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::UnknownVariant;

/// Subscription tier. Only `Premium` may mutate resumes or use text enhancement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Free,
    Premium,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Free => "free",
            SubscriptionStatus::Premium => "premium",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

impl TryFrom<String> for SubscriptionStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "free" => Ok(SubscriptionStatus::Free),
            "premium" => Ok(SubscriptionStatus::Premium),
            "expired" => Ok(SubscriptionStatus::Expired),
            _ => Err(UnknownVariant {
                kind: "subscription_status",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub subscription_status: SubscriptionStatus,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_premium(&self) -> bool {
        self.subscription_status == SubscriptionStatus::Premium
    }

    /// The resume builder is a premium feature.
    pub fn can_use_builder(&self) -> bool {
        self.is_premium()
    }
}

/// Public profile returned by the auth endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub subscription_status: SubscriptionStatus,
    pub is_premium: bool,
    pub can_use_builder: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            subscription_status: user.subscription_status,
            is_premium: user.is_premium(),
            can_use_builder: user.can_use_builder(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_user(status: SubscriptionStatus) -> User {
    User {
        id: Uuid::new_v4(),
        username: "jdoe".to_string(),
        email: "jdoe@example.com".to_string(),
        password_hash: "$2b$12$invalid".to_string(),
        subscription_status: status,
        stripe_customer_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
