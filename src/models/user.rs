use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row of the `user` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a user with a fresh v4 id, stamped with the current time
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_timestamp(name, Utc::now())
    }

    /// Create a user with a fresh v4 id and an explicit creation time
    pub fn with_timestamp(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at,
        }
    }
}
