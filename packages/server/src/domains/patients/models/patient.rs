use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::PatientId;

/// Patient record as the reminder engine sees it: a name to greet and an
/// address to write to. Accounts and credentials live elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: PatientId::new(),
            name: name.into(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }

    pub async fn find_by_id(id: PatientId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM patients WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO patients (id, name, email) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.email)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}
