//! Lookups against the portal's own tables. `jobs`, `users` and
//! `company_members` belong to the surrounding CRUD system; this crate only
//! reads them (and bumps `jobs.applications_count`).

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::Result;
use crate::models::directory::{
    AccountType, EmployerRole, JobSnapshot, JobStatus, Membership, UserProfile,
};
use crate::services::collaborators::{JobDirectory, MembershipDirectory, UserDirectory};

#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobDirectory for PgDirectory {
    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobSnapshot>> {
        let row = sqlx::query(r#"SELECT id, company_id, status FROM jobs WHERE id = $1"#)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else { return Ok(None) };
        let status: String = row.try_get("status")?;
        let is_open =
            status.eq_ignore_ascii_case("open") || status.eq_ignore_ascii_case("published");
        Ok(Some(JobSnapshot {
            id: row.try_get("id")?,
            company_id: row.try_get("company_id")?,
            status: if is_open {
                JobStatus::Open
            } else {
                JobStatus::Closed
            },
        }))
    }

    async fn record_application(&self, job_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"UPDATE jobs SET applications_count = COALESCE(applications_count, 0) + 1 WHERE id = $1"#,
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for PgDirectory {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            r#"SELECT id, name, email, phone, is_active, user_type FROM users WHERE id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let user_type: String = row.try_get("user_type")?;
        Ok(Some(UserProfile {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            is_active: row.try_get::<Option<bool>, _>("is_active")?.unwrap_or(false),
            account_type: match user_type.to_ascii_lowercase().as_str() {
                "candidate" | "job_seeker" => AccountType::Candidate,
                "admin" => AccountType::Admin,
                _ => AccountType::Employer,
            },
        }))
    }
}

#[async_trait]
impl MembershipDirectory for PgDirectory {
    async fn get_membership(&self, user_id: Uuid, company_id: Uuid) -> Result<Option<Membership>> {
        let role: Option<(String,)> = sqlx::query_as(
            r#"SELECT role FROM company_members WHERE user_id = $1 AND company_id = $2"#,
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role.map(|(role,)| Membership {
            user_id,
            company_id,
            role: EmployerRole::parse(&role),
        }))
    }
}
