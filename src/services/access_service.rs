use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::application::Application;
use crate::models::directory::EmployerRole;
use crate::services::collaborators::MembershipDirectory;

/// How a caller is allowed to see an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    Candidate,
    Employer(EmployerRole),
}

#[derive(Clone)]
pub struct AccessService {
    memberships: Arc<dyn MembershipDirectory>,
}

impl AccessService {
    pub fn new(memberships: Arc<dyn MembershipDirectory>) -> Self {
        Self { memberships }
    }

    pub fn check_ownership(&self, application: &Application, caller: Uuid) -> Result<()> {
        if application.candidate_id != caller {
            return Err(Error::Forbidden(
                "only the applying candidate can perform this action".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn check_employer_access(
        &self,
        application: &Application,
        caller: Uuid,
    ) -> Result<EmployerRole> {
        self.check_company_access(application.company_id, caller)
            .await
    }

    /// Resolves the caller's membership in `company_id` and requires a role in
    /// the pipeline allow-set (viewer, recruiter, admin, owner).
    pub async fn check_company_access(
        &self,
        company_id: Uuid,
        caller: Uuid,
    ) -> Result<EmployerRole> {
        let membership = self
            .memberships
            .get_membership(caller, company_id)
            .await?
            .ok_or_else(|| {
                Error::Forbidden("caller is not a member of the hiring company".to_string())
            })?;

        if !membership.role.grants_pipeline_access() {
            tracing::debug!(
                user_id = %caller,
                company_id = %company_id,
                role = %membership.role,
                "Membership role does not grant pipeline access"
            );
            return Err(Error::Forbidden(format!(
                "role '{}' cannot access the hiring pipeline",
                membership.role
            )));
        }
        Ok(membership.role)
    }

    /// Candidate owner or any employer with pipeline access.
    pub async fn check_read_access(
        &self,
        application: &Application,
        caller: Uuid,
    ) -> Result<Viewer> {
        if application.candidate_id == caller {
            return Ok(Viewer::Candidate);
        }
        let role = self.check_employer_access(application, caller).await?;
        Ok(Viewer::Employer(role))
    }
}
