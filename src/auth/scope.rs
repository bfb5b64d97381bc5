use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::Role;

/// The maximal set of leads the current user may view or mutate. Every
/// lead query in the db layer takes one of these; rows outside it behave
/// as if they did not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadScope {
    /// Organizers see every lead of their organization.
    Organization(Uuid),
    /// Agents see leads of their organization assigned to them.
    Assigned { organization: Uuid, agent: Uuid },
}

impl LeadScope {
    pub fn for_user(auth: &AuthUser) -> Result<Self, AppError> {
        match auth.role {
            Role::Organizer => Ok(LeadScope::Organization(auth.organization_id)),
            Role::Agent => {
                let agent = auth.agent_id.ok_or_else(|| {
                    AppError::Unauthorized("Session is not bound to an agent".to_string())
                })?;
                Ok(LeadScope::Assigned {
                    organization: auth.organization_id,
                    agent,
                })
            }
        }
    }

    pub fn organization_id(&self) -> Uuid {
        match self {
            LeadScope::Organization(org) => *org,
            LeadScope::Assigned { organization, .. } => *organization,
        }
    }
}
