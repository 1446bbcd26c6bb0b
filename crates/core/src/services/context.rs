//! Caller identity passed explicitly into services.

use grantdesk_common::{AppError, AppResult};
use grantdesk_db::entities::profile::{self, Role};

/// The authenticated operator on whose behalf a service call runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContext {
    pub actor_id: String,
    pub actor_name: String,
    pub role: Role,
}

impl AdminContext {
    /// Create a context from raw parts.
    #[must_use]
    pub fn new(actor_id: impl Into<String>, actor_name: impl Into<String>, role: Role) -> Self {
        Self {
            actor_id: actor_id.into(),
            actor_name: actor_name.into(),
            role,
        }
    }

    /// Build the context of a signed-in profile.
    #[must_use]
    pub fn from_profile(profile: &profile::Model) -> Self {
        Self::new(profile.id.clone(), profile.name.clone(), profile.role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Reject anyone but an administrator.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }

    /// Reject anyone but an administrator or a manager.
    pub fn require_staff(&self) -> AppResult<()> {
        match self.role {
            Role::Admin | Role::Manager => Ok(()),
            Role::Scholar => Err(AppError::Forbidden(
                "Admin or manager access required".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_admin() {
        assert!(AdminContext::new("a", "Ana", Role::Admin).require_admin().is_ok());
        assert!(matches!(
            AdminContext::new("m", "Marcos", Role::Manager).require_admin(),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_require_staff() {
        assert!(AdminContext::new("m", "Marcos", Role::Manager).require_staff().is_ok());
        assert!(AdminContext::new("s", "Sofia", Role::Scholar).require_staff().is_err());
    }
}
