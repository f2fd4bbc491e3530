//! Ownership checks for single-resource operations
//!
//! A resource belongs to exactly one user. Any operation touching a single
//! resource loads it first, then asks the guard whether the caller owns it.

use super::middleware::CallerIdentity;
use crate::error::AppError;
use journal_core::{OwnershipPolicy, UserId};

/// Decides whether a caller may touch a resource
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipGuard {
    policy: OwnershipPolicy,
}

impl OwnershipGuard {
    pub fn new(policy: OwnershipPolicy) -> Self {
        Self { policy }
    }

    /// Pass iff the caller owns the journal
    ///
    /// # Arguments
    ///
    /// * `owner_id` - Owner recorded on the loaded resource
    /// * `caller_id` - Authenticated caller
    /// * `journal_id` - Used for the concealed 404 message
    pub fn assert_owner(
        &self,
        owner_id: UserId,
        caller_id: UserId,
        journal_id: i64,
    ) -> Result<(), AppError> {
        if owner_id == caller_id {
            return Ok(());
        }

        match self.policy {
            OwnershipPolicy::Forbidden => Err(AppError::Forbidden("Not your journal".to_string())),
            OwnershipPolicy::Conceal => Err(AppError::journal_not_found(journal_id)),
        }
    }

    /// Pass iff the caller is the target user or holds the admin role
    ///
    /// Guards the user-by-id endpoints.
    pub fn assert_self_or_admin(
        &self,
        target_id: UserId,
        caller: &CallerIdentity,
    ) -> Result<(), AppError> {
        if target_id == caller.user_id || caller.is_admin() {
            return Ok(());
        }

        match self.policy {
            OwnershipPolicy::Forbidden => Err(AppError::Forbidden("Access denied".to_string())),
            OwnershipPolicy::Conceal => Err(AppError::user_not_found(target_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{ROLE_ADMIN, ROLE_USER};

    fn caller(id: UserId, role: &str) -> CallerIdentity {
        CallerIdentity {
            user_id: id,
            username: "someone".to_string(),
            roles: vec![role.to_string()],
        }
    }

    #[test]
    fn test_owner_passes() {
        let guard = OwnershipGuard::default();
        assert!(guard.assert_owner(1, 1, 10).is_ok());
    }

    #[test]
    fn test_foreign_resource_forbidden_by_default() {
        let guard = OwnershipGuard::default();
        assert_eq!(
            guard.assert_owner(1, 2, 10),
            Err(AppError::Forbidden("Not your journal".to_string()))
        );
    }

    #[test]
    fn test_conceal_policy_reports_not_found() {
        let guard = OwnershipGuard::new(OwnershipPolicy::Conceal);
        assert_eq!(
            guard.assert_owner(1, 2, 10),
            Err(AppError::journal_not_found(10))
        );
    }

    #[test]
    fn test_self_or_admin() {
        let guard = OwnershipGuard::default();

        assert!(guard.assert_self_or_admin(5, &caller(5, ROLE_USER)).is_ok());
        assert!(guard.assert_self_or_admin(5, &caller(7, ROLE_ADMIN)).is_ok());
        assert!(matches!(
            guard.assert_self_or_admin(5, &caller(7, ROLE_USER)),
            Err(AppError::Forbidden(_))
        ));

        let concealing = OwnershipGuard::new(OwnershipPolicy::Conceal);
        assert_eq!(
            concealing.assert_self_or_admin(5, &caller(7, ROLE_USER)),
            Err(AppError::user_not_found(5))
        );
    }
}
