//! Authorization policy for user resources
//!
//! Pure decisions over the request identity. Authentication failures are
//! the middleware's business (401); everything here is a 403.

use super::middleware::AuthenticatedUser;
use thiserror::Error;
use uuid::Uuid;

/// The identity may not perform the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Forbidden")]
pub struct Forbidden;

/// Allow administrators only
pub fn require_admin(identity: &AuthenticatedUser) -> Result<(), Forbidden> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(Forbidden)
    }
}

/// Allow administrators and the owner of `user_id`
///
/// A missing identity is forbidden as well.
pub fn require_self_or_admin(
    identity: Option<&AuthenticatedUser>,
    user_id: Uuid,
) -> Result<(), Forbidden> {
    match identity {
        Some(identity) if identity.is_admin() || identity.id == user_id => Ok(()),
        _ => Err(Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iepf_core::UserRole;

    fn identity(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", role.as_str()),
            role,
        }
    }

    #[test]
    fn test_require_admin() {
        assert_eq!(require_admin(&identity(UserRole::Admin)), Ok(()));
        assert_eq!(require_admin(&identity(UserRole::User)), Err(Forbidden));
    }

    #[test]
    fn test_require_self_or_admin_truth_table() {
        let admin = identity(UserRole::Admin);
        let user = identity(UserRole::User);
        let other = Uuid::new_v4();

        // admin: anyone
        assert_eq!(require_self_or_admin(Some(&admin), admin.id), Ok(()));
        assert_eq!(require_self_or_admin(Some(&admin), user.id), Ok(()));
        assert_eq!(require_self_or_admin(Some(&admin), other), Ok(()));

        // user: only self
        assert_eq!(require_self_or_admin(Some(&user), user.id), Ok(()));
        assert_eq!(require_self_or_admin(Some(&user), admin.id), Err(Forbidden));
        assert_eq!(require_self_or_admin(Some(&user), other), Err(Forbidden));

        // nobody: never
        assert_eq!(require_self_or_admin(None, user.id), Err(Forbidden));
    }
}
