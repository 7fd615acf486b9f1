//! Role-based authorization matrix for account management.
//!
//! Pure decision functions over (actor, target) facts; every call is
//! independent and side-effect free. Anime records are deliberately
//! absent here: collection access is owner-scoped in the repository
//! filters and no role grants cross-user access to them.

use thiserror::Error;

use crate::models::user::{Identity, Role};

/// Why an account-management action was rejected.
///
/// Self-targeting is a logical error, not a privilege failure, and is
/// kept distinct so the API can answer 422 instead of 403.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("insufficient privileges")]
    Forbidden,

    #[error("cannot target your own account")]
    SelfTarget,
}

/// Owners and admins may list accounts; plain users may not.
#[must_use]
pub const fn can_list_users(actor: Role) -> bool {
    actor.is_privileged()
}

/// Only the owner may change roles, and never their own.
pub fn check_change_role(actor: &Identity, target_id: i32) -> Result<(), AccessError> {
    if actor.id == target_id {
        return Err(AccessError::SelfTarget);
    }
    if actor.role != Role::Owner {
        return Err(AccessError::Forbidden);
    }
    Ok(())
}

/// Actor-side screen for deletions, evaluated before the target is
/// ever looked up so unprivileged callers cannot probe which ids
/// exist: rejects self-targeting and actors below admin.
pub fn check_delete_user_actor(actor: &Identity, target_id: i32) -> Result<(), AccessError> {
    if actor.id == target_id {
        return Err(AccessError::SelfTarget);
    }
    if !actor.role.is_privileged() {
        return Err(AccessError::Forbidden);
    }
    Ok(())
}

/// Owners may delete anyone but themselves; admins may delete plain
/// users only; self-deletion is disallowed for everyone.
pub fn check_delete_user(
    actor: &Identity,
    target_id: i32,
    target_role: Role,
) -> Result<(), AccessError> {
    if actor.id == target_id {
        return Err(AccessError::SelfTarget);
    }
    match actor.role {
        Role::Owner => Ok(()),
        Role::Admin if target_role == Role::User => Ok(()),
        Role::Admin | Role::User => Err(AccessError::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: i32, role: Role) -> Identity {
        Identity {
            id,
            username: format!("user{id}"),
            role,
        }
    }

    const ROLES: [Role; 3] = [Role::Owner, Role::Admin, Role::User];

    #[test]
    fn list_users_matrix() {
        assert!(can_list_users(Role::Owner));
        assert!(can_list_users(Role::Admin));
        assert!(!can_list_users(Role::User));
    }

    #[test]
    fn change_role_matrix() {
        for actor_role in ROLES {
            for target_role in ROLES {
                let actor = identity(1, actor_role);
                let result = check_change_role(&actor, 2);
                let expected = if actor_role == Role::Owner {
                    Ok(())
                } else {
                    Err(AccessError::Forbidden)
                };
                assert_eq!(
                    result, expected,
                    "{actor_role} changing role of {target_role}"
                );
            }
        }
    }

    #[test]
    fn delete_user_matrix() {
        for actor_role in ROLES {
            for target_role in ROLES {
                let actor = identity(1, actor_role);
                let result = check_delete_user(&actor, 2, target_role);
                let expected = match actor_role {
                    Role::Owner => Ok(()),
                    Role::Admin if target_role == Role::User => Ok(()),
                    _ => Err(AccessError::Forbidden),
                };
                assert_eq!(result, expected, "{actor_role} deleting {target_role}");
            }
        }
    }

    #[test]
    fn delete_actor_screen_needs_no_target_facts() {
        // The screen must agree with the full matrix on everything it
        // can decide without knowing the target.
        assert_eq!(
            check_delete_user_actor(&identity(1, Role::User), 2),
            Err(AccessError::Forbidden)
        );
        assert_eq!(check_delete_user_actor(&identity(1, Role::Admin), 2), Ok(()));
        assert_eq!(check_delete_user_actor(&identity(1, Role::Owner), 2), Ok(()));
        for role in ROLES {
            assert_eq!(
                check_delete_user_actor(&identity(7, role), 7),
                Err(AccessError::SelfTarget)
            );
        }
    }

    #[test]
    fn self_targeting_is_invalid_not_forbidden() {
        for role in ROLES {
            let actor = identity(7, role);
            assert_eq!(check_change_role(&actor, 7), Err(AccessError::SelfTarget));
            assert_eq!(
                check_delete_user(&actor, 7, role),
                Err(AccessError::SelfTarget)
            );
        }
    }
}
