use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account privilege level, strictly ordered `owner > admin > user`.
///
/// The role string is the single source of authorization truth; there
/// is deliberately no separate "is admin" flag to drift out of sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Whether this role may see the account administration surface.
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(()),
        }
    }
}

/// User account as exposed by the repository layer.
///
/// Never carries the password hash; credential material stays inside
/// `db::repositories::user`.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

/// The authenticated caller, re-derived from the persisted user record
/// on every request so role changes take effect without re-login.
///
/// Passed explicitly into every service operation; nothing reads
/// identity from ambient state.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 60;

/// Validates a username against the account rules (3-60 chars after
/// trimming). Returns the trimmed username.
pub fn validate_username(username: &str) -> Result<&str, String> {
    let trimmed = username.trim();
    if trimmed.chars().count() < MIN_USERNAME_LEN {
        return Err(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters"
        ));
    }
    if trimmed.chars().count() > MAX_USERNAME_LEN {
        return Err(format!(
            "Username cannot be more than {MAX_USERNAME_LEN} characters"
        ));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::Owner, Role::Admin, Role::User] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn only_owner_and_admin_are_privileged() {
        assert!(Role::Owner.is_privileged());
        assert!(Role::Admin.is_privileged());
        assert!(!Role::User.is_privileged());
    }

    #[test]
    fn username_bounds_are_enforced() {
        assert!(validate_username("ab").is_err());
        assert_eq!(validate_username("  rin  "), Ok("rin"));
        assert!(validate_username(&"x".repeat(61)).is_err());
    }
}
