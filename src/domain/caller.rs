use serde::{Deserialize, Serialize};

use super::UserId;

/// Authorization role, derived from the user's `position` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub const ADMIN_POSITION: &'static str = "admin";

    #[must_use]
    pub fn from_position(position: &str) -> Self {
        if position == Self::ADMIN_POSITION {
            Self::Admin
        } else {
            Self::Staff
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Identity of whoever is making the current request.
///
/// Built by the auth guard from verified token claims and handed to the
/// services explicitly, so the business rules never look at HTTP state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub photo_link: Option<String>,
    pub role: Role,
}

impl Caller {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_position() {
        assert_eq!(Role::from_position("admin"), Role::Admin);
        assert_eq!(Role::from_position("purchasing"), Role::Staff);
        assert_eq!(Role::from_position("Admin"), Role::Staff);
        assert_eq!(Role::from_position(""), Role::Staff);
    }
}
