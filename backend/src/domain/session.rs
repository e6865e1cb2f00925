//! Explicit identity context for domain operations.
//!
//! Every service call that depends on who is acting takes a
//! [`SessionContext`] argument. The only policy here is the role branch:
//! an administrator picks any group, a group supervisor is pinned to the
//! group assigned in their profile.

use anyhow::Result;
use log::warn;

use crate::domain::models::{Role, UserProfile};
use crate::storage::traits::UserStorage;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("Unknown user: {0}")]
    UnknownUser(String),
    #[error("Administrator access required")]
    AdminRequired,
    #[error("User {0} is not assigned to a group")]
    NoGroupAssigned(String),
    #[error("A group must be selected")]
    GroupRequired,
    #[error("User {user_id} may not modify group {group_id}")]
    GroupForbidden { user_id: String, group_id: String },
}

/// Who is acting, with the attributes needed to pick a roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: String,
    pub role: Role,
    pub group_id: Option<String>,
}

impl SessionContext {
    pub fn new(user_id: &str, role: Role, group_id: Option<&str>) -> Self {
        Self {
            user_id: user_id.to_string(),
            role,
            group_id: group_id.map(str::to_string),
        }
    }

    pub fn admin(user_id: &str) -> Self {
        Self::new(user_id, Role::Admin, None)
    }

    pub fn supervisor(user_id: &str, group_id: &str) -> Self {
        Self::new(user_id, Role::Group, Some(group_id))
    }

    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.uid.clone(),
            role: profile.role,
            group_id: profile.group_id.clone().filter(|g| !g.trim().is_empty()),
        }
    }

    /// Look up the stored profile for `user_id`.
    pub fn resolve<U: UserStorage>(users: &U, user_id: &str) -> Result<Self> {
        match users.get_profile(user_id)? {
            Some(profile) => Ok(Self::from_profile(&profile)),
            None => {
                warn!("No profile for user {}", user_id);
                Err(AccessError::UnknownUser(user_id.to_string()).into())
            }
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AccessError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AccessError::AdminRequired)
        }
    }

    /// Choose the roster this session operates on. Administrators must name
    /// a group; supervisors get their own group and may not name another.
    pub fn roster_group(&self, requested: Option<&str>) -> Result<String, AccessError> {
        if self.is_admin() {
            return requested
                .filter(|g| !g.trim().is_empty())
                .map(str::to_string)
                .ok_or(AccessError::GroupRequired);
        }

        let own = self.own_group()?;
        match requested {
            Some(group_id) if group_id != own => Err(self.forbidden(group_id)),
            _ => Ok(own.to_string()),
        }
    }

    /// Entry and roster edits belong to the group's own supervisor only.
    pub fn require_group_editor(&self, group_id: &str) -> Result<(), AccessError> {
        if self.is_admin() {
            return Err(self.forbidden(group_id));
        }
        if self.own_group()? == group_id {
            Ok(())
        } else {
            Err(self.forbidden(group_id))
        }
    }

    /// Administrators read every group; supervisors only their own.
    pub fn require_group_reader(&self, group_id: &str) -> Result<(), AccessError> {
        if self.is_admin() || self.own_group()? == group_id {
            Ok(())
        } else {
            Err(self.forbidden(group_id))
        }
    }

    /// Administrators manage every roster; supervisors their own.
    pub fn require_roster_manager(&self, group_id: &str) -> Result<(), AccessError> {
        self.require_group_reader(group_id)
    }

    fn own_group(&self) -> Result<&str, AccessError> {
        self.group_id
            .as_deref()
            .ok_or_else(|| AccessError::NoGroupAssigned(self.user_id.clone()))
    }

    fn forbidden(&self, group_id: &str) -> AccessError {
        AccessError::GroupForbidden {
            user_id: self.user_id.clone(),
            group_id: group_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;
    use crate::storage::traits::Connection;

    #[test]
    fn test_roster_group_for_admin() {
        let ctx = SessionContext::admin("root");
        assert_eq!(ctx.roster_group(Some("g2")).unwrap(), "g2");
        assert_eq!(ctx.roster_group(None), Err(AccessError::GroupRequired));
        assert_eq!(ctx.roster_group(Some(" ")), Err(AccessError::GroupRequired));
    }

    #[test]
    fn test_roster_group_for_supervisor() {
        let ctx = SessionContext::supervisor("u1", "g1");
        assert_eq!(ctx.roster_group(None).unwrap(), "g1");
        assert_eq!(ctx.roster_group(Some("g1")).unwrap(), "g1");
        assert!(matches!(
            ctx.roster_group(Some("g2")),
            Err(AccessError::GroupForbidden { .. })
        ));

        let unassigned = SessionContext::new("u2", Role::Group, None);
        assert_eq!(
            unassigned.roster_group(None),
            Err(AccessError::NoGroupAssigned("u2".to_string()))
        );
    }

    #[test]
    fn test_editor_and_reader_checks() {
        let admin = SessionContext::admin("root");
        let sup = SessionContext::supervisor("u1", "g1");

        assert!(admin.require_group_editor("g1").is_err());
        assert!(admin.require_group_reader("g1").is_ok());
        assert!(sup.require_group_editor("g1").is_ok());
        assert!(sup.require_group_editor("g2").is_err());
        assert!(sup.require_group_reader("g2").is_err());
        assert!(sup.require_admin().is_err());
        assert!(admin.require_admin().is_ok());
    }

    #[test]
    fn test_resolve_from_storage() {
        let env = TestEnvironment::new().unwrap();
        let helper = env.helper();
        helper.create_user("u1", Role::Group, Some("g1")).unwrap();
        let users = env.connection.create_user_repository();

        let ctx = SessionContext::resolve(&users, "u1").unwrap();
        assert_eq!(ctx, SessionContext::supervisor("u1", "g1"));

        let err = SessionContext::resolve(&users, "ghost").unwrap_err();
        assert_eq!(
            err.downcast_ref::<AccessError>(),
            Some(&AccessError::UnknownUser("ghost".to_string()))
        );
    }
}
