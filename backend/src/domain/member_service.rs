//! # Member Service
//!
//! Roster administration. Supervisors maintain their own group's roster;
//! administrators can also move members between groups and assign
//! supervisors to groups.
//!
//! Month entries are never touched here. A renamed or deactivated member is
//! picked up by the next roster sync, and past months keep whatever they
//! recorded.

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use std::collections::HashSet;

use crate::domain::commands::members::{
    AddMemberCommand, AssignSupervisorCommand, AssignSupervisorResult, DeleteMemberCommand,
    MoveMemberCommand, MoveMemberResult, UpdateMemberCommand,
};
use crate::domain::models::{clean_display_name, unique_member_id, Group, MemberRecord, Role};
use crate::domain::session::SessionContext;
use crate::storage::traits::{Connection, GroupStorage, RosterStorage, UserStorage};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MemberError {
    #[error("name must be 1 to 100 characters")]
    InvalidName,
    #[error("nothing to update")]
    EmptyUpdate,
    #[error("member {member_id} not found in group {group_id}")]
    MemberNotFound { group_id: String, member_id: String },
    #[error("group {0} not found")]
    GroupNotFound(String),
    #[error("user {0} not found")]
    UserNotFound(String),
    #[error("user {0} is not a group supervisor account")]
    NotSupervisorAccount(String),
    #[error("member is already in group {0}")]
    SameGroup(String),
    #[error("no free id for '{0}'")]
    NoFreeId(String),
}

#[derive(Clone)]
pub struct MemberService<C: Connection> {
    groups: C::GroupRepository,
    roster: C::RosterRepository,
    users: C::UserRepository,
}

impl<C: Connection> MemberService<C> {
    pub fn new(connection: &C) -> Self {
        Self {
            groups: connection.create_group_repository(),
            roster: connection.create_roster_repository(),
            users: connection.create_user_repository(),
        }
    }

    /// Groups visible to the session: all of them for an administrator,
    /// only the assigned one for a supervisor.
    pub fn list_groups(&self, ctx: &SessionContext) -> Result<Vec<Group>> {
        let groups = self.groups.list_groups()?;
        if ctx.is_admin() {
            return Ok(groups);
        }
        Ok(groups
            .into_iter()
            .filter(|g| ctx.group_id.as_deref() == Some(g.id.as_str()))
            .collect())
    }

    /// Roster of a group, active and inactive, sorted by name.
    pub fn list_members(&self, ctx: &SessionContext, group_id: &str) -> Result<Vec<MemberRecord>> {
        ctx.require_roster_manager(group_id)?;
        let mut members = self.roster.list_members(group_id)?;
        members.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(members)
    }

    pub fn add_member(&self, ctx: &SessionContext, command: AddMemberCommand) -> Result<MemberRecord> {
        ctx.require_roster_manager(&command.group_id)?;
        let name = clean_display_name(&command.name).ok_or(MemberError::InvalidName)?;

        let id = self.free_id(&command.group_id, &name)?;
        let member = MemberRecord::with_id(id, &name);
        self.roster.create_member(&command.group_id, &member)?;
        info!(
            "Added member {} to group {} by {}",
            member.id, command.group_id, ctx.user_id
        );
        Ok(member)
    }

    /// Rename and/or (de)activate a member. The id never changes.
    pub fn update_member(&self, ctx: &SessionContext, command: UpdateMemberCommand) -> Result<MemberRecord> {
        ctx.require_roster_manager(&command.group_id)?;
        if command.name.is_none() && command.active.is_none() {
            return Err(MemberError::EmptyUpdate.into());
        }
        let name = match &command.name {
            Some(raw) => Some(clean_display_name(raw).ok_or(MemberError::InvalidName)?),
            None => None,
        };

        let mut member = self.require_member(&command.group_id, &command.member_id)?;
        if let Some(name) = name {
            member.name = name;
        }
        if let Some(active) = command.active {
            member.active = active;
        }

        self.roster.update_member(&command.group_id, &member)?;
        info!("Updated member {} of group {}", member.id, command.group_id);
        Ok(member)
    }

    /// Remove a member from the roster. Entries already written for past
    /// months stay as they are.
    pub fn delete_member(&self, ctx: &SessionContext, command: DeleteMemberCommand) -> Result<()> {
        ctx.require_roster_manager(&command.group_id)?;
        if !self.roster.delete_member(&command.group_id, &command.member_id)? {
            return Err(MemberError::MemberNotFound {
                group_id: command.group_id,
                member_id: command.member_id,
            }
            .into());
        }
        info!(
            "Deleted member {} from group {} by {}",
            command.member_id, command.group_id, ctx.user_id
        );
        Ok(())
    }

    /// Transfer a member to another group (admin only).
    ///
    /// The destination record is written first, so a failure leaves the
    /// source untouched. The source record is then deactivated rather than
    /// deleted, which keeps it out of new months while history stays intact.
    pub fn move_member(&self, ctx: &SessionContext, command: MoveMemberCommand) -> Result<MoveMemberResult> {
        ctx.require_admin()?;
        if command.from_group_id == command.to_group_id {
            return Err(MemberError::SameGroup(command.to_group_id).into());
        }
        let mut source = self.require_member(&command.from_group_id, &command.member_id)?;
        self.require_group(&command.to_group_id)?;

        let now = Utc::now();
        let id = self.free_id(&command.to_group_id, &source.name)?;
        let mut destination = MemberRecord::with_id(id, &source.name);
        destination.moved_from = Some(command.from_group_id.clone());
        destination.moved_at = Some(now);
        self.roster.create_member(&command.to_group_id, &destination)?;

        source.active = false;
        source.moved_to = Some(command.to_group_id.clone());
        source.moved_at = Some(now);
        self.roster.update_member(&command.from_group_id, &source)?;

        info!(
            "Moved member {} from group {} to {} as {}",
            source.id, command.from_group_id, command.to_group_id, destination.id
        );
        Ok(MoveMemberResult { source, destination })
    }

    /// Put a `group` account in charge of a group (admin only).
    pub fn assign_supervisor(
        &self,
        ctx: &SessionContext,
        command: AssignSupervisorCommand,
    ) -> Result<AssignSupervisorResult> {
        ctx.require_admin()?;
        let mut profile = self
            .users
            .get_profile(&command.user_id)?
            .ok_or_else(|| MemberError::UserNotFound(command.user_id.clone()))?;
        if profile.role != Role::Group {
            return Err(MemberError::NotSupervisorAccount(command.user_id).into());
        }
        let mut group = self.require_group(&command.group_id)?;

        let previous_group_id = profile.group_id.clone().filter(|g| !g.trim().is_empty());
        if let Some(previous) = previous_group_id.as_deref().filter(|g| *g != group.id) {
            match self.groups.get_group(previous)? {
                Some(mut old) => {
                    old.editors.retain(|uid| uid != &profile.uid);
                    self.groups.store_group(&old)?;
                }
                None => warn!("Previous group {} of {} no longer exists", previous, profile.uid),
            }
        }

        if !group.editors.contains(&profile.uid) {
            group.editors.push(profile.uid.clone());
        }
        group.supervisor_name = if profile.name.trim().is_empty() {
            profile.uid.clone()
        } else {
            profile.name.trim().to_string()
        };
        self.groups.store_group(&group)?;

        profile.group_id = Some(group.id.clone());
        self.users.store_profile(&profile)?;

        info!("Assigned {} to group {}", profile.uid, group.id);
        Ok(AssignSupervisorResult {
            profile,
            group,
            previous_group_id,
        })
    }

    fn free_id(&self, group_id: &str, name: &str) -> Result<String> {
        let taken: HashSet<String> = self
            .roster
            .list_members(group_id)?
            .into_iter()
            .map(|m| m.id)
            .collect();
        unique_member_id(name, |candidate| taken.contains(candidate))
            .ok_or_else(|| MemberError::NoFreeId(name.to_string()).into())
    }

    fn require_member(&self, group_id: &str, member_id: &str) -> Result<MemberRecord> {
        self.roster.get_member(group_id, member_id)?.ok_or_else(|| {
            MemberError::MemberNotFound {
                group_id: group_id.to_string(),
                member_id: member_id.to_string(),
            }
            .into()
        })
    }

    fn require_group(&self, group_id: &str) -> Result<Group> {
        self.groups
            .get_group(group_id)?
            .ok_or_else(|| MemberError::GroupNotFound(group_id.to_string()).into())
    }
}
