//! Roster, group and user DTO mapping.

use shared::{
    AssignSupervisorResponse, Group as GroupDto, Member, MemberListResponse, MoveMemberResponse,
    UserProfile as UserDto,
};

use crate::domain::commands::members::{AssignSupervisorResult, MoveMemberResult};
use crate::domain::models::{Group, MemberRecord, UserProfile};

pub struct MemberMapper;

impl MemberMapper {
    pub fn to_dto(member: MemberRecord) -> Member {
        Member {
            id: member.id,
            name: member.name,
            active: member.active,
            moved_from: member.moved_from,
            moved_to: member.moved_to,
            moved_at: member.moved_at.map(|t| t.to_rfc3339()),
        }
    }

    pub fn to_list_dto(group_id: &str, members: Vec<MemberRecord>) -> MemberListResponse {
        MemberListResponse {
            group_id: group_id.to_string(),
            members: members.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_move_dto(result: MoveMemberResult) -> MoveMemberResponse {
        MoveMemberResponse {
            source: Self::to_dto(result.source),
            destination: Self::to_dto(result.destination),
        }
    }

    pub fn group_to_dto(group: Group) -> GroupDto {
        let label = group.label();
        GroupDto {
            id: group.id,
            number: group.number,
            supervisor_name: group.supervisor_name,
            editors: group.editors,
            label,
        }
    }

    pub fn profile_to_dto(profile: UserProfile) -> UserDto {
        UserDto {
            uid: profile.uid,
            name: profile.name,
            role: profile.role.to_string(),
            group_id: profile.group_id,
        }
    }

    pub fn to_assign_dto(result: AssignSupervisorResult) -> AssignSupervisorResponse {
        AssignSupervisorResponse {
            user: Self::profile_to_dto(result.profile),
            group: Self::group_to_dto(result.group),
            previous_group_id: result.previous_group_id,
        }
    }
}
