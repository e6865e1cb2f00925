//! Domain-level command and query types
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer is responsible for mapping the
//! public DTOs defined in the `shared` crate to these internal types.

pub mod entries {
    use crate::domain::models::{MemberMonthEntry, MonthId, ReportStatus, Summary};

    /// Requested changes to one entry. Numbers are signed so that negative
    /// input can be rejected rather than wrapped.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct EntryEdit {
        pub participated: Option<bool>,
        pub auxiliary_pioneer: Option<bool>,
        pub regular_pioneer: Option<bool>,
        pub bible_studies: Option<i64>,
        pub hours_aux: Option<f64>,
        pub hours_regular: Option<f64>,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateEntryCommand {
        pub group_id: String,
        pub month: String,
        pub entry_id: String,
        pub edit: EntryEdit,
    }

    /// Input for adding an entry that is not backed by a roster member.
    #[derive(Debug, Clone)]
    pub struct AddEntryCommand {
        pub group_id: String,
        pub month: String,
        pub name: String,
    }

    #[derive(Debug, Clone)]
    pub struct RemoveEntryCommand {
        pub group_id: String,
        pub month: String,
        pub entry_id: String,
    }

    /// A group's month: entries sorted by name plus their summary.
    /// `status` is `None` when no report document exists yet.
    #[derive(Debug, Clone)]
    pub struct ListEntriesResult {
        pub group_id: String,
        pub month: MonthId,
        pub status: Option<ReportStatus>,
        pub entries: Vec<MemberMonthEntry>,
        pub summary: Summary,
    }
}

pub mod reports {
    use crate::domain::models::MonthId;

    /// Outcome of clearing one group's month.
    #[derive(Debug, Clone, PartialEq)]
    pub struct GroupDeletion {
        pub group_id: String,
        pub entries_removed: usize,
        /// Entries still present after the attempt.
        pub failed_entries: Vec<String>,
        /// Only removed once every entry is gone.
        pub report_removed: bool,
        pub error: Option<String>,
    }

    impl GroupDeletion {
        pub fn is_complete(&self) -> bool {
            self.failed_entries.is_empty() && self.error.is_none()
        }
    }

    /// Result of deleting a month for every group.
    #[derive(Debug, Clone, PartialEq)]
    pub struct DeleteMonthResult {
        pub month: MonthId,
        pub groups: Vec<GroupDeletion>,
    }

    impl DeleteMonthResult {
        pub fn is_complete(&self) -> bool {
            self.groups.iter().all(GroupDeletion::is_complete)
        }
    }
}

pub mod members {
    use crate::domain::models::{Group, MemberRecord, UserProfile};

    #[derive(Debug, Clone)]
    pub struct AddMemberCommand {
        pub group_id: String,
        pub name: String,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateMemberCommand {
        pub group_id: String,
        pub member_id: String,
        pub name: Option<String>,
        pub active: Option<bool>,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteMemberCommand {
        pub group_id: String,
        pub member_id: String,
    }

    /// Transfer a member to another group.
    #[derive(Debug, Clone)]
    pub struct MoveMemberCommand {
        pub from_group_id: String,
        pub member_id: String,
        pub to_group_id: String,
    }

    #[derive(Debug, Clone)]
    pub struct MoveMemberResult {
        /// The deactivated record left behind in the source group.
        pub source: MemberRecord,
        /// The new active record in the destination group.
        pub destination: MemberRecord,
    }

    /// Put a `group` user in charge of a group.
    #[derive(Debug, Clone)]
    pub struct AssignSupervisorCommand {
        pub user_id: String,
        pub group_id: String,
    }

    #[derive(Debug, Clone)]
    pub struct AssignSupervisorResult {
        pub profile: UserProfile,
        pub group: Group,
        pub previous_group_id: Option<String>,
    }
}
