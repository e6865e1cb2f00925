//! Domain models for groups, rosters and month reports.

pub mod entry;
pub mod group;
pub mod lenient;
pub mod member;
pub mod month;
pub mod summary;
pub mod user;

pub use entry::{EntryPatch, MemberMonthEntry};
pub use group::Group;
pub use member::{
    clean_display_name, member_id_from_name, strip_accents, unique_member_id, MemberRecord,
};
pub use month::{MonthId, MonthIdError, MonthReport, ReportStatus};
pub use summary::Summary;
pub use user::{Role, UserProfile};
