use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use csv::StringRecord;
use log::{info, warn};

use super::columns::{read_rows, to_csv_bytes, Columns};
use super::connection::CsvConnection;
use crate::domain::models::lenient;
use crate::domain::models::MemberRecord;
use crate::storage::notify::{ChangeEvent, ChangeKind, ChangeScope};
use crate::storage::traits::{Connection, RosterStorage};

const HEADER: [&str; 6] = ["id", "name", "active", "moved_from", "moved_to", "moved_at"];

/// CSV-backed roster repository, one `members.csv` per group
#[derive(Clone)]
pub struct MemberRepository {
    connection: CsvConnection,
}

impl MemberRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_members(&self, group_id: &str) -> Result<Vec<MemberRecord>> {
        let path = self.connection.members_file_path(group_id)?;
        read_rows(&path, parse_member)
    }

    fn write_members(&self, group_id: &str, members: &[MemberRecord]) -> Result<()> {
        let path = self.connection.members_file_path(group_id)?;
        let rows = members.iter().map(|m| {
            vec![
                m.id.clone(),
                m.name.clone(),
                m.active.to_string(),
                m.moved_from.clone().unwrap_or_default(),
                m.moved_to.clone().unwrap_or_default(),
                m.moved_at.map(|at| at.to_rfc3339()).unwrap_or_default(),
            ]
        });
        let bytes = to_csv_bytes(&HEADER, rows)?;
        self.connection.write_atomic(&path, &bytes)
    }

    fn publish(&self, group_id: &str, member_id: &str, kind: ChangeKind) {
        let scope = ChangeScope::Roster {
            group_id: group_id.to_string(),
        };
        self.connection
            .notifier()
            .publish(ChangeEvent::new(scope, Some(member_id), kind));
    }
}

fn parse_member(columns: &Columns, record: &StringRecord) -> Option<MemberRecord> {
    let id = columns.get(record, "id").trim();
    if id.is_empty() {
        warn!("Skipping roster row without id");
        return None;
    }
    let moved_at = columns
        .optional(record, "moved_at")
        .and_then(|raw| match DateTime::parse_from_rfc3339(&raw) {
            Ok(at) => Some(at.with_timezone(&Utc)),
            Err(e) => {
                warn!("Ignoring malformed moved_at '{}' for member {}: {}", raw, id, e);
                None
            }
        });

    Some(MemberRecord {
        id: id.to_string(),
        name: columns.get(record, "name").trim().to_string(),
        active: lenient::flag_from_cell(columns.get(record, "active"), true),
        moved_from: columns.optional(record, "moved_from"),
        moved_to: columns.optional(record, "moved_to"),
        moved_at,
    })
}

impl RosterStorage for MemberRepository {
    fn list_members(&self, group_id: &str) -> Result<Vec<MemberRecord>> {
        self.read_members(group_id)
    }

    fn get_member(&self, group_id: &str, member_id: &str) -> Result<Option<MemberRecord>> {
        Ok(self
            .read_members(group_id)?
            .into_iter()
            .find(|m| m.id == member_id))
    }

    fn create_member(&self, group_id: &str, member: &MemberRecord) -> Result<()> {
        {
            let _guard = self.connection.lock_writes()?;
            let mut members = self.read_members(group_id)?;
            if members.iter().any(|m| m.id == member.id) {
                bail!("Member {} already exists in group {}", member.id, group_id);
            }
            members.push(member.clone());
            self.write_members(group_id, &members)?;
        }

        info!("Created member {} in group {}", member.id, group_id);
        self.publish(group_id, &member.id, ChangeKind::Created);
        Ok(())
    }

    fn update_member(&self, group_id: &str, member: &MemberRecord) -> Result<()> {
        {
            let _guard = self.connection.lock_writes()?;
            let mut members = self.read_members(group_id)?;
            match members.iter_mut().find(|m| m.id == member.id) {
                Some(existing) => *existing = member.clone(),
                None => bail!("Member {} not found in group {}", member.id, group_id),
            }
            self.write_members(group_id, &members)?;
        }

        info!("Updated member {} in group {}", member.id, group_id);
        self.publish(group_id, &member.id, ChangeKind::Updated);
        Ok(())
    }

    fn delete_member(&self, group_id: &str, member_id: &str) -> Result<bool> {
        {
            let _guard = self.connection.lock_writes()?;
            let mut members = self.read_members(group_id)?;
            let before = members.len();
            members.retain(|m| m.id != member_id);
            if members.len() == before {
                return Ok(false);
            }
            self.write_members(group_id, &members)?;
        }

        info!("Deleted member {} from group {}", member_id, group_id);
        self.publish(group_id, member_id, ChangeKind::Deleted);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;

    #[test]
    fn test_create_list_and_duplicate() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_roster_repository();

        assert!(repo.list_members("g1").unwrap().is_empty());
        repo.create_member("g1", &MemberRecord::new("Ana Souza")).unwrap();
        repo.create_member("g1", &MemberRecord::new("Bia")).unwrap();
        assert!(repo.create_member("g1", &MemberRecord::new("Ana Souza")).is_err());

        let ids: Vec<String> = repo.list_members("g1").unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["ana-souza", "bia"]);
        assert!(repo.list_members("g2").unwrap().is_empty());
    }

    #[test]
    fn test_update_round_trips_move_fields() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_roster_repository();
        let mut member = MemberRecord::new("Carla");
        repo.create_member("g1", &member).unwrap();

        member.active = false;
        member.moved_to = Some("g2".to_string());
        member.moved_at = Some(Utc::now());
        repo.update_member("g1", &member).unwrap();

        let stored = repo.get_member("g1", "carla").unwrap().unwrap();
        assert!(!stored.active);
        assert_eq!(stored.moved_to.as_deref(), Some("g2"));
        assert_eq!(stored.moved_from, None);
        assert_eq!(
            stored.moved_at.map(|at| at.timestamp()),
            member.moved_at.map(|at| at.timestamp())
        );
    }

    #[test]
    fn test_update_missing_member_fails() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_roster_repository();
        assert!(repo.update_member("g1", &MemberRecord::new("Nobody")).is_err());
    }

    #[test]
    fn test_delete_member() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_roster_repository();
        repo.create_member("g1", &MemberRecord::new("Ana")).unwrap();

        assert!(repo.delete_member("g1", "ana").unwrap());
        assert!(!repo.delete_member("g1", "ana").unwrap());
        assert!(repo.get_member("g1", "ana").unwrap().is_none());
    }

    #[test]
    fn test_hand_edited_file_defaults() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_roster_repository();
        let path = env.connection.members_file_path("g1").unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "name,id\nAna,ana\n,\nBia,bia\n").unwrap();

        let members = repo.list_members("g1").unwrap();
        assert_eq!(members.len(), 2);
        assert!(members.iter().all(|m| m.active));
    }

    #[test]
    fn test_writes_publish_roster_events() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_roster_repository();
        let scope = ChangeScope::Roster {
            group_id: "g1".to_string(),
        };
        let mut sub = env.connection.notifier().subscribe(Some(scope));

        repo.create_member("g1", &MemberRecord::new("Ana")).unwrap();
        repo.create_member("g2", &MemberRecord::new("Bia")).unwrap();
        repo.delete_member("g1", "ana").unwrap();

        assert_eq!(sub.try_next().unwrap().kind, ChangeKind::Created);
        assert_eq!(sub.try_next().unwrap().kind, ChangeKind::Deleted);
        assert!(sub.try_next().is_none());
    }
}
