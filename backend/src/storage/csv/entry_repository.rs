use anyhow::{anyhow, Result};
use csv::StringRecord;
use log::{debug, info, warn};

use super::columns::{read_rows, to_csv_bytes, Columns};
use super::connection::CsvConnection;
use crate::domain::models::lenient;
use crate::domain::models::{EntryPatch, MemberMonthEntry, MonthId};
use crate::storage::notify::{ChangeEvent, ChangeKind, ChangeScope};
use crate::storage::traits::{Connection, EntryStorage};

const HEADER: [&str; 8] = [
    "id",
    "name",
    "participated",
    "auxiliary_pioneer",
    "regular_pioneer",
    "bible_studies",
    "hours_aux",
    "hours_regular",
];

/// CSV-backed month entry repository, one `entries.csv` per group month
#[derive(Clone)]
pub struct EntryRepository {
    connection: CsvConnection,
}

impl EntryRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_entries(&self, group_id: &str, month: &MonthId) -> Result<Vec<MemberMonthEntry>> {
        let path = self.connection.entries_file_path(group_id, month)?;
        read_rows(&path, parse_entry)
    }

    fn write_entries(
        &self,
        group_id: &str,
        month: &MonthId,
        entries: &[MemberMonthEntry],
    ) -> Result<()> {
        let path = self.connection.entries_file_path(group_id, month)?;
        let rows = entries.iter().map(|e| {
            vec![
                e.id.clone(),
                e.name.clone(),
                e.participated.to_string(),
                e.auxiliary_pioneer.to_string(),
                e.regular_pioneer.to_string(),
                e.bible_studies.to_string(),
                e.hours_aux.to_string(),
                e.hours_regular.to_string(),
            ]
        });
        let bytes = to_csv_bytes(&HEADER, rows)?;
        self.connection.write_atomic(&path, &bytes)
    }

    fn publish(&self, group_id: &str, month: &MonthId, entry_id: &str, kind: ChangeKind) {
        let scope = ChangeScope::Entries {
            group_id: group_id.to_string(),
            month: *month,
        };
        self.connection
            .notifier()
            .publish(ChangeEvent::new(scope, Some(entry_id), kind));
    }
}

/// Malformed cells read as zero/false rather than failing the whole month.
fn parse_entry(columns: &Columns, record: &StringRecord) -> Option<MemberMonthEntry> {
    let id = columns.get(record, "id").trim();
    if id.is_empty() {
        warn!("Skipping entry row without id");
        return None;
    }

    Some(MemberMonthEntry {
        id: id.to_string(),
        name: columns.get(record, "name").to_string(),
        participated: lenient::flag_from_cell(columns.get(record, "participated"), false),
        auxiliary_pioneer: lenient::flag_from_cell(columns.get(record, "auxiliary_pioneer"), false),
        regular_pioneer: lenient::flag_from_cell(columns.get(record, "regular_pioneer"), false),
        bible_studies: lenient::count_from_cell(columns.get(record, "bible_studies")),
        hours_aux: lenient::number_from_cell(columns.get(record, "hours_aux")),
        hours_regular: lenient::number_from_cell(columns.get(record, "hours_regular")),
    })
}

impl EntryStorage for EntryRepository {
    fn list_entries(&self, group_id: &str, month: &MonthId) -> Result<Vec<MemberMonthEntry>> {
        self.read_entries(group_id, month)
    }

    fn get_entry(
        &self,
        group_id: &str,
        month: &MonthId,
        entry_id: &str,
    ) -> Result<Option<MemberMonthEntry>> {
        Ok(self
            .read_entries(group_id, month)?
            .into_iter()
            .find(|e| e.id == entry_id))
    }

    fn create_entry(
        &self,
        group_id: &str,
        month: &MonthId,
        entry: &MemberMonthEntry,
    ) -> Result<bool> {
        {
            let _guard = self.connection.lock_writes()?;
            let mut entries = self.read_entries(group_id, month)?;
            if entries.iter().any(|e| e.id == entry.id) {
                debug!("Entry {} already exists in {}/{}", entry.id, group_id, month);
                return Ok(false);
            }
            entries.push(entry.clone());
            self.write_entries(group_id, month, &entries)?;
        }

        debug!("Created entry {} in {}/{}", entry.id, group_id, month);
        self.publish(group_id, month, &entry.id, ChangeKind::Created);
        Ok(true)
    }

    fn update_entry_fields(
        &self,
        group_id: &str,
        month: &MonthId,
        entry_id: &str,
        patch: &EntryPatch,
    ) -> Result<MemberMonthEntry> {
        let updated = {
            let _guard = self.connection.lock_writes()?;
            let mut entries = self.read_entries(group_id, month)?;
            let entry = entries
                .iter_mut()
                .find(|e| e.id == entry_id)
                .ok_or_else(|| anyhow!("Entry {} not found in {}/{}", entry_id, group_id, month))?;
            entry.apply(patch);
            let updated = entry.clone();
            self.write_entries(group_id, month, &entries)?;
            updated
        };

        debug!("Updated entry {} in {}/{}", entry_id, group_id, month);
        self.publish(group_id, month, entry_id, ChangeKind::Updated);
        Ok(updated)
    }

    fn delete_entry(&self, group_id: &str, month: &MonthId, entry_id: &str) -> Result<bool> {
        {
            let _guard = self.connection.lock_writes()?;
            let mut entries = self.read_entries(group_id, month)?;
            let before = entries.len();
            entries.retain(|e| e.id != entry_id);
            if entries.len() == before {
                return Ok(false);
            }
            if entries.is_empty() {
                let path = self.connection.entries_file_path(group_id, month)?;
                self.connection.remove_file(&path)?;
                self.connection
                    .remove_dir_if_empty(&self.connection.month_directory(group_id, month)?);
            } else {
                self.write_entries(group_id, month, &entries)?;
            }
        }

        info!("Deleted entry {} from {}/{}", entry_id, group_id, month);
        self.publish(group_id, month, entry_id, ChangeKind::Deleted);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;

    fn feb() -> MonthId {
        MonthId::new(2026, 2).unwrap()
    }

    #[test]
    fn test_create_never_overwrites() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_entry_repository();

        let mut ana = MemberMonthEntry::blank("ana", "Ana");
        ana.hours_aux = 12.5;
        assert!(repo.create_entry("g1", &feb(), &ana).unwrap());
        assert!(!repo
            .create_entry("g1", &feb(), &MemberMonthEntry::blank("ana", "Ana"))
            .unwrap());

        let stored = repo.get_entry("g1", &feb(), "ana").unwrap().unwrap();
        assert_eq!(stored.hours_aux, 12.5);
    }

    #[test]
    fn test_update_fields_only_touches_patch() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_entry_repository();
        let mut ana = MemberMonthEntry::blank("ana", "Ana");
        ana.bible_studies = 3;
        ana.hours_regular = 40.0;
        repo.create_entry("g1", &feb(), &ana).unwrap();

        let updated = repo
            .update_entry_fields("g1", &feb(), "ana", &EntryPatch::rename("Ana Maria"))
            .unwrap();
        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.bible_studies, 3);
        assert_eq!(updated.hours_regular, 40.0);
        assert_eq!(repo.get_entry("g1", &feb(), "ana").unwrap(), Some(updated));

        assert!(repo
            .update_entry_fields("g1", &feb(), "nobody", &EntryPatch::rename("x"))
            .is_err());
    }

    #[test]
    fn test_months_are_isolated() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_entry_repository();
        let mar = MonthId::new(2026, 3).unwrap();
        repo.create_entry("g1", &feb(), &MemberMonthEntry::blank("ana", "Ana"))
            .unwrap();

        assert!(repo.list_entries("g1", &mar).unwrap().is_empty());
        assert!(repo.list_entries("g2", &feb()).unwrap().is_empty());
        assert_eq!(repo.list_entries("g1", &feb()).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_cells_read_as_zero() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_entry_repository();
        let path = env.connection.entries_file_path("g1", &feb()).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "id,name,participated,hours_aux,bible_studies\nana,Ana,yes,abc,-2\nbia,Bia,0,\"7,5\",2\n",
        )
        .unwrap();

        let entries = repo.list_entries("g1", &feb()).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].participated);
        assert_eq!(entries[0].hours_aux, 0.0);
        assert_eq!(entries[0].bible_studies, 0);
        assert!(!entries[1].participated);
        assert_eq!(entries[1].hours_aux, 7.5);
        assert_eq!(entries[1].hours_regular, 0.0);
    }

    #[test]
    fn test_short_row_keeps_month_readable() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_entry_repository();
        let path = env.connection.entries_file_path("g1", &feb()).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "id,name,participated,hours_aux\nana,Ana,true,3\nbia,Bia\n").unwrap();

        let entries = repo.list_entries("g1", &feb()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].hours_aux, 3.0);
        assert_eq!(entries[1].id, "bia");
        assert!(!entries[1].participated);
        assert_eq!(entries[1].hours_aux, 0.0);
    }

    #[test]
    fn test_delete_last_entry_removes_file() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_entry_repository();
        repo.create_entry("g1", &feb(), &MemberMonthEntry::blank("ana", "Ana"))
            .unwrap();
        repo.create_entry("g1", &feb(), &MemberMonthEntry::blank("bia", "Bia"))
            .unwrap();

        assert!(repo.delete_entry("g1", &feb(), "ana").unwrap());
        assert!(!repo.delete_entry("g1", &feb(), "ana").unwrap());
        assert!(repo.delete_entry("g1", &feb(), "bia").unwrap());
        assert!(!env.connection.entries_file_path("g1", &feb()).unwrap().exists());
    }
}
