/// Test utilities module for automatic cleanup and consistent test infrastructure
///
/// This module provides RAII-based cleanup that guarantees test data is removed
/// even if tests panic or fail.
use anyhow::{anyhow, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use super::connection::CsvConnection;
use super::{EntryRepository, GroupRepository, MemberRepository, ReportRepository, UserRepository};
use crate::domain::models::{
    EntryPatch, Group, MemberMonthEntry, MemberRecord, MonthId, MonthReport, Role, UserProfile,
};
use crate::storage::notify::ChangeNotifier;
use crate::storage::traits::{
    Connection, EntryStorage, GroupStorage, MonthReportStorage, RosterStorage, UserStorage,
};

/// RAII Test Environment that automatically cleans up on drop
pub struct TestEnvironment {
    /// The temporary directory - kept alive to prevent auto-cleanup until drop
    _temp_dir: TempDir,
    pub connection: CsvConnection,
    pub base_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = CsvConnection::new(&base_path)?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            connection,
            base_path,
        })
    }

    pub fn helper(&self) -> TestHelper<'_> {
        TestHelper { env: self }
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        if std::env::var("MINISTRY_REPORT_DEBUG_TESTS").is_ok() {
            println!("Cleaning up test environment: {:?}", self.base_path);
        }
    }
}

/// Seeding shortcuts for tests that need a populated data directory
pub struct TestHelper<'a> {
    env: &'a TestEnvironment,
}

impl TestHelper<'_> {
    /// Group `group_id` with number `number`, supervised by `supervisor_uid`
    /// and a matching `group` user profile.
    pub fn create_group(&self, group_id: &str, number: u32, supervisor_uid: &str) -> Result<Group> {
        let group = Group {
            id: group_id.to_string(),
            number,
            supervisor_name: format!("Supervisor {}", number),
            editors: vec![supervisor_uid.to_string()],
        };
        self.env.connection.create_group_repository().store_group(&group)?;
        self.create_user(supervisor_uid, Role::Group, Some(group_id))?;
        Ok(group)
    }

    pub fn create_user(&self, uid: &str, role: Role, group_id: Option<&str>) -> Result<UserProfile> {
        let profile = UserProfile {
            uid: uid.to_string(),
            name: uid.to_string(),
            role,
            group_id: group_id.map(str::to_string),
        };
        self.env.connection.create_user_repository().store_profile(&profile)?;
        Ok(profile)
    }

    /// Add active members by display name; returns their ids.
    pub fn add_members(&self, group_id: &str, names: &[&str]) -> Result<Vec<String>> {
        let roster = self.env.connection.create_roster_repository();
        let mut ids = Vec::new();
        for name in names {
            let member = MemberRecord::new(name);
            roster.create_member(group_id, &member)?;
            ids.push(member.id);
        }
        Ok(ids)
    }

    pub fn create_draft(&self, group_id: &str, month: &MonthId) -> Result<()> {
        let report = MonthReport::new_draft(*month, "test", Utc::now());
        self.env
            .connection
            .create_report_repository()
            .create_report_if_absent(group_id, &report)?;
        Ok(())
    }

    pub fn insert_entry(&self, group_id: &str, month: &MonthId, entry: MemberMonthEntry) -> Result<()> {
        self.env
            .connection
            .create_entry_repository()
            .create_entry(group_id, month, &entry)?;
        Ok(())
    }

    pub fn entries(&self, group_id: &str, month: &MonthId) -> Result<Vec<MemberMonthEntry>> {
        self.env
            .connection
            .create_entry_repository()
            .list_entries(group_id, month)
    }
}

/// Storage wrapper that fails entry writes for chosen ids and can make the
/// roster unreadable.
#[derive(Clone)]
pub struct FlakyConnection {
    inner: CsvConnection,
    failures: Arc<Mutex<HashMap<String, u32>>>,
    roster_broken: Arc<AtomicBool>,
}

impl FlakyConnection {
    pub fn new(inner: CsvConnection) -> Self {
        Self {
            inner,
            failures: Arc::new(Mutex::new(HashMap::new())),
            roster_broken: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fail the next `times` writes of `entry_id`.
    pub fn fail_writes(&self, entry_id: &str, times: u32) {
        self.failures.lock().unwrap().insert(entry_id.to_string(), times);
    }

    pub fn break_roster(&self) {
        self.roster_broken.store(true, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct FlakyEntries {
    inner: EntryRepository,
    failures: Arc<Mutex<HashMap<String, u32>>>,
}

impl FlakyEntries {
    fn check(&self, entry_id: &str) -> Result<()> {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(entry_id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(anyhow!("connection reset while writing {}", entry_id))
            }
            _ => Ok(()),
        }
    }
}

impl EntryStorage for FlakyEntries {
    fn list_entries(&self, group_id: &str, month: &MonthId) -> Result<Vec<MemberMonthEntry>> {
        self.inner.list_entries(group_id, month)
    }

    fn get_entry(&self, group_id: &str, month: &MonthId, entry_id: &str) -> Result<Option<MemberMonthEntry>> {
        self.inner.get_entry(group_id, month, entry_id)
    }

    fn create_entry(&self, group_id: &str, month: &MonthId, entry: &MemberMonthEntry) -> Result<bool> {
        self.check(&entry.id)?;
        self.inner.create_entry(group_id, month, entry)
    }

    fn update_entry_fields(
        &self,
        group_id: &str,
        month: &MonthId,
        entry_id: &str,
        patch: &EntryPatch,
    ) -> Result<MemberMonthEntry> {
        self.check(entry_id)?;
        self.inner.update_entry_fields(group_id, month, entry_id, patch)
    }

    fn delete_entry(&self, group_id: &str, month: &MonthId, entry_id: &str) -> Result<bool> {
        self.check(entry_id)?;
        self.inner.delete_entry(group_id, month, entry_id)
    }
}

#[derive(Clone)]
pub struct FlakyRoster {
    inner: MemberRepository,
    broken: Arc<AtomicBool>,
}

impl RosterStorage for FlakyRoster {
    fn list_members(&self, group_id: &str) -> Result<Vec<MemberRecord>> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(anyhow!("roster unreadable"));
        }
        self.inner.list_members(group_id)
    }

    fn get_member(&self, group_id: &str, member_id: &str) -> Result<Option<MemberRecord>> {
        self.inner.get_member(group_id, member_id)
    }

    fn create_member(&self, group_id: &str, member: &MemberRecord) -> Result<()> {
        self.inner.create_member(group_id, member)
    }

    fn update_member(&self, group_id: &str, member: &MemberRecord) -> Result<()> {
        self.inner.update_member(group_id, member)
    }

    fn delete_member(&self, group_id: &str, member_id: &str) -> Result<bool> {
        self.inner.delete_member(group_id, member_id)
    }
}

impl Connection for FlakyConnection {
    type GroupRepository = GroupRepository;
    type RosterRepository = FlakyRoster;
    type ReportRepository = ReportRepository;
    type EntryRepository = FlakyEntries;
    type UserRepository = UserRepository;

    fn create_group_repository(&self) -> Self::GroupRepository {
        self.inner.create_group_repository()
    }

    fn create_roster_repository(&self) -> Self::RosterRepository {
        FlakyRoster {
            inner: self.inner.create_roster_repository(),
            broken: self.roster_broken.clone(),
        }
    }

    fn create_report_repository(&self) -> Self::ReportRepository {
        self.inner.create_report_repository()
    }

    fn create_entry_repository(&self) -> Self::EntryRepository {
        FlakyEntries {
            inner: self.inner.create_entry_repository(),
            failures: self.failures.clone(),
        }
    }

    fn create_user_repository(&self) -> Self::UserRepository {
        self.inner.create_user_repository()
    }

    fn notifier(&self) -> &ChangeNotifier {
        self.inner.notifier()
    }
}
