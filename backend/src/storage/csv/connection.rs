use anyhow::{anyhow, bail, Result};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{EntryRepository, GroupRepository, MemberRepository, ReportRepository, UserRepository};
use crate::domain::models::MonthId;
use crate::storage::notify::ChangeNotifier;
use crate::storage::traits::Connection;

/// Name of the data directory created under the user's documents folder.
pub const DEFAULT_DATA_DIR_NAME: &str = "Ministry Report";

/// CsvConnection owns the data directory layout and serializes writes.
///
/// ```text
/// <base>/users.yaml
/// <base>/groups/<group_id>/group.yaml
/// <base>/groups/<group_id>/members.csv
/// <base>/groups/<group_id>/reports/<YYYY-MM>/report.yaml
/// <base>/groups/<group_id>/reports/<YYYY-MM>/entries.csv
/// ```
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
    notifier: ChangeNotifier,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created data directory: {:?}", base_path);
        }

        Ok(Self {
            base_directory: Arc::new(base_path),
            write_lock: Arc::new(Mutex::new(())),
            notifier: ChangeNotifier::default(),
        })
    }

    /// ~/Documents/Ministry Report, falling back to the home directory when
    /// there is no documents folder.
    pub fn default_data_directory() -> Result<PathBuf> {
        let root = dirs::document_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow!("Could not determine home directory"))?;
        Ok(root.join(DEFAULT_DATA_DIR_NAME))
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn users_file_path(&self) -> PathBuf {
        self.base_directory.join("users.yaml")
    }

    pub fn groups_directory(&self) -> PathBuf {
        self.base_directory.join("groups")
    }

    pub fn group_directory(&self, group_id: &str) -> Result<PathBuf> {
        validate_segment(group_id)?;
        Ok(self.groups_directory().join(group_id))
    }

    pub fn group_file_path(&self, group_id: &str) -> Result<PathBuf> {
        Ok(self.group_directory(group_id)?.join("group.yaml"))
    }

    pub fn members_file_path(&self, group_id: &str) -> Result<PathBuf> {
        Ok(self.group_directory(group_id)?.join("members.csv"))
    }

    pub fn month_directory(&self, group_id: &str, month: &MonthId) -> Result<PathBuf> {
        Ok(self
            .group_directory(group_id)?
            .join("reports")
            .join(month.to_string()))
    }

    pub fn report_file_path(&self, group_id: &str, month: &MonthId) -> Result<PathBuf> {
        Ok(self.month_directory(group_id, month)?.join("report.yaml"))
    }

    pub fn entries_file_path(&self, group_id: &str, month: &MonthId) -> Result<PathBuf> {
        Ok(self.month_directory(group_id, month)?.join("entries.csv"))
    }

    /// Hold this guard across a read-modify-write of any file.
    pub fn lock_writes(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| anyhow!("Storage write lock poisoned"))
    }

    /// Write a file through a temp file and rename, creating parent
    /// directories as needed.
    pub fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
                debug!("Created directory: {:?}", parent);
            }
        }

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, contents)?;
        if let Err(e) = fs::rename(&temp_path, path) {
            warn!("Atomic rename failed for {:?}: {}", path, e);
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Remove a file, returning whether it existed.
    pub fn remove_file(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a directory if nothing is left in it.
    pub fn remove_dir_if_empty(&self, path: &Path) {
        let empty = fs::read_dir(path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if empty {
            if let Err(e) = fs::remove_dir(path) {
                debug!("Could not remove empty directory {:?}: {}", path, e);
            }
        }
    }
}

/// Ids become directory names; reject anything that could escape the
/// data directory.
fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
        || segment.chars().any(char::is_control)
    {
        bail!("Invalid storage id: {:?}", segment);
    }
    Ok(())
}

impl Connection for CsvConnection {
    type GroupRepository = GroupRepository;
    type RosterRepository = MemberRepository;
    type ReportRepository = ReportRepository;
    type EntryRepository = EntryRepository;
    type UserRepository = UserRepository;

    fn create_group_repository(&self) -> Self::GroupRepository {
        GroupRepository::new(self.clone())
    }

    fn create_roster_repository(&self) -> Self::RosterRepository {
        MemberRepository::new(self.clone())
    }

    fn create_report_repository(&self) -> Self::ReportRepository {
        ReportRepository::new(self.clone())
    }

    fn create_entry_repository(&self) -> Self::EntryRepository {
        EntryRepository::new(self.clone())
    }

    fn create_user_repository(&self) -> Self::UserRepository {
        UserRepository::new(self.clone())
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}
