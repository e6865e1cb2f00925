use anyhow::Result;
use log::{debug, info, warn};
use std::fs;

use super::connection::CsvConnection;
use crate::domain::models::Group;
use crate::storage::notify::{ChangeEvent, ChangeKind, ChangeScope};
use crate::storage::traits::{Connection, GroupStorage};

/// YAML-backed group repository, one `group.yaml` per group directory
#[derive(Clone)]
pub struct GroupRepository {
    connection: CsvConnection,
}

impl GroupRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn load_group(&self, group_id: &str) -> Result<Option<Group>> {
        let path = self.connection.group_file_path(group_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let yaml_content = fs::read_to_string(&path)?;
        let mut group: Group = serde_yaml::from_str(&yaml_content)?;
        // The directory name is authoritative.
        group.id = group_id.to_string();
        Ok(Some(group))
    }
}

impl GroupStorage for GroupRepository {
    fn store_group(&self, group: &Group) -> Result<()> {
        let path = self.connection.group_file_path(&group.id)?;
        let yaml_content = serde_yaml::to_string(group)?;

        let existed = {
            let _guard = self.connection.lock_writes()?;
            let existed = path.exists();
            self.connection.write_atomic(&path, yaml_content.as_bytes())?;
            existed
        };

        info!("Stored group {} (number {})", group.id, group.number);
        let kind = if existed { ChangeKind::Updated } else { ChangeKind::Created };
        self.connection
            .notifier()
            .publish(ChangeEvent::new(ChangeScope::Groups, Some(&group.id), kind));
        Ok(())
    }

    fn get_group(&self, group_id: &str) -> Result<Option<Group>> {
        self.load_group(group_id)
    }

    fn list_groups(&self) -> Result<Vec<Group>> {
        let groups_dir = self.connection.groups_directory();
        if !groups_dir.exists() {
            debug!("Groups directory doesn't exist, returning empty list");
            return Ok(Vec::new());
        }

        let mut groups = Vec::new();
        for entry in fs::read_dir(&groups_dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let dir_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => {
                    warn!("Skipping directory with invalid name: {:?}", path);
                    continue;
                }
            };
            match self.load_group(&dir_name) {
                Ok(Some(group)) => groups.push(group),
                Ok(None) => debug!("Directory {} has no group.yaml", dir_name),
                Err(e) => warn!("Error loading group from {}: {}", dir_name, e),
            }
        }

        groups.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.id.cmp(&b.id)));
        Ok(groups)
    }
}
