use anyhow::Result;
use log::info;
use std::fs;

use super::connection::CsvConnection;
use crate::domain::models::UserProfile;
use crate::storage::notify::{ChangeEvent, ChangeKind, ChangeScope};
use crate::storage::traits::{Connection, UserStorage};

/// YAML-backed user profile repository; all profiles live in `users.yaml`
#[derive(Clone)]
pub struct UserRepository {
    connection: CsvConnection,
}

impl UserRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_profiles(&self) -> Result<Vec<UserProfile>> {
        let path = self.connection.users_file_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let yaml_content = fs::read_to_string(&path)?;
        if yaml_content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_yaml::from_str(&yaml_content)?)
    }
}

impl UserStorage for UserRepository {
    fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        Ok(self.read_profiles()?.into_iter().find(|p| p.uid == uid))
    }

    fn list_profiles(&self) -> Result<Vec<UserProfile>> {
        self.read_profiles()
    }

    fn store_profile(&self, profile: &UserProfile) -> Result<()> {
        let kind = {
            let _guard = self.connection.lock_writes()?;
            let mut profiles = self.read_profiles()?;
            let kind = match profiles.iter_mut().find(|p| p.uid == profile.uid) {
                Some(existing) => {
                    *existing = profile.clone();
                    ChangeKind::Updated
                }
                None => {
                    profiles.push(profile.clone());
                    ChangeKind::Created
                }
            };
            let yaml_content = serde_yaml::to_string(&profiles)?;
            self.connection
                .write_atomic(&self.connection.users_file_path(), yaml_content.as_bytes())?;
            kind
        };

        info!("Stored profile for user {} ({})", profile.uid, profile.role);
        self.connection
            .notifier()
            .publish(ChangeEvent::new(ChangeScope::Users, Some(&profile.uid), kind));
        Ok(())
    }
}
