use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;

use super::connection::CsvConnection;
use crate::domain::models::{MonthId, MonthReport, ReportStatus};
use crate::storage::notify::{ChangeEvent, ChangeKind, ChangeScope};
use crate::storage::traits::{Connection, MonthReportStorage};

/// Intermediate struct for YAML serialization with string timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
struct YamlReport {
    month: String,
    #[serde(default)]
    status: String,
    created_at: String,
    #[serde(default)]
    created_by: String,
    updated_at: String,
    #[serde(default)]
    updated_by: String,
}

impl From<&MonthReport> for YamlReport {
    fn from(report: &MonthReport) -> Self {
        Self {
            month: report.month.to_string(),
            status: report.status.as_str().to_string(),
            created_at: report.created_at.to_rfc3339(),
            created_by: report.created_by.clone(),
            updated_at: report.updated_at.to_rfc3339(),
            updated_by: report.updated_by.clone(),
        }
    }
}

fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| anyhow!("Failed to parse {}: {}", field, e))
}

/// YAML-backed month report repository
#[derive(Clone)]
pub struct ReportRepository {
    connection: CsvConnection,
}

impl ReportRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn load(&self, group_id: &str, month: &MonthId) -> Result<Option<MonthReport>> {
        let path = self.connection.report_file_path(group_id, month)?;
        if !path.exists() {
            return Ok(None);
        }
        let yaml: YamlReport = serde_yaml::from_str(&fs::read_to_string(&path)?)?;

        Ok(Some(MonthReport {
            month: *month,
            status: ReportStatus::from_stored(&yaml.status),
            created_at: parse_timestamp(&yaml.created_at, "created_at")?,
            created_by: yaml.created_by,
            updated_at: parse_timestamp(&yaml.updated_at, "updated_at")?,
            updated_by: yaml.updated_by,
        }))
    }

    fn save(&self, group_id: &str, report: &MonthReport) -> Result<()> {
        let path = self.connection.report_file_path(group_id, &report.month)?;
        let yaml_content = serde_yaml::to_string(&YamlReport::from(report))?;
        self.connection.write_atomic(&path, yaml_content.as_bytes())
    }

    /// Load, modify and save an existing report under the write lock.
    fn modify<F>(&self, group_id: &str, month: &MonthId, change: F) -> Result<Option<MonthReport>>
    where
        F: FnOnce(&mut MonthReport),
    {
        let _guard = self.connection.lock_writes()?;
        let mut report = match self.load(group_id, month)? {
            Some(report) => report,
            None => return Ok(None),
        };
        change(&mut report);
        self.save(group_id, &report)?;
        Ok(Some(report))
    }

    fn publish(&self, group_id: &str, month: &MonthId, kind: ChangeKind) {
        let scope = ChangeScope::Report {
            group_id: group_id.to_string(),
            month: *month,
        };
        self.connection
            .notifier()
            .publish(ChangeEvent::new(scope, None, kind));
    }
}

impl MonthReportStorage for ReportRepository {
    fn get_report(&self, group_id: &str, month: &MonthId) -> Result<Option<MonthReport>> {
        self.load(group_id, month)
    }

    fn create_report_if_absent(&self, group_id: &str, report: &MonthReport) -> Result<bool> {
        {
            let _guard = self.connection.lock_writes()?;
            let path = self.connection.report_file_path(group_id, &report.month)?;
            if path.exists() {
                debug!("Report {} for group {} already exists", report.month, group_id);
                return Ok(false);
            }
            self.save(group_id, report)?;
        }

        info!("Created {} report {} for group {}", report.status, report.month, group_id);
        self.publish(group_id, &report.month, ChangeKind::Created);
        Ok(true)
    }

    fn update_status(
        &self,
        group_id: &str,
        month: &MonthId,
        status: ReportStatus,
        updated_by: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let updated = self.modify(group_id, month, |report| {
            report.status = status;
            report.updated_by = updated_by.to_string();
            report.updated_at = updated_at;
        })?;
        if updated.is_none() {
            bail!("No report {} for group {}", month, group_id);
        }

        info!("Report {} for group {} is now {}", month, group_id, status);
        self.publish(group_id, month, ChangeKind::Updated);
        Ok(())
    }

    fn touch_report(
        &self,
        group_id: &str,
        month: &MonthId,
        updated_by: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let touched = self.modify(group_id, month, |report| {
            report.updated_by = updated_by.to_string();
            report.updated_at = updated_at;
        })?;
        if touched.is_some() {
            self.publish(group_id, month, ChangeKind::Updated);
        }
        Ok(())
    }

    fn delete_report(&self, group_id: &str, month: &MonthId) -> Result<bool> {
        let removed = {
            let _guard = self.connection.lock_writes()?;
            let path = self.connection.report_file_path(group_id, month)?;
            let removed = self.connection.remove_file(&path)?;
            self.connection
                .remove_dir_if_empty(&self.connection.month_directory(group_id, month)?);
            removed
        };

        if removed {
            info!("Deleted report {} for group {}", month, group_id);
            self.publish(group_id, month, ChangeKind::Deleted);
        }
        Ok(removed)
    }
}
