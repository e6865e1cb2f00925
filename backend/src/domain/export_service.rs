//! Export service domain logic for month reports.
//!
//! Builds downloadable artifacts for a group's month and for the whole
//! congregation's month. Both formats render the same content:
//!
//! - **Spreadsheet**: CSV written with the `csv` crate, one block per
//!   section separated by empty rows;
//! - **Printable**: a plain-text report with aligned columns.
//!
//! Hour totals are rounded to one decimal here, at presentation time only.

use anyhow::{anyhow, Result};
use log::{error, info};
use std::fs;
use std::path::PathBuf;

use crate::domain::dashboard_service::{DashboardService, GroupMonthOverview, MonthOverview};
use crate::domain::models::{strip_accents, MemberMonthEntry, MonthId, Summary};
use crate::domain::session::SessionContext;
use crate::storage::traits::Connection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Spreadsheet,
    Printable,
}

impl ExportFormat {
    /// Accepts `csv`/`spreadsheet` and `txt`/`printable`, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "csv" | "spreadsheet" => Some(ExportFormat::Spreadsheet),
            "txt" | "text" | "printable" => Some(ExportFormat::Printable),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => "csv",
            ExportFormat::Printable => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => "text/csv; charset=utf-8",
            ExportFormat::Printable => "text/plain; charset=utf-8",
        }
    }
}

/// A rendered export, ready to be downloaded or written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

const MEMBER_HEADER: [&str; 7] = [
    "Name",
    "Participated",
    "Auxiliary pioneer",
    "Regular pioneer",
    "Bible studies",
    "Hours aux",
    "Hours regular",
];

const GROUP_TABLE_HEADER: [&str; 10] = [
    "Group",
    "Supervisor",
    "Status",
    "Registered",
    "Participated",
    "Auxiliary pioneers",
    "Regular pioneers",
    "Bible studies",
    "Hours aux",
    "Hours regular",
];

/// Section of an export document.
enum Block {
    Lines(Vec<String>),
    Fields(Vec<(String, String)>),
    Table {
        title: Option<String>,
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

#[derive(Clone)]
pub struct ExportService<C: Connection> {
    dashboard: DashboardService<C>,
    congregation_name: String,
}

impl<C: Connection> ExportService<C> {
    pub fn new(connection: &C, congregation_name: &str) -> Self {
        Self {
            dashboard: DashboardService::new(connection),
            congregation_name: congregation_name.trim().to_string(),
        }
    }

    /// Export one group's month. Readable by the group's supervisor and by
    /// administrators.
    pub fn group_month(
        &self,
        ctx: &SessionContext,
        group_id: &str,
        month: &str,
        format: ExportFormat,
    ) -> Result<ExportArtifact> {
        let overview = self.dashboard.group_overview(ctx, group_id, month)?;
        let month = MonthId::parse(month)?;
        info!(
            "Exporting {} of group {} as {:?} ({} entries)",
            month,
            group_id,
            format,
            overview.entries.len()
        );

        let mut blocks = vec![
            Block::Lines(vec![self.congregation_name.clone(), "Ministry report".to_string()]),
            Block::Fields(vec![
                ("Month".to_string(), format!("{} ({})", month.label(), month)),
                ("Group".to_string(), overview.group.number.to_string()),
                ("Supervisor".to_string(), or_dash(&overview.group.supervisor_name)),
                ("Status".to_string(), overview.state.as_str().to_string()),
            ]),
            Block::Fields(summary_fields(&overview.summary)),
        ];
        blocks.push(member_table(None, &overview.entries));

        let stem = format!("report_{}_group_{}", month, overview.group.number);
        render(&stem, format, &blocks)
    }

    /// Export the congregation's month: totals, one consolidated row per
    /// group and every group's member table (admin only).
    pub fn congregation_month(
        &self,
        ctx: &SessionContext,
        month: &str,
        format: ExportFormat,
    ) -> Result<ExportArtifact> {
        let overview = self.dashboard.month_overview(ctx, month)?;
        info!(
            "Exporting congregation month {} as {:?} ({} groups)",
            overview.month,
            format,
            overview.groups.len()
        );

        let mut blocks = vec![
            Block::Lines(vec![
                self.congregation_name.clone(),
                "Ministry report - congregation".to_string(),
            ]),
            Block::Fields(vec![
                (
                    "Month".to_string(),
                    format!("{} ({})", overview.month.label(), overview.month),
                ),
                ("Groups".to_string(), overview.groups.len().to_string()),
                ("Submitted".to_string(), overview.submitted_count().to_string()),
                ("Entries".to_string(), overview.total_entries.to_string()),
            ]),
            Block::Fields(summary_fields(&overview.congregation)),
            group_table(&overview),
        ];
        for group in &overview.groups {
            blocks.push(member_table(Some(group.group.label()), &group.entries));
        }

        let stem = if self.congregation_name.is_empty() {
            format!("congregation_report_{}", overview.month)
        } else {
            format!("{}_report_{}", self.congregation_name, overview.month)
        };
        render(&stem, format, &blocks)
    }
}

/// Write an artifact into `directory`, or into the user's documents folder
/// (home folder as fallback) when none is given. Returns the written path.
pub fn export_to_path(artifact: &ExportArtifact, directory: Option<&str>) -> Result<PathBuf> {
    let directory = match directory.map(sanitize_path).filter(|p| !p.is_empty()) {
        Some(custom) => PathBuf::from(custom),
        None => dirs::document_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow!("Could not determine export directory"))?,
    };

    if let Err(e) = fs::create_dir_all(&directory) {
        error!("Failed to create export directory {:?}: {}", directory, e);
        return Err(e.into());
    }
    let file_path = directory.join(&artifact.filename);
    fs::write(&file_path, &artifact.bytes)?;
    info!("Exported {} ({} bytes)", file_path.display(), artifact.bytes.len());
    Ok(file_path)
}

/// Filesystem-safe name: accents stripped, every other non-word character
/// replaced by `_`, runs of `_` collapsed.
pub fn safe_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in strip_accents(name.trim()).chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '_' };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "export".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Clean up a user-typed directory: surrounding quotes, escaped spaces,
/// trailing separators and a leading `~`.
fn sanitize_path(path: &str) -> String {
    let mut cleaned = path.trim();
    if cleaned.len() >= 2
        && ((cleaned.starts_with('"') && cleaned.ends_with('"'))
            || (cleaned.starts_with('\'') && cleaned.ends_with('\'')))
    {
        cleaned = cleaned[1..cleaned.len() - 1].trim();
    }
    let mut cleaned = cleaned.replace("\\ ", " ");
    while cleaned.len() > 1 && (cleaned.ends_with('/') || cleaned.ends_with('\\')) {
        cleaned.pop();
    }

    if let Some(home) = dirs::home_dir() {
        if cleaned == "~" {
            return home.to_string_lossy().to_string();
        }
        if let Some(rest) = cleaned.strip_prefix("~/").or_else(|| cleaned.strip_prefix("~\\")) {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    cleaned
}

fn render(stem: &str, format: ExportFormat, blocks: &[Block]) -> Result<ExportArtifact> {
    let bytes = match format {
        ExportFormat::Spreadsheet => render_csv(blocks)?,
        ExportFormat::Printable => render_text(blocks).into_bytes(),
    };
    Ok(ExportArtifact {
        filename: format!("{}.{}", safe_filename(stem), format.extension()),
        content_type: format.content_type(),
        bytes,
    })
}

fn render_csv(blocks: &[Block]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            writer.write_record(None::<&str>)?;
        }
        match block {
            Block::Lines(lines) => {
                for line in lines {
                    writer.write_record([line])?;
                }
            }
            Block::Fields(fields) => {
                for (label, value) in fields {
                    writer.write_record([label, value])?;
                }
            }
            Block::Table { title, header, rows } => {
                if let Some(title) = title {
                    writer.write_record([title])?;
                }
                writer.write_record(header)?;
                for row in rows {
                    writer.write_record(row)?;
                }
            }
        }
    }

    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to finish CSV export: {}", e.error()))
}

fn render_text(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Lines(lines) => {
                for line in lines {
                    out.push_str(line);
                    out.push('\n');
                }
            }
            Block::Fields(fields) => {
                let width = fields.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
                for (label, value) in fields {
                    out.push_str(&format!("{:<width$}  {}\n", label, value, width = width));
                }
            }
            Block::Table { title, header, rows } => {
                if let Some(title) = title {
                    out.push_str(title);
                    out.push('\n');
                }
                let widths = column_widths(header, rows);
                push_row(&mut out, header, &widths);
                let rule: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
                out.push_str(&"-".repeat(rule));
                out.push('\n');
                for row in rows {
                    push_row(&mut out, row, &widths);
                }
            }
        }
        out.push('\n');
    }
    out
}

fn column_widths(header: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }
    widths
}

/// First column left-aligned, the rest right-aligned.
fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &width))| {
            if i == 0 {
                format!("{:<width$}", cell, width = width)
            } else {
                format!("{:>width$}", cell, width = width)
            }
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn summary_fields(summary: &Summary) -> Vec<(String, String)> {
    let s = summary.rounded();
    vec![
        ("Hours aux (total)".to_string(), hours(s.total_hours_aux)),
        ("Hours regular (total)".to_string(), hours(s.total_hours_regular)),
        ("Bible studies (total)".to_string(), s.total_bible_studies.to_string()),
        ("Auxiliary pioneers".to_string(), s.count_aux_pioneers.to_string()),
        ("Regular pioneers".to_string(), s.count_regular_pioneers.to_string()),
        ("Participated".to_string(), s.total_participated.to_string()),
        ("Registered".to_string(), s.total_registered.to_string()),
        (
            "Bible studies by regular pioneers".to_string(),
            s.bible_studies_by_regular.to_string(),
        ),
        (
            "Bible studies by auxiliary pioneers".to_string(),
            s.bible_studies_by_aux.to_string(),
        ),
        (
            "Bible studies by publishers who participated".to_string(),
            s.bible_studies_by_participated.to_string(),
        ),
    ]
}

fn member_table(title: Option<String>, entries: &[MemberMonthEntry]) -> Block {
    Block::Table {
        title,
        header: MEMBER_HEADER.iter().map(|h| h.to_string()).collect(),
        rows: entries
            .iter()
            .map(|e| {
                vec![
                    e.name.clone(),
                    yes_no(e.participated),
                    yes_no(e.auxiliary_pioneer),
                    yes_no(e.regular_pioneer),
                    e.bible_studies.to_string(),
                    hours(e.hours_aux),
                    hours(e.hours_regular),
                ]
            })
            .collect(),
    }
}

fn group_table(overview: &MonthOverview) -> Block {
    Block::Table {
        title: Some("Groups".to_string()),
        header: GROUP_TABLE_HEADER.iter().map(|h| h.to_string()).collect(),
        rows: overview.groups.iter().map(group_row).collect(),
    }
}

fn group_row(group: &GroupMonthOverview) -> Vec<String> {
    let s = group.summary.rounded();
    vec![
        group.group.number.to_string(),
        or_dash(&group.group.supervisor_name),
        group.state.as_str().to_string(),
        s.total_registered.to_string(),
        s.total_participated.to_string(),
        s.count_aux_pioneers.to_string(),
        s.count_regular_pioneers.to_string(),
        s.total_bible_studies.to_string(),
        hours(s.total_hours_aux),
        hours(s.total_hours_regular),
    ]
}

fn hours(value: f64) -> String {
    format!("{}", (value * 10.0).round() / 10.0)
}

fn yes_no(value: bool) -> String {
    let text = if value { "Yes" } else { "No" };
    text.to_string()
}

fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.trim().to_string()
    }
}
