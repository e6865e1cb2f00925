//! # CSV Storage Module
//!
//! File-based document storage for groups, rosters and month reports. Every
//! collection is a CSV or YAML file under one data directory, rewritten
//! atomically (temp file + rename) under a process-wide write lock.
//!
//! ## File Format
//!
//! Rosters and month entries are CSV files read by header name, so columns
//! may be reordered or missing:
//! ```csv
//! id,name,participated,auxiliary_pioneer,regular_pioneer,bible_studies,hours_aux,hours_regular
//! ana-souza,Ana Souza,true,true,false,2,12.5,0
//! ```
//! Groups, report status documents and user profiles are YAML.

mod columns;
pub mod connection;
pub mod entry_repository;
pub mod group_repository;
pub mod member_repository;
pub mod report_repository;
pub mod user_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::CsvConnection;
pub use entry_repository::EntryRepository;
pub use group_repository::GroupRepository;
pub use member_repository::MemberRepository;
pub use report_repository::ReportRepository;
pub use user_repository::UserRepository;
