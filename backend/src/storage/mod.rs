//! # Storage Module
//!
//! Handles all data persistence for the ministry report backend.
//!
//! The domain layer only sees the traits in [`traits`]; the CSV/YAML
//! implementation in [`csv`] can be swapped for another document store
//! without touching domain logic.
//!
//! ## Key Responsibilities
//!
//! - **Data Persistence**: groups, rosters, month reports and user profiles
//! - **Field-level updates**: entry writes touch only the fields they name
//! - **Change notification**: every successful write publishes a
//!   [`notify::ChangeEvent`]

pub mod csv;
pub mod notify;
pub mod traits;

pub use self::csv::CsvConnection;
pub use notify::{ChangeEvent, ChangeKind, ChangeNotifier, ChangeScope, Subscription};
pub use traits::{
    Connection, EntryStorage, GroupStorage, MonthReportStorage, RosterStorage, UserStorage,
};
