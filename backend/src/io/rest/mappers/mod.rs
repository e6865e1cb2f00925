//! Conversions between domain models and the `shared` DTOs.

pub mod dashboard_mapper;
pub mod entry_mapper;
pub mod member_mapper;
