//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services: request
//! parsing, identity extraction, DTO mapping and translation of domain
//! errors into status codes.

pub mod rest;
