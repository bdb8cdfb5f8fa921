//! Core types, rules and services for the grade management system.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! layers, leaf first:
//!
//! - [`guard`]: pure input checks.
//! - [`rules`]: per-entity semantic validation and uniqueness scoping.
//! - [`service`]: use-case pipelines over a [`store::GradeStore`].

pub mod audit;
pub mod competency;
pub mod error;
pub mod guard;
pub mod patch;
pub mod rules;
pub mod service;
pub mod store;
pub mod subject;

pub use error::{Error, ErrorKind, Result};
pub use patch::Patch;
pub use service::{CompetencyService, SubjectService};

#[cfg(test)]
mod tests;
