//! gradebook-core: Exam score store, ranking, grade banding and bulk import.
//!
//! This crate holds the marks for an exam session, derives totals, averages
//! and competition ranks from them, maps numbers onto grade bands, and
//! converts uploaded CSV mark sheets into batches for the store.

pub mod config;
pub mod error;
pub mod grading;
pub mod model;
pub mod parser;
pub mod report;
pub mod statistics;
pub mod store;
pub mod upload;

pub use error::GradebookError;
