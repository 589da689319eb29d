//! Core library for the hr-recap command line application.
//!
//! The library loads the employee database (and the optional organisational
//! structure workbook), reconciles their headers and columns, and computes the
//! headcount and vacancy reports the CLI prints or exports. Ingestion lives
//! under [`io`], logical column resolution in [`columns`], the aggregates in
//! [`aggregate`] and [`vacancy`], and the end-to-end orchestration in
//! [`dashboard`]. Replacement workbooks are persisted through [`publish`].

pub mod aggregate;
pub mod columns;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod io;
pub mod model;
pub mod publish;
pub mod report;
pub mod roster;
pub mod telemetry;
pub mod vacancy;

pub use error::{HrError, LoadError, PublishError, Result};
