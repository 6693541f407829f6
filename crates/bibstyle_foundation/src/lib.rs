//! Core types, diagnostics, and persistent name collections for Bibstyle.
//!
//! This crate provides:
//! - [`Error`] - Rich error types with context
//! - [`Diagnostics`] and [`Outcome`] - Collected, non-fatal problems next to a partial result
//! - [`LintCode`] and [`LintSelection`] - Stable violation identifiers and watch/ignore filtering
//! - [`NameSet`] - Persistent ordered set of schema names

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod diagnostic;
pub mod error;
pub mod lint;

pub use collections::NameSet;
pub use diagnostic::{Diagnostics, Outcome};
pub use error::{Error, ErrorContext, ErrorKind, Result, Severity};
pub use lint::{LintCode, LintSelection, normalize_id};
