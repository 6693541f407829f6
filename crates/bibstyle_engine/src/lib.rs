//! Constraint evaluation, field value checks, and the date grammar for Bibstyle.
//!
//! This crate provides:
//! - [`check_constraints`] - Mandatory and conditional presence rules for one entry
//! - [`ValueChecker`] - Datatype-specific checks for one raw field value
//! - [`DateGrammar`] - The bibliographic date and date-range grammar
//! - [`EntryValidator`] - All of the above for whole entries, filtered by lint selection
//!
//! Nothing here mutates a [`Style`](bibstyle_schema::Style); validators only
//! borrow it.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod constraint;
pub mod date;
pub mod report;
pub mod validator;
pub mod value;


pub use config::ValidationConfig;
pub use constraint::{FieldPresence, check_constraints, condition_holds};
pub use date::{DateGrammar, is_valid_date};
pub use report::{Violation, ViolationKind, ViolationReport};
pub use validator::{EntryReport, EntryValidator};
pub use value::{ValueChecker, check_value};
