//! Schema aggregation and compilation for Bibstyle.
//!
//! This crate provides:
//! - [`ProtoStyle`] - The mutable aggregate of templates and user overrides
//! - [`Style`] - The compiled, immutable schema used at validation time
//! - [`FieldSchema`] and [`EntrySchema`] - Resolved field and entry records
//!
//! The flow is: `Template`s → `ProtoStyle::aggregate` → (directives) → `Style::compile`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entry;
pub mod field;
pub mod proto;
pub mod style;

pub use entry::{ConditionalRule, EntryConstraintSet, EntrySchema};
pub use field::{CompiledPattern, FieldSchema, unwrap_regexp};
pub use proto::{EntryRules, ProtoStyle};
pub use style::{CompileOptions, Style, resolve_alias};
