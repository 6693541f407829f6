//! Comment stripping, command lexer, and declaration analysis for data-model sources.
//!
//! This crate provides:
//! - [`strip_comments`] - Removes `%` line comments, keeping line structure
//! - [`Lexer`] - Finds `\Name[options]{body}` commands, recursively
//! - [`DeclarationAnalyzer`] - Turns commands into typed declarations
//! - [`Template`] - The flat, immutable result for one source
//!
//! The flow is: Source → `strip_comments` → `Lexer` → `DeclarationAnalyzer` → `Template`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod comments;
pub mod declaration;
pub mod lexer;
pub mod span;
pub mod template;


pub use comments::strip_comments;
pub use declaration::{
    Condition, Constant, ConstantValue, Constraint, DataConstraint, Datatype, Declaration,
    DeclarationAnalyzer, EntryProps, FieldKind, FieldProps, MandatoryConstraint, Quantifier,
    ResetKind, option_flag, parameter_options, split_list,
};
pub use lexer::{Command, Lexer, Node};
pub use span::Span;
pub use template::{EntryConstraints, NamedEntries, NamedFields, Template, TemplateBuilder};
