//! Bibstyle - bibliography data-model schemas and entry validation
//!
//! This crate re-exports all layers of the Bibstyle system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 5: bibstyle_runtime     - Style registry, serialization, CLI
//! Layer 4: bibstyle_stdlib      - Built-in default data model
//! Layer 3: bibstyle_engine      - Constraint evaluation, field values, date grammar
//! Layer 2: bibstyle_directives  - Override directives and style configuration
//! Layer 1: bibstyle_schema      - ProtoStyle aggregation and Style compilation
//! Layer 0: bibstyle_language    - Comment stripping, command lexer, declarations
//! Base:    bibstyle_foundation  - Core types (Error, Diagnostics, LintCode)
//! ```

pub use bibstyle_directives as directives;
pub use bibstyle_engine as engine;
pub use bibstyle_foundation as foundation;
pub use bibstyle_language as language;
pub use bibstyle_runtime as runtime;
pub use bibstyle_schema as schema;
pub use bibstyle_stdlib as stdlib;
