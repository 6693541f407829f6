//! Integration tests for the language layer
//!
//! Tests for comment stripping, the command lexer, declaration analysis and
//! template construction.

mod declarations;
mod lexer;
