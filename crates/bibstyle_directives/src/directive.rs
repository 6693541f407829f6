//! Single override directives.
//!
//! A directive has the shape `<verb> <name> { <options> }`; the braces are
//! optional when there are no options:
//!
//! ```text
//! add doi {type=field, datatype=verbatim}
//! alias journaltitle {journal}
//! require article {all=[author, title], some=[date, year]}
//! rsome article {year}
//! ```

use std::fmt;

use bibstyle_foundation::{Error, ErrorContext, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::options::{DirectiveOption, parse_options};

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([a-zA-Z]+)\s+([a-zA-Z][a-zA-Z0-9_\-]*)\s*(?:\{([^\}]*)\})?\s*$")
        .expect("directive pattern is a valid regex")
});

/// What a directive edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// A field record.
    Field,
    /// An entry type.
    Entry,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => write!(f, "field"),
            Self::Entry => write!(f, "entry"),
        }
    }
}

/// The operation a directive performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Create, or update in place.
    Add,
    /// Delete.
    Remove,
    /// Update an existing record.
    Set,
    /// Register alternate names.
    Alias,
    /// Append mandatory clauses (entries only).
    Require,
    /// Drop names from the `all` clause (entries only).
    RelaxAll,
    /// Drop names from every `some` group (entries only).
    RelaxSome,
    /// Drop names from every `one` group (entries only).
    RelaxOne,
}

impl Verb {
    /// Parses a verb or one of its short forms.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "a" | "add" => Some(Self::Add),
            "r" | "remove" => Some(Self::Remove),
            "s" | "set" => Some(Self::Set),
            "alias" => Some(Self::Alias),
            "require" => Some(Self::Require),
            "rall" => Some(Self::RelaxAll),
            "rsome" => Some(Self::RelaxSome),
            "rone" => Some(Self::RelaxOne),
            _ => None,
        }
    }

    /// The canonical spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Set => "set",
            Self::Alias => "alias",
            Self::Require => "require",
            Self::RelaxAll => "rall",
            Self::RelaxSome => "rsome",
            Self::RelaxOne => "rone",
        }
    }

    /// Returns true if the verb can be used on `target`.
    #[must_use]
    pub fn applies_to(self, target: Target) -> bool {
        match self {
            Self::Add | Self::Remove | Self::Set | Self::Alias => true,
            Self::Require | Self::RelaxAll | Self::RelaxSome | Self::RelaxOne => {
                target == Target::Entry
            }
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive {
    /// Field or entry.
    pub target: Target,
    /// The operation.
    pub verb: Verb,
    /// Lowercased record name.
    pub name: String,
    /// Options in source order.
    pub options: Vec<DirectiveOption>,
    /// The text the directive was parsed from.
    pub source: String,
}

impl Directive {
    /// Creates a directive without source text.
    #[must_use]
    pub fn new(target: Target, verb: Verb, name: impl Into<String>) -> Self {
        Self {
            target,
            verb,
            name: name.into().to_ascii_lowercase(),
            options: Vec::new(),
            source: String::new(),
        }
    }

    /// Appends an option.
    #[must_use]
    pub fn with_option(mut self, option: DirectiveOption) -> Self {
        self.options.push(option);
        self
    }

    /// Parses one directive string.
    ///
    /// # Errors
    ///
    /// Returns a directive error if the text does not have the directive
    /// shape, names an unknown verb, uses an entry-only verb on a field, or
    /// has a malformed option list.
    pub fn parse(target: Target, text: &str) -> Result<Self> {
        let context = ErrorContext::new().with_snippet(text);
        let Some(caps) = DIRECTIVE.captures(text) else {
            return Err(Error::directive(format!("cannot parse {target} directive")).with_context(context));
        };
        let verb_text = &caps[1];
        let Some(verb) = Verb::parse(verb_text) else {
            return Err(Error::directive(format!("unknown verb '{verb_text}'")).with_context(context));
        };
        if !verb.applies_to(target) {
            return Err(Error::directive(format!("'{verb}' cannot be applied to a {target}"))
                .with_context(context));
        }
        let options = match caps.get(3) {
            Some(body) => parse_options(body.as_str()).map_err(|e| e.with_context(context))?,
            None => Vec::new(),
        };
        Ok(Self {
            target,
            verb,
            name: caps[2].to_ascii_lowercase(),
            options,
            source: text.trim().to_string(),
        })
    }

    /// Returns the first option with `key`.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&DirectiveOption> {
        self.options.iter().find(|o| o.key == key)
    }

    /// An error for this directive, carrying its source text.
    #[must_use]
    pub fn error(&self, message: impl Into<String>) -> Error {
        let error = Error::directive(message);
        if self.source.is_empty() {
            error
        } else {
            error.with_context(ErrorContext::new().with_snippet(self.source.clone()))
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb, self.name)?;
        if !self.options.is_empty() {
            let opts: Vec<String> = self.options.iter().map(ToString::to_string).collect();
            write!(f, " {{{}}}", opts.join(", "))?;
        }
        Ok(())
    }
}
