//! Command lexer for data-model sources.
//!
//! The lexer is a recursive-descent scanner over an explicit character
//! cursor. It finds commands of the form `\Name[options]{arg}{arg}...` and
//! lexes the first argument of every command again, so constraint blocks
//! come out as a tree of nested commands.
//!
//! Options and arguments are brace-balanced and backslash-escape aware.
//! A malformed command (unterminated options or argument) is reported and
//! skipped; scanning resumes right after the opening delimiter, so one bad
//! declaration never hides the rest of the source.

use bibstyle_foundation::{Diagnostics, Error, ErrorKind, Outcome};

use crate::span::Span;

/// One lexed item.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A `\Name[...]{...}` command.
    Command(Command),
    /// Non-empty text between commands, trimmed.
    Text {
        /// The trimmed text.
        body: String,
        /// Where the untrimmed gap started.
        span: Span,
    },
}

impl Node {
    /// Returns the command, if this node is one.
    #[must_use]
    pub fn as_command(&self) -> Option<&Command> {
        match self {
            Node::Command(cmd) => Some(cmd),
            Node::Text { .. } => None,
        }
    }

    /// Returns the source span.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Node::Command(cmd) => cmd.span,
            Node::Text { span, .. } => *span,
        }
    }
}

/// A lexed command.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    /// Command name without the backslash.
    pub name: String,
    /// Raw text between `[` and `]`, if present.
    pub options: Option<String>,
    /// Raw text of each consecutive `{...}` argument.
    pub arguments: Vec<String>,
    /// The first argument, lexed again.
    pub children: Vec<Node>,
    /// From the backslash to the end of the last argument.
    pub span: Span,
}

impl Command {
    /// Returns the first argument.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.argument(0)
    }

    /// Returns the argument at `index`.
    #[must_use]
    pub fn argument(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).map(String::as_str)
    }

    /// Iterates over the child commands, skipping text.
    pub fn child_commands(&self) -> impl Iterator<Item = &Command> {
        self.children.iter().filter_map(Node::as_command)
    }
}

#[derive(Clone, Copy, Debug)]
struct Cursor {
    pos: usize,
    line: u32,
    column: u32,
}

/// Lexer over one region of a source.
pub struct Lexer<'src> {
    source: &'src str,
    end: usize,
    cursor: Cursor,
    diagnostics: Diagnostics,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer over the whole source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self::bounded(
            source,
            Cursor {
                pos: 0,
                line: 1,
                column: 1,
            },
            source.len(),
        )
    }

    fn bounded(source: &'src str, cursor: Cursor, end: usize) -> Self {
        Self {
            source,
            end,
            cursor,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Lexes a complete source.
    #[must_use]
    pub fn tokenize(source: &str) -> Outcome<Vec<Node>> {
        let mut lexer = Lexer::new(source);
        let nodes = lexer.nodes();
        Outcome::new(nodes, lexer.diagnostics)
    }

    /// Lexes everything up to the end of this lexer's region.
    fn nodes(&mut self) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut gap_start = self.cursor;

        while let Some(c) = self.peek() {
            if c != '\\' {
                self.advance();
                continue;
            }
            if !self.peek_nth(1).is_some_and(|n| n.is_ascii_alphabetic()) {
                // Escaped character, part of the surrounding text.
                self.advance();
                self.advance();
                continue;
            }

            self.push_text(&mut nodes, gap_start, self.cursor.pos);
            if let Some(cmd) = self.command() {
                nodes.push(Node::Command(cmd));
            }
            gap_start = self.cursor;
        }

        self.push_text(&mut nodes, gap_start, self.cursor.pos);
        nodes
    }

    fn push_text(&self, nodes: &mut Vec<Node>, start: Cursor, end: usize) {
        let body = self.source[start.pos..end].trim();
        if !body.is_empty() {
            nodes.push(Node::Text {
                body: body.to_string(),
                span: Span::new(start.pos, end, start.line, start.column),
            });
        }
    }

    /// Lexes one command starting at a backslash.
    ///
    /// Returns `None` after recording a parse failure.
    fn command(&mut self) -> Option<Command> {
        let start = self.cursor;
        self.advance();

        let name_start = self.cursor.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.advance();
        }
        let name = self.source[name_start..self.cursor.pos].to_string();
        self.skip_whitespace();

        let mut options = None;
        if self.peek() == Some('[') {
            options = Some(self.delimited('[', ']', &name)?.0);
            self.skip_whitespace();
        }

        let mut arguments = Vec::new();
        let mut children = Vec::new();
        loop {
            let before = self.cursor;
            self.skip_whitespace();
            if self.peek() != Some('{') {
                self.cursor = before;
                break;
            }
            let (text, inner) = self.delimited('{', '}', &name)?;
            if arguments.is_empty() {
                let mut sub = Lexer::bounded(self.source, inner, inner.pos + text.len());
                children = sub.nodes();
                self.diagnostics.append(sub.diagnostics);
            }
            arguments.push(text);
        }

        Some(Command {
            name,
            options,
            arguments,
            children,
            span: Span::new(start.pos, self.cursor.pos, start.line, start.column),
        })
    }

    /// Consumes a balanced `open ... close` group.
    ///
    /// Returns the inner text and the cursor at its first character. On
    /// end of input, records a failure and rewinds to just after `open`.
    fn delimited(&mut self, open: char, close: char, name: &str) -> Option<(String, Cursor)> {
        let opening = self.cursor;
        self.advance();
        let inner = self.cursor;
        let mut depth = 0usize;

        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.advance();
                    self.advance();
                    continue;
                }
                '{' => depth += 1,
                '}' if depth > 0 => depth -= 1,
                _ if c == close && depth == 0 => {
                    let text = self.source[inner.pos..self.cursor.pos].to_string();
                    self.advance();
                    return Some((text, inner));
                }
                _ => {}
            }
            self.advance();
        }

        let what = if open == '[' { "options" } else { "argument" };
        self.diagnostics.push(Error::new(ErrorKind::ParseFailure {
            message: format!("unterminated {what}"),
            line: opening.line,
            column: opening.column,
            context: name.to_string(),
        }));
        self.cursor = inner;
        None
    }

    fn peek(&self) -> Option<char> {
        self.source[self.cursor.pos..self.end].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.cursor.pos..self.end].chars().nth(n)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.cursor.pos += c.len_utf8();
            if c == '\n' {
                self.cursor.line += 1;
                self.cursor.column = 1;
            } else {
                self.cursor.column += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }
}
