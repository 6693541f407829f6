//! Line comment removal.

/// Removes `%` line comments from a data-model source.
///
/// A comment runs from an unescaped `%` up to (not including) the end of the
/// line, so line numbers are unchanged. A backslash escapes the following
/// character, which keeps `\%` as literal text.
#[must_use]
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    let mut in_comment = false;

    while let Some(c) = chars.next() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
                out.push(c);
            }
            continue;
        }
        match c {
            '%' => in_comment = true,
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            _ => out.push(c),
        }
    }

    out
}
