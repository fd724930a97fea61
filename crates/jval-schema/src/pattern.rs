//! # Schema Regular Expressions
//!
//! `pattern` and `patternProperties` are written in ECMA-262 syntax and
//! match as a search anywhere in the string. They are compiled with the
//! `regex` crate, which agrees with ECMA-262 on the common subset but
//! makes the shorthand classes Unicode-aware. `\d`, `\D`, `\w` and `\W`
//! are therefore rewritten to their ASCII classes before compilation.
//! Constructs outside the `regex` crate's syntax (backreferences,
//! lookaround) fail to compile and are reported as schema errors.

use std::fmt;

use regex::Regex;

/// A compiled schema pattern.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile an ECMA-262 pattern.
    ///
    /// # Errors
    ///
    /// Returns the `regex` crate's error for unsupported or invalid syntax.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&translate(source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Unanchored search.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The pattern as written in the schema.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// Rewrite ECMA shorthand classes to ASCII. An escaped backslash is
/// copied as a pair so `\\d` stays a literal backslash followed by `d`.
///
/// Inside a bracket class ECMA has no nesting or set operations, so `[`,
/// `&` and `~` there are literals and are escaped for the `regex` crate.
/// Shorthands become nested classes, which the `regex` crate allows.
fn translate(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('d') => out.push_str("[0-9]"),
                Some('w') => out.push_str("[A-Za-z0-9_]"),
                Some('D') => out.push_str("[^0-9]"),
                Some('W') => out.push_str("[^A-Za-z0-9_]"),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            '[' if in_class => out.push_str("\\["),
            '&' | '~' if in_class => {
                out.push('\\');
                out.push(c);
            }
            '[' => {
                in_class = true;
                out.push('[');
                if chars.peek() == Some(&'^') {
                    chars.next();
                    out.push('^');
                }
            }
            ']' if in_class => {
                in_class = false;
                out.push(']');
            }
            _ => out.push(c),
        }
    }
    out
}
