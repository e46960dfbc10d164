//! Include and exclude patterns for directory walks.
//!
//! Patterns use shell wildcard syntax (`*`, `?`, `[abc]`, `[!abc]`) and are
//! matched against the path of a file relative to the walked directory,
//! with `/` as separator. `*` also matches `/`, so `*.log` excludes log
//! files at any depth.

use crate::error::EngineError;
use regex::Regex;

/// Compiled include and exclude lists.
#[derive(Debug, Clone, Default)]
pub struct PathPatterns {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl PathPatterns {
    /// Compile both lists. Blank patterns are ignored.
    pub fn compile(include: &[String], exclude: &[String]) -> Result<Self, EngineError> {
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Exclusion wins; a non-empty include list must then match.
    pub fn allows(&self, relative_path: &str) -> bool {
        if self.exclude.iter().any(|re| re.is_match(relative_path)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|re| re.is_match(relative_path))
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, EngineError> {
    patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| {
            Regex::new(&glob_to_regex(p)).map_err(|e| EngineError::InvalidPattern {
                pattern: p.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Translate a wildcard pattern into an anchored regular expression.
fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("(?s)^");
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push_str(".*");
                i += 1;
            }
            '?' => {
                out.push('.');
                i += 1;
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push('[');
                    let mut j = i + 1;
                    if chars[j] == '!' {
                        out.push('^');
                        j += 1;
                    }
                    for &c in &chars[j..end] {
                        if c == '\\' || c == '[' || c == '&' || c == '~' || c == '^' {
                            out.push('\\');
                        }
                        out.push(c);
                    }
                    out.push(']');
                    i = end + 1;
                }
                None => {
                    out.push_str("\\[");
                    i += 1;
                }
            },
            c => {
                out.push_str(&regex::escape(&c.to_string()));
                i += 1;
            }
        }
    }

    out.push('$');
    out
}

/// Index of the `]` closing the class opened at `start`, if any.
///
/// A `]` right after `[` or `[!` is a literal member of the class.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    while j < chars.len() {
        if chars[j] == ']' {
            return Some(j);
        }
        j += 1;
    }
    None
}
