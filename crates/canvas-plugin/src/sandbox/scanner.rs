//! Extracts import statements from plugin module source.
//!
//! Works on logical lines: comments and string literals are blanked out,
//! bracketed and backslash-continued lines are joined, `;` separated
//! statements are split, and one-line compound headers (`if x:`,
//! `class A:`) are dropped before matching. Imports nested in function bodies
//! are found too, so imports that would only run at call time are still
//! rejected at load time.

use std::sync::LazyLock;

use regex::Regex;

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^import\s+(?P<targets>.+)$").expect("valid regex"));

static FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^from\s+(?P<dots>\.*)\s*(?P<module>[A-Za-z_][\w.]*)?\s+import\s+(?P<names>.+)$")
        .expect("valid regex")
});

static DYNAMIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b__import__\s*\(").expect("valid regex"));

/// One import found in a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatement {
    /// `import a.b` (an `as` alias is dropped).
    Import {
        /// Dotted module path.
        module: String,
    },
    /// `from ..a.b import x, y`.
    From {
        /// Number of leading dots; 0 for absolute imports.
        level: usize,
        /// Module after the dots, if any.
        module: Option<String>,
        /// Imported names (aliases dropped).
        names: Vec<String>,
    },
    /// A call to `__import__(...)`.
    Dynamic,
}

/// An import statement with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedImport {
    /// Source line.
    pub line: usize,
    /// The statement.
    pub statement: ImportStatement,
}

/// Scans module source for import statements.
pub fn scan_imports(source: &str) -> Vec<ScannedImport> {
    let mut found = Vec::new();

    for (line, text) in logical_lines(source) {
        if DYNAMIC_RE.is_match(&text) {
            found.push(ScannedImport {
                line,
                statement: ImportStatement::Dynamic,
            });
        }

        for segment in text.split(';') {
            for statement in parse_statement(strip_block_headers(segment.trim())) {
                found.push(ScannedImport { line, statement });
            }
        }
    }

    found
}

const BLOCK_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "try", "except", "finally", "with", "for", "while", "def", "class",
    "async", "match", "case",
];

/// Drops one-line compound headers, so `class A: import os` and
/// `if x: with y: import os` leave only the body.
fn strip_block_headers(mut statement: &str) -> &str {
    loop {
        let first = statement
            .split(|c: char| c.is_whitespace() || c == ':' || c == '(')
            .next()
            .unwrap_or("");
        if !BLOCK_KEYWORDS.contains(&first) {
            return statement;
        }
        match header_end(statement) {
            Some(colon) => statement = statement[colon + 1..].trim(),
            None => return statement,
        }
    }
}

/// Byte offset of the first `:` outside brackets that is not part of `:=`.
fn header_end(statement: &str) -> Option<usize> {
    let bytes = statement.as_bytes();
    let mut depth: usize = 0;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) != Some(&b'=') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Parses one simple statement. `import a, b as c` yields one entry per
/// target.
fn parse_statement(statement: &str) -> Vec<ImportStatement> {
    if let Some(caps) = FROM_RE.captures(statement) {
        let level = caps.name("dots").map_or(0, |m| m.as_str().len());
        let module = caps.name("module").map(|m| m.as_str().to_string());
        let names = caps["names"]
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split(',')
            .filter_map(strip_alias)
            .collect();
        return vec![ImportStatement::From {
            level,
            module,
            names,
        }];
    }

    if let Some(caps) = IMPORT_RE.captures(statement) {
        return caps["targets"]
            .split(',')
            .filter_map(strip_alias)
            .map(|module| ImportStatement::Import { module })
            .collect();
    }

    Vec::new()
}

fn strip_alias(part: &str) -> Option<String> {
    let name = part.split_whitespace().next()?;
    Some(name.to_string())
}

/// Splits source into logical lines with strings and comments removed.
fn logical_lines(source: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut start_line = 1;
    let mut line = 1;
    let mut depth: usize = 0;
    let mut quote: Option<(char, bool)> = None;

    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some((q, triple)) = quote {
            if c == '\\' {
                if chars.get(i + 1) == Some(&'\n') {
                    line += 1;
                }
                i += 2;
                continue;
            }
            if c == '\n' {
                line += 1;
            }
            if c == q {
                if !triple {
                    quote = None;
                } else if chars.get(i + 1) == Some(&q) && chars.get(i + 2) == Some(&q) {
                    quote = None;
                    i += 2;
                }
            }
            i += 1;
            continue;
        }

        match c {
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '\'' | '"' => {
                let triple = chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c);
                quote = Some((c, triple));
                current.push_str("\"\"");
                i += if triple { 3 } else { 1 };
                continue;
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            '\\' if chars.get(i + 1) == Some(&'\n') => {
                current.push(' ');
                line += 1;
                i += 2;
                continue;
            }
            '\n' => {
                line += 1;
                if depth > 0 {
                    current.push(' ');
                } else {
                    flush(&mut lines, &mut current, start_line);
                    start_line = line;
                }
            }
            _ => current.push(c),
        }
        i += 1;
    }
    flush(&mut lines, &mut current, start_line);

    lines
}

fn flush(lines: &mut Vec<(usize, String)>, current: &mut String, start_line: usize) {
    let text = current.trim();
    if !text.is_empty() {
        lines.push((start_line, text.to_string()));
    }
    current.clear();
}
