//! Import statement extraction from Python source
//!
//! A line scanner, not a parser: it recognises `import` and `from ... import`
//! statements at any indentation, follows backslash continuations and `;`
//! separated statements, and ignores text inside triple-quoted strings.

/// An absolute import found in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    /// Dotted module path as written (`boa.vyper.contract`)
    pub module: String,
    pub line: usize,
}

impl ImportStatement {
    /// First component of the module path
    pub fn top_level(&self) -> &str {
        self.module.split('.').next().unwrap_or(&self.module)
    }
}

/// Extract absolute imports, skipping relative ones
pub fn scan_imports(source: &str) -> Vec<ImportStatement> {
    let mut imports = Vec::new();
    let mut open_string: Option<&'static str> = None;
    let mut pending = String::new();
    let mut pending_line = 0;

    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;

        if let Some(delimiter) = open_string {
            if raw.matches(delimiter).count() % 2 == 1 {
                open_string = None;
            }
            continue;
        }

        if pending.is_empty() {
            pending_line = number;
        }
        match raw.trim_end().strip_suffix('\\') {
            Some(head) => {
                pending.push_str(head);
                pending.push(' ');
                continue;
            },
            None => pending.push_str(raw),
        }

        let logical = std::mem::take(&mut pending);
        let code = strip_comment(&logical);
        for statement in code.split(';') {
            parse_statement(statement.trim(), pending_line, &mut imports);
        }
        open_string = unclosed_triple_quote(code);
    }

    imports
}

fn parse_statement(statement: &str, line: usize, imports: &mut Vec<ImportStatement>) {
    if let Some(rest) = statement.strip_prefix("import ") {
        for item in rest.split(',') {
            let name = item.split_whitespace().next().unwrap_or_default();
            let name = name.trim_matches(|c: char| c == '(' || c == ')');
            if is_module_path(name) {
                imports.push(ImportStatement {
                    module: name.to_string(),
                    line,
                });
            }
        }
    } else if let Some(rest) = statement.strip_prefix("from ") {
        let mut words = rest.split_whitespace();
        let module = words.next().unwrap_or_default();
        if words.next() == Some("import") && is_module_path(module) {
            imports.push(ImportStatement {
                module: module.to_string(),
                line,
            });
        }
    }
}

/// Dotted identifiers; relative paths (leading `.`) are rejected
fn is_module_path(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
                && chars.all(|c| c.is_alphanumeric() || c == '_')
        })
}

/// Code before a `#` that is not inside a string literal
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (index, c) in line.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {},
            None if c == '#' => return &line[..index],
            None if c == '"' || c == '\'' => quote = Some(c),
            None => {},
        }
    }
    line
}

/// Triple-quote delimiter left open at the end of a line
fn unclosed_triple_quote(line: &str) -> Option<&'static str> {
    let mut rest = line;
    loop {
        let double = rest.find("\"\"\"");
        let single = rest.find("'''");
        let (start, delimiter) = match (double, single) {
            (Some(d), Some(s)) if s < d => (s, "'''"),
            (Some(d), _) => (d, "\"\"\""),
            (None, Some(s)) => (s, "'''"),
            (None, None) => return None,
        };
        let after = &rest[start + 3..];
        match after.find(delimiter) {
            Some(end) => rest = &after[end + 3..],
            None => return Some(delimiter),
        }
    }
}
