//! Manifest document model, parsing and canonical rendering

mod lines;

use camino::Utf8Path;
use reqs_core::types::HashDigest;
use reqs_core::{DependencySet, ReqsError, ReqsResult, Requirement};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use self::lines::{logical_lines, split_comment, split_option, trailing_options_start};
use crate::include::IncludeKind;
use crate::STDIN_LABEL;

/// Parsed manifest file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    /// File label used in diagnostics
    pub file: String,
    pub lines: Vec<Line>,
}

/// One logical line of a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    /// 1-based number of the first physical line
    pub number: usize,
    pub kind: LineKind,
    /// Trailing comment text after `#`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Blank,
    /// Full-line comment, text after `#`
    Comment(String),
    Requirement(Requirement),
    Directive(Directive),
}

/// Option line that is not itself a keyed declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Directive {
    /// `-r FILE`
    Requirements(String),
    /// `-c FILE`
    Constraints(String),
    /// `-i URL`
    IndexUrl(String),
    ExtraIndexUrl(String),
    /// `-f URL`
    FindLinks(String),
    Pre,
    /// Local project directory or archive, optionally `-e`
    LocalPath { path: String, editable: bool },
}

/// Declarations grouped under the comment that introduces them
#[derive(Debug, Clone, Serialize)]
pub struct Section<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    pub line: usize,
    pub requirements: Vec<&'a Requirement>,
}

impl Manifest {
    /// Parse manifest text, labelling errors with `file`
    pub fn parse(content: &str, file: &str) -> ReqsResult<Self> {
        let mut lines = Vec::new();

        for logical in logical_lines(content) {
            let (body, comment) = split_comment(&logical.text);
            let body = body.trim();
            let comment = comment.map(str::to_string);

            let line = if body.is_empty() {
                match comment {
                    Some(text) => Line {
                        number: logical.number,
                        kind: LineKind::Comment(text),
                        comment: None,
                    },
                    None => Line {
                        number: logical.number,
                        kind: LineKind::Blank,
                        comment: None,
                    },
                }
            } else {
                let kind = parse_body(body)
                    .map_err(|message| ReqsError::parse(file, logical.number, message))?;
                Line {
                    number: logical.number,
                    kind,
                    comment,
                }
            };
            lines.push(line);
        }

        debug!("Parsed {} with {} lines", file, lines.len());
        Ok(Self {
            file: file.to_string(),
            lines,
        })
    }

    /// Declarations in file order
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirement_lines().map(|(_, requirement)| requirement)
    }

    /// Declarations with their line numbers
    pub fn requirement_lines(&self) -> impl Iterator<Item = (usize, &Requirement)> {
        self.lines.iter().filter_map(|line| match &line.kind {
            LineKind::Requirement(requirement) => Some((line.number, requirement)),
            _ => None,
        })
    }

    /// Option lines with their line numbers
    pub fn directives(&self) -> impl Iterator<Item = (usize, &Directive)> {
        self.lines.iter().filter_map(|line| match &line.kind {
            LineKind::Directive(directive) => Some((line.number, directive)),
            _ => None,
        })
    }

    /// `-r` and `-c` targets with their line numbers
    pub fn includes(&self) -> impl Iterator<Item = (usize, IncludeKind, &str)> {
        self.directives().filter_map(|(number, directive)| match directive {
            Directive::Requirements(path) => Some((number, IncludeKind::Requirements, path.as_str())),
            Directive::Constraints(path) => Some((number, IncludeKind::Constraints, path.as_str())),
            _ => None,
        })
    }

    /// Group declarations by header comment
    ///
    /// A blank line closes the current section. A comment block opening a
    /// new section names it; a comment directly under a declaration stays
    /// in the current one.
    pub fn sections(&self) -> Vec<Section<'_>> {
        let mut sections = Vec::new();
        let mut current = Section {
            header: None,
            line: 1,
            requirements: Vec::new(),
        };
        let mut after_content = false;
        let mut in_comment_block = false;

        for line in &self.lines {
            match &line.kind {
                LineKind::Blank => {
                    if !current.requirements.is_empty() {
                        sections.push(std::mem::replace(
                            &mut current,
                            Section {
                                header: None,
                                line: line.number,
                                requirements: Vec::new(),
                            },
                        ));
                    }
                    after_content = false;
                    in_comment_block = false;
                },
                LineKind::Comment(text) => {
                    if !after_content && !in_comment_block {
                        let previous = std::mem::replace(
                            &mut current,
                            Section {
                                header: section_header(text),
                                line: line.number,
                                requirements: Vec::new(),
                            },
                        );
                        if !previous.requirements.is_empty() {
                            sections.push(previous);
                        }
                    }
                    in_comment_block = true;
                },
                LineKind::Requirement(requirement) => {
                    if current.requirements.is_empty() && current.header.is_none() {
                        current.line = line.number;
                    }
                    current.requirements.push(requirement);
                    after_content = true;
                    in_comment_block = false;
                },
                LineKind::Directive(_) => {
                    after_content = true;
                    in_comment_block = false;
                },
            }
        }

        if !current.requirements.is_empty() {
            sections.push(current);
        }
        sections
    }

    /// Declarations merged into a set keyed by package name
    pub fn dependency_set(&self) -> ReqsResult<DependencySet> {
        let mut set = DependencySet::new();
        for (number, requirement) in self.requirement_lines() {
            set.insert(requirement).map_err(|e| {
                if matches!(e, ReqsError::SourceConflict { .. }) {
                    ReqsError::parse(&self.file, number, e.to_string())
                } else {
                    e
                }
            })?;
        }
        Ok(set)
    }

    /// Canonical text keeping comments and order
    ///
    /// Continuations are joined, runs of blank lines collapse to one, and
    /// the text ends with a single newline.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut previous_blank = true;

        for line in &self.lines {
            let is_blank = matches!(line.kind, LineKind::Blank);
            if is_blank && previous_blank {
                continue;
            }
            out.push_str(&line.to_string());
            out.push('\n');
            previous_blank = is_blank;
        }

        while out.ends_with("\n\n") {
            out.pop();
        }
        out
    }

    /// Check whether `content` is already in canonical form
    pub fn is_canonical(&self, content: &str) -> bool {
        self.render() == content
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LineKind::Blank => return Ok(()),
            LineKind::Comment(text) => return write!(f, "#{}", text.trim_end()),
            LineKind::Requirement(requirement) => write!(f, "{}", requirement)?,
            LineKind::Directive(directive) => write!(f, "{}", directive)?,
        }
        if let Some(ref comment) = self.comment {
            write!(f, "  #{}", comment.trim_end())?;
        }
        Ok(())
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Requirements(path) => write!(f, "-r {}", path),
            Directive::Constraints(path) => write!(f, "-c {}", path),
            Directive::IndexUrl(url) => write!(f, "--index-url {}", url),
            Directive::ExtraIndexUrl(url) => write!(f, "--extra-index-url {}", url),
            Directive::FindLinks(url) => write!(f, "--find-links {}", url),
            Directive::Pre => f.write_str("--pre"),
            Directive::LocalPath {
                path,
                editable: true,
            } => write!(f, "-e {}", path),
            Directive::LocalPath {
                path,
                editable: false,
            } => f.write_str(path),
        }
    }
}

/// Parse manifest text that did not come from a file
pub fn parse_manifest(content: &str) -> ReqsResult<Manifest> {
    Manifest::parse(content, STDIN_LABEL)
}

/// Load and parse a manifest from disk
pub async fn load_manifest(path: &Utf8Path) -> ReqsResult<Manifest> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ReqsError::io(format!("Failed to read {}", path), e))?;

    Manifest::parse(&content, path.as_str())
}

fn section_header(comment: &str) -> Option<String> {
    let header = comment.trim().trim_end_matches(':').trim_end();
    (!header.is_empty()).then(|| header.to_string())
}

fn parse_body(body: &str) -> Result<LineKind, String> {
    if body.starts_with('-') {
        return parse_option(body);
    }
    if looks_like_path(body) {
        return Ok(LineKind::Directive(Directive::LocalPath {
            path: body.to_string(),
            editable: false,
        }));
    }
    parse_requirement(body).map(LineKind::Requirement)
}

fn parse_option(body: &str) -> Result<LineKind, String> {
    let (flag, value) = split_option(body);
    let required = || value.ok_or_else(|| format!("Option '{}' requires a value", flag));
    let single = || {
        let value = required()?;
        match value.split_whitespace().nth(1) {
            Some(extra) => Err(format!("Unexpected argument '{}' after '{}'", extra, flag)),
            None => Ok(value.to_string()),
        }
    };

    let directive = match flag {
        "-r" | "--requirement" => Directive::Requirements(single()?),
        "-c" | "--constraint" => Directive::Constraints(single()?),
        "-i" | "--index-url" => Directive::IndexUrl(single()?),
        "--extra-index-url" => Directive::ExtraIndexUrl(single()?),
        "-f" | "--find-links" => Directive::FindLinks(single()?),
        "--pre" => match value {
            None => Directive::Pre,
            Some(_) => return Err("Option '--pre' takes no value".to_string()),
        },
        "-e" | "--editable" => {
            let target = required()?;
            if looks_like_path(target) {
                Directive::LocalPath {
                    path: target.to_string(),
                    editable: true,
                }
            } else {
                let requirement = Requirement::parse_editable(target).map_err(|e| e.to_string())?;
                return Ok(LineKind::Requirement(requirement));
            }
        },
        _ => return Err(format!("Unknown option '{}'", flag)),
    };
    Ok(LineKind::Directive(directive))
}

fn parse_requirement(body: &str) -> Result<Requirement, String> {
    let (text, options) = match trailing_options_start(body) {
        Some(start) => (&body[..start], Some(&body[start..])),
        None => (body, None),
    };

    let mut requirement = text
        .parse::<Requirement>()
        .map_err(|e| e.to_string())?;
    if let Some(options) = options {
        requirement.hashes = parse_hash_options(options)?;
    }
    Ok(requirement)
}

/// `--hash=algo:hex` or `--hash algo:hex`, repeated
fn parse_hash_options(options: &str) -> Result<Vec<HashDigest>, String> {
    let mut hashes = Vec::new();
    let mut tokens = options.split_whitespace();

    while let Some(token) = tokens.next() {
        let value = match token.split_once('=') {
            Some(("--hash", value)) => value,
            None if token == "--hash" => tokens
                .next()
                .ok_or_else(|| "Option '--hash' requires a value".to_string())?,
            _ => {
                let flag = token.split('=').next().unwrap_or(token);
                return Err(format!("Unsupported option '{}' on a requirement line", flag));
            },
        };
        hashes.push(value.parse::<HashDigest>().map_err(|e| e.to_string())?);
    }
    Ok(hashes)
}

/// Local directory or archive path rather than a package name or URL
fn looks_like_path(text: &str) -> bool {
    if text.starts_with(|c: char| matches!(c, '.' | '/' | '~')) {
        return true;
    }
    !text.contains("://") && !text.contains('@') && text.contains(|c: char| matches!(c, '/' | '\\'))
}
