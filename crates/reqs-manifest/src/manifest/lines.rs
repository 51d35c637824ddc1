//! Physical line handling: continuations, comments and option splitting.

/// Physical lines joined across `\` continuations
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogicalLine {
    /// 1-based number of the first physical line
    pub number: usize,
    pub text: String,
}

/// Join continued lines
///
/// A comment line ends a pending continuation and becomes its inline
/// comment, the same way pip reads it.
pub(crate) fn logical_lines(content: &str) -> Vec<LogicalLine> {
    let mut lines = Vec::new();
    let mut pending: Option<LogicalLine> = None;

    for (index, raw) in content.lines().enumerate() {
        let number = index + 1;
        let is_comment = raw.trim_start().starts_with('#');
        let continued = if is_comment {
            None
        } else {
            raw.trim_end().strip_suffix('\\')
        };

        match (pending.as_mut(), continued) {
            (Some(line), Some(body)) => line.text.push_str(body),
            (Some(line), None) => {
                if is_comment {
                    line.text.push(' ');
                }
                line.text.push_str(raw);
                lines.extend(pending.take());
            },
            (None, Some(body)) => {
                pending = Some(LogicalLine {
                    number,
                    text: body.to_string(),
                })
            },
            (None, None) => lines.push(LogicalLine {
                number,
                text: raw.to_string(),
            }),
        }
    }

    lines.extend(pending);
    lines
}

/// Split at the first `#` that starts the text or follows whitespace
///
/// URL fragments (`#egg=`) are not preceded by whitespace and stay intact.
pub(crate) fn split_comment(text: &str) -> (&str, Option<&str>) {
    let mut after_space = true;
    for (i, c) in text.char_indices() {
        if c == '#' && after_space {
            return (&text[..i], Some(&text[i + 1..]));
        }
        after_space = c.is_whitespace();
    }
    (text, None)
}

/// Split an option line into its flag and value
///
/// Accepts `-r file`, `-rfile`, `--requirement file` and
/// `--requirement=file`.
pub(crate) fn split_option(text: &str) -> (&str, Option<&str>) {
    let text = text.trim();
    let flag_end = if text.starts_with("--") {
        text.find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(text.len())
    } else {
        text.char_indices().nth(2).map(|(i, _)| i).unwrap_or(text.len())
    };

    let flag = &text[..flag_end];
    let rest = text[flag_end..].trim_start();
    let rest = rest.strip_prefix('=').unwrap_or(rest).trim();
    (flag, (!rest.is_empty()).then_some(rest))
}

/// Index where trailing `--option` tokens start on a requirement line
pub(crate) fn trailing_options_start(text: &str) -> Option<usize> {
    text.match_indices("--")
        .map(|(i, _)| i)
        .find(|&i| i > 0 && text[..i].ends_with(char::is_whitespace))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuation_lines() {
        let lines = logical_lines("pandas>=1.5,\\\n    <3\nblack\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[0].text, "pandas>=1.5,    <3");
        assert_eq!(lines[1].number, 3);
        assert_eq!(lines[1].text, "black");
    }

    #[test]
    fn test_comment_ends_continuation() {
        let lines = logical_lines("black \\\n# formatter\nflake8");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "black  # formatter");
        assert_eq!(lines[1].number, 3);
    }

    #[test]
    fn test_trailing_continuation_at_eof() {
        let lines = logical_lines("vyper>=0.3.10 \\");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "vyper>=0.3.10 ");
    }

    #[test]
    fn test_split_comment() {
        assert_eq!(split_comment("# linting"), ("", Some(" linting")));
        assert_eq!(split_comment("black  # formatter"), ("black  ", Some(" formatter")));
        assert_eq!(
            split_comment("git+https://host/org/repo@abc#egg=repo"),
            ("git+https://host/org/repo@abc#egg=repo", None)
        );
    }

    #[test]
    fn test_split_option() {
        assert_eq!(split_option("-r base.txt"), ("-r", Some("base.txt")));
        assert_eq!(split_option("-rbase.txt"), ("-r", Some("base.txt")));
        assert_eq!(split_option("--requirement=base.txt"), ("--requirement", Some("base.txt")));
        assert_eq!(split_option("--requirement  base.txt"), ("--requirement", Some("base.txt")));
        assert_eq!(split_option("--pre"), ("--pre", None));
    }

    #[test]
    fn test_trailing_options_start() {
        let text = "six==1.16.0 --hash=sha256:abc";
        assert_eq!(trailing_options_start(text), Some(12));
        assert_eq!(trailing_options_start("six==1.16.0"), None);
    }
}
