use std::iter::Enumerate;
use std::str::Lines;

use tracing::trace;

use crate::error::FormatError;
use crate::section::{self, Section, Value};

/// Represents an on-going parse.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
        }
    }
}

impl Parser<'_> {
    /// Consume the input, failing on the first malformed line.
    pub fn into_sections(mut self) -> Result<Vec<Section>, FormatError> {
        let mut sections = Vec::<Section>::with_capacity(16);

        while let Some((index, raw)) = self.lines.next() {
            let line = index + 1;

            // Only a marker in the very first column starts a comment.
            if raw.starts_with(['#', ';']) {
                continue;
            }

            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with(['#', ';']) {
                return Err(FormatError::IndentedComment { line });
            }
            // Values never span lines, so there is nothing an indented line could continue.
            if raw.starts_with(char::is_whitespace) {
                return Err(FormatError::IndentedLine { line });
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = parse_section_name(header, line)?;
                if sections.iter().any(|section| section.name() == name) {
                    return Err(FormatError::DuplicateSection { line, name });
                }

                trace!(section = %name, line, "section header");
                sections.push(Section::new(name));
                continue;
            }

            let (key, value) = parse_option(trimmed, line)?;
            let Some(section) = sections.last_mut() else {
                return Err(FormatError::OptionOutsideSection { line, name: key });
            };
            if section.contains(&key) {
                return Err(FormatError::DuplicateOption {
                    line,
                    section: section.name().to_owned(),
                    option: key,
                });
            }

            section.push(key, value);
        }

        Ok(sections)
    }
}

/// Byte offset of an inline comment: a `;` directly preceded by whitespace.
pub(crate) fn inline_comment_start(text: &str) -> Option<usize> {
    let mut after_blank = false;

    for (i, c) in text.char_indices() {
        if c == ';' && after_blank {
            return Some(i);
        }
        after_blank = c.is_whitespace();
    }

    None
}

fn strip_inline_comment(text: &str) -> &str {
    match inline_comment_start(text) {
        Some(i) => text[..i].trim_end(),
        None => text,
    }
}

/// Parse what follows the opening `[` of a header line.
fn parse_section_name(header: &str, line: usize) -> Result<String, FormatError> {
    let Some((name, rest)) = header.split_once(']') else {
        return Err(FormatError::MalformedHeader { line });
    };

    // Anything after the bracket must be an inline comment.
    let comment = rest.starts_with(char::is_whitespace) && rest.trim_start().starts_with(';');
    if !rest.is_empty() && !comment {
        return Err(FormatError::HeaderTrailingText {
            line,
            text: rest.trim().to_owned(),
        });
    }

    let name = name.trim();
    if name.is_empty() {
        return Err(FormatError::SectionNameEmpty { line });
    }

    Ok(name.to_owned())
}

/// Parse `key = value` or a bare `key` from an already trimmed line.
fn parse_option(text: &str, line: usize) -> Result<(String, Value), FormatError> {
    let (key, value) = match text.split_once('=') {
        Some((key, value)) => (key.trim(), Value::from(strip_inline_comment(value.trim()))),
        None => (strip_inline_comment(text), Value::Null),
    };

    if key.is_empty() {
        return Err(FormatError::OptionNameEmpty { line });
    }
    if key.contains(char::is_whitespace) {
        return Err(FormatError::OptionNameWhitespace {
            line,
            name: key.to_owned(),
        });
    }

    Ok((section::option_key(key), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Vec<Section>, FormatError> {
        Parser::new(text).into_sections()
    }

    fn value(s: &str) -> Value {
        Value::String(s.to_owned())
    }

    #[test]
    fn comments_blank_lines_and_values() {
        let text = "
[server]
host = 1.2.3.4
port = 28    ; an integer

# This block concerns our secret sauce
speed =
# fill in an integer greater than 1000000 above
use-power
; leave this alone

nocomment = this; that
semicolon = ;

[client settings]
browser = chrome only
";

        let sections = parse(text).expect("failed to parse hardcoded config");

        assert_eq!(sections.len(), 2);
        let server = &sections[0];
        assert_eq!(server.name(), "server");
        assert_eq!(
            server.entries().collect::<Vec<_>>(),
            [
                ("host", &value("1.2.3.4")),
                ("port", &value("28")),
                ("speed", &Value::Empty),
                ("use-power", &Value::Null),
                ("nocomment", &value("this; that")),
                ("semicolon", &value(";")),
            ]
        );

        let client = &sections[1];
        assert_eq!(client.name(), "client settings");
        assert_eq!(client.get("browser"), Some(&value("chrome only")));
    }

    #[test]
    fn crlf_line_endings() {
        let sections = parse("[a]\r\nkey = value\r\nflag\r\n").expect("failed to parse CRLF input");

        assert_eq!(sections[0].get("key"), Some(&value("value")));
        assert_eq!(sections[0].get("flag"), Some(&Value::Null));
    }

    #[test]
    fn value_split_at_first_equal_sign() {
        let sections = parse("[a]\nexpr = 1+1=2\n").expect("failed to parse hardcoded config");

        assert_eq!(sections[0].get("expr"), Some(&value("1+1=2")));
    }

    #[test]
    fn inline_comment_after_bare_key_and_header() {
        let sections = parse("[a]   ; first section\nflag ; no value\n")
            .expect("failed to parse hardcoded config");

        assert_eq!(sections[0].name(), "a");
        assert_eq!(sections[0].get("flag"), Some(&Value::Null));
    }

    #[test]
    fn tab_before_semicolon_starts_comment() {
        let sections = parse("[a]\nkey = value\t;comment\n").expect("failed to parse hardcoded config");

        assert_eq!(sections[0].get("key"), Some(&value("value")));
    }

    #[test]
    fn option_before_section() {
        let err = parse("# header comment\nkey = value\n[a]\n").unwrap_err();

        assert_eq!(
            err,
            FormatError::OptionOutsideSection {
                line: 2,
                name: "key".to_owned()
            }
        );
    }

    #[test]
    fn option_name_with_whitespace() {
        let err = parse("[a]\nbad key = value\n").unwrap_err();

        assert!(matches!(err, FormatError::OptionNameWhitespace { line: 2, .. }));
        assert!(matches!(
            parse("[a]\nuse power\n"),
            Err(FormatError::OptionNameWhitespace { .. })
        ));
    }

    #[test]
    fn indented_comment() {
        assert_eq!(
            parse("[a]\n  ; not a comment\n"),
            Err(FormatError::IndentedComment { line: 2 })
        );
        assert_eq!(
            parse("[a]\n\t# nor this\n"),
            Err(FormatError::IndentedComment { line: 2 })
        );
    }

    #[test]
    fn malformed_headers() {
        assert_eq!(parse("[a\n"), Err(FormatError::MalformedHeader { line: 1 }));
        assert_eq!(
            parse("[a]b\n"),
            Err(FormatError::HeaderTrailingText {
                line: 1,
                text: "b".to_owned()
            })
        );
        assert_eq!(parse("[   ]\n"), Err(FormatError::SectionNameEmpty { line: 1 }));
    }

    #[test]
    fn hash_after_header_is_not_a_comment() {
        assert_eq!(
            parse("[a]\t# note\n"),
            Err(FormatError::HeaderTrailingText {
                line: 1,
                text: "# note".to_owned()
            })
        );
        assert!(parse("[a]\t; note\n").is_ok());
    }

    #[test]
    fn indented_lines() {
        assert_eq!(
            parse("[a]\nkey = first\n  second = line\n"),
            Err(FormatError::IndentedLine { line: 3 })
        );
        assert_eq!(
            parse("  [a]\n"),
            Err(FormatError::IndentedLine { line: 1 })
        );
        assert_eq!(
            parse("[a]\n\tflag\n"),
            Err(FormatError::IndentedLine { line: 2 })
        );
    }

    #[test]
    fn option_names_are_lowercased() {
        let sections = parse("[Server]\nHost = x\nUSE-Power\n").expect("failed to parse hardcoded config");

        assert_eq!(sections[0].name(), "Server");
        assert_eq!(sections[0].options().collect::<Vec<_>>(), ["host", "use-power"]);
        assert_eq!(sections[0].get("HOST"), Some(&value("x")));
    }

    #[test]
    fn option_names_differing_in_case_collide() {
        assert_eq!(
            parse("[a]\nKey = 1\nkey = 2\n"),
            Err(FormatError::DuplicateOption {
                line: 3,
                section: "a".to_owned(),
                option: "key".to_owned()
            })
        );
    }

    #[test]
    fn empty_option_name() {
        assert_eq!(
            parse("[a]\n= value\n"),
            Err(FormatError::OptionNameEmpty { line: 2 })
        );
    }

    #[test]
    fn duplicates() {
        assert!(matches!(
            parse("[a]\n[b]\n[a]\n"),
            Err(FormatError::DuplicateSection { line: 3, .. })
        ));
        assert!(matches!(
            parse("[a]\nkey = 1\nkey = 2\n"),
            Err(FormatError::DuplicateOption { line: 3, .. })
        ));

        // The same option name in different sections is fine.
        let sections = parse("[a]\nkey = 1\n[b]\nkey = 2\n").expect("failed to parse hardcoded config");
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn section_names_are_case_sensitive() {
        let sections = parse("[Server]\n[server]\n").expect("failed to parse hardcoded config");

        assert_eq!(sections[0].name(), "Server");
        assert_eq!(sections[1].name(), "server");
    }

    #[test]
    fn finds_inline_comments() {
        assert_eq!(inline_comment_start("28    ; an integer"), Some(6));
        assert_eq!(inline_comment_start("this; that"), None);
        assert_eq!(inline_comment_start(";"), None);
    }
}
