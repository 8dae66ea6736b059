use std::path::PathBuf;
use std::{io, str};

/// Any failure produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    #[error("failed to read data")]
    Read(#[source] io::Error),

    #[error("failed to access {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The text (or a value handed to a mutator) does not fit the format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("input is not valid UTF-8")]
    Encoding {
        #[source]
        source: str::Utf8Error,
    },

    #[error("line {line}: option {name:?} appears before any section header")]
    OptionOutsideSection { line: usize, name: String },

    #[error("line {line}: option name cannot be empty")]
    OptionNameEmpty { line: usize },

    #[error("line {line}: option name {name:?} contains whitespace")]
    OptionNameWhitespace { line: usize, name: String },

    #[error("line {line}: section name cannot be empty")]
    SectionNameEmpty { line: usize },

    #[error("line {line}: malformed section header")]
    MalformedHeader { line: usize },

    #[error("line {line}: unexpected {text:?} after section header; only \" ;\" starts a comment")]
    HeaderTrailingText { line: usize, text: String },

    #[error("line {line}: section {name:?} already exists")]
    DuplicateSection { line: usize, name: String },

    #[error("line {line}: option {option:?} already exists in section {section:?}")]
    DuplicateOption {
        line: usize,
        section: String,
        option: String,
    },

    #[error("line {line}: indented comment")]
    IndentedComment { line: usize },

    #[error("line {line}: indented line; values cannot continue onto another line")]
    IndentedLine { line: usize },

    #[error("invalid option name: {name:?}")]
    InvalidOptionName { name: String },

    #[error("invalid section name: {name:?}")]
    InvalidSectionName { name: String },

    #[error("value {value:?} cannot be written without changing its meaning")]
    UnrepresentableValue { value: String },

    #[error("section {name:?} already exists")]
    SectionExists { name: String },

    #[error("[{section}] {option}: option has no value")]
    MissingValue { section: String, option: String },

    #[error("[{section}] {option}: {value:?} is not a boolean")]
    InvalidBoolean {
        section: String,
        option: String,
        value: String,
    },

    #[error("[{section}] {option}: {value:?} is not a valid {expected}")]
    InvalidValue {
        section: String,
        option: String,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("no section named {section:?}")]
    SectionNotFound { section: String },

    #[error("no option {option:?} in section {section:?}")]
    OptionNotFound { section: String, option: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterpolationError {
    #[error("[{section}] {option}: unterminated %(name)s reference")]
    Unterminated { section: String, option: String },

    #[error("[{section}] {option}: '%' must be followed by '%' or '('")]
    BarePercentSign { section: String, option: String },

    #[error("[{section}] {option}: references missing option {reference:?}")]
    MissingReference {
        section: String,
        option: String,
        reference: String,
    },

    #[error("[{section}] {option}: option {reference:?} has no value")]
    NullReference {
        section: String,
        option: String,
        reference: String,
    },

    #[error("[{section}] {option}: nested references exceed depth {depth}")]
    DepthExceeded {
        section: String,
        option: String,
        depth: usize,
    },
}

impl FormatError {
    /// 1-based line number for errors raised while parsing.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match *self {
            Self::OptionOutsideSection { line, .. }
            | Self::OptionNameEmpty { line }
            | Self::OptionNameWhitespace { line, .. }
            | Self::SectionNameEmpty { line }
            | Self::MalformedHeader { line }
            | Self::HeaderTrailingText { line, .. }
            | Self::DuplicateSection { line, .. }
            | Self::DuplicateOption { line, .. }
            | Self::IndentedComment { line }
            | Self::IndentedLine { line } => Some(line),
            Self::Encoding { .. }
            | Self::InvalidOptionName { .. }
            | Self::InvalidSectionName { .. }
            | Self::UnrepresentableValue { .. }
            | Self::SectionExists { .. }
            | Self::MissingValue { .. }
            | Self::InvalidBoolean { .. }
            | Self::InvalidValue { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn line_numbers_only_for_parse_errors() {
        assert_eq!(FormatError::MalformedHeader { line: 7 }.line(), Some(7));
        assert_eq!(
            FormatError::SectionExists {
                name: "server".to_owned()
            }
            .line(),
            None
        );
    }

    #[test]
    fn display_includes_context() {
        let e = FormatError::OptionNameWhitespace {
            line: 3,
            name: "bad key".to_owned(),
        };
        assert_eq!(e.to_string(), "line 3: option name \"bad key\" contains whitespace");

        let e = LookupError::OptionNotFound {
            section: "server".to_owned(),
            option: "port".to_owned(),
        };
        assert!(e.to_string().contains("port"));

        let e = FormatError::HeaderTrailingText {
            line: 1,
            text: "# note".to_owned(),
        };
        assert!(e.to_string().contains("only \" ;\" starts a comment"));
    }

    #[test]
    fn io_error_keeps_source() {
        let e = Error::Io {
            path: PathBuf::from("missing.cfg"),
            source: io::Error::new(io::ErrorKind::NotFound, "file missing"),
        };
        assert!(e.to_string().contains("missing.cfg"));
        assert!(e.source().is_some());
    }

    #[test]
    fn converts_into_crate_error() {
        let e: Error = LookupError::SectionNotFound {
            section: "client".to_owned(),
        }
        .into();
        assert!(matches!(e, Error::Lookup(LookupError::SectionNotFound { .. })));
    }
}
