#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::style,
    clippy::pedantic
)]

//! Reader and writer for an INI-style configuration format.
//!
//! ```text
//! [server]
//! host = 1.2.3.4
//! port = 28    ; an integer
//!
//! # Comments start in the very first column.
//! speed =
//! use-power
//! nocomment = this; that
//!
//! [client settings]
//! browser = chrome only
//! ```
//!
//! - `#` or `;` starts a comment only as the first character of a line.
//! - ` ;` (whitespace, then a semicolon) starts an inline comment; any other `;` is literal.
//! - `speed =` holds an empty string, while a bare `use-power` holds no value at all.
//! - Section names may contain spaces; option names may not.
//! - Values are never unquoted: quotation marks are part of the value.
//!
//! Saving a [`Config`] drops every comment of the text it was parsed from.

mod error;
mod interpolate;
mod parser;
mod section;

use std::fmt;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::str::{self, FromStr};

use tracing::debug;

pub use crate::error::{Error, FormatError, InterpolationError, LookupError};
pub use crate::interpolate::MAX_DEPTH as MAX_INTERPOLATION_DEPTH;
pub use crate::parser::Parser;
pub use crate::section::{Section, Value};

/// A UTF-8 Byte Order Mark (BOM), written by some editors at the start of a file. It carries no
/// meaning for UTF-8 and is skipped.
///
/// <https://en.wikipedia.org/wiki/Byte_order_mark>
const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];

/// An ordered collection of uniquely named sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    sections: Vec<Section>,
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration text.
    ///
    /// # Errors
    ///
    /// Fails on the first line that breaks the format; nothing is partially loaded.
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let sections = Parser::new(text).into_sections()?;
        Ok(Self { sections })
    }

    /// Parse raw bytes, which must be UTF-8 with an optional BOM.
    ///
    /// # Errors
    ///
    /// Fails when the bytes are not UTF-8 or the text breaks the format.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, FormatError> {
        let text = decode_data(buffer)?;
        Self::parse(text)
    }

    /// # Errors
    ///
    /// Fails when reading fails or the data does not parse.
    pub fn from_reader<R>(reader: &mut R) -> Result<Self, Error>
    where
        R: Read,
    {
        let mut buffer = Vec::with_capacity(4096);
        reader.read_to_end(&mut buffer).map_err(Error::Read)?;
        Ok(Self::from_bytes(&buffer)?)
    }

    /// Read and parse the file at `path`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not parse.
    pub fn load<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let buffer = fs::read(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::from_bytes(&buffer)?;

        debug!(path = %path.display(), sections = config.len(), "loaded config");
        Ok(config)
    }

    /// Write the canonical text form to `path`, replacing the file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be created or written.
    pub fn save<P>(&self, path: P) -> Result<(), Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let io_error = |source| Error::Io {
            path: path.to_owned(),
            source,
        };

        let file = fs::File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer).map_err(io_error)?;
        writer.flush().map_err(io_error)?;

        debug!(path = %path.display(), sections = self.len(), "saved config");
        Ok(())
    }

    /// Write the canonical text form.
    ///
    /// # Errors
    ///
    /// Propagates errors from `writer`.
    pub fn write_to<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        write!(writer, "{self}")
    }

    /// Number of sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Section names in their current order.
    pub fn sections(&self) -> impl ExactSizeIterator<Item = &str> {
        self.sections.iter().map(Section::name)
    }

    /// Option names of `section` in their current order.
    ///
    /// # Errors
    ///
    /// Fails when the section does not exist.
    pub fn options(
        &self,
        section: &str,
    ) -> Result<impl ExactSizeIterator<Item = &str>, LookupError> {
        Ok(self.section(section)?.options())
    }

    /// # Errors
    ///
    /// Fails when the section does not exist.
    pub fn section(&self, name: &str) -> Result<&Section, LookupError> {
        self.sections
            .iter()
            .find(|section| section.name() == name)
            .ok_or_else(|| LookupError::SectionNotFound {
                section: name.to_owned(),
            })
    }

    #[must_use]
    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_ok()
    }

    #[must_use]
    pub fn has_option(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_ok()
    }

    /// The literal value of `key`, without interpolation.
    ///
    /// # Errors
    ///
    /// Fails when the section or the option does not exist.
    pub fn get(&self, section: &str, key: &str) -> Result<&Value, LookupError> {
        self.section(section)?
            .get(key)
            .ok_or_else(|| LookupError::OptionNotFound {
                section: section.to_owned(),
                option: key.to_owned(),
            })
    }

    /// Like [`Config::get`], with `None` for an option that has no value.
    ///
    /// # Errors
    ///
    /// Fails when the section or the option does not exist.
    pub fn get_str(&self, section: &str, key: &str) -> Result<Option<&str>, LookupError> {
        self.get(section, key).map(Value::as_str)
    }

    /// Read a boolean written as `true`, `false`, `yes` or `no` in any letter case.
    ///
    /// # Errors
    ///
    /// Fails when the option is missing, has no value, or holds any other text.
    pub fn get_bool(&self, section: &str, key: &str) -> Result<bool, Error> {
        let text = self.get_text(section, key)?;

        if ["true", "yes"].iter().any(|t| text.eq_ignore_ascii_case(t)) {
            Ok(true)
        } else if ["false", "no"].iter().any(|f| text.eq_ignore_ascii_case(f)) {
            Ok(false)
        } else {
            Err(FormatError::InvalidBoolean {
                section: section.to_owned(),
                option: key.to_owned(),
                value: text.to_owned(),
            }
            .into())
        }
    }

    /// Parse the value with [`FromStr`], e.g. into an integer.
    ///
    /// # Errors
    ///
    /// Fails when the option is missing, has no value, or does not parse as `T`.
    pub fn get_parsed<T>(&self, section: &str, key: &str) -> Result<T, Error>
    where
        T: FromStr,
    {
        let text = self.get_text(section, key)?;

        text.parse::<T>().map_err(|_| {
            FormatError::InvalidValue {
                section: section.to_owned(),
                option: key.to_owned(),
                value: text.to_owned(),
                expected: std::any::type_name::<T>(),
            }
            .into()
        })
    }

    /// The value with `%(name)s` references to options of the same section expanded, and `%%`
    /// turned into `%`.
    ///
    /// # Errors
    ///
    /// Fails when the option is missing or has no value, or a reference cannot be resolved.
    pub fn get_interpolated(&self, section: &str, key: &str) -> Result<String, Error> {
        let text = self.get_text(section, key)?;
        let owner = self.section(section)?;
        Ok(interpolate::interpolate(owner, key, text)?)
    }

    /// Insert or overwrite an option, creating the section at the end when it does not exist.
    ///
    /// An existing option keeps its position; a new one is appended.
    ///
    /// # Errors
    ///
    /// Fails when a name or the value could not be saved and parsed back unchanged. Nothing is
    /// modified in that case.
    pub fn set<V>(&mut self, section: &str, key: &str, value: V) -> Result<(), FormatError>
    where
        V: Into<Value>,
    {
        let value = value.into();

        if !section::is_valid_section_name(section) {
            return Err(FormatError::InvalidSectionName {
                name: section.to_owned(),
            });
        }
        if !section::is_valid_option_name(key) {
            return Err(FormatError::InvalidOptionName {
                name: key.to_owned(),
            });
        }
        if !section::is_representable(&value) {
            return Err(FormatError::UnrepresentableValue {
                value: value.to_string(),
            });
        }

        let index = match self.position(section) {
            Some(i) => i,
            None => {
                self.sections.push(Section::new(section.to_owned()));
                self.sections.len() - 1
            }
        };
        self.sections[index].set(key, value);

        Ok(())
    }

    /// Append an empty section.
    ///
    /// # Errors
    ///
    /// Fails when the name is invalid or already taken.
    pub fn add_section(&mut self, name: &str) -> Result<(), FormatError> {
        if !section::is_valid_section_name(name) {
            return Err(FormatError::InvalidSectionName {
                name: name.to_owned(),
            });
        }
        if self.has_section(name) {
            return Err(FormatError::SectionExists {
                name: name.to_owned(),
            });
        }

        self.sections.push(Section::new(name.to_owned()));
        Ok(())
    }

    /// Remove an option and return its value.
    ///
    /// # Errors
    ///
    /// Fails when the section or the option does not exist.
    pub fn remove_option(&mut self, section: &str, key: &str) -> Result<Value, LookupError> {
        let index = self
            .position(section)
            .ok_or_else(|| LookupError::SectionNotFound {
                section: section.to_owned(),
            })?;

        self.sections[index]
            .remove(key)
            .ok_or_else(|| LookupError::OptionNotFound {
                section: section.to_owned(),
                option: key.to_owned(),
            })
    }

    /// Remove a section with all of its options.
    ///
    /// # Errors
    ///
    /// Fails when the section does not exist.
    pub fn remove_section(&mut self, name: &str) -> Result<Section, LookupError> {
        let index = self
            .position(name)
            .ok_or_else(|| LookupError::SectionNotFound {
                section: name.to_owned(),
            })?;

        Ok(self.sections.remove(index))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|section| section.name() == name)
    }

    /// Text of an option that must have a value.
    fn get_text(&self, section: &str, key: &str) -> Result<&str, Error> {
        self.get_str(section, key)?.ok_or_else(|| {
            FormatError::MissingValue {
                section: section.to_owned(),
                option: key.to_owned(),
            }
            .into()
        })
    }
}

impl FromStr for Config {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "[{}]", section.name())?;

            for (key, value) in section.entries() {
                match value {
                    Value::Null => writeln!(f, "{key}")?,
                    Value::Empty | Value::String(_) => writeln!(f, "{key} = {value}")?,
                }
            }

            writeln!(f)?;
        }

        Ok(())
    }
}

fn decode_data(data: &[u8]) -> Result<&str, FormatError> {
    let data = data.strip_prefix(BOM_UTF8).unwrap_or(data);
    str::from_utf8(data).map_err(|source| FormatError::Encoding { source })
}
