use std::fmt;

use crate::parser::inline_comment_start;

/// A named, ordered group of options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    options: Vec<(String, Value)>,
}

impl Section {
    #[must_use]
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            options: Vec::with_capacity(8),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Option names in their current order.
    pub fn options(&self) -> impl ExactSizeIterator<Item = &str> {
        self.options.iter().map(|(key, _)| key.as_str())
    }

    /// Options and their values in their current order.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> {
        self.options.iter().map(|(key, value)| (key.as_str(), value))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.position(key).map(|i| &self.options[i].1)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Replace the value in place if `key` exists, otherwise append it.
    pub(crate) fn set(&mut self, key: &str, value: Value) {
        match self.position(key) {
            Some(i) => self.options[i].1 = value,
            None => self.options.push((option_key(key), value)),
        }
    }

    /// Append without checking for an existing key; the parser checks first.
    pub(crate) fn push(&mut self, key: String, value: Value) {
        self.options.push((key, value));
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<Value> {
        self.position(key).map(|i| self.options.remove(i).1)
    }

    fn position(&self, key: &str) -> Option<usize> {
        let key = option_key(key);
        self.options.iter().position(|(k, _)| *k == key)
    }
}

/// The value held by an option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Value {
    /// A bare key with no `=`.
    #[default]
    Null,
    /// `key =` with nothing after the sign.
    Empty,
    /// Literal, never empty, text.
    String(String),
}

impl Value {
    /// The text of the value; `""` for [`Value::Empty`], `None` for [`Value::Null`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Null => None,
            Self::Empty => Some(""),
            Self::String(s) => Some(s),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Value::Empty
        } else {
            Value::String(value)
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        value.to_owned().into()
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().unwrap_or_default().fmt(f)
    }
}

/// Option names are stored lowercased and looked up regardless of case.
pub(crate) fn option_key(name: &str) -> String {
    name.to_lowercase()
}

/// Whether `name` survives a save and reload as the same option name.
pub(crate) fn is_valid_option_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(['[', '#', ';'])
        && !name.contains('=')
        && !name.contains(char::is_whitespace)
}

/// Whether `name` survives a save and reload as the same section name.
pub(crate) fn is_valid_section_name(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && !name.contains(['\n', '\r', ']'])
}

/// Whether `value` survives a save and reload unchanged.
pub(crate) fn is_representable(value: &Value) -> bool {
    match value {
        Value::Null | Value::Empty => true,
        Value::String(s) => {
            !s.is_empty()
                && s.trim() == s
                && !s.contains(['\n', '\r'])
                && inline_comment_start(s).is_none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_keeps_position_of_existing_key() {
        let mut section = Section::new("server".to_owned());
        section.set("host", "1.2.3.4".into());
        section.set("port", "28".into());
        section.set("host", "localhost".into());

        assert_eq!(section.options().collect::<Vec<_>>(), ["host", "port"]);
        assert_eq!(section.get("host"), Some(&Value::String("localhost".to_owned())));
    }

    #[test]
    fn option_names_ignore_case() {
        let mut section = Section::new("Server".to_owned());
        section.set("Host", "1.2.3.4".into());
        section.set("HOST", "localhost".into());

        assert_eq!(section.options().collect::<Vec<_>>(), ["host"]);
        assert_eq!(section.get("hOsT"), Some(&Value::String("localhost".to_owned())));
        assert!(section.contains("host"));
        assert_eq!(section.remove("Host"), Some(Value::String("localhost".to_owned())));
    }

    #[test]
    fn remove_returns_value() {
        let mut section = Section::new("server".to_owned());
        section.set("use-power", Value::Null);

        assert_eq!(section.remove("use-power"), Some(Value::Null));
        assert_eq!(section.remove("use-power"), None);
        assert!(section.is_empty());
    }

    #[test]
    fn empty_string_becomes_empty_value() {
        assert_eq!(Value::from(""), Value::Empty);
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::String("x".to_owned()));
        assert_eq!(Value::Empty.as_str(), Some(""));
        assert_eq!(Value::Null.as_str(), None);
    }

    #[test]
    fn option_names() {
        assert!(is_valid_option_name("use-power"));
        assert!(!is_valid_option_name(""));
        assert!(!is_valid_option_name("two words"));
        assert!(!is_valid_option_name("a=b"));
        assert!(!is_valid_option_name("#hidden"));
        assert!(!is_valid_option_name("[oops"));
    }

    #[test]
    fn section_names() {
        assert!(is_valid_section_name("client settings"));
        assert!(!is_valid_section_name(""));
        assert!(!is_valid_section_name(" padded "));
        assert!(!is_valid_section_name("a]b"));
        assert!(!is_valid_section_name("line\nbreak"));
    }

    #[test]
    fn representable_values() {
        assert!(is_representable(&"this; that".into()));
        assert!(is_representable(&";".into()));
        assert!(!is_representable(&"28 ; comment".into()));
        assert!(!is_representable(&Value::String(" padded".to_owned())));
        assert!(!is_representable(&Value::String(String::new())));
        assert!(!is_representable(&"multi\nline".into()));
    }
}
