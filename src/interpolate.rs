use crate::error::InterpolationError;
use crate::section::Section;

/// How many nested `%(name)s` references are followed before giving up.
pub const MAX_DEPTH: usize = 10;

/// Expand `%(name)s` references in `value` using the options of `section`.
///
/// `%%` produces a literal percent sign. `option` names the option `value` was read from and is
/// only used to describe errors.
pub(crate) fn interpolate(
    section: &Section,
    option: &str,
    value: &str,
) -> Result<String, InterpolationError> {
    expand(section, option, value, 1)
}

fn expand(
    section: &Section,
    option: &str,
    value: &str,
    depth: usize,
) -> Result<String, InterpolationError> {
    if depth > MAX_DEPTH {
        return Err(InterpolationError::DepthExceeded {
            section: section.name().to_owned(),
            option: option.to_owned(),
            depth: MAX_DEPTH,
        });
    }

    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }

        match chars.next() {
            Some('%') => result.push('%'),
            Some('(') => {
                let mut reference = String::new();

                loop {
                    match chars.next() {
                        Some(')') => break,
                        Some(ch) => reference.push(ch),
                        None => return Err(unterminated(section, option)),
                    }
                }

                if chars.next() != Some('s') {
                    return Err(unterminated(section, option));
                }

                let text = section
                    .get(&reference)
                    .ok_or_else(|| InterpolationError::MissingReference {
                        section: section.name().to_owned(),
                        option: option.to_owned(),
                        reference: reference.clone(),
                    })?
                    .as_str()
                    .ok_or_else(|| InterpolationError::NullReference {
                        section: section.name().to_owned(),
                        option: option.to_owned(),
                        reference: reference.clone(),
                    })?;

                result.push_str(&expand(section, option, text, depth + 1)?);
            }
            _ => {
                return Err(InterpolationError::BarePercentSign {
                    section: section.name().to_owned(),
                    option: option.to_owned(),
                });
            }
        }
    }

    Ok(result)
}

fn unterminated(section: &Section, option: &str) -> InterpolationError {
    InterpolationError::Unterminated {
        section: section.name().to_owned(),
        option: option.to_owned(),
    }
}
