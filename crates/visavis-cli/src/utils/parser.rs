use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid attribute pair '{0}'. Expected 'first:second' (e.g., 'Vinf_act:ISG_act').")]
    InvalidAttributePair(String),

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidAssignment(String),

    #[error("Component '{component}' cannot be empty in '{text}'.")]
    EmptyComponent {
        component: &'static str,
        text: String,
    },
}

fn split_nonempty<'a>(
    text: &'a str,
    separator: char,
    names: (&'static str, &'static str),
    malformed: fn(String) -> ParseError,
) -> Result<(&'a str, &'a str), ParseError> {
    let (left, right) = text
        .split_once(separator)
        .ok_or_else(|| malformed(text.to_string()))?;
    let (left, right) = (left.trim(), right.trim());
    if left.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: names.0,
            text: text.to_string(),
        });
    }
    if right.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: names.1,
            text: text.to_string(),
        });
    }
    Ok((left, right))
}

pub fn parse_attribute_pair(text: &str) -> Result<(&str, &str), ParseError> {
    split_nonempty(
        text,
        ':',
        ("first", "second"),
        ParseError::InvalidAttributePair,
    )
}

pub fn parse_assignment(text: &str) -> Result<(&str, &str), ParseError> {
    split_nonempty(text, '=', ("key", "value"), ParseError::InvalidAssignment)
}
