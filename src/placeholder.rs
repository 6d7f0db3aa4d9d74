//! Substitution of `{{ .Field.Path }}` placeholders
//!
//! Only field references are understood. Pipelines, functions and
//! control structures are not part of the grammar.
//!
//! `{{-` and `-}}` trim the whitespace before and after the placeholder.

use serde_json::Value;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Errors raised while substituting placeholders
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
pub enum PlaceholderError {
    #[error("unclosed placeholder at position {position}")]
    Unclosed { position: usize },

    #[error("placeholder [{expression}] is not a field reference like `.Release.Name`")]
    Malformed { expression: String },

    #[error("placeholder [{expression}] could not be resolved")]
    Unresolved { expression: String },
}

/// Replaces every placeholder in `template` with the value found at its
/// field path in `scope`.
///
/// ```
/// use airflow_chart_tests::placeholder::substitute;
/// use serde_json::json;
///
/// let scope = json!({"Release": {"Name": "release-name"}});
/// let result = substitute("{{ .Release.Name }}-storage-class", &scope);
/// assert_eq!(result.unwrap(), "release-name-storage-class");
/// ```
pub fn substitute(template: &str, scope: &Value) -> Result<String, PlaceholderError> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find(OPEN) {
        output.push_str(&rest[..start]);

        let inner_start = start + OPEN.len();
        let inner_len = rest[inner_start..]
            .find(CLOSE)
            .ok_or(PlaceholderError::Unclosed {
                position: offset + start,
            })?;
        let inner = &rest[inner_start..inner_start + inner_len];

        let (expression, trim_left, trim_right) = strip_trim_markers(inner);
        if trim_left {
            output.truncate(output.trim_end().len());
        }
        output.push_str(&resolve(expression, scope)?);

        let consumed = inner_start + inner_len + CLOSE.len();
        offset += consumed;
        rest = &rest[consumed..];
        if trim_right {
            let trimmed = rest.trim_start();
            offset += rest.len() - trimmed.len();
            rest = trimmed;
        }
    }
    output.push_str(rest);

    Ok(output)
}

/// Splits off `- ` and ` -` markers. A dash not followed or preceded by
/// whitespace belongs to the expression.
fn strip_trim_markers(inner: &str) -> (&str, bool, bool) {
    let (inner, trim_left) = match inner.strip_prefix('-') {
        Some(rest) if rest.starts_with(char::is_whitespace) => (rest, true),
        _ => (inner, false),
    };
    let (inner, trim_right) = match inner.strip_suffix('-') {
        Some(rest) if rest.ends_with(char::is_whitespace) => (rest, true),
        _ => (inner, false),
    };
    (inner.trim(), trim_left, trim_right)
}

fn resolve(expression: &str, scope: &Value) -> Result<String, PlaceholderError> {
    let malformed = || PlaceholderError::Malformed {
        expression: expression.to_owned(),
    };
    let unresolved = || PlaceholderError::Unresolved {
        expression: expression.to_owned(),
    };

    let path = expression.strip_prefix('.').ok_or_else(malformed)?;
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| !is_identifier(segment)) {
        return Err(malformed());
    }

    let value = segments
        .iter()
        .try_fold(scope, |value, segment| value.as_object()?.get(*segment))
        .ok_or_else(unresolved)?;

    match value {
        Value::String(string) => Ok(string.to_owned()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(boolean) => Ok(boolean.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(unresolved()),
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(first) if first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}
