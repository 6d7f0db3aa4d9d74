//! Path queries on rendered documents
//!
//! A path is a sequence of field names and indices, e.g.
//! `spec.accessModes[0]` or `metadata.annotations."key-two"`. Field names
//! which are not plain identifiers have to be quoted. Negative indices
//! count from the end of a sequence.
//!
//! A path which does not exist in a document yields nothing. Only a
//! syntactically malformed path is an error.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// Errors raised while parsing a query path
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
pub enum QueryError {
    #[error("query path is empty")]
    Empty,

    #[error("unexpected character '{character}' at position {position} in query path [{path}]")]
    UnexpectedCharacter {
        path: String,
        character: char,
        position: usize,
    },

    #[error("query path [{path}] ends unexpectedly")]
    UnexpectedEnd { path: String },

    #[error("invalid index [{index}] in query path [{path}]")]
    InvalidIndex { path: String, index: String },

    #[error("invalid quoted field name in query path [{path}]")]
    InvalidQuotedField { path: String },
}

/// A single step of a query path
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment {
    Field(String),
    Index(i64),
}

/// A parsed query path
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the value at this path or `None` if any segment is missing.
    pub fn search<'v>(&self, document: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(document, |value, segment| match segment {
                Segment::Field(name) => value.as_object()?.get(name),
                Segment::Index(index) => {
                    let items = value.as_array()?;
                    let position = if *index < 0 {
                        items.len().checked_sub(index.unsigned_abs() as usize)?
                    } else {
                        *index as usize
                    };
                    items.get(position)
                }
            })
    }
}

impl FromStr for Path {
    type Err = QueryError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        Parser::new(path).parse()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if is_identifier(name) => {
                    if position > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", name)?;
                }
                Segment::Field(name) => {
                    if position > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", Value::from(name.as_str()))?;
                }
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Returns the value at `path` in `document`.
///
/// `Ok(None)` means that the path does not exist in the document.
pub fn query<'v>(document: &'v Value, path: &str) -> Result<Option<&'v Value>, QueryError> {
    Ok(path.parse::<Path>()?.search(document))
}

/// Returns a copy of the value at `path` in `document` or `null` if the
/// path does not exist.
pub fn search(path: &str, document: &Value) -> Result<Value, QueryError> {
    Ok(query(document, path)?.cloned().unwrap_or(Value::Null))
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Start,
    AfterDot,
    AfterSegment,
}

struct Parser<'a> {
    path: &'a str,
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(path: &'a str) -> Self {
        Parser { path, position: 0 }
    }

    fn parse(mut self) -> Result<Path, QueryError> {
        if self.path.is_empty() {
            return Err(QueryError::Empty);
        }

        let mut segments = Vec::new();
        let mut state = State::Start;

        while let Some(character) = self.peek() {
            match (state, character) {
                (State::Start | State::AfterSegment, '[') => {
                    segments.push(self.index()?);
                    state = State::AfterSegment;
                }
                (State::AfterSegment, '.') => {
                    self.position += 1;
                    state = State::AfterDot;
                }
                (State::Start | State::AfterDot, '"') => {
                    segments.push(self.quoted_field()?);
                    state = State::AfterSegment;
                }
                (State::Start | State::AfterDot, c) if c.is_ascii_alphabetic() || c == '_' => {
                    segments.push(self.field());
                    state = State::AfterSegment;
                }
                (_, character) => {
                    return Err(QueryError::UnexpectedCharacter {
                        path: self.path.to_owned(),
                        character,
                        position: self.position,
                    })
                }
            }
        }

        if state == State::AfterDot {
            return Err(QueryError::UnexpectedEnd {
                path: self.path.to_owned(),
            });
        }

        Ok(Path { segments })
    }

    fn peek(&self) -> Option<char> {
        self.path[self.position..].chars().next()
    }

    fn rest(&self) -> &'a str {
        &self.path[self.position..]
    }

    fn field(&mut self) -> Segment {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        self.position += len;
        Segment::Field(rest[..len].to_owned())
    }

    fn quoted_field(&mut self) -> Result<Segment, QueryError> {
        let path = self.path;
        let rest = self.rest();
        let invalid = || QueryError::InvalidQuotedField {
            path: path.to_owned(),
        };

        let mut escaped = false;
        let mut end = None;
        for (offset, c) in rest.char_indices().skip(1) {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    end = Some(offset);
                    break;
                }
                _ => {}
            }
        }

        let end = end.ok_or_else(invalid)?;
        let name: String = serde_json::from_str(&rest[..=end]).map_err(|_| invalid())?;
        self.position += end + 1;
        Ok(Segment::Field(name))
    }

    fn index(&mut self) -> Result<Segment, QueryError> {
        let rest = self.rest();
        let end = rest.find(']').ok_or_else(|| QueryError::UnexpectedEnd {
            path: self.path.to_owned(),
        })?;
        let index = &rest[1..end];
        let parsed = index
            .parse::<i64>()
            .ok()
            .filter(|_| !index.starts_with('+'))
            .ok_or_else(|| QueryError::InvalidIndex {
                path: self.path.to_owned(),
                index: index.to_owned(),
            })?;
        self.position += end + 1;
        Ok(Segment::Index(parsed))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
