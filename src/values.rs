//! Chart values
//!
//! Values are kept as an untyped tree because templates only read the
//! subtrees they need. Typed views are extracted on demand with
//! [`ChartValues::extract`].

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Default values shipped with the chart
pub const DEFAULT_VALUES: &str = include_str!("../chart/values.yaml");

/// A nested tree of chart values
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartValues(Map<String, Value>);

impl ChartValues {
    /// Creates an empty set of values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the default values of the chart.
    pub fn chart_defaults() -> Result<Self> {
        Self::from_yaml(DEFAULT_VALUES)
    }

    /// Parses values from the given YAML text.
    ///
    /// A document without content yields empty values.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: Value = serde_yaml::from_str(yaml).map_err(Error::ValuesYaml)?;
        Self::try_from(value)
    }

    /// Merges `overlay` onto these values.
    ///
    /// Mappings are merged key by key, every other overlay value replaces
    /// the existing one and `null` removes the key.
    pub fn coalesce(mut self, overlay: &ChartValues) -> Self {
        coalesce_into(&mut self.0, &overlay.0);
        self
    }

    /// Looks up the value at the given dotted path, e.g.
    /// `dags.persistence.enabled`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = self.0.get(segments.next()?)?;
        segments.try_fold(first, |value, segment| value.as_object()?.get(segment))
    }

    /// Deserializes the subtree at the given dotted path.
    ///
    /// An absent or `null` subtree yields the default of `T`.
    pub fn extract<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.get(path) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(value) => T::deserialize(value).map_err(|source| Error::InvalidValues {
                path: path.to_owned(),
                source,
            }),
        }
    }

    /// Returns the values as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for ChartValues {
    fn from(map: Map<String, Value>) -> Self {
        ChartValues(map)
    }
}

impl TryFrom<Value> for ChartValues {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::ValuesNotAMapping {
                found: other.to_string(),
            }),
        }
    }
}

fn coalesce_into(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match value {
            Value::Null => {
                base.remove(key);
            }
            Value::Object(overlay_map) => match base.get_mut(key) {
                Some(Value::Object(base_map)) => coalesce_into(base_map, overlay_map),
                _ => {
                    base.insert(key.to_owned(), without_nulls(value));
                }
            },
            _ => {
                base.insert(key.to_owned(), value.to_owned());
            }
        }
    }
}

/// Drops `null` entries from nested mappings, there is nothing for them
/// to remove when no default exists.
fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key.to_owned(), without_nulls(value)))
                .collect(),
        ),
        other => other.to_owned(),
    }
}
