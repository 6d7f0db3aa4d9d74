//! Persistence settings of a component, e.g. `dags.persistence`

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::error::Result;
use crate::values::ChartValues;

/// Access mode used when the values do not name one
pub const DEFAULT_ACCESS_MODE: &str = "ReadWriteOnce";

/// Typed view of a `<component>.persistence` subtree
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Persistence {
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(default)]
    pub existing_claim: Option<String>,
    /// Numbers and booleans are taken by their display form, e.g. `size: 5`
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub size: Option<String>,
    #[serde(default)]
    pub storage_class_name: Option<String>,
    #[serde(default)]
    pub access_mode: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: BTreeMap<String, String>,
}

impl Persistence {
    /// Reads the persistence settings of the given component.
    ///
    /// An absent subtree yields disabled persistence. A subtree with
    /// values of the wrong type is an error.
    pub fn from_values(values: &ChartValues, component: &str) -> Result<Self> {
        values.extract(&format!("{}.persistence", component))
    }

    /// Returns true if a new claim has to be created.
    ///
    /// No claim is created if persistence is disabled or if an existing
    /// claim is reused. An empty `existingClaim` counts as unset.
    pub fn should_emit(&self) -> bool {
        self.enabled
            && self
                .existing_claim
                .as_deref()
                .map_or(true, |claim| claim.is_empty())
    }

    /// Returns the configured access mode or `default`.
    pub fn access_mode_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.access_mode
            .as_deref()
            .filter(|mode| !mode.is_empty())
            .unwrap_or(default)
    }
}

/// Decides whether the claim of the given component is rendered.
///
/// Only `enabled: true` enables the claim. Any `existingClaim` other than
/// `null` or `""` suppresses it. The remaining settings are not read, so
/// they cannot fail a disabled claim.
pub fn should_emit(values: &ChartValues, component: &str) -> bool {
    let enabled = match values.get(&format!("{}.persistence.enabled", component)) {
        Some(Value::Bool(enabled)) => *enabled,
        None | Some(Value::Null) => false,
        Some(enabled) => {
            warn!(component, %enabled, "ignoring malformed persistence settings");
            false
        }
    };

    let existing_claim = values.get(&format!("{}.persistence.existingClaim", component));
    let claim_unset = match existing_claim {
        None | Some(Value::Null) => true,
        Some(Value::String(claim)) => claim.is_empty(),
        Some(_) => false,
    };

    enabled && claim_unset
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(value @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(value.to_string())),
        Some(value) => Err(D::Error::custom(format!(
            "expected a scalar, found {}",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    fn values(value: Value) -> ChartValues {
        ChartValues::try_from(value).unwrap()
    }

    #[test]
    fn absent_persistence_is_disabled() {
        let persistence = Persistence::from_values(&ChartValues::new(), "dags").unwrap();

        assert_eq!(persistence, Persistence::default());
        assert!(!persistence.should_emit());
    }

    #[test]
    fn enabled_persistence_without_claim_is_emitted() {
        for claim in [json!(null), json!("")] {
            let values = values(json!({
                "dags": {"persistence": {"enabled": true, "existingClaim": claim}}
            }));

            assert!(should_emit(&values, "dags"));
        }
    }

    #[test]
    fn existing_claim_suppresses_emission() {
        let values = values(json!({
            "dags": {"persistence": {"enabled": true, "existingClaim": "test-claim"}}
        }));

        assert!(!should_emit(&values, "dags"));
    }

    #[test]
    fn null_enabled_and_annotations_fall_back_to_defaults() {
        let values = values(json!({
            "dags": {"persistence": {"enabled": null, "annotations": null}}
        }));

        let persistence = Persistence::from_values(&values, "dags").unwrap();

        assert!(!persistence.enabled);
        assert!(persistence.annotations.is_empty());
    }

    #[test]
    fn settings_of_other_components_are_ignored() {
        let values = values(json!({"logs": {"persistence": {"enabled": true}}}));

        assert!(!should_emit(&values, "dags"));
        assert!(should_emit(&values, "logs"));
    }

    #[test]
    fn access_mode_falls_back_when_unset_or_empty() {
        let mut persistence = Persistence::default();
        assert_eq!(persistence.access_mode_or(DEFAULT_ACCESS_MODE), "ReadWriteOnce");

        persistence.access_mode = Some(String::new());
        assert_eq!(persistence.access_mode_or("ReadWriteMany"), "ReadWriteMany");

        persistence.access_mode = Some(String::from("ReadOnlyMany"));
        assert_eq!(persistence.access_mode_or(DEFAULT_ACCESS_MODE), "ReadOnlyMany");
    }

    #[test]
    fn malformed_settings_are_rejected_by_the_typed_view() {
        let values = values(json!({"dags": {"persistence": {"enabled": "yes"}}}));

        assert!(Persistence::from_values(&values, "dags").is_err());
    }

    #[traced_test]
    #[test]
    fn malformed_settings_are_not_emitted() {
        let values = values(json!({"dags": {"persistence": {"enabled": "yes"}}}));

        assert!(!should_emit(&values, "dags"));
        assert!(logs_contain("ignoring malformed persistence settings"));
    }

    #[test]
    fn disabled_persistence_ignores_the_other_settings() {
        let values = values(json!({
            "dags": {"persistence": {"enabled": false, "size": ["1G"], "annotations": ["key"]}}
        }));

        assert!(!should_emit(&values, "dags"));
    }

    #[test]
    fn claims_which_are_not_strings_suppress_emission() {
        let values = values(json!({
            "dags": {"persistence": {"enabled": true, "existingClaim": {"name": "claim"}}}
        }));

        assert!(!should_emit(&values, "dags"));
    }

    #[test]
    fn scalar_sizes_are_taken_verbatim() {
        for (size, expected) in [(json!(5), "5"), (json!(1.5), "1.5"), (json!("1Gi"), "1Gi")] {
            let values = values(json!({"dags": {"persistence": {"size": size}}}));

            let persistence = Persistence::from_values(&values, "dags").unwrap();

            assert_eq!(persistence.size.as_deref(), Some(expected));
        }
    }
}
