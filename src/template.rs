//! Chart templates
//!
//! A template decides on its own whether it emits a manifest. The chart
//! only collects what its selected templates emit.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, ResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::{json, Value};
use tracing::debug;

use crate::chart::{ChartMetadata, ReleaseContext};
use crate::error::{Error, Result};
use crate::persistence::{self, Persistence, DEFAULT_ACCESS_MODE};
use crate::placeholder;
use crate::values::ChartValues;

/// Maximum length of a Kubernetes resource name
const MAX_NAME_LENGTH: usize = 63;

/// Everything a template can read while rendering
pub struct RenderContext<'a> {
    pub chart: &'a ChartMetadata,
    pub release: &'a ReleaseContext,
    pub values: ChartValues,
    scope: Value,
}

impl<'a> RenderContext<'a> {
    /// Creates a context for the given coalesced values.
    pub fn new(chart: &'a ChartMetadata, release: &'a ReleaseContext, values: ChartValues) -> Self {
        let scope = json!({
            "Release": {
                "Name": release.name,
                "Namespace": release.namespace,
                "Service": release.service,
            },
            "Chart": {
                "Name": chart.name,
                "Version": chart.version,
                "AppVersion": chart.app_version,
            },
            "Values": values.to_value(),
        });
        RenderContext {
            chart,
            release,
            values,
            scope,
        }
    }

    /// Returns the tree which placeholders are resolved against.
    pub fn scope(&self) -> &Value {
        &self.scope
    }

    /// Returns the base name of all resources of the release.
    ///
    /// `fullnameOverride` takes precedence over the release name. The name
    /// is cut to 63 characters and a single trailing dash is removed.
    pub fn fullname(&self) -> Result<String> {
        let fullname_override: String = self.values.extract("fullnameOverride")?;
        let name = if fullname_override.is_empty() {
            &self.release.name
        } else {
            &fullname_override
        };
        let truncated: String = name.chars().take(MAX_NAME_LENGTH).collect();
        Ok(truncated.strip_suffix('-').unwrap_or(&truncated).to_owned())
    }

    /// Returns the labels every resource of the release carries.
    pub fn common_labels(&self, component: &str) -> Result<BTreeMap<String, String>> {
        let mut labels = BTreeMap::new();
        labels.insert(String::from("tier"), String::from("airflow"));
        labels.insert(String::from("component"), component.to_owned());
        labels.insert(String::from("release"), self.release.name.to_owned());
        labels.insert(
            String::from("chart"),
            format!("{}-{}", self.chart.name, self.chart.version),
        );
        labels.insert(String::from("heritage"), self.release.service.to_owned());

        let extra_labels: BTreeMap<String, String> = self.values.extract("labels")?;
        labels.extend(extra_labels);

        Ok(labels)
    }
}

/// A template of the chart
pub trait Template {
    /// Path of the template relative to the chart, e.g.
    /// `templates/dags-persistent-volume-claim.yaml`
    fn path(&self) -> &str;

    /// Renders the manifest or returns `None` if the template is disabled
    /// by the values.
    fn render(&self, context: &RenderContext) -> Result<Option<Value>>;
}

/// A persistent volume claim backed by a `<component>.persistence` subtree
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PersistentVolumeClaimTemplate {
    path: String,
    component: String,
    default_access_mode: String,
}

impl PersistentVolumeClaimTemplate {
    /// Creates a template which reads `<component>.persistence` and names
    /// the claim `<fullname>-<component>`.
    pub fn new(path: &str, component: &str, default_access_mode: &str) -> Self {
        PersistentVolumeClaimTemplate {
            path: path.to_owned(),
            component: component.to_owned(),
            default_access_mode: default_access_mode.to_owned(),
        }
    }

    /// Claim for the dags volume
    pub fn dags() -> Self {
        Self::new(
            "templates/dags-persistent-volume-claim.yaml",
            "dags",
            DEFAULT_ACCESS_MODE,
        )
    }

    /// Claim for the logs volume, which is shared between all components
    pub fn logs() -> Self {
        Self::new(
            "templates/logs-persistent-volume-claim.yaml",
            "logs",
            "ReadWriteMany",
        )
    }

    /// Maps the persistence settings onto a claim.
    ///
    /// An unset storage class is omitted, `-` requests an explicitly empty
    /// storage class.
    pub fn project(
        &self,
        persistence: &Persistence,
        context: &RenderContext,
    ) -> Result<PersistentVolumeClaim> {
        let storage_class_name = match persistence.storage_class_name.as_deref() {
            None | Some("") => None,
            Some("-") => Some(String::new()),
            Some(storage_class_name) => Some(
                placeholder::substitute(storage_class_name, context.scope()).map_err(
                    |source| Error::Placeholder {
                        template: self.path.to_owned(),
                        source,
                    },
                )?,
            ),
        };

        let annotations =
            Some(persistence.annotations.to_owned()).filter(|annotations| !annotations.is_empty());

        let mut requests = BTreeMap::new();
        requests.insert(
            String::from("storage"),
            Quantity(persistence.size.to_owned().unwrap_or_default()),
        );

        Ok(PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(format!("{}-{}", context.fullname()?, self.component)),
                labels: Some(context.common_labels(&format!("{}-pvc", self.component))?),
                annotations,
                ..ObjectMeta::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec![persistence
                    .access_mode_or(&self.default_access_mode)
                    .to_owned()]),
                resources: Some(ResourceRequirements {
                    requests: Some(requests),
                    ..ResourceRequirements::default()
                }),
                storage_class_name,
                ..PersistentVolumeClaimSpec::default()
            }),
            ..PersistentVolumeClaim::default()
        })
    }
}

impl Template for PersistentVolumeClaimTemplate {
    fn path(&self) -> &str {
        &self.path
    }

    fn render(&self, context: &RenderContext) -> Result<Option<Value>> {
        if !persistence::should_emit(&context.values, &self.component) {
            debug!(template = %self.path, "persistent volume claim not rendered");
            return Ok(None);
        }

        let persistence = Persistence::from_values(&context.values, &self.component)?;
        let claim = self.project(&persistence, context)?;
        serde_json::to_value(&claim)
            .map(Some)
            .map_err(|error| Error::ManifestEncoding {
                source_path: self.path.to_owned(),
                error: error.to_string(),
            })
    }
}
