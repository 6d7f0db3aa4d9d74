//! Rendering of the chart into Kubernetes manifests
//!
//! [`Chart::template`] produces the same kind of YAML stream as
//! `helm template`. [`render_chart`] parses that stream into documents
//! which can be inspected with [`query`][crate::query].

use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::template::{PersistentVolumeClaimTemplate, RenderContext, Template};
use crate::values::ChartValues;

/// Metadata of the chart shipped with this crate
pub const CHART_METADATA: &str = include_str!("../chart/Chart.yaml");

pub const DEFAULT_RELEASE_NAME: &str = "release-name";
pub const DEFAULT_NAMESPACE: &str = "default";
const RELEASE_SERVICE: &str = "Helm";

/// Name and version of a chart as declared in `Chart.yaml`
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub app_version: Option<String>,
}

impl ChartMetadata {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::ChartMetadata)
    }
}

/// The release a chart is rendered for
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReleaseContext {
    pub name: String,
    pub namespace: String,
    pub service: String,
}

impl ReleaseContext {
    pub fn new(name: &str, namespace: &str) -> Self {
        ReleaseContext {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            service: String::from(RELEASE_SERVICE),
        }
    }
}

impl Default for ReleaseContext {
    fn default() -> Self {
        ReleaseContext::new(DEFAULT_RELEASE_NAME, DEFAULT_NAMESPACE)
    }
}

/// Options for rendering a chart
///
/// ```
/// use airflow_chart_tests::{ChartValues, RenderOptions};
///
/// let options = RenderOptions::new()
///     .release_name("my-release")
///     .values(ChartValues::from_yaml("dags: {persistence: {enabled: true}}").unwrap())
///     .show_only(["templates/dags-persistent-volume-claim.yaml"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RenderOptions {
    release: ReleaseContext,
    values: ChartValues,
    show_only: Vec<String>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release_name(mut self, name: &str) -> Self {
        self.release.name = name.to_owned();
        self
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.release.namespace = namespace.to_owned();
        self
    }

    /// Sets the user supplied values which are merged onto the chart
    /// defaults.
    pub fn values(mut self, values: ChartValues) -> Self {
        self.values = values;
        self
    }

    /// Restricts the output to the given templates.
    ///
    /// All templates are rendered if no template is given.
    pub fn show_only<I, S>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.show_only = templates.into_iter().map(Into::into).collect();
        self
    }

    pub fn release(&self) -> &ReleaseContext {
        &self.release
    }
}

/// A chart consisting of default values and templates
pub struct Chart {
    metadata: ChartMetadata,
    default_values: ChartValues,
    templates: Vec<Box<dyn Template>>,
}

impl Chart {
    /// Creates a chart without templates.
    pub fn new(metadata: ChartMetadata, default_values: ChartValues) -> Self {
        Chart {
            metadata,
            default_values,
            templates: Vec::new(),
        }
    }

    /// Loads the Airflow chart shipped with this crate.
    pub fn airflow() -> Result<Self> {
        let chart = Chart::new(
            ChartMetadata::from_yaml(CHART_METADATA)?,
            ChartValues::chart_defaults()?,
        )
        .with_template(PersistentVolumeClaimTemplate::dags())
        .with_template(PersistentVolumeClaimTemplate::logs());
        Ok(chart)
    }

    /// Adds a template. Templates are rendered in the order they were
    /// added.
    pub fn with_template<T>(mut self, template: T) -> Self
    where
        T: Template + 'static,
    {
        self.templates.push(Box::new(template));
        self
    }

    pub fn metadata(&self) -> &ChartMetadata {
        &self.metadata
    }

    /// Renders the selected templates into a YAML stream.
    ///
    /// Every manifest is preceded by a document separator and a comment
    /// naming its template.
    pub fn template(&self, options: &RenderOptions) -> Result<String> {
        let templates = self.select(&options.show_only)?;
        let values = self.default_values.clone().coalesce(&options.values);
        let context = RenderContext::new(&self.metadata, &options.release, values);

        let mut stream = String::new();
        for template in templates {
            let source_path = format!("{}/{}", self.metadata.name, template.path());
            match template.render(&context)? {
                Some(manifest) => {
                    let yaml = serde_yaml::to_string(&manifest).map_err(|error| {
                        Error::ManifestEncoding {
                            source_path: source_path.to_owned(),
                            error: error.to_string(),
                        }
                    })?;
                    stream.push_str("---\n# Source: ");
                    stream.push_str(&source_path);
                    stream.push('\n');
                    stream.push_str(&yaml);
                    debug!(source = %source_path, "manifest rendered");
                }
                None => debug!(source = %source_path, "template emitted no manifest"),
            }
        }

        Ok(stream)
    }

    /// Resolves the show-only selectors to templates.
    ///
    /// A selector matches a template by its path relative to the chart,
    /// optionally prefixed with the chart name.
    fn select(&self, show_only: &[String]) -> Result<Vec<&(dyn Template + 'static)>> {
        if show_only.is_empty() {
            return Ok(self.templates.iter().map(Box::as_ref).collect());
        }

        let unknown = show_only.iter().find(|selector| {
            !self
                .templates
                .iter()
                .any(|template| self.matches(template.as_ref(), selector))
        });
        if let Some(unknown) = unknown {
            return Err(Error::TemplateNotFound(unknown.to_owned()));
        }

        Ok(self
            .templates
            .iter()
            .map(Box::as_ref)
            .filter(|template| {
                show_only
                    .iter()
                    .any(|selector| self.matches(*template, selector))
            })
            .collect())
    }

    fn matches(&self, template: &dyn Template, selector: &str) -> bool {
        let path = template.path();
        selector == path
            || selector
                .strip_prefix(self.metadata.name.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                == Some(path)
    }
}

/// Renders the chart and parses the output into documents.
///
/// Every persistent volume claim is checked against the Kubernetes
/// schema.
pub fn render_chart(chart: &Chart, options: &RenderOptions) -> Result<Vec<Value>> {
    let stream = chart.template(options)?;
    let documents = parse_manifests(&stream)?;
    info!(
        chart = %chart.metadata().name,
        release = %options.release().name,
        documents = documents.len(),
        "chart rendered"
    );
    Ok(documents)
}

/// Parses a YAML stream into its non-empty documents.
pub fn parse_manifests(stream: &str) -> Result<Vec<Value>> {
    if stream.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(stream) {
        let value = Value::deserialize(document).map_err(Error::ManifestStream)?;
        if value.is_null() {
            continue;
        }
        validate(&value)?;
        documents.push(value);
    }
    Ok(documents)
}

fn validate(document: &Value) -> Result<()> {
    if document.get("kind").and_then(Value::as_str) == Some("PersistentVolumeClaim") {
        PersistentVolumeClaim::deserialize(document).map_err(|error| Error::InvalidManifest {
            kind: String::from("PersistentVolumeClaim"),
            error,
        })?;
    }
    Ok(())
}
