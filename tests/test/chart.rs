//! A client for rendering the chart
//!
//! The client panics on erroneous results which reduces the verbosity of
//! test cases.

use airflow_chart_tests::logging::init_test_logging;
use airflow_chart_tests::{render_chart, Chart, ChartValues, RenderOptions, Result};
use serde_json::Value;
use tracing::metadata::Level;

/// Renders the Airflow chart for tests
pub struct TestChart {
    chart: Chart,
}

impl TestChart {
    /// Creates a [`TestChart`].
    pub fn new() -> TestChart {
        init_test_logging(Level::DEBUG);
        let chart = Chart::airflow().expect("Chart could not be loaded");
        TestChart { chart }
    }

    /// Renders the given templates with the given values for the release
    /// `release-name`.
    pub fn render(&self, values: Value, show_only: &[&str]) -> Vec<Value> {
        self.render_with(
            RenderOptions::new()
                .values(values_from(values))
                .show_only(show_only.iter().copied()),
        )
    }

    /// Renders the given templates with values given as YAML.
    pub fn render_yaml(&self, values: &str, show_only: &[&str]) -> Vec<Value> {
        let values = ChartValues::from_yaml(values).expect("Values are not a well-formed YAML");
        self.render_with(
            RenderOptions::new()
                .values(values)
                .show_only(show_only.iter().copied()),
        )
    }

    /// Renders the chart with the given options.
    pub fn render_with(&self, options: RenderOptions) -> Vec<Value> {
        self.try_render(&options)
            .expect("Chart could not be rendered")
    }

    /// Renders the chart with the given options without panicking.
    pub fn try_render(&self, options: &RenderOptions) -> Result<Vec<Value>> {
        render_chart(&self.chart, options)
    }

    /// Returns the rendered YAML stream.
    pub fn template(&self, options: &RenderOptions) -> String {
        self.chart
            .template(options)
            .expect("Chart could not be rendered")
    }
}

/// Converts a JSON value into chart values.
pub fn values_from(values: Value) -> ChartValues {
    ChartValues::try_from(values).expect("Values are not a mapping")
}

/// Returns the value at the given path or `null` if the path does not
/// exist.
pub fn search(path: &str, document: &Value) -> Value {
    airflow_chart_tests::search(path, document).expect("Query path is malformed")
}
